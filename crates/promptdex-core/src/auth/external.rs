//! Return leg of an external identity-provider login.
//!
//! The backend finishes the provider handshake and redirects the browser to
//! the landing route with either `?token=<credential>` or `?error=<code>`.
//! [`ExternalLoginCompletion::complete`] consumes the landing, so it runs
//! exactly once and is never retried.

use reqwest::Url;
use serde::Serialize;
use tracing::{info, warn};

use super::notice::Notice;
use super::store::SessionStore;
use crate::routes::Navigation;

/// Base used to resolve landing paths given without scheme and host
const LANDING_BASE: &str = "http://localhost/";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Landing {
    Token(String),
    Error(String),
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct CompletionOutcome {
    pub navigation: Navigation,
    pub notice: Option<Notice>,
    pub authenticated: bool,
}

#[derive(Debug)]
pub struct ExternalLoginCompletion {
    landing: Landing,
}

impl ExternalLoginCompletion {
    /// Parse the landing URL. Accepts a full URL, a path with query, or a
    /// bare query string. Empty parameter values count as absent.
    pub fn from_url(url: &str) -> Self {
        let parsed = Url::parse(url).or_else(|_| {
            Url::parse(LANDING_BASE).and_then(|base| base.join(url))
        });

        let landing = match parsed {
            Ok(url) => Self::landing_from_pairs(url.query_pairs().into_owned()),
            Err(e) => {
                warn!(error = %e, "Unparsable external login landing URL");
                Landing::Empty
            }
        };
        Self { landing }
    }

    pub fn from_params(token: Option<&str>, error: Option<&str>) -> Self {
        let pairs = token
            .map(|t| ("token".to_string(), t.to_string()))
            .into_iter()
            .chain(error.map(|e| ("error".to_string(), e.to_string())));
        Self {
            landing: Self::landing_from_pairs(pairs),
        }
    }

    /// `token` wins when both parameters are present.
    fn landing_from_pairs(pairs: impl Iterator<Item = (String, String)>) -> Landing {
        let mut token = None;
        let mut error = None;
        for (key, value) in pairs {
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "token" if token.is_none() => token = Some(value),
                "error" if error.is_none() => error = Some(value),
                _ => {}
            }
        }

        match (token, error) {
            (Some(token), _) => Landing::Token(token),
            (None, Some(error)) => Landing::Error(error),
            (None, None) => Landing::Empty,
        }
    }

    /// Finalize the landing against the store.
    ///
    /// A token that the store rejects (malformed, expired, or lacking the
    /// admin role in the administrative application) is reported to the user
    /// and sends them to the login page instead of a logged-out home page.
    pub fn complete(self, store: &SessionStore) -> CompletionOutcome {
        let app = store.app();

        match self.landing {
            Landing::Token(token) => match store.try_set_credential(&token) {
                Ok(session) => {
                    info!(subject = ?session.username(), "External login completed");
                    CompletionOutcome {
                        navigation: Navigation::push(app.home_route()),
                        notice: None,
                        authenticated: true,
                    }
                }
                Err(reason) => {
                    warn!(%reason, "External login returned an unusable credential");
                    CompletionOutcome {
                        navigation: Navigation::push(app.login_route()),
                        notice: Some(Notice::error(format!(
                            "Login failed: {}",
                            reason.user_message()
                        ))),
                        authenticated: false,
                    }
                }
            },
            Landing::Error(code) => {
                warn!(error = %code, "External login failed at provider");
                CompletionOutcome {
                    navigation: Navigation::push(app.login_route()),
                    notice: Some(Notice::error(format!("Login failed: {}", code))),
                    authenticated: store.is_authenticated(),
                }
            }
            Landing::Empty => {
                warn!("External login landing carried neither token nor error");
                CompletionOutcome {
                    navigation: Navigation::push(app.login_route()),
                    notice: Some(Notice::error("An unknown error occurred during login.")),
                    authenticated: store.is_authenticated(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn landing(url: &str) -> Landing {
        ExternalLoginCompletion::from_url(url).landing
    }

    #[test]
    fn test_parse_full_url() {
        assert_eq!(
            landing("http://localhost:5173/oauth2/redirect?token=abc.def.ghi"),
            Landing::Token("abc.def.ghi".to_string())
        );
        assert_eq!(
            landing("http://localhost:5173/oauth2/redirect?error=access_denied"),
            Landing::Error("access_denied".to_string())
        );
    }

    #[test]
    fn test_parse_relative_forms() {
        assert_eq!(
            landing("/oauth2/redirect?error=access_denied"),
            Landing::Error("access_denied".to_string())
        );
        assert_eq!(landing("?token=xyz"), Landing::Token("xyz".to_string()));
        assert_eq!(landing("/oauth2/redirect"), Landing::Empty);
    }

    #[test]
    fn test_parse_percent_encoded_error() {
        assert_eq!(
            landing("/oauth2/redirect?error=email%20already%20registered"),
            Landing::Error("email already registered".to_string())
        );
    }

    #[test]
    fn test_empty_values_are_absent() {
        assert_eq!(landing("/oauth2/redirect?token=&error="), Landing::Empty);
        assert_eq!(
            landing("/oauth2/redirect?token=&error=denied"),
            Landing::Error("denied".to_string())
        );
    }

    #[test]
    fn test_token_wins_over_error() {
        assert_eq!(
            landing("/oauth2/redirect?error=denied&token=abc"),
            Landing::Token("abc".to_string())
        );
    }

    #[test]
    fn test_from_params() {
        assert_eq!(
            ExternalLoginCompletion::from_params(None, Some("denied")).landing,
            Landing::Error("denied".to_string())
        );
        assert_eq!(ExternalLoginCompletion::from_params(None, None).landing, Landing::Empty);
    }
}
