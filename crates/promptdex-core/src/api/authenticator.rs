//! Attaches the current credential to outgoing requests.
//!
//! Call sites never deal with authentication: the `ApiClient` runs every
//! request through [`RequestAuthenticator`] just before sending it. The
//! authenticator only reads the store; it does not re-check expiry, retry,
//! or look at responses. A credential that expires mid-session keeps being
//! attached until the next rehydration, and the backend's 401 is what
//! enforces expiry in that window.

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::RequestBuilder;
use tracing::warn;

use crate::auth::SessionStore;

#[derive(Clone, Debug)]
pub struct RequestAuthenticator {
    store: SessionStore,
}

impl RequestAuthenticator {
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }

    /// Set `Authorization: Bearer <credential>` when a credential is held,
    /// otherwise leave the headers untouched.
    pub fn authenticate(&self, headers: &mut HeaderMap) {
        let Some(credential) = self.store.current_credential() else {
            return;
        };

        match HeaderValue::from_str(&format!("Bearer {}", credential)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(header::AUTHORIZATION, value);
            }
            Err(e) => {
                // Only reachable with non-visible ASCII in a decodable token
                warn!(error = %e, "Credential is not a valid header value, sending unauthenticated");
            }
        }
    }

    /// Apply [`authenticate`](Self::authenticate) to a request builder
    pub fn apply(&self, builder: RequestBuilder) -> RequestBuilder {
        let mut headers = HeaderMap::new();
        self.authenticate(&mut headers);
        if headers.is_empty() {
            builder
        } else {
            builder.headers(headers)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::FixedClock;
    use crate::storage::MemoryStorage;
    use crate::AppKind;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn store() -> SessionStore {
        SessionStore::with_clock(
            AppKind::Public,
            Box::new(MemoryStorage::new()),
            Box::new(FixedClock::new(1500)),
        )
    }

    fn token() -> String {
        encode(
            &Header::default(),
            &json!({ "sub": "alice", "roles": ["USER"], "exp": 2000 }),
            &EncodingKey::from_secret(b"test"),
        )
        .expect("Failed to mint test token")
    }

    #[test]
    fn test_no_credential_leaves_headers_untouched() {
        let authenticator = RequestAuthenticator::new(store());
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        authenticator.authenticate(&mut headers);

        assert_eq!(headers.len(), 1);
        assert!(headers.get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_credential_attached_as_bearer() {
        let store = store();
        let token = token();
        assert!(store.set_credential(Some(&token)));

        let authenticator = RequestAuthenticator::new(store);
        let mut headers = HeaderMap::new();
        authenticator.authenticate(&mut headers);

        let value = headers.get(header::AUTHORIZATION).expect("header set");
        assert_eq!(value.to_str().unwrap(), format!("Bearer {}", token));
        assert!(value.is_sensitive());
    }

    #[test]
    fn test_follows_store_after_logout() {
        let store = store();
        assert!(store.set_credential(Some(&token())));
        let authenticator = RequestAuthenticator::new(store.clone());

        store.logout();

        let mut headers = HeaderMap::new();
        authenticator.authenticate(&mut headers);
        assert!(headers.get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_replaces_stale_authorization_header() {
        let store = store();
        let token = token();
        assert!(store.set_credential(Some(&token)));

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer old"));
        RequestAuthenticator::new(store).authenticate(&mut headers);

        assert_eq!(headers.get_all(header::AUTHORIZATION).iter().count(), 1);
        assert_eq!(
            headers.get(header::AUTHORIZATION).unwrap().to_str().unwrap(),
            format!("Bearer {}", token)
        );
    }
}
