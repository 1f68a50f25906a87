//! Login and registration call sites.
//!
//! The session store fails silently. This is where a failed attempt becomes a
//! message the user can read. A failed login always leaves the store logged
//! out, never half-authenticated.

use thiserror::Error;
use tracing::{error, info, warn};

use super::error::CredentialRejected;
use super::notice::Notice;
use super::session::Session;
use super::store::SessionStore;
use crate::api::{ApiClient, ApiError};
use crate::AppKind;

const REGISTERED_MESSAGE: &str = "Registration successful! Please log in.";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Username and password required")]
    MissingCredentials,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("No token received from server")]
    MissingToken,

    #[error("Credential rejected: {0}")]
    Rejected(#[from] CredentialRejected),

    #[error("Registration failed: {0}")]
    Registration(String),

    #[error(transparent)]
    Api(ApiError),
}

impl AuthError {
    /// Message suitable for showing on the login or registration form
    pub fn user_message(&self) -> String {
        match self {
            AuthError::MissingCredentials => "Username and password required".to_string(),
            AuthError::InvalidCredentials => {
                "Invalid username or password. Please try again.".to_string()
            }
            AuthError::MissingToken => "Login failed: No token received from server.".to_string(),
            AuthError::Rejected(reason) => format!("Login failed: {}", reason.user_message()),
            AuthError::Registration(message) => message.clone(),
            AuthError::Api(ApiError::NetworkError(e)) if e.is_timeout() => {
                "Connection timed out. Please try again.".to_string()
            }
            AuthError::Api(ApiError::NetworkError(_)) => {
                "Unable to connect to server. Check your connection.".to_string()
            }
            AuthError::Api(_) => "Login failed. An unexpected error occurred.".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct AuthService {
    store: SessionStore,
    api: ApiClient,
}

impl AuthService {
    pub fn new(store: SessionStore, api: ApiClient) -> Self {
        Self { store, api }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Exchange username and password for a credential and install it.
    ///
    /// The session is left untouched while the request is in flight and
    /// replaced (or cleared) only once the backend has answered.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let token = match self.api.login(username, password).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                warn!("Login response carried no token");
                self.store.logout();
                return Err(AuthError::MissingToken);
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                self.store.logout();
                return Err(match e {
                    ApiError::Unauthorized => AuthError::InvalidCredentials,
                    other => AuthError::Api(other),
                });
            }
        };

        // A rejected credential has already cleared the store
        let session = self.store.try_set_credential(&token)?;
        info!(app = %self.store.app(), "Login successful");
        Ok(session)
    }

    /// Register a new account. Does not log in; the returned notice asks
    /// the user to do so.
    pub async fn register(&self, username: &str, password: &str, email: &str) -> Result<Notice, AuthError> {
        match self.api.register(username, password, email).await {
            Ok(()) => {
                info!("Registration successful");
                Ok(Notice::success(REGISTERED_MESSAGE))
            }
            Err(e) => {
                error!(error = %e, "Registration failed");
                let message = e
                    .server_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| "Registration failed.".to_string());
                Err(AuthError::Registration(message))
            }
        }
    }

    pub fn logout(&self) {
        self.store.logout();
        info!("Logged out");
    }

    /// Whether this application offers self-service registration
    pub fn supports_registration(&self) -> bool {
        matches!(self.store.app(), AppKind::Public)
    }
}
