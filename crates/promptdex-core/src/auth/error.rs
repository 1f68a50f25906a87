use thiserror::Error;

use super::claims::DecodeError;

/// Why a credential did not produce a session.
///
/// The session store treats every variant the same way (the session ends up
/// unauthenticated), but callers that initiated the login can use the reason
/// to tell the user what happened.
#[derive(Error, Debug)]
pub enum CredentialRejected {
    #[error("Malformed credential: {0}")]
    Malformed(#[from] DecodeError),

    #[error("Credential expired at {expires_at} (now {now})")]
    Expired { expires_at: i64, now: i64 },

    #[error("Account {subject} does not have the ADMIN role")]
    MissingAdminRole { subject: String },
}

impl CredentialRejected {
    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            CredentialRejected::Malformed(_) => {
                "The server returned an unreadable login token.".to_string()
            }
            CredentialRejected::Expired { .. } => {
                "Your login has expired. Please log in again.".to_string()
            }
            CredentialRejected::MissingAdminRole { .. } => {
                "This account does not have administrator access.".to_string()
            }
        }
    }
}
