//! The session store: single owner of the current credential and session.
//!
//! `SessionStore` is a cheap handle; clones share the same state. It is
//! constructed once at startup, rehydrated once from persisted storage, and
//! then handed to everything that needs to read the session (the request
//! authenticator, route gates, pages).
//!
//! Every write goes through [`SessionStore::set_credential`] or
//! [`SessionStore::logout`]. Writers are serialized by a dedicated lock that
//! spans decode → persist → commit, while readers only ever take the short
//! state lock, so a reader never waits on storage I/O and never sees a
//! half-applied transition.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::claims::{self, Claims};
use super::clock::{Clock, SystemClock};
use super::error::CredentialRejected;
use super::session::Session;
use crate::app::AppKind;
use crate::storage::CredentialStorage;

/// Persisted layout of the administrative application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminEnvelope {
    pub token: Option<String>,
    pub user: Option<EnvelopeUser>,
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeUser {
    pub username: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Default)]
struct StoreState {
    credential: Option<String>,
    session: Session,
}

struct StoreInner {
    app: AppKind,
    storage: Box<dyn CredentialStorage>,
    clock: Box<dyn Clock>,
    state: RwLock<StoreState>,
    writer: Mutex<()>,
}

#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<StoreInner>,
}

impl SessionStore {
    /// Create a store using the system clock. The session starts
    /// unauthenticated until [`rehydrate`](Self::rehydrate) runs.
    pub fn new(app: AppKind, storage: Box<dyn CredentialStorage>) -> Self {
        Self::with_clock(app, storage, Box::new(SystemClock))
    }

    pub fn with_clock(
        app: AppKind,
        storage: Box<dyn CredentialStorage>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                app,
                storage,
                clock,
                state: RwLock::new(StoreState::default()),
                writer: Mutex::new(()),
            }),
        }
    }

    pub fn app(&self) -> AppKind {
        self.inner.app
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Snapshot of the current session
    pub fn current_session(&self) -> Session {
        self.inner.state.read().session.clone()
    }

    /// The raw credential backing the current session, if any
    pub fn current_credential(&self) -> Option<String> {
        self.inner.state.read().credential.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.read().session.is_authenticated()
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Replace the session from a raw credential, or clear it with `None`.
    ///
    /// Returns whether the resulting session is authenticated. Malformed,
    /// expired and (admin application) role-less credentials all leave the
    /// store exactly as if `None` had been passed.
    pub fn set_credential(&self, raw: Option<&str>) -> bool {
        match raw {
            Some(raw) => self.try_set_credential(raw).is_ok(),
            None => {
                self.logout();
                false
            }
        }
    }

    /// Like [`set_credential`](Self::set_credential) with a value, but
    /// reports why a credential was rejected. The store has already been
    /// cleared when this returns an error.
    pub fn try_set_credential(&self, raw: &str) -> Result<Session, CredentialRejected> {
        let _writer = self.inner.writer.lock();

        match self.validate(raw) {
            Ok(claims) => {
                let session = Session::from_claims(&claims, self.inner.app);
                self.persist(raw, &claims);

                let mut state = self.inner.state.write();
                state.credential = Some(raw.to_string());
                state.session = session.clone();

                info!(
                    app = %self.inner.app,
                    subject = %claims.subject,
                    expires_at = claims.expires_at,
                    "Session established"
                );
                Ok(session)
            }
            Err(reason) => {
                warn!(app = %self.inner.app, %reason, "Credential rejected, clearing session");
                self.clear_locked();
                Err(reason)
            }
        }
    }

    /// Clear the credential, persisted storage and session. Idempotent.
    pub fn logout(&self) {
        let _writer = self.inner.writer.lock();
        self.clear_locked();
        debug!(app = %self.inner.app, "Session cleared");
    }

    /// Restore the session from persisted storage.
    ///
    /// Runs once at startup. The persisted credential goes through the same
    /// checks as a fresh login, so a credential that expired while the
    /// application was closed yields an unauthenticated session.
    pub fn rehydrate(&self) -> bool {
        let key = self.inner.app.storage_key();
        let persisted = match self.inner.storage.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Failed to read persisted credential");
                None
            }
        };

        let Some(persisted) = persisted else {
            debug!(app = %self.inner.app, "No persisted credential");
            return false;
        };

        match self.unwrap_persisted(&persisted) {
            Some(raw) => self.set_credential(Some(&raw)),
            None => {
                warn!(app = %self.inner.app, "Persisted session is unreadable, clearing");
                self.set_credential(None)
            }
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn validate(&self, raw: &str) -> Result<Claims, CredentialRejected> {
        let claims = claims::decode(raw)?;

        let now = self.inner.clock.now();
        if claims.is_expired(now) {
            return Err(CredentialRejected::Expired {
                expires_at: claims.expires_at,
                now,
            });
        }

        if self.inner.app.requires_admin() && !claims.is_admin() {
            return Err(CredentialRejected::MissingAdminRole {
                subject: claims.subject,
            });
        }

        Ok(claims)
    }

    fn persist(&self, raw: &str, claims: &Claims) {
        let value = match self.inner.app {
            AppKind::Public => raw.to_string(),
            AppKind::Admin => {
                let envelope = AdminEnvelope {
                    token: Some(raw.to_string()),
                    user: Some(EnvelopeUser {
                        username: claims.subject.clone(),
                        roles: claims.roles.iter().cloned().collect(),
                    }),
                    is_admin: true,
                };
                match serde_json::to_string(&envelope) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!(error = %e, "Failed to encode admin session envelope");
                        self.discard_persisted();
                        return;
                    }
                }
            }
        };

        // The in-memory session still applies but must not survive a reload,
        // and an older persisted credential must not come back in its place.
        if let Err(e) = self.inner.storage.set(self.inner.app.storage_key(), &value) {
            warn!(error = %e, "Failed to persist credential");
            self.discard_persisted();
        }
    }

    fn discard_persisted(&self) {
        if let Err(e) = self.inner.storage.remove(self.inner.app.storage_key()) {
            warn!(error = %e, "Failed to remove persisted credential");
        }
    }

    /// Must be called with the writer lock held.
    fn clear_locked(&self) {
        self.discard_persisted();
        *self.inner.state.write() = StoreState::default();
    }

    fn unwrap_persisted(&self, persisted: &str) -> Option<String> {
        match self.inner.app {
            AppKind::Public => Some(persisted.to_string()),
            AppKind::Admin => serde_json::from_str::<AdminEnvelope>(persisted)
                .ok()
                .and_then(|envelope| envelope.token),
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the credential
        f.debug_struct("SessionStore")
            .field("app", &self.inner.app)
            .field("session", &self.current_session())
            .finish()
    }
}
