//! Route guards.
//!
//! A gate is either open (render the destination) or closed (redirect to the
//! login entry point, replacing the current history entry so "back" does not
//! land on the gate again). The decision is made synchronously from the
//! in-memory session on every navigation; there is no loading state, so a
//! store that has not been rehydrated yet reads as unauthenticated.

use serde::Serialize;

use super::session::Session;
use super::store::SessionStore;
use crate::app::AppKind;
use crate::routes::{self, Navigation, RouteAccess};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub enum GateDecision {
    Open,
    Closed { redirect: Navigation },
}

impl GateDecision {
    pub fn is_open(&self) -> bool {
        matches!(self, GateDecision::Open)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionGate {
    app: AppKind,
}

impl SessionGate {
    pub fn new(app: AppKind) -> Self {
        Self { app }
    }

    /// Gate for the public application: any authenticated session passes
    pub fn user() -> Self {
        Self::new(AppKind::Public)
    }

    /// Gate for the administrative application
    pub fn admin() -> Self {
        Self::new(AppKind::Admin)
    }

    /// The gate predicate.
    ///
    /// The admin gate checks the admin context itself rather than relying on
    /// the store having already rejected non-admin credentials.
    pub fn permits(&self, session: &Session) -> bool {
        match self.app {
            AppKind::Public => session.is_authenticated(),
            AppKind::Admin => session.is_authenticated() && session.is_admin_context(),
        }
    }

    pub fn evaluate(&self, session: &Session) -> GateDecision {
        if self.permits(session) {
            GateDecision::Open
        } else {
            GateDecision::Closed {
                redirect: Navigation::replace(self.app.login_route()),
            }
        }
    }

    /// Evaluate against the store's current session
    pub fn check(&self, store: &SessionStore) -> GateDecision {
        self.evaluate(&store.current_session())
    }

    /// Decide a navigation to `path`; unguarded routes are always open.
    pub fn guard(&self, store: &SessionStore, path: &str) -> GateDecision {
        match routes::access(self.app, path) {
            RouteAccess::Public => GateDecision::Open,
            RouteAccess::Guarded => self.check(store),
        }
    }
}
