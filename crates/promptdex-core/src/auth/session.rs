use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::claims::{role_matches, Claims, ADMIN_ROLE};
use crate::app::AppKind;

/// Who the current user is, as far as the client knows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct Identity {
    pub subject: String,
    pub roles: BTreeSet<String>,
}

impl Identity {
    /// The subject doubles as the username
    pub fn username(&self) -> &str {
        &self.subject
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| role_matches(r, role))
    }
}

/// Authentication state derived from a validated credential.
///
/// Only the session store builds these; the fields are private so that
/// `is_authenticated` always agrees with the presence of an identity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct Session {
    is_authenticated: bool,
    identity: Option<Identity>,
    is_admin_context: bool,
}

impl Session {
    pub fn unauthenticated() -> Self {
        Self::default()
    }

    pub(crate) fn from_claims(claims: &Claims, app: AppKind) -> Self {
        let identity = Identity {
            subject: claims.subject.clone(),
            roles: claims.roles.clone(),
        };
        let is_admin_context = app.requires_admin() && identity.has_role(ADMIN_ROLE);

        Self {
            is_authenticated: true,
            identity: Some(identity),
            is_admin_context,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// True only inside the administrative application for an admin identity
    pub fn is_admin_context(&self) -> bool {
        self.is_admin_context
    }

    pub fn username(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.username())
    }
}
