//! Identification of the running front end.
//!
//! The public application and the administrative application are deployed
//! independently and never share persisted state. Everything that differs
//! between them (storage key, landing routes, gate predicate) hangs off
//! [`AppKind`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::routes::{ADMIN_HOME_ROUTE, HOME_ROUTE, LOGIN_ROUTE};

/// Storage key holding the raw credential for the public application
pub const PUBLIC_STORAGE_KEY: &str = "token";

/// Storage key holding the JSON envelope for the administrative application
pub const ADMIN_STORAGE_KEY: &str = "admin-auth-storage";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub enum AppKind {
    /// The public single-page application (prompts, reviews, collections)
    #[default]
    Public,
    /// The administrative single-page application
    Admin,
}

impl AppKind {
    /// Key under which this application persists its credential.
    pub fn storage_key(&self) -> &'static str {
        match self {
            AppKind::Public => PUBLIC_STORAGE_KEY,
            AppKind::Admin => ADMIN_STORAGE_KEY,
        }
    }

    /// Route a user lands on after a successful login.
    pub fn home_route(&self) -> &'static str {
        match self {
            AppKind::Public => HOME_ROUTE,
            AppKind::Admin => ADMIN_HOME_ROUTE,
        }
    }

    pub fn login_route(&self) -> &'static str {
        LOGIN_ROUTE
    }

    /// Whether a session in this application requires the `ADMIN` role
    pub fn requires_admin(&self) -> bool {
        matches!(self, AppKind::Admin)
    }

    /// Directory name used to keep each application's files apart
    pub fn dir_name(&self) -> &'static str {
        match self {
            AppKind::Public => "public",
            AppKind::Admin => "admin",
        }
    }
}

impl fmt::Display for AppKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for AppKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "public" | "user" => Ok(AppKind::Public),
            "admin" => Ok(AppKind::Admin),
            other => Err(anyhow::anyhow!("Unknown application kind: {}", other)),
        }
    }
}
