//! Route table for both front ends.
//!
//! The public application is open by default and guards only the pages that
//! create or edit content. The administrative application is the opposite:
//! every page except the login entry points sits behind the admin gate.

use serde::Serialize;

use crate::app::AppKind;

/// Home route of the public application
pub const HOME_ROUTE: &str = "/";

/// Dashboard route of the administrative application
pub const ADMIN_HOME_ROUTE: &str = "/";

/// Login entry point (same path in both applications)
pub const LOGIN_ROUTE: &str = "/login";

/// Landing route for the return leg of an external identity-provider login
pub const EXTERNAL_LOGIN_ROUTE: &str = "/oauth2/redirect";

/// Routes of the public application that require a session
const PUBLIC_GUARDED: &[&str] = &["/create-prompt", "/prompts/:id/edit"];

/// Routes of the administrative application reachable without a session
const ADMIN_OPEN: &[&str] = &[LOGIN_ROUTE, EXTERNAL_LOGIN_ROUTE];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    Public,
    Guarded,
}

/// A navigation request produced by gates and login flows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct Navigation {
    pub to: String,
    /// Replace the current history entry instead of pushing a new one
    pub replace: bool,
}

impl Navigation {
    pub fn push(to: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            replace: false,
        }
    }

    pub fn replace(to: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            replace: true,
        }
    }
}

/// Classify a path for the given application.
pub fn access(app: AppKind, path: &str) -> RouteAccess {
    let path = normalize(path);
    let path = path.as_str();
    match app {
        AppKind::Public => {
            if PUBLIC_GUARDED.iter().any(|p| matches_pattern(p, path)) {
                RouteAccess::Guarded
            } else {
                RouteAccess::Public
            }
        }
        AppKind::Admin => {
            if ADMIN_OPEN.iter().any(|p| matches_pattern(p, path)) {
                RouteAccess::Public
            } else {
                RouteAccess::Guarded
            }
        }
    }
}

/// Strip query string and fragment, lowercase, and collapse empty segments
/// (repeated or trailing slashes). Route matching is case-insensitive, the
/// same as the browser router the front ends use.
fn normalize(path: &str) -> String {
    let end = path.find(|c: char| c == '?' || c == '#').unwrap_or(path.len());
    let segments: Vec<String> = path[..end]
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_lowercase)
        .collect();
    format!("/{}", segments.join("/"))
}

/// Match a path against a pattern where `:name` segments accept any
/// non-empty segment.
fn matches_pattern(pattern: &str, path: &str) -> bool {
    let mut pattern_segments = pattern.split('/');
    let mut path_segments = path.split('/');

    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return true,
            (Some(p), Some(s)) => {
                if p.starts_with(':') {
                    if s.is_empty() {
                        return false;
                    }
                } else if p != s {
                    return false;
                }
            }
            _ => return false,
        }
    }
}
