//! Authentication and authorization for both front ends.
//!
//! This module provides:
//! - `claims`: decoding a bearer credential into typed claims
//! - `SessionStore`: the single owner of the current credential and session
//! - `SessionGate`: route guards for the public and admin applications
//! - `ExternalLoginCompletion`: the landing step of an external login
//! - `AuthService`: login and registration call sites
//!
//! Every invalid input (malformed credential, expired credential, missing
//! admin role) ends in an unauthenticated session. Validity is checked when
//! a credential is set or rehydrated, not continuously.

pub mod claims;
pub mod clock;
pub mod error;
pub mod external;
pub mod gate;
pub mod notice;
pub mod service;
pub mod session;
pub mod store;

pub use claims::{Claims, DecodeError};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::CredentialRejected;
pub use external::{CompletionOutcome, ExternalLoginCompletion};
pub use gate::{GateDecision, SessionGate};
pub use notice::{Notice, NoticeLevel};
pub use service::{AuthError, AuthService};
pub use session::{Identity, Session};
pub use store::SessionStore;
