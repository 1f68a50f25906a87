//! Core library for the Promptdex front ends.
//!
//! Both the public application and the administrative application share this
//! crate. It owns everything that decides whether a request or a navigation is
//! made on behalf of an authenticated user:
//!
//! - [`auth`]: credential decoding, the session store, route gates, the
//!   external-login landing handler and the login/registration service
//! - [`api`]: the REST client and the request authenticator it routes every
//!   call through
//! - [`storage`]: persisted credential backends (file, OS keychain, memory)
//! - [`routes`]: which paths of each application are guarded
//! - [`config`]: on-disk configuration with environment overrides

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod routes;
pub mod storage;

pub use app::AppKind;
