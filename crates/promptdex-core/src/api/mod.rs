//! REST API client module for the Promptdex backend.
//!
//! This module provides the `ApiClient` for communicating with the backend
//! and the `RequestAuthenticator` it routes every request through.
//!
//! The backend uses JWT bearer authentication; credentials are obtained from
//! `POST /auth/login` or from the external-login landing route.

pub mod authenticator;
pub mod client;
pub mod error;

pub use authenticator::RequestAuthenticator;
pub use client::ApiClient;
pub use error::ApiError;

/// HTTP method type accepted by [`ApiClient::request_value`]
pub use reqwest::Method;
