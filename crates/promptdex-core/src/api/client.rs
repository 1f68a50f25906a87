//! API client for the Promptdex backend.
//!
//! This module provides the `ApiClient` struct. Every request it sends is
//! passed through the [`RequestAuthenticator`], so callers never attach
//! credentials themselves.

use std::time::Duration;

use anyhow::Result;
use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ApiError, RequestAuthenticator};
use crate::config::Config;

// ============================================================================
// Constants
// ============================================================================

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    password: &'a str,
    email: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: Option<String>,
}

/// API client for the Promptdex backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    authenticator: RequestAuthenticator,
    initial_backoff: Duration,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        authenticator: RequestAuthenticator,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            authenticator,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    pub fn from_config(config: &Config, authenticator: RequestAuthenticator) -> Result<Self> {
        Self::new(&config.api_base_url(), config.request_timeout(), authenticator)
    }

    /// Override the initial rate-limit backoff (tests use a few milliseconds)
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    // ===== Authentication Endpoints =====

    /// `POST /auth/login`. Returns the issued credential, or `None` when the
    /// backend answered 2xx without one.
    pub async fn login(&self, username: &str, password: &str) -> Result<Option<String>, ApiError> {
        let body = LoginRequest { username, password };
        let response: LoginResponse = self.post("/auth/login", &body).await?;
        Ok(response.token.filter(|t| !t.is_empty()))
    }

    /// `POST /auth/register`. The success body is plain text and ignored.
    pub async fn register(&self, username: &str, password: &str, email: &str) -> Result<(), ApiError> {
        let body = RegisterRequest {
            username,
            password,
            email,
        };
        let url = self.url("/auth/register");
        self.execute(|| self.client.post(&url).json(&body)).await?;
        Ok(())
    }

    // ===== Generic JSON Helpers =====

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        let response = self.execute(|| self.client.get(&url)).await?;
        Self::parse_json(response, &url).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let url = self.url(path);
        let response = self.execute(|| self.client.post(&url).json(body)).await?;
        Self::parse_json(response, &url).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let url = self.url(path);
        let response = self.execute(|| self.client.put(&url).json(body)).await?;
        Self::parse_json(response, &url).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = self.url(path);
        self.execute(|| self.client.delete(&url)).await?;
        Ok(())
    }

    /// Send an arbitrary request and return the body as JSON, or `Null` for
    /// an empty or non-JSON body.
    pub async fn request_value(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value, ApiError> {
        let url = self.url(path);
        let response = self
            .execute(|| {
                let builder = self.client.request(method.clone(), &url);
                match body {
                    Some(body) => builder.json(body),
                    None => builder,
                }
            })
            .await?;

        let text = response.text().await?;
        Ok(serde_json::from_str(&text).unwrap_or(serde_json::Value::Null))
    }

    // ===== Request Plumbing =====

    /// Authenticate and send a request, retrying with exponential backoff
    /// while the backend answers 429.
    async fn execute<F>(&self, build: F) -> Result<Response, ApiError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut retries = 0;
        let mut backoff = self.initial_backoff;

        loop {
            let request = self
                .authenticator
                .apply(build().header(header::ACCEPT, "application/json"));
            let response = request.send().await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => return Ok(response),
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(retry = retries, backoff_ms = backoff.as_millis() as u64, "Rate limited, backing off");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }
    }

    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit
    /// (should retry), or Err for other errors.
    async fn check_response_for_retry(response: Response) -> Result<Option<Response>, ApiError> {
        let status = response.status();
        if status.is_success() {
            Ok(Some(response))
        } else if status.as_u16() == 429 {
            Ok(None)
        } else {
            let body = response.text().await.unwrap_or_default();
            debug!(%status, "Request failed");
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse_json<T: DeserializeOwned>(response: Response, url: &str) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e)))
    }
}
