//! Shared helpers for integration tests: credential minting, store
//! construction, and an axum stub standing in for the backend.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use jsonwebtoken::{encode, EncodingKey, Header};
use promptdex_core::api::{ApiClient, RequestAuthenticator};
use promptdex_core::auth::{AuthService, FixedClock, SessionStore};
use promptdex_core::storage::{CredentialStorage, MemoryStorage};
use promptdex_core::AppKind;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

pub const NOW: i64 = 1500;

pub fn mint(payload: Value) -> String {
    encode(&Header::default(), &payload, &EncodingKey::from_secret(b"backend-secret"))
        .expect("Failed to mint test token")
}

/// Storage handle the test keeps after giving a clone to the store
#[derive(Clone, Default)]
pub struct SharedStorage(pub Arc<MemoryStorage>);

impl CredentialStorage for SharedStorage {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        self.0.get(key)
    }
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.0.set(key, value)
    }
    fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.0.remove(key)
    }
}

pub fn store(app: AppKind, now: i64) -> (SessionStore, SharedStorage) {
    let storage = SharedStorage::default();
    let store = SessionStore::with_clock(app, Box::new(storage.clone()), Box::new(FixedClock::new(now)));
    (store, storage)
}

pub fn service(store: &SessionStore, base_url: &str) -> AuthService {
    let api = ApiClient::new(
        base_url,
        Duration::from_secs(5),
        RequestAuthenticator::new(store.clone()),
    )
    .expect("Failed to build client")
    .with_initial_backoff(Duration::from_millis(5));
    AuthService::new(store.clone(), api)
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(|s| s.as_str())
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl StubResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.to_string(),
        }
    }
}

#[derive(Clone, Default)]
struct StubState {
    responses: Arc<Mutex<VecDeque<StubResponse>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// Serves queued responses in order, whatever the route, and records every
/// request it receives.
pub struct StubServer {
    pub base_url: String,
    state: StubState,
}

impl StubServer {
    pub async fn start(responses: Vec<StubResponse>) -> Self {
        let state = StubState {
            responses: Arc::new(Mutex::new(responses.into())),
            requests: Arc::default(),
        };

        let app = Router::new().fallback(respond).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub server");
        let addr = listener.local_addr().expect("stub address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{}/api", addr),
            state,
        }
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().await.clone()
    }
}

async fn respond(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let headers = headers
        .iter()
        .filter_map(|(name, value)| Some((name.as_str().to_string(), value.to_str().ok()?.to_string())))
        .collect();

    state.requests.lock().await.push(RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        headers,
        body,
    });

    match state.responses.lock().await.pop_front() {
        Some(response) => {
            let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, [(header::CONTENT_TYPE, response.content_type)], response.body).into_response()
        }
        None => (StatusCode::INTERNAL_SERVER_ERROR, "no response queued").into_response(),
    }
}

/// A base URL nothing listens on
pub async fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("address");
    drop(listener);
    format!("http://{}/api", addr)
}
