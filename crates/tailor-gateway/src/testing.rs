//! Test support: a mock tailor shop API and recording collaborators.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get, post};
use serde_json::{Value, json};
use tailor_auth::{MemoryStore, TokenPair, credentials};
use tokio::net::TcpListener;

use crate::hooks::Hooks;
use crate::navigator::Navigator;

#[derive(Default)]
struct MockState {
    /// Access token the API currently accepts on `/orders`
    valid_token: Mutex<String>,
    reject_refresh: AtomicBool,
    refresh_delay: Mutex<Duration>,
    /// Hold the refresh response until this many 401s were served
    refresh_gate: AtomicUsize,
    refresh_calls: AtomicUsize,
    unauthorized: AtomicUsize,
    seen_refresh_tokens: Mutex<Vec<String>>,
    seen_authorization: Mutex<Vec<Option<String>>>,
}

/// Mock API bound to an ephemeral localhost port.
pub(crate) struct MockApi {
    pub base_url: String,
    state: Arc<MockState>,
}

impl MockApi {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let app = axum::Router::new()
            .route("/auth/refresh-token", post(refresh_handler))
            .route("/orders", get(orders_handler))
            .route("/always-401", any(always_unauthorized))
            .route("/echo", any(echo_handler))
            .route("/plain", get(|| async { "pong" }))
            .route(
                "/text-error",
                get(|| async { (StatusCode::NOT_FOUND, "Order not found") }),
            )
            .route(
                "/json-error",
                get(|| async {
                    (
                        StatusCode::TOO_MANY_REQUESTS,
                        Json(json!({"message": "Quota exceeded"})),
                    )
                }),
            )
            .route(
                "/opaque-error",
                get(|| async {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({"error": "boom"})),
                    )
                }),
            )
            .route(
                "/malformed",
                get(|| async { ([(header::CONTENT_TYPE, "application/json")], "{not json") }),
            )
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn accept_token(&self, token: &str) {
        *self.state.valid_token.lock().unwrap() = token.to_string();
    }

    pub fn reject_refresh(&self) {
        self.state.reject_refresh.store(true, Ordering::SeqCst);
    }

    pub fn delay_refresh(&self, delay: Duration) {
        *self.state.refresh_delay.lock().unwrap() = delay;
    }

    pub fn gate_refresh_until_unauthorized(&self, count: usize) {
        self.state.refresh_gate.store(count, Ordering::SeqCst);
    }

    pub fn refresh_calls(&self) -> usize {
        self.state.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn seen_refresh_tokens(&self) -> Vec<String> {
        self.state.seen_refresh_tokens.lock().unwrap().clone()
    }

    pub fn seen_authorization(&self) -> Vec<Option<String>> {
        self.state.seen_authorization.lock().unwrap().clone()
    }
}

async fn refresh_handler(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    state
        .seen_refresh_tokens
        .lock()
        .unwrap()
        .push(body["refreshToken"].as_str().unwrap_or_default().to_string());

    let gate = state.refresh_gate.load(Ordering::SeqCst);
    if gate > 0 {
        while state.unauthorized.load(Ordering::SeqCst) < gate {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    let delay = *state.refresh_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    if state.reject_refresh.load(Ordering::SeqCst) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Invalid refresh token"})),
        )
            .into_response();
    }

    *state.valid_token.lock().unwrap() = "A2".into();
    Json(json!({"accessToken": "A2", "refreshToken": "R2"})).into_response()
}

async fn orders_handler(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    let auth = authorization(&headers);
    state.seen_authorization.lock().unwrap().push(auth.clone());

    let expected = format!("Bearer {}", state.valid_token.lock().unwrap());
    if auth.as_deref() == Some(expected.as_str()) {
        Json(json!([
            {"id": 1, "garment": "sherwani", "status": "stitching"},
            {"id": 2, "garment": "kurta", "status": "ready"}
        ]))
        .into_response()
    } else {
        state.unauthorized.fetch_add(1, Ordering::SeqCst);
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Token expired"})),
        )
            .into_response()
    }
}

async fn always_unauthorized(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state
        .seen_authorization
        .lock()
        .unwrap()
        .push(authorization(&headers));
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "Unauthorized"})),
    )
        .into_response()
}

async fn echo_handler(
    method: axum::http::Method,
    headers: HeaderMap,
    body: String,
) -> Json<Value> {
    let mut headers_map = serde_json::Map::new();
    for (name, value) in &headers {
        headers_map.insert(
            name.to_string(),
            Value::String(value.to_str().unwrap_or("").to_string()),
        );
    }
    Json(json!({
        "method": method.to_string(),
        "headers": headers_map,
        "body": body,
    }))
}

fn authorization(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Base URL of a port nothing listens on.
pub(crate) async fn dead_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Memory store holding a token pair and a cached user.
pub(crate) async fn seeded_store(access: &str, refresh: &str) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    credentials::save_pair(
        &*store,
        &TokenPair {
            access_token: access.into(),
            refresh_token: refresh.into(),
        },
    )
    .await
    .unwrap();
    credentials::save_user(&*store, &json!({"id": 7, "name": "Asha"}))
        .await
        .unwrap();
    store
}

/// Navigator that counts redirects.
#[derive(Default)]
pub(crate) struct RecordingNavigator {
    redirects: AtomicUsize,
}

impl RecordingNavigator {
    pub fn redirects(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl Navigator for RecordingNavigator {
    fn redirect_to_entry(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}

/// Counts of hook invocations for one or more calls.
#[derive(Default)]
pub(crate) struct HookCounts {
    pub start: AtomicUsize,
    pub error: AtomicUsize,
    pub finish: AtomicUsize,
    pub messages: Mutex<Vec<String>>,
}

/// Hooks that record into `counts`.
pub(crate) fn counting_hooks(counts: &Arc<HookCounts>) -> Hooks {
    let (s, e, f) = (counts.clone(), counts.clone(), counts.clone());
    Hooks::new()
        .on_start(move || {
            s.start.fetch_add(1, Ordering::SeqCst);
        })
        .on_error(move |message| {
            e.error.fetch_add(1, Ordering::SeqCst);
            e.messages.lock().unwrap().push(message.to_string());
        })
        .on_finish(move || {
            f.finish.fetch_add(1, Ordering::SeqCst);
        })
}

impl HookCounts {
    /// (start, error, finish)
    pub fn snapshot(&self) -> (usize, usize, usize) {
        (
            self.start.load(Ordering::SeqCst),
            self.error.load(Ordering::SeqCst),
            self.finish.load(Ordering::SeqCst),
        )
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}
