//! In-process mock of the BotDesk backend.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::Barrier;

use botdesk_client::{ApiClient, ClientConfig, SessionManager};
use botdesk_persistence::MemoryStore;

/// A request as the backend saw it.
#[derive(Debug, Clone)]
pub struct Seen {
    pub path: String,
    pub bearer: Option<String>,
    pub query: Option<String>,
}

pub struct BackendState {
    access: Mutex<String>,
    refresh: Mutex<String>,
    refresh_calls: AtomicUsize,
    google_calls: AtomicUsize,
    fail_refresh: AtomicBool,
    refresh_delay: Duration,
    slow_delay: Duration,
    unauthorized_gate: Option<Barrier>,
    seen: Mutex<Vec<Seen>>,
    last_upload: Mutex<Option<(String, String)>>,
}

pub struct MockBackend {
    pub url: String,
    state: Arc<BackendState>,
}

#[derive(Default)]
pub struct MockBackendBuilder {
    refresh_delay: Duration,
    slow_delay: Duration,
    gate: Option<usize>,
    fail_refresh: bool,
}

impl MockBackendBuilder {
    /// Holds every 401 response until `n` of them are pending.
    pub fn unauthorized_gate(mut self, n: usize) -> Self {
        self.gate = Some(n);
        self
    }

    pub fn refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    /// Delay before `/slow` rejects a stale token.
    pub fn slow_unauthorized(mut self, delay: Duration) -> Self {
        self.slow_delay = delay;
        self
    }

    pub fn fail_refresh(mut self) -> Self {
        self.fail_refresh = true;
        self
    }

    pub async fn start(self) -> MockBackend {
        let state = Arc::new(BackendState {
            access: Mutex::new("A1".to_string()),
            refresh: Mutex::new("R1".to_string()),
            refresh_calls: AtomicUsize::new(0),
            google_calls: AtomicUsize::new(0),
            fail_refresh: AtomicBool::new(self.fail_refresh),
            refresh_delay: self.refresh_delay,
            slow_delay: self.slow_delay,
            unauthorized_gate: self.gate.map(Barrier::new),
            seen: Mutex::new(Vec::new()),
            last_upload: Mutex::new(None),
        });

        let app = Router::new()
            .route("/auth/refresh", post(refresh))
            .route("/auth/login", post(login))
            .route("/auth/me", get(me))
            .route("/auth/google", post(google))
            .route("/auth/locked", get(locked))
            .route("/slow", get(slow))
            .route("/bots/", get(list_bots))
            .route("/bots/:id", get(get_bot))
            .route("/bots/:id/feedbacks", get(list_feedback))
            .route("/bots/:id/feedbacks/stats", get(feedback_stats))
            .route("/ai/bots/:id/knowledge", post(upload_knowledge))
            .route("/ai/bots/:id/knowledge/status", get(knowledge_status))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        MockBackend {
            url: format!("http://{}", addr),
            state,
        }
    }
}

impl MockBackend {
    pub fn builder() -> MockBackendBuilder {
        MockBackendBuilder::default()
    }

    pub async fn start() -> Self {
        Self::builder().start().await
    }

    /// Stops accepting the current access token.
    pub fn expire_access(&self) {
        *self.state.access.lock().unwrap() = "expired".to_string();
    }

    pub fn refresh_calls(&self) -> usize {
        self.state.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn google_calls(&self) -> usize {
        self.state.google_calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self, path: &str) -> Vec<Seen> {
        self.state
            .seen
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.path == path)
            .cloned()
            .collect()
    }

    /// Content type and raw body of the last knowledge upload.
    pub fn last_upload(&self) -> Option<(String, String)> {
        self.state.last_upload.lock().unwrap().clone()
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(&self.url)
    }

    /// Client whose store holds `entries`.
    pub fn client_with(&self, entries: &[(&str, &str)]) -> (ApiClient, Arc<MemoryStore>) {
        self.client_with_config(self.config(), entries)
    }

    pub fn client_with_config(
        &self,
        config: ClientConfig,
        entries: &[(&str, &str)],
    ) -> (ApiClient, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_entries(entries.iter().copied()));
        let session = SessionManager::new(store.clone());
        (ApiClient::new(config, session).unwrap(), store)
    }

    /// Client logged in with `A1`/`R1`.
    pub fn logged_in_client(&self) -> (ApiClient, Arc<MemoryStore>) {
        self.client_with(&[("token", "A1"), ("refreshToken", "R1")])
    }
}

pub fn bot_json(id: i64, knowledge_base_status: &str) -> Value {
    json!({
        "id": id,
        "owner_id": 1,
        "bot_name": format!("Bot {}", id),
        "requirements": "Answer questions about the product",
        "bot_token": "123456:ABCDEF",
        "bot_type": "qa_knowledge_base",
        "generated_code": null,
        "status": "ready",
        "is_running": false,
        "created_at": "2025-02-10T08:00:00",
        "pid": null,
        "knowledge_base_status": knowledge_base_status
    })
}

pub fn feedback_json(id: i64, bot_id: i64) -> Value {
    json!({
        "id": id,
        "bot_id": bot_id,
        "user_telegram_id": 777,
        "username": "ivan",
        "rating": 4,
        "message_text": "Helpful",
        "status": "new",
        "images": [],
        "created_at": "2025-02-10T08:00:00Z"
    })
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

impl BackendState {
    fn record(&self, path: &str, headers: &HeaderMap, query: Option<String>) {
        self.seen.lock().unwrap().push(Seen {
            path: path.to_string(),
            bearer: bearer(headers),
            query,
        });
    }

    async fn authorize(&self, path: &str, headers: &HeaderMap) -> Result<(), Response> {
        self.record(path, headers, None);
        let valid = self.access.lock().unwrap().clone();
        if bearer(headers).as_deref() == Some(valid.as_str()) {
            return Ok(());
        }
        if let Some(gate) = &self.unauthorized_gate {
            gate.wait().await;
        }
        Err(detail(StatusCode::UNAUTHORIZED, "Could not validate credentials"))
    }
}

async fn refresh(State(state): State<Arc<BackendState>>, Json(body): Json<Value>) -> Response {
    let n = state.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
    tokio::time::sleep(state.refresh_delay).await;

    let presented = body["refresh_token"].as_str().unwrap_or_default().to_string();
    let expected = state.refresh.lock().unwrap().clone();
    if state.fail_refresh.load(Ordering::SeqCst) || presented != expected {
        return detail(StatusCode::UNAUTHORIZED, "Invalid refresh token");
    }

    let access = format!("A{}", n + 1);
    let refresh = format!("R{}", n + 1);
    *state.access.lock().unwrap() = access.clone();
    *state.refresh.lock().unwrap() = refresh.clone();
    Json(json!({
        "access_token": access,
        "refresh_token": refresh,
        "token_type": "bearer"
    }))
    .into_response()
}

async fn login(State(state): State<Arc<BackendState>>, Json(body): Json<Value>) -> Response {
    if body["password"] != "secret" {
        return detail(StatusCode::UNAUTHORIZED, "Incorrect email or password");
    }
    *state.access.lock().unwrap() = "A-login".to_string();
    *state.refresh.lock().unwrap() = "R-login".to_string();
    Json(json!({
        "access_token": "A-login",
        "refresh_token": "R-login",
        "token_type": "bearer"
    }))
    .into_response()
}

async fn me(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    if let Err(resp) = state.authorize("/auth/me", &headers).await {
        return resp;
    }
    Json(json!({
        "id": 1,
        "email": "owner@example.com",
        "full_name": "Owner",
        "is_verified": true
    }))
    .into_response()
}

async fn google(State(state): State<Arc<BackendState>>, Json(body): Json<Value>) -> Response {
    state.google_calls.fetch_add(1, Ordering::SeqCst);
    if body["redirect_uri"] != "http://localhost:5173/auth/google/callback" {
        return detail(StatusCode::BAD_REQUEST, "redirect_uri_mismatch");
    }
    if body["code"] == "stale-code" {
        return detail(StatusCode::BAD_REQUEST, "Token exchange failed: invalid_grant");
    }
    *state.access.lock().unwrap() = "A-google".to_string();
    Json(json!({
        "access_token": "A-google",
        "refresh_token": "R-google",
        "user": {
            "id": 9,
            "email": "google@example.com",
            "full_name": "Google User",
            "is_verified": true
        }
    }))
    .into_response()
}

async fn locked(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    state.record("/auth/locked", &headers, None);
    detail(StatusCode::UNAUTHORIZED, "Not allowed")
}

async fn slow(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    state.record("/slow", &headers, None);
    let valid = state.access.lock().unwrap().clone();
    if bearer(&headers).as_deref() != Some(valid.as_str()) {
        tokio::time::sleep(state.slow_delay).await;
        return detail(StatusCode::UNAUTHORIZED, "Could not validate credentials");
    }
    Json(json!({ "ok": true })).into_response()
}

async fn list_bots(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    if let Err(resp) = state.authorize("/bots/", &headers).await {
        return resp;
    }
    Json(json!([bot_json(42, "ready")])).into_response()
}

async fn get_bot(
    State(state): State<Arc<BackendState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    if let Err(resp) = state.authorize(&format!("/bots/{}", id), &headers).await {
        return resp;
    }
    if id == 42 {
        Json(bot_json(42, "ready")).into_response()
    } else {
        detail(StatusCode::NOT_FOUND, "Bot not found")
    }
}

async fn list_feedback(
    State(state): State<Arc<BackendState>>,
    Path(id): Path<i64>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    let path = format!("/bots/{}/feedbacks", id);
    if let Err(resp) = state.authorize(&path, &headers).await {
        return resp;
    }
    state.record(&format!("{}?", path), &headers, query);
    // Bot 7 answers with the paged shape, every other bot with a bare array.
    if id == 7 {
        Json(json!({
            "feedbacks": [feedback_json(1, id)],
            "total": 12
        }))
        .into_response()
    } else {
        Json(json!([feedback_json(1, id), feedback_json(2, id)])).into_response()
    }
}

async fn feedback_stats(
    State(state): State<Arc<BackendState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    if let Err(resp) = state
        .authorize(&format!("/bots/{}/feedbacks/stats", id), &headers)
        .await
    {
        return resp;
    }
    Json(json!({ "total_count": 3, "replied_count": 1, "average_rating": 4.5 })).into_response()
}

async fn upload_knowledge(
    State(state): State<Arc<BackendState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(resp) = state
        .authorize(&format!("/ai/bots/{}/knowledge", id), &headers)
        .await
    {
        return resp;
    }
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    *state.last_upload.lock().unwrap() =
        Some((content_type, String::from_utf8_lossy(&body).into_owned()));
    Json(json!({ "message": "File uploaded, processing started" })).into_response()
}

async fn knowledge_status(
    State(state): State<Arc<BackendState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    if let Err(resp) = state
        .authorize(&format!("/ai/bots/{}/knowledge/status", id), &headers)
        .await
    {
        return resp;
    }
    Json(json!({
        "bot_id": id,
        "knowledge_base_status": "processing",
        "bot_type": "qa_knowledge_base"
    }))
    .into_response()
}
