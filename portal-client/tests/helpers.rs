//! Integration test helpers
//!
//! Spawns an axum mock of the portal backend on an ephemeral port and wires
//! a full client stack (session context, wrapper, store) against it.

#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use portal_client::{
    ApiClient, FileTokenStore, NavigationRecorder, RecordingNotifier, SessionContext,
    SessionStore,
};
use portal_core::ApiConfig;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

// Ensure tracing is only initialized once
static TRACING: LazyLock<()> = LazyLock::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(std::io::sink)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
});

pub const EXPORT_BYTES: &[u8] = b"PK\x03\x04 not really a spreadsheet";

/// A request the mock backend saw
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub token: Option<String>,
}

struct Account {
    user_id: i64,
    username: &'static str,
    password: &'static str,
    role: i64,
    delay_ms: u64,
}

const ACCOUNTS: &[Account] = &[
    Account { user_id: 1, username: "admin", password: "admin123", role: 0, delay_ms: 0 },
    Account { user_id: 2, username: "teacher", password: "teacher123", role: 1, delay_ms: 0 },
    Account { user_id: 3, username: "student", password: "student123", role: 2, delay_ms: 0 },
    Account { user_id: 9, username: "ghost", password: "ghost123", role: 7, delay_ms: 0 },
    Account { user_id: 4, username: "slowpoke", password: "slow123", role: 1, delay_ms: 250 },
];

fn account_by_id(user_id: i64) -> Option<&'static Account> {
    ACCOUNTS.iter().find(|a| a.user_id == user_id)
}

fn profile(account: &Account) -> Value {
    json!({
        "userId": account.user_id,
        "username": account.username,
        "password": null,
        "role": account.role,
        "status": true,
        "email": format!("{}@example.edu", account.username),
        "createdTime": "2024-09-01 08:00:00"
    })
}

fn envelope(code: i64, message: &str, data: Value) -> Json<Value> {
    Json(json!({ "code": code, "message": message, "data": data }))
}

#[derive(Default)]
pub struct MockState {
    sessions: Mutex<HashMap<String, i64>>,
    recorded: Mutex<Vec<Recorded>>,
    issued: Mutex<u64>,
    logout_delay_ms: Mutex<u64>,
    current_user_delay_ms: Mutex<u64>,
}

impl MockState {
    fn record(&self, method: &str, path: &str, headers: &HeaderMap) -> Option<String> {
        let token = headers
            .get("token")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        self.recorded.lock().unwrap().push(Recorded {
            method: method.to_string(),
            path: path.to_string(),
            token: token.clone(),
        });
        token
    }

    fn issue(&self, user_id: i64) -> String {
        let mut issued = self.issued.lock().unwrap();
        *issued += 1;
        let token = format!("tok-{}-{}", user_id, *issued);
        self.sessions.lock().unwrap().insert(token.clone(), user_id);
        token
    }

    fn user_for(&self, token: Option<&str>) -> Option<&'static Account> {
        let sessions = self.sessions.lock().unwrap();
        token
            .and_then(|t| sessions.get(t).copied())
            .and_then(account_by_id)
    }
}

async fn login(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.record("POST", "/auth/login", &headers);
    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    match ACCOUNTS
        .iter()
        .find(|a| a.username == username && a.password == password)
    {
        Some(account) => {
            tokio::time::sleep(Duration::from_millis(account.delay_ms)).await;
            let token = state.issue(account.user_id);
            envelope(200, "Login successful", json!({ "token": token, "user": profile(account) }))
        }
        None => envelope(500, "Invalid username or password", Value::Null),
    }
}

async fn logout(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Json<Value> {
    let token = state.record("POST", "/auth/logout", &headers);
    let delay = *state.logout_delay_ms.lock().unwrap();
    tokio::time::sleep(Duration::from_millis(delay)).await;

    let removed = token.and_then(|token| state.sessions.lock().unwrap().remove(&token));
    match removed {
        Some(_) => envelope(200, "Logged out", Value::Null),
        None => envelope(401, "Not logged in", Value::Null),
    }
}

async fn current_user(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Json<Value> {
    let token = state.record("GET", "/auth/current-user", &headers);
    let delay = *state.current_user_delay_ms.lock().unwrap();
    tokio::time::sleep(Duration::from_millis(delay)).await;
    match state.user_for(token.as_deref()) {
        Some(account) => envelope(200, "ok", profile(account)),
        None => envelope(401, "Not logged in", Value::Null),
    }
}

async fn simulate_login(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(user_id): Path<i64>,
) -> Json<Value> {
    let token = state.record("POST", "/admin/simulate/login", &headers);
    match state.user_for(token.as_deref()) {
        Some(caller) if caller.role == 0 => match account_by_id(user_id) {
            Some(target) => {
                let token = state.issue(target.user_id);
                envelope(200, "ok", json!({ "token": token, "user": profile(target) }))
            }
            None => envelope(404, "User does not exist", Value::Null),
        },
        Some(_) => envelope(403, "Only administrators can impersonate", Value::Null),
        None => envelope(401, "Not logged in", Value::Null),
    }
}

async fn echo_token(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Json<Value> {
    let token = state.record("GET", "/echo-token", &headers);
    envelope(200, "ok", json!({ "token": token }))
}

async fn envelope_code(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(code): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.record("GET", "/envelope", &headers);
    let message = params.get("message").cloned().unwrap_or_default();
    Json(json!({ "code": code, "message": message, "data": { "echo": code } }))
}

async fn bare_status(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(status): Path<u16>,
) -> Response {
    state.record("GET", "/status", &headers);
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status == StatusCode::IM_A_TEAPOT {
        (status, Json(json!({ "message": "Short and stout" }))).into_response()
    } else {
        (status, "plain text failure").into_response()
    }
}

async fn not_envelope(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.record("GET", "/not-envelope", &headers);
    (StatusCode::OK, "<html>maintenance</html>").into_response()
}

async fn export_all(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let token = state.record("GET", "/admin/logs/all/export", &headers);
    if state.user_for(token.as_deref()).is_none() {
        return (StatusCode::UNAUTHORIZED, "").into_response();
    }
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let range = format!(
        "{}..{}",
        params.get("startTime").map(String::as_str).unwrap_or(""),
        params.get("endTime").map(String::as_str).unwrap_or("")
    );
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, accept),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename*=UTF-8''system%20logs.xlsx".to_string(),
            ),
            (header::HeaderName::from_static("x-range"), range),
        ],
        EXPORT_BYTES,
    )
        .into_response()
}

async fn list_admins(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.record("GET", "/admin/admins", &headers);
    let keyword = params.get("keyword").cloned().unwrap_or_default();
    let records: Vec<Value> = ACCOUNTS
        .iter()
        .filter(|a| a.role == 0 && a.username.contains(&keyword))
        .map(|a| json!({ "adminId": a.user_id * 10, "userId": a.user_id, "name": a.username, "user": profile(a) }))
        .collect();
    envelope(200, "ok", json!({ "total": records.len(), "list": records }))
}

async fn change_password(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.record("POST", "/auth/change-password", &headers);
    match params.get("oldPassword").map(String::as_str) {
        Some("admin123") => envelope(200, "Password changed", Value::Null),
        _ => envelope(500, "Old password is incorrect", Value::Null),
    }
}

pub struct MockBackend {
    pub address: String,
    pub port: u16,
    pub state: Arc<MockState>,
}

impl MockBackend {
    pub fn recorded(&self) -> Vec<Recorded> {
        self.state.recorded.lock().unwrap().clone()
    }

    pub fn recorded_for(&self, path: &str) -> Vec<Recorded> {
        self.recorded().into_iter().filter(|r| r.path == path).collect()
    }

    pub fn set_logout_delay(&self, delay: Duration) {
        *self.state.logout_delay_ms.lock().unwrap() = delay.as_millis() as u64;
    }

    pub fn set_current_user_delay(&self, delay: Duration) {
        *self.state.current_user_delay_ms.lock().unwrap() = delay.as_millis() as u64;
    }

    pub fn active_sessions(&self) -> usize {
        self.state.sessions.lock().unwrap().len()
    }
}

/// Start the mock backend on an ephemeral port
pub async fn spawn_backend() -> MockBackend {
    LazyLock::force(&TRACING);

    let state = Arc::new(MockState::default());
    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/current-user", get(current_user))
        .route("/auth/change-password", post(change_password))
        .route("/admin/simulate/login/{user_id}", post(simulate_login))
        .route("/admin/admins", get(list_admins))
        .route("/admin/logs/all/export", get(export_all))
        .route("/echo-token", get(echo_token))
        .route("/envelope/{code}", get(envelope_code))
        .route("/status/{status}", get(bare_status))
        .route("/not-envelope", get(not_envelope))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    MockBackend {
        address: format!("http://127.0.0.1:{}", port),
        port,
        state,
    }
}

/// A base URL nothing is listening on
pub async fn closed_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

/// Full client stack against a base URL, with file-backed durable storage
pub struct TestPortal {
    pub storage: Arc<FileTokenStore>,
    pub session: Arc<SessionContext>,
    pub navigator: Arc<NavigationRecorder>,
    pub notifier: Arc<RecordingNotifier>,
    pub client: Arc<ApiClient>,
    pub store: SessionStore,
    _dir: TempDir,
}

impl TestPortal {
    pub fn new(base_url: &str) -> Self {
        Self::with_config(ApiConfig {
            base_url: base_url.to_string(),
            timeout_ms: 2_000,
            ..Default::default()
        })
    }

    pub fn with_config(config: ApiConfig) -> Self {
        LazyLock::force(&TRACING);

        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(FileTokenStore::new(dir.path().join("session.json")));
        let session = Arc::new(SessionContext::new(storage.clone()));
        let navigator = Arc::new(NavigationRecorder::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let client = Arc::new(
            ApiClient::new(config, session.clone(), navigator.clone(), notifier.clone()).unwrap(),
        );
        let store = SessionStore::new(client.clone());

        Self {
            storage,
            session,
            navigator,
            notifier,
            client,
            store,
            _dir: dir,
        }
    }

    pub async fn durable_token(&self) -> Option<String> {
        use portal_client::TokenStore;
        self.storage.load().await.unwrap()
    }

    /// Log in through the store and forget the side effects it produced
    pub async fn logged_in_as(&self, username: &str, password: &str) {
        let credentials = portal_core::Credentials::new(username, password);
        assert!(self.store.login(&credentials).await, "login as {} failed", username);
        self.navigator.clear();
        self.notifier.clear();
    }
}

pub async fn spawn_portal() -> (MockBackend, TestPortal) {
    let backend = spawn_backend().await;
    let portal = TestPortal::new(&backend.address);
    (backend, portal)
}
