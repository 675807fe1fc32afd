// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared test helpers: a mock Google provider and a router wired to it.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use sheet_intake::config::{Config, TokenSharing};
use sheet_intake::db::RecordStore;
use sheet_intake::middleware::auth::{create_session_jwt, SESSION_COOKIE};
use sheet_intake::models::TokenSet;
use sheet_intake::routes::create_router;
use sheet_intake::services::{AuthEvent, ClientIdentity};
use sheet_intake::AppState;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Authorization code the mock provider accepts.
pub const GOOD_CODE: &str = "good-code";
pub const MOCK_ACCESS_TOKEN: &str = "mock-access";
pub const MOCK_REFRESH_TOKEN: &str = "mock-refresh";
pub const REFRESHED_ACCESS_TOKEN: &str = "mock-access-refreshed";
/// Spreadsheet ID for which the mock Sheets API answers 403.
pub const FORBIDDEN_SPREADSHEET: &str = "forbidden-sheet";
pub const FORBIDDEN_MESSAGE: &str = "The caller does not have permission";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// What the mock provider has seen.
#[derive(Default)]
pub struct ProviderLog {
    pub token_requests: AtomicUsize,
    pub sheet_requests: AtomicUsize,
    pub appended: Mutex<Vec<Vec<Value>>>,
    pub bearer_tokens: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl ProviderLog {
    pub fn token_requests(&self) -> usize {
        self.token_requests.load(Ordering::SeqCst)
    }

    pub fn sheet_requests(&self) -> usize {
        self.sheet_requests.load(Ordering::SeqCst)
    }

    pub fn appended_rows(&self) -> Vec<Vec<Value>> {
        self.appended.lock().unwrap().clone()
    }

    pub fn last_bearer(&self) -> Option<String> {
        self.bearer_tokens.lock().unwrap().last().cloned()
    }
}

/// Mock provider running on a local port.
pub struct MockProvider {
    pub addr: SocketAddr,
    pub log: Arc<ProviderLog>,
}

impl MockProvider {
    pub fn token_url(&self) -> String {
        format!("http://{}/token", self.addr)
    }

    pub fn sheets_url(&self) -> String {
        format!("http://{}/v4", self.addr)
    }
}

/// Start the mock token endpoint and Sheets API.
pub async fn spawn_mock_provider() -> MockProvider {
    let log = Arc::new(ProviderLog::default());

    let app = Router::new()
        .route("/token", post(mock_token))
        .route(
            "/v4/spreadsheets/{id}/values/{range}",
            get(mock_read).post(mock_append),
        )
        .with_state(log.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockProvider { addr, log }
}

async fn mock_token(
    State(log): State<Arc<ProviderLog>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    log.token_requests.fetch_add(1, Ordering::SeqCst);

    let grant = form.get("grant_type").map(String::as_str);
    match grant {
        Some("authorization_code") if form.get("code").map(String::as_str) == Some(GOOD_CODE) => {
            Json(json!({
                "access_token": MOCK_ACCESS_TOKEN,
                "refresh_token": MOCK_REFRESH_TOKEN,
                "expires_in": 3599,
                "scope": "https://www.googleapis.com/auth/spreadsheets",
                "token_type": "Bearer"
            }))
            .into_response()
        }
        Some("refresh_token")
            if form.get("refresh_token").map(String::as_str) == Some(MOCK_REFRESH_TOKEN) =>
        {
            Json(json!({
                "access_token": REFRESHED_ACCESS_TOKEN,
                "expires_in": 3599,
                "token_type": "Bearer"
            }))
            .into_response()
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_grant", "error_description": "Bad Request"})),
        )
            .into_response(),
    }
}

fn record_bearer(log: &ProviderLog, headers: &HeaderMap) -> bool {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string);

    match bearer {
        Some(token) => {
            log.bearer_tokens.lock().unwrap().push(token);
            true
        }
        None => false,
    }
}

fn unauthenticated() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": {"code": 401, "message": "Request is missing required authentication credential.", "status": "UNAUTHENTICATED"}})),
    )
        .into_response()
}

fn forbidden() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({"error": {"code": 403, "message": FORBIDDEN_MESSAGE, "status": "PERMISSION_DENIED"}})),
    )
        .into_response()
}

fn sheet_of(range: &str) -> &str {
    range.rsplit_once('!').map(|(sheet, _)| sheet).unwrap_or("Sheet1")
}

async fn mock_read(
    State(log): State<Arc<ProviderLog>>,
    Path((id, range)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    log.sheet_requests.fetch_add(1, Ordering::SeqCst);
    if !record_bearer(&log, &headers) {
        return unauthenticated();
    }
    if id == FORBIDDEN_SPREADSHEET {
        return forbidden();
    }

    if range.starts_with("Empty") {
        return Json(json!({"range": range, "majorDimension": "ROWS"})).into_response();
    }

    let mut values = vec![json!(["Name", "Email"])];
    values.extend(log.appended_rows().into_iter().map(Value::from));
    Json(json!({"range": range, "majorDimension": "ROWS", "values": values})).into_response()
}

async fn mock_append(
    State(log): State<Arc<ProviderLog>>,
    Path((id, range)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    log.sheet_requests.fetch_add(1, Ordering::SeqCst);
    if !record_bearer(&log, &headers) {
        return unauthenticated();
    }
    if id == FORBIDDEN_SPREADSHEET {
        return forbidden();
    }

    let range = range.strip_suffix(":append").unwrap_or(&range).to_string();
    let sheet = sheet_of(&range).to_string();

    let rows: Vec<Vec<Value>> = serde_json::from_value(body["values"].clone()).unwrap_or_default();
    let mut appended = log.appended.lock().unwrap();
    // Row 1 holds the header
    let first = appended.len() + 2;
    appended.extend(rows.iter().cloned());
    let last = appended.len() + 1;

    Json(json!({
        "spreadsheetId": id,
        "tableRange": format!("{}!A1:B{}", sheet, first - 1),
        "updates": {
            "spreadsheetId": id,
            "updatedRange": format!("{}!A{}:B{}", sheet, first, last),
            "updatedRows": rows.len(),
            "updatedColumns": 2,
            "updatedCells": rows.len() * 2
        }
    }))
    .into_response()
}

// ─── App under test ──────────────────────────────────────────

pub struct TestOptions {
    pub token_sharing: TokenSharing,
    pub duplicate_guard: bool,
    pub persisted_tokens: Option<TokenSet>,
    pub spreadsheet_id: String,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            token_sharing: TokenSharing::Shared,
            duplicate_guard: false,
            persisted_tokens: None,
            spreadsheet_id: "test-spreadsheet".to_string(),
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub provider: MockProvider,
    /// Holds the token file's directory alive for the test.
    pub dir: tempfile::TempDir,
}

#[allow(dead_code)]
impl TestApp {
    pub fn token_path(&self) -> std::path::PathBuf {
        self.state.config.token_path.clone()
    }

    /// Session cookie header for a session that completed the flow with `tokens`.
    pub fn authenticated_cookie(&self, tokens: TokenSet) -> String {
        let sessions = &self.state.sessions;
        let id = sessions.create().unwrap();
        sessions.advance(&id, AuthEvent::ConsentUrlBuilt).unwrap();
        sessions.advance(&id, AuthEvent::RedirectIssued).unwrap();
        sessions.authenticate(&id, tokens).unwrap();
        session_cookie_header(&id, &self.state.config.session_signing_key)
    }
}

#[allow(dead_code)]
pub fn session_cookie_header(session_id: &str, key: &[u8]) -> String {
    format!("{}={}", SESSION_COOKIE, create_session_jwt(session_id, key).unwrap())
}

#[allow(dead_code)]
pub fn test_identity() -> ClientIdentity {
    ClientIdentity {
        client_id: "client-123.apps.googleusercontent.com".to_string(),
        client_secret: "client-secret".to_string(),
        redirect_uri: "http://localhost:3000/oauth2callback".to_string(),
    }
}

/// Token set the mock provider accepts as a bearer.
#[allow(dead_code)]
pub fn valid_tokens() -> TokenSet {
    TokenSet {
        access_token: MOCK_ACCESS_TOKEN.to_string(),
        refresh_token: Some(MOCK_REFRESH_TOKEN.to_string()),
        expires_at: Some(Utc::now() + Duration::hours(1)),
        scope: Some("https://www.googleapis.com/auth/spreadsheets".to_string()),
        token_type: Some("Bearer".to_string()),
    }
}

/// Build the router against a fresh mock provider and temp token file.
#[allow(dead_code)]
pub async fn create_test_app(options: TestOptions) -> TestApp {
    let provider = spawn_mock_provider().await;
    let dir = tempfile::tempdir().unwrap();

    let mut config = Config::test_default();
    config.token_path = dir.path().join("token.json");
    config.oauth_token_url = provider.token_url();
    config.sheets_api_url = provider.sheets_url();
    config.token_sharing = options.token_sharing;
    config.spreadsheet_id = options.spreadsheet_id;

    let records = options.duplicate_guard.then(RecordStore::in_memory);
    let state = Arc::new(AppState::new(config, test_identity(), records));

    if let Some(tokens) = options.persisted_tokens {
        state.token_store.persist(&tokens).await.unwrap();
    }

    TestApp {
        router: create_router(state.clone()),
        state,
        provider,
        dir,
    }
}

/// Extract `name=value` of a Set-Cookie header for use as a Cookie header.
#[allow(dead_code)]
pub fn cookie_from_response(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{name}=")))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

/// Read a response body as a string.
#[allow(dead_code)]
pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
