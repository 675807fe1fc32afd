// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Spreadsheet route tests against the mock Sheets API.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use sheet_intake::config::TokenSharing;
use sheet_intake::services::TokenStore;
use tower::ServiceExt;

mod common;
use common::{
    body_string, create_test_app, valid_tokens, TestOptions, FORBIDDEN_MESSAGE,
    FORBIDDEN_SPREADSHEET, MOCK_ACCESS_TOKEN, REFRESHED_ACCESS_TOKEN,
};

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, cookie: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn shared_with_persisted() -> TestOptions {
    TestOptions {
        persisted_tokens: Some(valid_tokens()),
        ..TestOptions::default()
    }
}

#[tokio::test]
async fn test_unauthenticated_redirects_without_gateway_call() {
    let app = create_test_app(TestOptions::default()).await;

    for uri in ["/sheets", "/enter-details"] {
        let response = app.router.clone().oneshot(get(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/auth");
    }

    let add = Request::builder()
        .method("POST")
        .uri("/sheets/add")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("name=Ann&email=a%40x.com"))
        .unwrap();
    let response = app.router.clone().oneshot(add).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    assert_eq!(app.provider.log.sheet_requests(), 0);
}

#[tokio::test]
async fn test_shared_mode_uses_persisted_tokens() {
    let app = create_test_app(shared_with_persisted()).await;

    let response = app.router.clone().oneshot(get("/sheets", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.provider.log.last_bearer().as_deref(), Some(MOCK_ACCESS_TOKEN));
}

#[tokio::test]
async fn test_per_session_mode_ignores_persisted_tokens() {
    let app = create_test_app(TestOptions {
        token_sharing: TokenSharing::PerSession,
        ..shared_with_persisted()
    })
    .await;

    let response = app.router.clone().oneshot(get("/sheets", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(app.provider.log.sheet_requests(), 0);

    let cookie = app.authenticated_cookie(valid_tokens());
    let response = app
        .router
        .clone()
        .oneshot(get("/sheets", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_read_rows() {
    let app = create_test_app(shared_with_persisted()).await;

    let response = app.router.clone().oneshot(get("/sheets", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let rows: Vec<Vec<Value>> = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(rows, vec![vec![json!("Name"), json!("Email")]]);
}

#[tokio::test]
async fn test_read_empty_range_is_not_found() {
    let app = create_test_app(shared_with_persisted()).await;

    let response = app
        .router
        .clone()
        .oneshot(get("/sheets?range=Empty!A1:B10", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_json_add_requires_range_and_values() {
    let app = create_test_app(shared_with_persisted()).await;
    let cookie = app.authenticated_cookie(valid_tokens());

    let bodies = [
        json!({"values": [["Ann", "a@x.com"]]}),
        json!({"range": "Sheet1!A1:B1"}),
        json!({"range": "Sheet1!A1:B1", "values": []}),
        json!({"range": "   ", "values": [["Ann", "a@x.com"]]}),
    ];

    for body in bodies {
        let response = app
            .router
            .clone()
            .oneshot(post_json("/sheets/add", &cookie, body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
    }

    assert_eq!(app.provider.log.sheet_requests(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = create_test_app(shared_with_persisted()).await;
    let cookie = app.authenticated_cookie(valid_tokens());

    let request = Request::builder()
        .method("POST")
        .uri("/sheets/add")
        .header(header::COOKIE, &cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.provider.log.sheet_requests(), 0);
}

#[tokio::test]
async fn test_json_add_returns_confirmation() {
    let app = create_test_app(shared_with_persisted()).await;
    let cookie = app.authenticated_cookie(valid_tokens());

    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/sheets/add",
            &cookie,
            json!({"range": "Sheet1!A1:B1", "values": [["Ann", "a@x.com"], ["Bob", "b@x.com"]]}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    let updated_range = body["updatedRange"].as_str().unwrap();
    assert!(updated_range.starts_with("Sheet1!"), "{updated_range}");
    assert_eq!(body["updatedRows"], 2);

    assert_eq!(
        app.provider.log.appended_rows(),
        vec![
            vec![json!("Ann"), json!("a@x.com")],
            vec![json!("Bob"), json!("b@x.com")],
        ]
    );
}

#[tokio::test]
async fn test_form_add_appends_name_and_email() {
    let app = create_test_app(shared_with_persisted()).await;

    let request = Request::builder()
        .method("POST")
        .uri("/sheets/add")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("name=Ann&email=a%40x.com"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "Data added successfully!");
    assert_eq!(
        app.provider.log.appended_rows(),
        vec![vec![json!("Ann"), json!("a@x.com")]]
    );
}

#[tokio::test]
async fn test_api_error_passes_through_message() {
    let app = create_test_app(TestOptions {
        spreadsheet_id: FORBIDDEN_SPREADSHEET.to_string(),
        ..shared_with_persisted()
    })
    .await;

    let response = app.router.clone().oneshot(get("/sheets", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["error"], "sheets_error");
    assert!(body["details"].as_str().unwrap().contains(FORBIDDEN_MESSAGE));
}

#[tokio::test]
async fn test_expired_token_refreshed_before_call() {
    let mut expired = valid_tokens();
    expired.expires_at = Some(Utc::now() - Duration::minutes(5));

    let app = create_test_app(TestOptions {
        persisted_tokens: Some(expired),
        ..TestOptions::default()
    })
    .await;

    let response = app.router.clone().oneshot(get("/sheets", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.provider.log.token_requests(), 1);
    assert_eq!(
        app.provider.log.last_bearer().as_deref(),
        Some(REFRESHED_ACCESS_TOKEN)
    );

    // The refreshed set replaces the persisted one and keeps the refresh token
    let persisted = TokenStore::new(app.token_path())
        .load_persisted()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(persisted.access_token, REFRESHED_ACCESS_TOKEN);
    assert!(persisted.refresh_token.is_some());
}

#[tokio::test]
async fn test_failed_refresh_is_exchange_error() {
    let mut expired = valid_tokens();
    expired.expires_at = Some(Utc::now() - Duration::minutes(5));
    expired.refresh_token = Some("revoked-refresh".to_string());

    let app = create_test_app(TestOptions {
        persisted_tokens: Some(expired),
        ..TestOptions::default()
    })
    .await;

    let response = app.router.clone().oneshot(get("/sheets", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.provider.log.token_requests(), 1);
    assert_eq!(app.provider.log.sheet_requests(), 0);
}

#[tokio::test]
async fn test_security_headers_on_responses() {
    let app = create_test_app(TestOptions::default()).await;

    let response = app.router.clone().oneshot(get("/", None)).await.unwrap();

    assert_eq!(
        response.headers().get("X-Content-Type-Options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("Cache-Control").unwrap(), "no-store");
}
