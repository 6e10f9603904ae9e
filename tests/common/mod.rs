//! Common test helpers for integration tests.
//!
//! Each test builds a fresh router over in-memory repositories and drives it
//! with `tower::ServiceExt::oneshot`.
//!
//! # Note
//!
//! The `#![allow(dead_code)]` attribute is necessary because Rust compiles each
//! integration test file as a separate crate, and not every file uses every
//! helper.

#![allow(dead_code)]

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

use kanban_api::api::{AppState, create_router};
use kanban_api::auth::TokenService;
use kanban_api::config::ServerConfig;
use kanban_api::infrastructure::Repositories;

pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const PASSWORD: &str = "s3cret-pass";

// =============================================================================
// App Creation Helpers
// =============================================================================

/// Creates a router over fresh in-memory repositories.
pub fn create_test_app() -> Router {
    let tokens = TokenService::new(SecretString::from(TEST_SECRET), Duration::from_secs(3600))
        .expect("Failed to create token service");
    let state = AppState::new(Repositories::in_memory(), tokens);
    create_router(state, &ServerConfig::default())
}

// =============================================================================
// Request Helpers
// =============================================================================

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub set_cookie: Option<String>,
    pub body: Value,
}

/// Sends a request and decodes the JSON body (`Value::Null` when empty).
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    send_raw(app, method, uri, token, body.map(|body| body.to_string())).await
}

/// Sends a request whose body is sent verbatim as `application/json`.
pub async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<String>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body)),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Router is infallible");

    let status = response.status();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    TestResponse {
        status,
        set_cookie,
        body,
    }
}

// =============================================================================
// Account Helpers
// =============================================================================

/// Signs up and logs in, returning the session token.
pub async fn signup_and_login(app: &Router, name: &str, email: &str) -> String {
    let response = send(
        app,
        Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({ "name": name, "email": email, "password": PASSWORD })),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);

    let response = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": PASSWORD })),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);

    response.body["data"]["token"]
        .as_str()
        .expect("login returns a token")
        .to_string()
}

/// Creates a task and returns its `_id`.
pub async fn create_task(app: &Router, token: &str, body: Value) -> String {
    let response = send(app, Method::POST, "/api/tasks/create", Some(token), Some(body)).await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    response.body["data"]["_id"]
        .as_str()
        .expect("task has an id")
        .to_string()
}

/// Creates a car listing and returns its `_id`.
pub async fn create_car(app: &Router, token: &str, body: Value) -> String {
    let response = send(app, Method::POST, "/api/cars/create", Some(token), Some(body)).await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    response.body["_id"]
        .as_str()
        .expect("car has an id")
        .to_string()
}
