//! Integration tests for the account endpoints.
//!
//! # Tests Covered
//!
//! - `POST /api/auth/signup`: creation, duplicates, validation
//! - `POST /api/auth/login`: token in body and cookie, bad credentials
//! - `GET /api/auth/boot`: bearer and cookie sessions
//! - `GET /api/auth/logout`: revocation of the presented token

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use rstest::rstest;
use serde_json::json;
use tower::ServiceExt;

use common::{PASSWORD, create_task, create_test_app, send, signup_and_login};

// =============================================================================
// Signup
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_signup_returns_profile_without_password() {
    let app = create_test_app();

    let response = send(
        &app,
        Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({ "name": "Ada", "email": "Ada@Example.com", "password": PASSWORD })),
    )
    .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["message"], "User Created Successfully");
    assert_eq!(response.body["data"]["email"], "ada@example.com");
    assert_eq!(response.body["data"]["name"], "Ada");
    assert!(response.body["data"].get("password").is_none());
    assert!(response.body["data"].get("passwordHash").is_none());
}

#[rstest]
#[tokio::test]
async fn test_signup_duplicate_email_is_conflict() {
    let app = create_test_app();
    signup_and_login(&app, "Ada", "ada@example.com").await;

    let response = send(
        &app,
        Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({ "name": "Other", "email": "ada@example.com", "password": PASSWORD })),
    )
    .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["message"], "User Already Exists!");
}

#[rstest]
#[tokio::test]
async fn test_signup_accepts_single_label_domain() {
    let app = create_test_app();

    let token = signup_and_login(&app, "Lan", "lan@localhost").await;

    let response = send(&app, Method::GET, "/api/auth/boot", Some(&token), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["email"], "lan@localhost");
}

#[rstest]
#[case(json!({ "name": "", "email": "ada@example.com", "password": PASSWORD }), "name")]
#[case(json!({ "name": "Ada", "email": "not-an-email", "password": PASSWORD }), "email")]
#[case(json!({ "name": "Ada", "email": "ada@example.com", "password": "123" }), "password")]
#[tokio::test]
async fn test_signup_validation_errors(#[case] body: serde_json::Value, #[case] field: &str) {
    let app = create_test_app();

    let response = send(&app, Method::POST, "/api/auth/signup", None, Some(body)).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "VALIDATION_ERROR");
    let fields: Vec<&str> = response.body["details"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|detail| detail["field"].as_str())
        .collect();
    assert!(fields.contains(&field), "{fields:?}");
}

// =============================================================================
// Login
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_login_sets_http_only_cookie() {
    let app = create_test_app();
    signup_and_login(&app, "Ada", "ada@example.com").await;

    let response = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "ada@example.com", "password": PASSWORD })),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Login Successful!");
    let token = response.body["data"]["token"].as_str().unwrap();
    let cookie = response.set_cookie.unwrap();
    assert!(cookie.starts_with(&format!("token={token}")));
    assert!(cookie.contains("HttpOnly"));
}

#[rstest]
#[case("ada@example.com", "wrong-password")]
#[case("nobody@example.com", PASSWORD)]
#[tokio::test]
async fn test_login_bad_credentials_are_unauthorized(#[case] email: &str, #[case] password: &str) {
    let app = create_test_app();
    signup_and_login(&app, "Ada", "ada@example.com").await;

    let response = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "Invalid Credentials!");
}

// =============================================================================
// Boot and Logout
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_boot_reports_task_count() {
    let app = create_test_app();
    let token = signup_and_login(&app, "Ada", "ada@example.com").await;
    create_task(&app, &token, json!({ "title": "First" })).await;
    create_task(&app, &token, json!({ "title": "Second" })).await;

    let response = send(&app, Method::GET, "/api/auth/boot", Some(&token), None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Boot Successful!");
    assert_eq!(response.body["data"]["isLoggedIn"], true);
    assert_eq!(response.body["data"]["taskCount"], 2);
    assert_eq!(response.body["data"]["email"], "ada@example.com");
}

#[rstest]
#[tokio::test]
async fn test_boot_accepts_session_cookie() {
    let app = create_test_app();
    let token = signup_and_login(&app, "Ada", "ada@example.com").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/auth/boot")
                .header(header::COOKIE, format!("theme=dark; token={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[rstest]
#[case(None)]
#[case(Some("not.a.jwt"))]
#[tokio::test]
async fn test_boot_without_valid_token_is_unauthorized(#[case] token: Option<&str>) {
    let app = create_test_app();

    let response = send(&app, Method::GET, "/api/auth/boot", token, None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["code"], "UNAUTHORIZED");
}

#[rstest]
#[tokio::test]
async fn test_logout_revokes_token_and_clears_cookie() {
    let app = create_test_app();
    let token = signup_and_login(&app, "Ada", "ada@example.com").await;

    let response = send(&app, Method::GET, "/api/auth/logout", Some(&token), None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Logged Out Successfully!");
    assert!(response.set_cookie.unwrap().contains("Max-Age=0"));

    let response = send(&app, Method::GET, "/api/auth/boot", Some(&token), None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[rstest]
#[tokio::test]
async fn test_logout_leaves_other_sessions_valid() {
    let app = create_test_app();
    let first = signup_and_login(&app, "Ada", "ada@example.com").await;
    let second = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "ada@example.com", "password": PASSWORD })),
    )
    .await
    .body["data"]["token"]
        .as_str()
        .unwrap()
        .to_string();

    send(&app, Method::GET, "/api/auth/logout", Some(&first), None).await;

    let response = send(&app, Method::GET, "/api/auth/boot", Some(&second), None).await;
    assert_eq!(response.status, StatusCode::OK);
}
