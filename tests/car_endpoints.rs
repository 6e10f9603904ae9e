//! Integration tests for the car listing endpoints.
//!
//! # Tests Covered
//!
//! - Create with image and tag validation
//! - Paged listing, own listings and keyword search
//! - Read, owner-only update and delete
//! - Malformed bodies and query strings answered with JSON errors

mod common;

use axum::http::{Method, StatusCode};
use rstest::rstest;
use serde_json::{Value, json};

use common::{create_car, create_test_app, send, send_raw, signup_and_login};

fn images(count: usize) -> Vec<String> {
    (0..count)
        .map(|index| format!("https://img.example.com/{index}.jpg"))
        .collect()
}

fn titles(cars: &Value) -> Vec<&str> {
    let mut titles: Vec<&str> = cars
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|car| car["title"].as_str())
        .collect();
    titles.sort_unstable();
    titles
}

// =============================================================================
// Create
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_create_car_returns_bare_document() {
    let app = create_test_app();
    let token = signup_and_login(&app, "Ada", "ada@example.com").await;

    let response = send(
        &app,
        Method::POST,
        "/api/cars/create",
        Some(&token),
        Some(json!({
            "title": "Red Roadster",
            "description": "Two seats",
            "images": images(2),
            "tags": ["Convertible", "red"]
        })),
    )
    .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert!(response.body["_id"].is_string());
    assert_eq!(response.body["title"], "Red Roadster");
    assert_eq!(response.body["images"].as_array().unwrap().len(), 2);
    assert_eq!(response.body["tags"], json!(["convertible", "red"]));
    assert_eq!(response.body["version"], 1);
}

#[rstest]
#[case(json!({ "title": "Too many", "images": images(11) }), "A car can only have up to 10 images")]
#[case(json!({ "title": "Bad url", "images": ["ftp://img"] }), "Image must be an http(s) URL")]
#[case(json!({ "title": "" }), "Title is required")]
#[tokio::test]
async fn test_create_car_rejects_invalid_input(#[case] body: Value, #[case] message: &str) {
    let app = create_test_app();
    let token = signup_and_login(&app, "Ada", "ada@example.com").await;

    let response = send(&app, Method::POST, "/api/cars/create", Some(&token), Some(body)).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let messages: Vec<&str> = response.body["details"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|detail| detail["message"].as_str())
        .collect();
    assert!(messages.contains(&message), "{messages:?}");
}

#[rstest]
#[tokio::test]
async fn test_create_car_accepts_exactly_ten_images() {
    let app = create_test_app();
    let token = signup_and_login(&app, "Ada", "ada@example.com").await;

    create_car(&app, &token, json!({ "title": "Gallery", "images": images(10) })).await;
}

// =============================================================================
// Listing and Search
// =============================================================================

#[rstest]
#[case("/api/cars?page=1&limit=2", 1, 2)]
#[case("/api/cars?page=3&limit=2", 3, 1)]
#[case("/api/cars?page=4&limit=2", 4, 0)]
#[case("/api/cars", 1, 5)]
#[tokio::test]
async fn test_list_cars_pages(
    #[case] uri: &str,
    #[case] current_page: u64,
    #[case] on_page: usize,
) {
    let app = create_test_app();
    let ada = signup_and_login(&app, "Ada", "ada@example.com").await;
    let bob = signup_and_login(&app, "Bob", "bob@example.com").await;
    for index in 0..3 {
        create_car(&app, &ada, json!({ "title": format!("Ada {index}") })).await;
    }
    for index in 0..2 {
        create_car(&app, &bob, json!({ "title": format!("Bob {index}") })).await;
    }

    let response = send(&app, Method::GET, uri, Some(&ada), None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["currentPage"], current_page);
    assert_eq!(response.body["totalCars"], 5);
    assert_eq!(response.body["matchedCars"].as_array().unwrap().len(), on_page);
}

#[rstest]
#[case("/api/cars?page=0")]
#[case("/api/cars?limit=0")]
#[case("/api/cars?limit=101")]
#[tokio::test]
async fn test_list_cars_rejects_bad_paging(#[case] uri: &str) {
    let app = create_test_app();
    let token = signup_and_login(&app, "Ada", "ada@example.com").await;

    let response = send(&app, Method::GET, uri, Some(&token), None).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[rstest]
#[case("/api/cars?page=abc")]
#[case("/api/cars?limit=-5")]
#[tokio::test]
async fn test_list_cars_unparsable_paging_is_json_error(#[case] uri: &str) {
    let app = create_test_app();
    let token = signup_and_login(&app, "Ada", "ada@example.com").await;

    let response = send(&app, Method::GET, uri, Some(&token), None).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "INVALID_QUERY");
    assert!(response.body["message"].is_string());
}

#[rstest]
#[tokio::test]
async fn test_create_car_malformed_body_is_json_error() {
    let app = create_test_app();
    let token = signup_and_login(&app, "Ada", "ada@example.com").await;

    let response = send_raw(
        &app,
        Method::POST,
        "/api/cars/create",
        Some(&token),
        Some(r#"{ "title": "Roadster", "images": "one.jpg" }"#.to_string()),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "INVALID_JSON");
}

#[rstest]
#[tokio::test]
async fn test_list_my_cars_returns_only_callers() {
    let app = create_test_app();
    let ada = signup_and_login(&app, "Ada", "ada@example.com").await;
    let bob = signup_and_login(&app, "Bob", "bob@example.com").await;
    create_car(&app, &ada, json!({ "title": "Ada's coupe" })).await;
    create_car(&app, &bob, json!({ "title": "Bob's van" })).await;

    let response = send(&app, Method::GET, "/api/cars/mine", Some(&bob), None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(titles(&response.body), vec!["Bob's van"]);
}

#[rstest]
#[case("roadster", vec!["Red Roadster"])]
#[case("FAMILY", vec!["Blue Wagon"])]
#[case("electric", vec!["Silent Hatch"])]
#[case("submarine", vec![])]
#[tokio::test]
async fn test_search_cars_matches_title_description_and_tags(
    #[case] keyword: &str,
    #[case] expected: Vec<&str>,
) {
    let app = create_test_app();
    let token = signup_and_login(&app, "Ada", "ada@example.com").await;
    create_car(&app, &token, json!({ "title": "Red Roadster" })).await;
    create_car(
        &app,
        &token,
        json!({ "title": "Blue Wagon", "description": "Room for the whole family" }),
    )
    .await;
    create_car(
        &app,
        &token,
        json!({ "title": "Silent Hatch", "tags": ["Electric"] }),
    )
    .await;

    let response = send(
        &app,
        Method::GET,
        &format!("/api/cars/search?keyword={keyword}"),
        Some(&token),
        None,
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(titles(&response.body), expected);
}

#[rstest]
#[case("/api/cars/search")]
#[case("/api/cars/search?keyword=%20%20")]
#[tokio::test]
async fn test_search_cars_requires_keyword(#[case] uri: &str) {
    let app = create_test_app();
    let token = signup_and_login(&app, "Ada", "ada@example.com").await;

    let response = send(&app, Method::GET, uri, Some(&token), None).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "KEYWORD_REQUIRED");
}

// =============================================================================
// Read, Update and Delete
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_get_car_by_id() {
    let app = create_test_app();
    let token = signup_and_login(&app, "Ada", "ada@example.com").await;
    let id = create_car(&app, &token, json!({ "title": "Red Roadster" })).await;

    let found = send(&app, Method::GET, &format!("/api/cars/{id}"), Some(&token), None).await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.body["_id"], id.as_str());

    let missing = send(
        &app,
        Method::GET,
        "/api/cars/0190b2a4-4b1e-7c3a-9f00-000000000001",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["message"], "Car not found");
}

#[rstest]
#[tokio::test]
async fn test_update_car_by_owner() {
    let app = create_test_app();
    let token = signup_and_login(&app, "Ada", "ada@example.com").await;
    let id = create_car(&app, &token, json!({ "title": "Old", "tags": ["a"] })).await;

    let response = send(
        &app,
        Method::PUT,
        &format!("/api/cars/{id}"),
        Some(&token),
        Some(json!({ "title": "New", "version": 1 })),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Car updated successfully");
    assert_eq!(response.body["car"]["title"], "New");
    assert_eq!(response.body["car"]["tags"], json!(["a"]));
    assert_eq!(response.body["car"]["version"], 2);
}

#[rstest]
#[tokio::test]
async fn test_update_car_rejects_stale_version_and_too_many_images() {
    let app = create_test_app();
    let token = signup_and_login(&app, "Ada", "ada@example.com").await;
    let id = create_car(&app, &token, json!({ "title": "Old" })).await;
    let uri = format!("/api/cars/{id}");

    let stale = send(&app, Method::PUT, &uri, Some(&token), Some(json!({ "title": "x", "version": 7 }))).await;
    assert_eq!(stale.status, StatusCode::CONFLICT);

    let crowded = send(&app, Method::PUT, &uri, Some(&token), Some(json!({ "images": images(11) }))).await;
    assert_eq!(crowded.status, StatusCode::BAD_REQUEST);
}

#[rstest]
#[case(Method::PUT, Some(json!({ "title": "Stolen" })), "You are not authorized to update this car")]
#[case(Method::DELETE, None, "You are not authorized to delete this car")]
#[tokio::test]
async fn test_non_owner_cannot_change_car(
    #[case] method: Method,
    #[case] body: Option<Value>,
    #[case] message: &str,
) {
    let app = create_test_app();
    let ada = signup_and_login(&app, "Ada", "ada@example.com").await;
    let bob = signup_and_login(&app, "Bob", "bob@example.com").await;
    let id = create_car(&app, &ada, json!({ "title": "Ada's coupe" })).await;

    let response = send(&app, method, &format!("/api/cars/{id}"), Some(&bob), body).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["message"], message);
}

#[rstest]
#[tokio::test]
async fn test_delete_car_by_owner() {
    let app = create_test_app();
    let token = signup_and_login(&app, "Ada", "ada@example.com").await;
    let id = create_car(&app, &token, json!({ "title": "Gone soon" })).await;
    let uri = format!("/api/cars/{id}");

    let deleted = send(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body, json!({ "message": "Car deleted successfully" }));

    let missing = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}
