//! Routing definitions.
//!
//! Builds the axum router with every endpoint, the body limit, request
//! tracing and CORS.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{delete, get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{AppState, health_check};
use super::{auth, cars, tasks};
use crate::config::ServerConfig;

// =============================================================================
// Router Creation
// =============================================================================

/// Creates the application router.
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/boot", get(auth::boot))
        .route("/logout", get(auth::logout));

    let task_routes = Router::new()
        .route("/create", post(tasks::create_task))
        .route("/getAll", get(tasks::get_all_tasks))
        .route("/getall", get(tasks::get_all_tasks))
        .route("/update/{id}", post(tasks::update_task))
        .route("/updateStatus/{id}", post(tasks::update_task_status))
        .route("/updatestatus/{id}", post(tasks::update_task_status))
        .route("/delete/{id}", delete(tasks::delete_task))
        .route("/board", get(tasks::get_board))
        .route("/board/move", post(tasks::move_task));

    let car_routes = Router::new()
        .route("/", get(cars::list_cars))
        .route("/create", post(cars::create_car))
        .route("/mine", get(cars::list_my_cars))
        .route("/search", get(cars::search_cars))
        .route(
            "/{id}",
            get(cars::get_car)
                .put(cars::update_car)
                .delete(cars::delete_car),
        );

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api/tasks", task_routes)
        .nest("/api/cars", car_routes)
        .layer(DefaultBodyLimit::max(config.body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(create_cors_layer(config.cors_origin.as_deref()))
        .with_state(state)
}

/// Creates the CORS layer.
///
/// A configured origin is allowed with credentials so the session cookie
/// travels; without one any origin is allowed and credentials are not.
fn create_cors_layer(origin: Option<&str>) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    match origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(methods)
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
            .allow_credentials(true),
        Some(Err(error)) => {
            tracing::warn!(%error, "CORS_ORIGIN is not a valid header value, allowing any origin");
            permissive_cors()
        }
        None => permissive_cors(),
    }
}

fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::test_state;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use rstest::rstest;
    use tower::ServiceExt;

    fn create_test_app() -> Router {
        create_router(test_state(), &ServerConfig::default())
    }

    #[rstest]
    #[tokio::test]
    async fn test_health_returns_healthy() {
        let response = create_test_app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "healthy");
    }

    #[rstest]
    #[case("/api/tasks/getAll")]
    #[case("/api/tasks/getall")]
    #[case("/api/tasks/board")]
    #[case("/api/cars")]
    #[case("/api/cars/mine")]
    #[case("/api/auth/boot")]
    #[tokio::test]
    async fn test_protected_routes_require_token(#[case] uri: &str) {
        let response = create_test_app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let response = create_test_app()
            .oneshot(Request::builder().uri("/api/unknown").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[tokio::test]
    async fn test_configured_origin_allows_credentials() {
        let config = ServerConfig {
            cors_origin: Some("http://localhost:5173".to_string()),
            ..ServerConfig::default()
        };
        let app = create_router(test_state(), &config);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("origin", "http://localhost:5173")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(
            headers["access-control-allow-origin"],
            "http://localhost:5173"
        );
        assert_eq!(headers["access-control-allow-credentials"], "true");
    }
}
