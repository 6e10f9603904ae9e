//! Shared handler state and the health check.

use std::sync::Arc;

use axum::Json;

use crate::auth::TokenService;
use crate::infrastructure::{
    CarRepository, Repositories, SessionStore, TaskRepository, UserRepository,
};

// =============================================================================
// Application Configuration
// =============================================================================

/// Runtime settings handlers need.
#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    /// Whether the session cookie is marked `Secure` (and `SameSite=None`).
    pub cookie_secure: bool,
}

// =============================================================================
// Application State
// =============================================================================

/// Shared application dependencies.
///
/// Uses trait objects so backends chosen by `RepositoryFactory` at start-up
/// can be plugged in without generics.
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository + Send + Sync>,
    pub task_repository: Arc<dyn TaskRepository + Send + Sync>,
    pub car_repository: Arc<dyn CarRepository + Send + Sync>,
    pub session_store: Arc<dyn SessionStore + Send + Sync>,
    /// Issues and verifies session tokens.
    pub tokens: Arc<TokenService>,
    pub config: AppConfig,
}

impl AppState {
    /// Creates the state from initialized repositories with default settings.
    #[must_use]
    pub fn new(repositories: Repositories, tokens: TokenService) -> Self {
        Self::with_config(repositories, tokens, AppConfig::default())
    }

    /// Creates the state from repositories and custom settings.
    #[must_use]
    pub fn with_config(repositories: Repositories, tokens: TokenService, config: AppConfig) -> Self {
        Self {
            user_repository: repositories.user_repository,
            task_repository: repositories.task_repository,
            car_repository: repositories.car_repository,
            session_store: repositories.session_store,
            tokens: Arc::new(tokens),
            config,
        }
    }
}

// =============================================================================
// GET /health Handler
// =============================================================================

/// Health check response body.
#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
}

/// Health check endpoint.
///
/// # Response
///
/// - **200 OK**: Service is healthy
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}
