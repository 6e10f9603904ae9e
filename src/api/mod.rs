//! API module for HTTP handlers.
//!
//! This module contains route definitions and request/response handlers.

pub mod auth;
pub mod cars;
pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod tasks;

pub use auth::{boot, login, logout, signup};
pub use cars::{create_car, delete_car, get_car, list_cars, list_my_cars, search_cars, update_car};
pub use error::{ApiError, ApiErrorResponse, FieldError, ValidationError};
pub use extract::{AuthenticatedUser, SESSION_COOKIE};
pub use handlers::{AppConfig, AppState, HealthResponse, health_check};
pub use routes::create_router;
pub use tasks::{
    create_task, delete_task, get_all_tasks, get_board, move_task, update_task,
    update_task_status,
};

#[cfg(test)]
pub(crate) mod test_support {
    use std::time::Duration;

    use secrecy::SecretString;

    use super::AppState;
    use crate::auth::TokenService;
    use crate::infrastructure::Repositories;

    pub const TEST_SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

    /// Creates an `AppState` over fresh in-memory repositories.
    pub fn test_state() -> AppState {
        let tokens = TokenService::new(
            SecretString::from(TEST_SECRET),
            Duration::from_secs(3600),
        )
        .unwrap();
        AppState::new(Repositories::in_memory(), tokens)
    }
}
