//! Car listing handlers.
//!
//! Listings are readable by every signed-in user; only the owner may change
//! or delete one.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use uuid::Uuid;

use super::dto::{
    CarListQuery, CarPageResponse, CarResponse, CarSearchQuery, CarUpdatedResponse,
    CreateCarRequest, MessageResponse, UpdateCarRequest, validate_car_page, validate_create_car,
    validate_update_car,
};
use super::error::ApiErrorResponse;
use super::extract::{ApiJson, ApiQuery, AuthenticatedUser};
use super::handlers::AppState;
use super::tasks::check_expected_version;
use crate::domain::{Car, CarId, Timestamp};
use crate::infrastructure::Pagination;

const CAR_NOT_FOUND_MESSAGE: &str = "Car not found";

fn car_not_found() -> ApiErrorResponse {
    ApiErrorResponse::not_found(CAR_NOT_FOUND_MESSAGE)
}

fn parse_car_id(value: &str) -> Option<CarId> {
    Uuid::parse_str(value.trim()).ok().map(CarId::from_uuid)
}

async fn load_car(state: &AppState, id: &str) -> Result<Car, ApiErrorResponse> {
    let car_id = parse_car_id(id).ok_or_else(car_not_found)?;
    state
        .car_repository
        .find_by_id(&car_id)
        .await?
        .ok_or_else(car_not_found)
}

/// Creates a listing owned by the caller.
///
/// # Errors
///
/// Returns 400 for invalid input, including more than 10 images.
pub async fn create_car(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    ApiJson(request): ApiJson<CreateCarRequest>,
) -> Result<(StatusCode, Json<CarResponse>), ApiErrorResponse> {
    let validated = validate_create_car(&request)?;
    let car = Car::new(
        CarId::generate(),
        caller.user_id.clone(),
        validated.title,
        Timestamp::now(),
    )
    .with_description(validated.description)
    .with_images(validated.images)
    .with_tags(validated.tags);

    state.car_repository.insert(&car).await?;

    tracing::debug!(car_id = %car.car_id, owner = %car.owner, "Car listed");
    Ok((StatusCode::CREATED, Json(CarResponse::from(&car))))
}

/// Lists every listing, oldest first, one page at a time.
///
/// # Errors
///
/// Returns 400 for `page=0` or a `limit` outside `1..=100`.
pub async fn list_cars(
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
    ApiQuery(query): ApiQuery<CarListQuery>,
) -> Result<Json<CarPageResponse>, ApiErrorResponse> {
    let (page, limit) = validate_car_page(&query)?;
    let result = state
        .car_repository
        .list(Pagination::new(page - 1, limit))
        .await?;

    Ok(Json(CarPageResponse {
        total_pages: result.total_pages(),
        total_cars: result.total,
        current_page: page,
        matched_cars: result.items.iter().map(CarResponse::from).collect(),
    }))
}

/// Lists the caller's own listings.
///
/// # Errors
///
/// Returns 500 for repository failures.
pub async fn list_my_cars(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
) -> Result<Json<Vec<CarResponse>>, ApiErrorResponse> {
    let cars = state.car_repository.list_by_owner(&caller.user_id).await?;
    Ok(Json(cars.iter().map(CarResponse::from).collect()))
}

/// Finds listings whose title, description or tags match `keyword`.
///
/// # Errors
///
/// Returns 400 when `keyword` is missing or blank.
pub async fn search_cars(
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
    ApiQuery(query): ApiQuery<CarSearchQuery>,
) -> Result<Json<Vec<CarResponse>>, ApiErrorResponse> {
    let keyword = query
        .keyword
        .as_deref()
        .map(str::trim)
        .filter(|keyword| !keyword.is_empty())
        .ok_or_else(|| {
            ApiErrorResponse::bad_request("KEYWORD_REQUIRED", "Keyword is required for search.")
        })?;

    let cars = state.car_repository.search(keyword).await?;
    Ok(Json(cars.iter().map(CarResponse::from).collect()))
}

/// Returns one listing.
///
/// # Errors
///
/// Returns 404 for unknown ids.
pub async fn get_car(
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<CarResponse>, ApiErrorResponse> {
    let car = load_car(&state, &id).await?;
    Ok(Json(CarResponse::from(&car)))
}

/// Applies a partial update to one of the caller's listings.
///
/// # Errors
///
/// Returns 404 for unknown ids, 403 for other users' listings, 400 for
/// invalid input and 409 for a stale `version`.
pub async fn update_car(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateCarRequest>,
) -> Result<Json<CarUpdatedResponse>, ApiErrorResponse> {
    let current = load_car(&state, &id).await?;
    if !current.is_owned_by(&caller.user_id) {
        return Err(ApiErrorResponse::forbidden(
            "You are not authorized to update this car",
        ));
    }

    let changes = validate_update_car(&request)?;
    check_expected_version(changes.version, current.version)?;

    let updated = changes
        .apply(current)
        .with_updated_at(Timestamp::now())
        .increment_version();
    state.car_repository.save(&updated).await?;

    tracing::debug!(car_id = %updated.car_id, version = updated.version, "Car updated");
    Ok(Json(CarUpdatedResponse {
        message: "Car updated successfully",
        car: CarResponse::from(&updated),
    }))
}

/// Deletes one of the caller's listings.
///
/// # Errors
///
/// Returns 404 for unknown ids and 403 for other users' listings.
pub async fn delete_car(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiErrorResponse> {
    let car = load_car(&state, &id).await?;
    if !car.is_owned_by(&caller.user_id) {
        return Err(ApiErrorResponse::forbidden(
            "You are not authorized to delete this car",
        ));
    }

    if !state.car_repository.delete(&car.car_id).await? {
        return Err(car_not_found());
    }

    tracing::debug!(car_id = %car.car_id, "Car deleted");
    Ok(Json(MessageResponse {
        message: "Car deleted successfully",
    }))
}
