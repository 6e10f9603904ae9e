//! Data Transfer Objects for API requests and responses.
//!
//! Wire names follow the browser client: camelCase fields and `_id` for
//! document ids. Validation helpers trim their input and report failures as
//! [`ValidationError`]s keyed by the wire field name.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::error::{FieldError, ValidationError};
use crate::domain::{
    Board, Car, ColumnCounts, DueDateOrder, Email, MAX_CAR_IMAGES, Priority, Tag, Task, TaskFilter,
    TaskStatus, Timestamp, User,
};

/// Maximum title length for tasks and cars.
pub const MAX_TITLE_LENGTH: usize = 200;
/// Maximum description length for tasks and cars.
pub const MAX_DESCRIPTION_LENGTH: usize = 5000;
/// Maximum number of tags on a car.
pub const MAX_TAGS: usize = 20;
/// Maximum tag length.
pub const MAX_TAG_LENGTH: usize = 50;
/// Maximum display name length.
pub const MAX_NAME_LENGTH: usize = 100;
/// Password length bounds.
pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_PASSWORD_LENGTH: usize = 128;
/// Upper bound for the `limit` query parameter on car listings.
pub const MAX_PAGE_LIMIT: u32 = 100;

// =============================================================================
// Envelope
// =============================================================================

/// `{ "message": ..., "data": ... }` success body.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub message: &'static str,
    pub data: T,
}

impl<T> Envelope<T> {
    #[must_use]
    pub const fn new(message: &'static str, data: T) -> Self {
        Self { message, data }
    }
}

/// `{ "message": ... }` body for operations with nothing to return.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// =============================================================================
// Auth DTOs
// =============================================================================

/// Request DTO for `POST /api/auth/signup`.
#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request DTO for `POST /api/auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Public part of a user account.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.to_string(),
        }
    }
}

/// Response DTO for a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub name: String,
    pub email: String,
    pub token: String,
}

/// Response DTO for `GET /api/auth/boot`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootResponse {
    pub name: String,
    pub email: String,
    pub is_logged_in: bool,
    pub task_count: usize,
}

impl From<&User> for BootResponse {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.to_string(),
            is_logged_in: true,
            task_count: user.task_ids.len(),
        }
    }
}

/// Validated signup data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSignup {
    pub name: String,
    pub email: Email,
    pub password: String,
}

/// Validates a signup request, reporting every failing field.
///
/// # Errors
///
/// Returns a `ValidationError` listing each invalid field.
pub fn validate_signup(request: &SignupRequest) -> Result<ValidatedSignup, ValidationError> {
    let mut errors = ValidationError::new(Vec::new());
    let name = errors.collect(validate_name(&request.name));
    let email = errors.collect(validate_email(&request.email));
    let password = errors.collect(validate_password(&request.password));

    match (name, email, password) {
        (Some(name), Some(email), Some(password)) if errors.is_empty() => Ok(ValidatedSignup {
            name,
            email,
            password,
        }),
        _ => Err(errors),
    }
}

/// Validates a display name.
///
/// # Errors
///
/// Returns a `ValidationError` if the name is blank or too long.
pub fn validate_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::single("name", "Name is required"));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::single(
            "name",
            format!("Name must not exceed {MAX_NAME_LENGTH} characters"),
        ));
    }
    Ok(name.to_string())
}

/// Validates and normalizes an e-mail address.
///
/// # Errors
///
/// Returns a `ValidationError` if the address is malformed.
pub fn validate_email(email: &str) -> Result<Email, ValidationError> {
    Email::parse(email).ok_or_else(|| ValidationError::single("email", "Email is invalid"))
}

/// Validates a new password.
///
/// # Errors
///
/// Returns a `ValidationError` if the password length is out of bounds.
pub fn validate_password(password: &str) -> Result<String, ValidationError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::single(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
        ));
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::single(
            "password",
            format!("Password must not exceed {MAX_PASSWORD_LENGTH} characters"),
        ));
    }
    Ok(password.to_string())
}

// =============================================================================
// Task DTOs
// =============================================================================

/// Request DTO for creating a task.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Board column; defaults to `todo`.
    #[serde(default)]
    pub status: Option<String>,
    /// Priority; defaults to `low`.
    #[serde(default)]
    pub priority: Option<String>,
    /// `""`, `YYYY-MM-DD` or RFC 3339.
    #[serde(default)]
    pub due_date: Option<String>,
}

/// Request DTO for a partial task update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    /// An empty string clears the description.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    /// An empty string clears the due date.
    #[serde(default)]
    pub due_date: Option<String>,
    /// Expected current version for optimistic locking.
    #[serde(default)]
    pub version: Option<u64>,
}

/// Request DTO for moving a task to another column.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub version: Option<u64>,
}

/// Request DTO for `POST /api/tasks/board/move`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveTaskRequest {
    #[serde(default)]
    pub task_id: String,
    #[serde(default)]
    pub destination: String,
}

/// Query DTO for listing tasks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskListQuery {
    /// `all`, `low`, `medium` or `high`.
    pub priority: Option<String>,
    /// `all`, `todo`, `inProgress` or `completed`.
    pub status: Option<String>,
    /// `asc` sorts by due date ascending; anything else descending.
    pub sort: Option<String>,
}

/// Response DTO for a task.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub author: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub due_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub version: u64,
}

impl From<&Task> for TaskResponse {
    fn from(task: &Task) -> Self {
        Self {
            id: task.task_id.to_string(),
            author: task.author.to_string(),
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            priority: task.priority,
            due_date: task.due_date.map(|due| due.to_string()),
            created_at: task.created_at.to_string(),
            updated_at: task.updated_at.to_string(),
            version: task.version,
        }
    }
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self::from(&task)
    }
}

/// Response DTO for a board.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardResponse {
    pub todo: Vec<TaskResponse>,
    pub in_progress: Vec<TaskResponse>,
    pub completed: Vec<TaskResponse>,
    pub counts: ColumnCounts,
}

impl From<Board> for BoardResponse {
    fn from(board: Board) -> Self {
        let counts = board.counts();
        let (todo, in_progress, completed) = board.into_columns();
        Self {
            todo: todo.into_iter().map(TaskResponse::from).collect(),
            in_progress: in_progress.into_iter().map(TaskResponse::from).collect(),
            completed: completed.into_iter().map(TaskResponse::from).collect(),
            counts,
        }
    }
}

/// Validated task creation data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCreateTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub due_date: Option<Timestamp>,
}

/// Validates a task creation request, reporting every failing field.
///
/// # Errors
///
/// Returns a `ValidationError` listing each invalid field.
pub fn validate_create_task(
    request: &CreateTaskRequest,
) -> Result<ValidatedCreateTask, ValidationError> {
    let mut errors = ValidationError::new(Vec::new());
    let title = errors.collect(validate_title(&request.title));
    let description = errors.collect(validate_description(request.description.as_deref()));
    let status = errors.collect(
        request
            .status
            .as_deref()
            .map_or(Ok(TaskStatus::Todo), validate_status),
    );
    let priority = errors.collect(
        request
            .priority
            .as_deref()
            .map_or(Ok(Priority::Low), validate_priority),
    );
    let due_date = errors.collect(
        request
            .due_date
            .as_deref()
            .map_or(Ok(None), parse_due_date),
    );

    match (title, description, status, priority, due_date) {
        (Some(title), Some(description), Some(status), Some(priority), Some(due_date))
            if errors.is_empty() =>
        {
            Ok(ValidatedCreateTask {
                title,
                description,
                status,
                priority,
                due_date,
            })
        }
        _ => Err(errors),
    }
}

/// Validated partial task update. `None` means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedUpdateTask {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<Timestamp>>,
    pub version: Option<u64>,
}

impl ValidatedUpdateTask {
    /// Applies the changes to `task`, without touching its version.
    #[must_use]
    pub fn apply(self, task: Task) -> Task {
        let task = match self.title {
            Some(title) => task.with_title(title),
            None => task,
        };
        let task = match self.description {
            Some(description) => task.with_description(description),
            None => task,
        };
        let task = match self.status {
            Some(status) => task.with_status(status),
            None => task,
        };
        let task = match self.priority {
            Some(priority) => task.with_priority(priority),
            None => task,
        };
        match self.due_date {
            Some(due_date) => task.with_due_date(due_date),
            None => task,
        }
    }
}

/// Validates a partial task update, reporting every failing field.
///
/// # Errors
///
/// Returns a `ValidationError` listing each invalid field.
pub fn validate_update_task(
    request: &UpdateTaskRequest,
) -> Result<ValidatedUpdateTask, ValidationError> {
    let mut errors = ValidationError::new(Vec::new());
    let title = errors.collect(request.title.as_deref().map(validate_title).transpose());
    let description = errors.collect(
        request
            .description
            .as_deref()
            .map(|description| validate_description(Some(description)))
            .transpose(),
    );
    let status = errors.collect(request.status.as_deref().map(validate_status).transpose());
    let priority = errors.collect(
        request
            .priority
            .as_deref()
            .map(validate_priority)
            .transpose(),
    );
    let due_date = errors.collect(request.due_date.as_deref().map(parse_due_date).transpose());

    match (title, description, status, priority, due_date) {
        (Some(title), Some(description), Some(status), Some(priority), Some(due_date))
            if errors.is_empty() =>
        {
            Ok(ValidatedUpdateTask {
                title,
                description,
                status,
                priority,
                due_date,
                version: request.version,
            })
        }
        _ => Err(errors),
    }
}

/// Builds a listing filter from query parameters.
///
/// `all` (or an absent value) disables a filter.
///
/// # Errors
///
/// Returns a `ValidationError` for unknown status or priority values.
pub fn task_filter_from_query(query: &TaskListQuery) -> Result<TaskFilter, ValidationError> {
    let selected = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty() && *value != "all")
            .map(str::to_string)
    };

    let mut errors = ValidationError::new(Vec::new());
    let status = errors.collect(
        selected(&query.status)
            .map(|status| validate_status(&status))
            .transpose(),
    );
    let priority = errors.collect(
        selected(&query.priority)
            .map(|priority| validate_priority(&priority))
            .transpose(),
    );
    let order = if query.sort.as_deref().map(str::trim) == Some("asc") {
        DueDateOrder::Ascending
    } else {
        DueDateOrder::Descending
    };

    match (status, priority) {
        (Some(status), Some(priority)) if errors.is_empty() => Ok(TaskFilter {
            status,
            priority,
            order,
        }),
        _ => Err(errors),
    }
}

// =============================================================================
// Car DTOs
// =============================================================================

/// Request DTO for creating a car listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCarRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Request DTO for a partial car update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCarRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub version: Option<u64>,
}

/// Query DTO for paginated car listings. `page` is 1-based.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CarListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Query DTO for car search.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CarSearchQuery {
    pub keyword: Option<String>,
}

/// Response DTO for a car listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: String,
    pub title: String,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    pub version: u64,
}

impl From<&Car> for CarResponse {
    fn from(car: &Car) -> Self {
        Self {
            id: car.car_id.to_string(),
            user: car.owner.to_string(),
            title: car.title.clone(),
            description: car.description.clone(),
            images: car.images.clone(),
            tags: car.tags.iter().map(|tag| tag.as_str().to_string()).collect(),
            created_at: car.created_at.to_string(),
            updated_at: car.updated_at.to_string(),
            version: car.version,
        }
    }
}

impl From<Car> for CarResponse {
    fn from(car: Car) -> Self {
        Self::from(&car)
    }
}

/// Response DTO for a page of car listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarPageResponse {
    pub matched_cars: Vec<CarResponse>,
    pub current_page: u32,
    pub total_pages: u64,
    pub total_cars: u64,
}

/// `{ "message": ..., "car": ... }` body returned by car updates.
#[derive(Debug, Clone, Serialize)]
pub struct CarUpdatedResponse {
    pub message: &'static str,
    pub car: CarResponse,
}

/// Validated car creation data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCreateCar {
    pub title: String,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub tags: Vec<Tag>,
}

/// Validates a car creation request, reporting every failing field.
///
/// # Errors
///
/// Returns a `ValidationError` listing each invalid field.
pub fn validate_create_car(request: &CreateCarRequest) -> Result<ValidatedCreateCar, ValidationError> {
    let mut errors = ValidationError::new(Vec::new());
    let title = errors.collect(validate_title(&request.title));
    let description = errors.collect(validate_description(request.description.as_deref()));
    let images = errors.collect(validate_images(&request.images));
    let tags = errors.collect(validate_tags(&request.tags));

    match (title, description, images, tags) {
        (Some(title), Some(description), Some(images), Some(tags)) if errors.is_empty() => {
            Ok(ValidatedCreateCar {
                title,
                description,
                images,
                tags,
            })
        }
        _ => Err(errors),
    }
}

/// Validated partial car update. `None` means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedUpdateCar {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub images: Option<Vec<String>>,
    pub tags: Option<Vec<Tag>>,
    pub version: Option<u64>,
}

impl ValidatedUpdateCar {
    /// Applies the changes to `car`, without touching its version.
    #[must_use]
    pub fn apply(self, car: Car) -> Car {
        let car = match self.title {
            Some(title) => car.with_title(title),
            None => car,
        };
        let car = match self.description {
            Some(description) => car.with_description(description),
            None => car,
        };
        let car = match self.images {
            Some(images) => car.with_images(images),
            None => car,
        };
        match self.tags {
            Some(tags) => car.with_tags(tags),
            None => car,
        }
    }
}

/// Validates a partial car update, reporting every failing field.
///
/// # Errors
///
/// Returns a `ValidationError` listing each invalid field.
pub fn validate_update_car(request: &UpdateCarRequest) -> Result<ValidatedUpdateCar, ValidationError> {
    let mut errors = ValidationError::new(Vec::new());
    let title = errors.collect(request.title.as_deref().map(validate_title).transpose());
    let description = errors.collect(
        request
            .description
            .as_deref()
            .map(|description| validate_description(Some(description)))
            .transpose(),
    );
    let images = errors.collect(
        request
            .images
            .as_deref()
            .map(validate_images)
            .transpose(),
    );
    let tags = errors.collect(request.tags.as_deref().map(validate_tags).transpose());

    match (title, description, images, tags) {
        (Some(title), Some(description), Some(images), Some(tags)) if errors.is_empty() => {
            Ok(ValidatedUpdateCar {
                title,
                description,
                images,
                tags,
                version: request.version,
            })
        }
        _ => Err(errors),
    }
}

/// Resolves the 1-based `page` and `limit` query parameters.
///
/// Defaults are page 1 and 20 per page.
///
/// # Errors
///
/// Returns a `ValidationError` if `page` is 0 or `limit` is outside
/// `1..=MAX_PAGE_LIMIT`.
pub fn validate_car_page(query: &CarListQuery) -> Result<(u32, u32), ValidationError> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(20);
    let mut errors = Vec::new();
    if page == 0 {
        errors.push(FieldError::new("page", "Page must be at least 1"));
    }
    if limit == 0 || limit > MAX_PAGE_LIMIT {
        errors.push(FieldError::new(
            "limit",
            format!("Limit must be between 1 and {MAX_PAGE_LIMIT}"),
        ));
    }
    if errors.is_empty() {
        Ok((page, limit))
    } else {
        Err(ValidationError::new(errors))
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Validates a title.
///
/// # Validation Rules
///
/// - Title must not be empty
/// - Title must not exceed 200 characters
///
/// # Errors
///
/// Returns a `ValidationError` if a rule is broken.
pub fn validate_title(title: &str) -> Result<String, ValidationError> {
    let title = title.trim();

    if title.is_empty() {
        return Err(ValidationError::single("title", "Title is required"));
    }

    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ValidationError::single(
            "title",
            format!("Title must not exceed {MAX_TITLE_LENGTH} characters"),
        ));
    }

    Ok(title.to_string())
}

/// Validates a description. Blank descriptions become `None`.
///
/// # Errors
///
/// Returns a `ValidationError` if the description exceeds 5000 characters.
pub fn validate_description(description: Option<&str>) -> Result<Option<String>, ValidationError> {
    description.map_or(Ok(None), |description| {
        let description = description.trim();
        if description.is_empty() {
            Ok(None)
        } else if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            Err(ValidationError::single(
                "description",
                format!("Description must not exceed {MAX_DESCRIPTION_LENGTH} characters"),
            ))
        } else {
            Ok(Some(description.to_string()))
        }
    })
}

/// Parses a board column name.
///
/// # Errors
///
/// Returns a `ValidationError` for unknown names.
pub fn validate_status(status: &str) -> Result<TaskStatus, ValidationError> {
    TaskStatus::parse(status.trim()).ok_or_else(|| {
        ValidationError::single(
            "status",
            "Status must be one of todo, inProgress, completed",
        )
    })
}

/// Parses a priority name.
///
/// # Errors
///
/// Returns a `ValidationError` for unknown names.
pub fn validate_priority(priority: &str) -> Result<Priority, ValidationError> {
    Priority::parse(priority.trim()).ok_or_else(|| {
        ValidationError::single("priority", "Priority must be one of low, medium, high")
    })
}

/// Parses a due date.
///
/// `""` means no due date, `YYYY-MM-DD` is midnight UTC of that day, and
/// RFC 3339 timestamps are converted to UTC.
///
/// # Errors
///
/// Returns a `ValidationError` for any other input.
pub fn parse_due_date(value: &str) -> Result<Option<Timestamp>, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(Some(Timestamp::start_of_day(date)));
    }
    DateTime::parse_from_rfc3339(value)
        .map(|datetime| Some(Timestamp::from_datetime(datetime.with_timezone(&Utc))))
        .map_err(|_| {
            ValidationError::single("dueDate", "Due date must be YYYY-MM-DD or RFC 3339")
        })
}

/// Validates image URLs.
///
/// # Validation Rules
///
/// - At most 10 images
/// - Each URL must start with `http://` or `https://`
///
/// # Errors
///
/// Returns a `ValidationError` listing each broken rule.
pub fn validate_images(images: &[String]) -> Result<Vec<String>, ValidationError> {
    if images.len() > MAX_CAR_IMAGES {
        return Err(ValidationError::single(
            "images",
            format!("A car can only have up to {MAX_CAR_IMAGES} images"),
        ));
    }

    let (valid, errors): (Vec<_>, Vec<_>) = images
        .iter()
        .enumerate()
        .map(|(index, image)| {
            let image = image.trim();
            if image.starts_with("http://") || image.starts_with("https://") {
                Ok(image.to_string())
            } else {
                Err(FieldError::new(
                    format!("images[{index}]"),
                    "Image must be an http(s) URL",
                ))
            }
        })
        .partition(Result::is_ok);

    if errors.is_empty() {
        Ok(valid.into_iter().filter_map(Result::ok).collect())
    } else {
        Err(ValidationError::new(
            errors.into_iter().filter_map(Result::err).collect(),
        ))
    }
}

/// Validates a list of tags.
///
/// # Validation Rules
///
/// - Each tag must not be empty
/// - Each tag must not exceed 50 characters
/// - Maximum 20 tags allowed
///
/// # Errors
///
/// Returns a `ValidationError` listing each broken rule.
pub fn validate_tags(tags: &[String]) -> Result<Vec<Tag>, ValidationError> {
    if tags.len() > MAX_TAGS {
        return Err(ValidationError::single(
            "tags",
            format!("Maximum {MAX_TAGS} tags allowed"),
        ));
    }

    let (validated_tags, errors): (Vec<_>, Vec<_>) = tags
        .iter()
        .enumerate()
        .map(|(index, tag)| {
            let tag = tag.trim();
            if tag.is_empty() {
                Err(FieldError::new(
                    format!("tags[{index}]"),
                    "Tag must not be empty",
                ))
            } else if tag.chars().count() > MAX_TAG_LENGTH {
                Err(FieldError::new(
                    format!("tags[{index}]"),
                    format!("Tag must not exceed {MAX_TAG_LENGTH} characters"),
                ))
            } else {
                Ok(Tag::new(tag))
            }
        })
        .partition(Result::is_ok);

    if errors.is_empty() {
        Ok(validated_tags.into_iter().filter_map(Result::ok).collect())
    } else {
        Err(ValidationError::new(
            errors.into_iter().filter_map(Result::err).collect(),
        ))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CarId, TaskId, UserId};
    use rstest::rstest;

    fn fields(error: &ValidationError) -> Vec<&str> {
        error.errors.iter().map(|error| error.field.as_str()).collect()
    }

    // -------------------------------------------------------------------------
    // Response Tests
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_task_response_wire_format() {
        let due = parse_due_date("2024-05-01").unwrap();
        let task = Task::new(TaskId::generate(), UserId::generate(), "Ship", Timestamp::now())
            .with_status(TaskStatus::InProgress)
            .with_priority(Priority::High)
            .with_due_date(due);

        let json = serde_json::to_value(TaskResponse::from(&task)).unwrap();

        assert_eq!(json["_id"], task.task_id.to_string());
        assert_eq!(json["status"], "inProgress");
        assert_eq!(json["priority"], "high");
        assert_eq!(json["dueDate"], "2024-05-01T00:00:00Z");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("id").is_none());
    }

    #[rstest]
    fn test_car_response_wire_format() {
        let car = Car::new(CarId::generate(), UserId::generate(), "Civic", Timestamp::now())
            .with_tags(vec![Tag::new("Honda")]);

        let json = serde_json::to_value(CarResponse::from(&car)).unwrap();

        assert_eq!(json["_id"], car.car_id.to_string());
        assert_eq!(json["user"], car.owner.to_string());
        assert_eq!(json["tags"], serde_json::json!(["honda"]));
    }

    #[rstest]
    fn test_board_response_columns() {
        let author = UserId::generate();
        let board = Board::from_tasks(vec![
            Task::new(TaskId::generate(), author.clone(), "a", Timestamp::now()),
            Task::new(TaskId::generate(), author, "b", Timestamp::now())
                .with_status(TaskStatus::Completed),
        ]);

        let json = serde_json::to_value(BoardResponse::from(board)).unwrap();

        assert_eq!(json["todo"].as_array().map(Vec::len), Some(1));
        assert_eq!(json["inProgress"].as_array().map(Vec::len), Some(0));
        assert_eq!(json["counts"]["completed"], 1);
    }

    // -------------------------------------------------------------------------
    // Auth Validation Tests
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_validate_signup_normalizes() {
        let request = SignupRequest {
            name: "  Ada  ".to_string(),
            email: " Ada@Example.COM ".to_string(),
            password: "secret1".to_string(),
        };

        let validated = validate_signup(&request).unwrap();

        assert_eq!(validated.name, "Ada");
        assert_eq!(validated.email.as_str(), "ada@example.com");
    }

    #[rstest]
    fn test_validate_signup_reports_every_field() {
        let request = SignupRequest {
            name: String::new(),
            email: "nope".to_string(),
            password: "123".to_string(),
        };

        let error = validate_signup(&request).unwrap_err();

        assert_eq!(fields(&error), vec!["name", "email", "password"]);
    }

    // -------------------------------------------------------------------------
    // Task Validation Tests
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_validate_create_task_defaults() {
        let request = CreateTaskRequest {
            title: "Write docs".to_string(),
            ..CreateTaskRequest::default()
        };

        let validated = validate_create_task(&request).unwrap();

        assert_eq!(validated.status, TaskStatus::Todo);
        assert_eq!(validated.priority, Priority::Low);
        assert_eq!(validated.due_date, None);
        assert_eq!(validated.description, None);
    }

    #[rstest]
    fn test_validate_create_task_invalid_fields() {
        let request = CreateTaskRequest {
            title: "   ".to_string(),
            status: Some("done".to_string()),
            priority: Some("urgent".to_string()),
            due_date: Some("tomorrow".to_string()),
            ..CreateTaskRequest::default()
        };

        let error = validate_create_task(&request).unwrap_err();

        assert_eq!(fields(&error), vec!["title", "status", "priority", "dueDate"]);
    }

    #[rstest]
    fn test_validate_update_task_distinguishes_clear_from_absent() {
        let request = UpdateTaskRequest {
            description: Some(String::new()),
            due_date: Some(String::new()),
            version: Some(3),
            ..UpdateTaskRequest::default()
        };

        let validated = validate_update_task(&request).unwrap();

        assert_eq!(validated.title, None);
        assert_eq!(validated.description, Some(None));
        assert_eq!(validated.due_date, Some(None));
        assert_eq!(validated.version, Some(3));
    }

    #[rstest]
    fn test_validated_update_task_apply() {
        let task = Task::new(TaskId::generate(), UserId::generate(), "Old", Timestamp::now())
            .with_description(Some("keep me".to_string()));
        let update = ValidatedUpdateTask {
            title: Some("New".to_string()),
            priority: Some(Priority::Medium),
            ..ValidatedUpdateTask::default()
        };

        let updated = update.apply(task);

        assert_eq!(updated.title, "New");
        assert_eq!(updated.priority, Priority::Medium);
        assert_eq!(updated.description.as_deref(), Some("keep me"));
        assert_eq!(updated.version, 1);
    }

    #[rstest]
    #[case("", None)]
    #[case("2024-02-29", Some("2024-02-29T00:00:00Z"))]
    #[case("2024-02-29T10:30:00+02:00", Some("2024-02-29T08:30:00Z"))]
    fn test_parse_due_date(#[case] input: &str, #[case] expected: Option<&str>) {
        let parsed = parse_due_date(input).unwrap();

        assert_eq!(parsed.map(|due| due.to_string()).as_deref(), expected);
    }

    #[rstest]
    #[case("2023-02-29")]
    #[case("29/02/2024")]
    fn test_parse_due_date_invalid(#[case] input: &str) {
        assert!(parse_due_date(input).is_err());
    }

    #[rstest]
    #[case(None, None, None, None, DueDateOrder::Descending)]
    #[case(Some("all"), Some("all"), Some("desc"), None, DueDateOrder::Descending)]
    #[case(
        Some("inProgress"),
        Some("high"),
        Some("asc"),
        Some((TaskStatus::InProgress, Priority::High)),
        DueDateOrder::Ascending
    )]
    fn test_task_filter_from_query(
        #[case] status: Option<&str>,
        #[case] priority: Option<&str>,
        #[case] sort: Option<&str>,
        #[case] selected: Option<(TaskStatus, Priority)>,
        #[case] order: DueDateOrder,
    ) {
        let query = TaskListQuery {
            status: status.map(str::to_string),
            priority: priority.map(str::to_string),
            sort: sort.map(str::to_string),
        };

        let filter = task_filter_from_query(&query).unwrap();

        assert_eq!(filter.status, selected.map(|(status, _)| status));
        assert_eq!(filter.priority, selected.map(|(_, priority)| priority));
        assert_eq!(filter.order, order);
    }

    #[rstest]
    fn test_task_filter_from_query_rejects_unknown_values() {
        let query = TaskListQuery {
            status: Some("archived".to_string()),
            ..TaskListQuery::default()
        };

        assert_eq!(
            fields(&task_filter_from_query(&query).unwrap_err()),
            vec!["status"]
        );
    }

    // -------------------------------------------------------------------------
    // Car Validation Tests
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_validate_images_limit() {
        let images: Vec<String> = (0..=MAX_CAR_IMAGES)
            .map(|index| format!("https://img.example.com/{index}.jpg"))
            .collect();

        let error = validate_images(&images).unwrap_err();

        assert_eq!(error.errors[0].message, "A car can only have up to 10 images");
    }

    #[rstest]
    fn test_validate_images_requires_urls() {
        let images = vec![
            "https://img.example.com/1.jpg".to_string(),
            "file:///etc/passwd".to_string(),
        ];

        assert_eq!(fields(&validate_images(&images).unwrap_err()), vec!["images[1]"]);
    }

    #[rstest]
    fn test_validate_tags_rules() {
        assert_eq!(validate_tags(&["SUV".to_string()]).unwrap(), vec![Tag::new("suv")]);
        assert!(validate_tags(&[String::new()]).is_err());
        assert!(validate_tags(&["a".repeat(51)]).is_err());
        let many: Vec<String> = (0..21).map(|index| format!("tag{index}")).collect();
        assert!(validate_tags(&many).is_err());
    }

    #[rstest]
    fn test_validate_update_car_leaves_absent_fields() {
        let car = Car::new(CarId::generate(), UserId::generate(), "Civic", Timestamp::now())
            .with_images(vec!["https://img.example.com/1.jpg".to_string()]);
        let request = UpdateCarRequest {
            title: Some("Accord".to_string()),
            ..UpdateCarRequest::default()
        };

        let updated = validate_update_car(&request).unwrap().apply(car);

        assert_eq!(updated.title, "Accord");
        assert_eq!(updated.images.len(), 1);
    }

    #[rstest]
    #[case(None, None, Ok((1, 20)))]
    #[case(Some(3), Some(5), Ok((3, 5)))]
    #[case(Some(0), None, Err(vec!["page"]))]
    #[case(None, Some(101), Err(vec!["limit"]))]
    fn test_validate_car_page(
        #[case] page: Option<u32>,
        #[case] limit: Option<u32>,
        #[case] expected: Result<(u32, u32), Vec<&str>>,
    ) {
        let result = validate_car_page(&CarListQuery { page, limit });

        match expected {
            Ok(pair) => assert_eq!(result.unwrap(), pair),
            Err(expected_fields) => assert_eq!(fields(&result.unwrap_err()), expected_fields),
        }
    }
}
