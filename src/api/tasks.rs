//! Task handlers.
//!
//! Every route acts on the caller's own tasks. Reads never reveal another
//! user's task and writes to one are refused with 403.
//!
//! Writes bump the task `version`. Clients may send the version they last
//! saw; a stale version is refused with 409 instead of overwriting.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use super::dto::{
    BoardResponse, CreateTaskRequest, Envelope, MessageResponse, MoveTaskRequest, TaskListQuery,
    TaskResponse, UpdateStatusRequest, UpdateTaskRequest, ValidatedCreateTask,
    task_filter_from_query, validate_create_task, validate_status, validate_update_task,
};
use super::error::{ApiErrorResponse, ValidationError};
use super::extract::{ApiJson, ApiQuery, AuthenticatedUser};
use super::handlers::AppState;
use crate::domain::{
    Board, BoardMove, DueDateOrder, Task, TaskFilter, TaskId, TaskStatus, Timestamp, UserId,
};
use crate::infrastructure::RepositoryError;

const TASK_NOT_FOUND_MESSAGE: &str = "Task Not Found!";
const TASK_UPDATED_MESSAGE: &str = "Task Updated Successfully!";

// =============================================================================
// Helpers
// =============================================================================

fn task_not_found() -> ApiErrorResponse {
    ApiErrorResponse::not_found(TASK_NOT_FOUND_MESSAGE)
}

/// Parses a task id from a path or body value. Malformed ids cannot exist.
fn parse_task_id(value: &str) -> Option<TaskId> {
    Uuid::parse_str(value.trim()).ok().map(TaskId::from_uuid)
}

/// Loads a task the caller owns.
///
/// Missing tasks are 404 and tasks owned by someone else are 403.
async fn load_owned_task(
    state: &AppState,
    caller: &AuthenticatedUser,
    id: &str,
) -> Result<Task, ApiErrorResponse> {
    let task_id = parse_task_id(id).ok_or_else(task_not_found)?;
    let task = state
        .task_repository
        .find_by_id(&task_id)
        .await?
        .ok_or_else(task_not_found)?;

    if !task.is_owned_by(&caller.user_id) {
        tracing::warn!(
            task_id = %task.task_id,
            caller = %caller.user_id,
            "Refused access to another user's task"
        );
        return Err(ApiErrorResponse::forbidden(
            "You are not authorized to modify this task",
        ));
    }
    Ok(task)
}

/// Refuses a write made against a version other than the stored one.
pub(super) fn check_expected_version(
    expected: Option<u64>,
    current: u64,
) -> Result<(), ApiErrorResponse> {
    match expected {
        Some(expected) if expected != current => Err(ApiErrorResponse::from(
            RepositoryError::VersionConflict {
                expected: current,
                found: expected,
            },
        )),
        _ => Ok(()),
    }
}

/// Builds a new task from validated input.
fn build_task(
    task_id: TaskId,
    author: UserId,
    validated: ValidatedCreateTask,
    timestamp: Timestamp,
) -> Task {
    Task::new(task_id, author, validated.title, timestamp)
        .with_description(validated.description)
        .with_status(validated.status)
        .with_priority(validated.priority)
        .with_due_date(validated.due_date)
}

/// Loads the caller's board, earliest due date first within each column.
async fn load_board(state: &AppState, author: &UserId) -> Result<Board, ApiErrorResponse> {
    let filter = TaskFilter {
        order: DueDateOrder::Ascending,
        ..TaskFilter::default()
    };
    let tasks = state.task_repository.list_for_author(author, filter).await?;
    Ok(Board::from_tasks(tasks))
}

// =============================================================================
// Handlers
// =============================================================================

/// Creates a task for the caller and appends it to their task list.
///
/// # Errors
///
/// Returns 400 for invalid input, 401 if the caller's account is gone and
/// 500 for repository failures.
pub async fn create_task(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    ApiJson(request): ApiJson<CreateTaskRequest>,
) -> Result<Json<Envelope<TaskResponse>>, ApiErrorResponse> {
    let validated = validate_create_task(&request)?;
    let task = build_task(
        TaskId::generate(),
        caller.user_id.clone(),
        validated,
        Timestamp::now(),
    );

    state
        .task_repository
        .insert_for_author(&task)
        .await
        .map_err(|error| match error {
            RepositoryError::NotFound(_) => ApiErrorResponse::unauthorized("Unauthorized"),
            other => ApiErrorResponse::from(other),
        })?;

    tracing::debug!(task_id = %task.task_id, author = %task.author, "Task created");
    Ok(Json(Envelope::new(
        "Task Created Successfully!",
        TaskResponse::from(&task),
    )))
}

/// Lists the caller's tasks.
///
/// # Query Parameters
///
/// - `priority`: `all` | `low` | `medium` | `high`
/// - `status`: `all` | `todo` | `inProgress` | `completed`
/// - `sort`: `asc` for earliest due date first, anything else for latest first
///
/// # Errors
///
/// Returns 400 for unknown filter values and 500 for repository failures.
pub async fn get_all_tasks(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    ApiQuery(query): ApiQuery<TaskListQuery>,
) -> Result<Json<Envelope<Vec<TaskResponse>>>, ApiErrorResponse> {
    let filter = task_filter_from_query(&query)?;
    let tasks = state
        .task_repository
        .list_for_author(&caller.user_id, filter)
        .await?;

    Ok(Json(Envelope::new(
        "Tasks Fetched Successfully!",
        tasks.iter().map(TaskResponse::from).collect(),
    )))
}

/// Applies a partial update to one of the caller's tasks.
///
/// # Errors
///
/// Returns 404 for unknown tasks, 403 for other users' tasks, 400 for
/// invalid input and 409 for a stale `version`.
pub async fn update_task(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateTaskRequest>,
) -> Result<Json<Envelope<TaskResponse>>, ApiErrorResponse> {
    let current = load_owned_task(&state, &caller, &id).await?;
    let changes = validate_update_task(&request)?;
    check_expected_version(changes.version, current.version)?;

    let updated = changes
        .apply(current)
        .with_updated_at(Timestamp::now())
        .increment_version();
    state.task_repository.save(&updated).await?;

    tracing::debug!(task_id = %updated.task_id, version = updated.version, "Task updated");
    Ok(Json(Envelope::new(
        TASK_UPDATED_MESSAGE,
        TaskResponse::from(&updated),
    )))
}

/// Moves one of the caller's tasks to another column.
///
/// Moving a task to the column it is already in changes nothing.
///
/// # Errors
///
/// Returns 404 for unknown tasks, 403 for other users' tasks, 400 for an
/// unknown status and 409 for a stale `version`.
pub async fn update_task_status(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateStatusRequest>,
) -> Result<Json<Envelope<TaskResponse>>, ApiErrorResponse> {
    let current = load_owned_task(&state, &caller, &id).await?;
    let status = validate_status(&request.status)?;
    check_expected_version(request.version, current.version)?;

    if current.status == status {
        return Ok(Json(Envelope::new(
            TASK_UPDATED_MESSAGE,
            TaskResponse::from(&current),
        )));
    }

    let updated = current
        .with_status(status)
        .with_updated_at(Timestamp::now())
        .increment_version();
    state.task_repository.save(&updated).await?;

    tracing::debug!(task_id = %updated.task_id, status = %status, "Task status changed");
    Ok(Json(Envelope::new(
        TASK_UPDATED_MESSAGE,
        TaskResponse::from(&updated),
    )))
}

/// Deletes one of the caller's tasks and removes it from their task list.
///
/// # Errors
///
/// Returns 404 for unknown tasks and 403 for other users' tasks.
pub async fn delete_task(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiErrorResponse> {
    let task = load_owned_task(&state, &caller, &id).await?;

    let deleted = state
        .task_repository
        .delete_for_author(&task.task_id, &caller.user_id)
        .await?;
    if !deleted {
        return Err(task_not_found());
    }

    tracing::debug!(task_id = %task.task_id, "Task deleted");
    Ok(Json(MessageResponse {
        message: "Task Successfully Deleted!",
    }))
}

/// Returns the caller's board.
///
/// # Errors
///
/// Returns 500 for repository failures.
pub async fn get_board(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
) -> Result<Json<Envelope<BoardResponse>>, ApiErrorResponse> {
    let board = load_board(&state, &caller.user_id).await?;
    Ok(Json(Envelope::new(
        "Board Fetched Successfully!",
        BoardResponse::from(board),
    )))
}

/// Drops a card on a column and returns the resulting board.
///
/// The moved card goes to the end of the destination column. Dropping a
/// card on its own column writes nothing.
///
/// # Errors
///
/// Returns 400 for an unknown destination, 404 if the task is not on the
/// caller's board and 409 if the task changed concurrently.
pub async fn move_task(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    ApiJson(request): ApiJson<MoveTaskRequest>,
) -> Result<Json<Envelope<BoardResponse>>, ApiErrorResponse> {
    let destination = TaskStatus::parse(request.destination.trim()).ok_or_else(|| {
        ValidationError::single(
            "destination",
            "Destination must be one of todo, inProgress, completed",
        )
    })?;
    let task_id = parse_task_id(&request.task_id).ok_or_else(task_not_found)?;
    let board = load_board(&state, &caller.user_id).await?;

    let board = match board.move_task(&task_id, destination, Timestamp::now()) {
        BoardMove::NotFound => return Err(task_not_found()),
        BoardMove::Unchanged => board,
        BoardMove::Moved { board, task } => {
            let saved = task.increment_version();
            state.task_repository.save(&saved).await?;
            tracing::debug!(task_id = %saved.task_id, status = %destination, "Card moved");
            board.replace(saved)
        }
    };

    Ok(Json(Envelope::new(
        TASK_UPDATED_MESSAGE,
        BoardResponse::from(board),
    )))
}
