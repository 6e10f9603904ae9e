//! Task domain model.
//!
//! Tasks are the cards of the kanban board. Every task belongs to exactly one
//! author and lives in one of three status columns.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;

// =============================================================================
// Value Objects - Newtypes
// =============================================================================

/// Unique identifier for a task.
///
/// This is a newtype wrapper around UUID to provide type safety.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a `TaskId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Generates a new time-ordered `TaskId` (UUID v7).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A timestamp wrapper for `DateTime<Utc>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a `Timestamp` from a `DateTime<Utc>`.
    #[must_use]
    pub const fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Self(datetime)
    }

    /// Returns the inner `DateTime<Utc>`.
    #[must_use]
    pub const fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the current time as a `Timestamp`.
    ///
    /// **Note**: reads the system clock; call it at the handler boundary.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Returns midnight UTC of the given calendar date.
    #[must_use]
    pub fn start_of_day(date: NaiveDate) -> Self {
        Self(date.and_time(chrono::NaiveTime::MIN).and_utc())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

// =============================================================================
// Enums
// =============================================================================

/// The board column a task sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    /// Not started yet.
    #[default]
    Todo,
    /// Being worked on.
    InProgress,
    /// Done.
    Completed,
}

impl TaskStatus {
    /// All statuses in board column order.
    pub const ALL: [Self; 3] = [Self::Todo, Self::InProgress, Self::Completed];

    /// Returns the wire name of the status (`todo`, `inProgress`, `completed`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "inProgress",
            Self::Completed => "completed",
        }
    }

    /// Parses a wire name. Returns `None` for unknown values.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == value)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// The priority level of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum Priority {
    /// Low priority (value: 0).
    #[default]
    Low,
    /// Medium priority (value: 1).
    Medium,
    /// High priority (value: 2).
    High,
}

impl Priority {
    /// All priorities from lowest to highest.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Returns the numeric value of the priority.
    ///
    /// Higher values indicate higher priority.
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }

    /// Returns the wire name of the priority.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Parses a wire name. Returns `None` for unknown values.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|priority| priority.as_str() == value)
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value().cmp(&other.value())
    }
}

// =============================================================================
// Task
// =============================================================================

/// A card on the board.
///
/// Updates are expressed as builder-style methods that consume the task and
/// return the modified copy; persistence bumps `version` through
/// [`Task::increment_version`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[allow(clippy::struct_field_names)]
pub struct Task {
    /// Unique identifier for the task.
    pub task_id: TaskId,
    /// The user who created (and owns) the task.
    pub author: UserId,
    /// Title of the task.
    pub title: String,
    /// Optional detailed description.
    pub description: Option<String>,
    /// Current board column.
    pub status: TaskStatus,
    /// Priority level of the task.
    pub priority: Priority,
    /// Optional due date.
    pub due_date: Option<Timestamp>,
    /// Timestamp when the task was created.
    pub created_at: Timestamp,
    /// Timestamp when the task was last updated.
    pub updated_at: Timestamp,
    /// Version number for optimistic locking.
    pub version: u64,
}

impl Task {
    /// Creates a new task for `author`.
    ///
    /// The task starts in the `todo` column with low priority, no due date
    /// and version 1.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        author: UserId,
        title: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            task_id,
            author,
            title: title.into(),
            description: None,
            status: TaskStatus::Todo,
            priority: Priority::Low,
            due_date: None,
            created_at: timestamp,
            updated_at: timestamp,
            version: 1,
        }
    }

    /// Returns a new task with the given title.
    #[must_use]
    pub fn with_title(self, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..self
        }
    }

    /// Returns a new task with the given description (`None` clears it).
    #[must_use]
    pub fn with_description(self, description: Option<String>) -> Self {
        Self {
            description,
            ..self
        }
    }

    /// Returns a new task with the given status.
    #[must_use]
    pub fn with_status(self, status: TaskStatus) -> Self {
        Self { status, ..self }
    }

    /// Returns a new task with the given priority.
    #[must_use]
    pub fn with_priority(self, priority: Priority) -> Self {
        Self { priority, ..self }
    }

    /// Returns a new task with the given due date (`None` clears it).
    #[must_use]
    pub fn with_due_date(self, due_date: Option<Timestamp>) -> Self {
        Self { due_date, ..self }
    }

    /// Returns a new task with the updated timestamp.
    #[must_use]
    pub fn with_updated_at(self, timestamp: Timestamp) -> Self {
        Self {
            updated_at: timestamp,
            ..self
        }
    }

    /// Returns a new task with an incremented version.
    ///
    /// # Panics
    ///
    /// Panics if the version number overflows `u64::MAX`.
    #[must_use]
    pub fn increment_version(self) -> Self {
        Self {
            version: self
                .version
                .checked_add(1)
                .expect("Version overflow: version number exceeded u64::MAX"),
            ..self
        }
    }

    /// Returns `true` if `user` is the author of this task.
    #[must_use]
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.author == user
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.task_id == other.task_id
    }
}

impl Eq for Task {}

impl std::hash::Hash for Task {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.task_id.hash(state);
    }
}

// =============================================================================
// Listing
// =============================================================================

/// Sort order for task listings, keyed on the due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DueDateOrder {
    /// Earliest due date first; undated tasks come first.
    Ascending,
    /// Latest due date first; undated tasks come last.
    #[default]
    Descending,
}

impl DueDateOrder {
    /// Compares two tasks by due date in this order.
    ///
    /// A missing due date counts as the smallest value. Ties fall back to
    /// creation time so listings are stable.
    #[must_use]
    pub fn compare(self, left: &Task, right: &Task) -> Ordering {
        let ordering = left
            .due_date
            .cmp(&right.due_date)
            .then_with(|| left.created_at.cmp(&right.created_at));
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

/// Filter applied when listing one author's tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskFilter {
    /// Only tasks in this column.
    pub status: Option<TaskStatus>,
    /// Only tasks with this priority.
    pub priority: Option<Priority>,
    /// Due-date ordering.
    pub order: DueDateOrder,
}

impl TaskFilter {
    /// Returns `true` if the task passes the status and priority filters.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.status.is_none_or(|status| task.status == status)
            && self.priority.is_none_or(|priority| task.priority == priority)
    }

    /// Filters and sorts `tasks` according to this filter.
    #[must_use]
    pub fn apply(&self, tasks: impl IntoIterator<Item = Task>) -> Vec<Task> {
        let mut selected: Vec<Task> = tasks.into_iter().filter(|task| self.matches(task)).collect();
        selected.sort_by(|left, right| self.order.compare(left, right));
        selected
    }
}

// =============================================================================
// Tests
// =============================================================================
