//! User domain model.

use im::Vector;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::task::{TaskId, Timestamp};

/// Unique identifier for a user.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a `UserId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Generates a new time-ordered `UserId` (UUID v7).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A normalized e-mail address.
///
/// Addresses are trimmed and lower-cased so that lookups are
/// case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// Parses and normalizes an address.
    ///
    /// Returns `None` unless the value has exactly one `@` between a
    /// non-empty local part and a non-empty domain, and no whitespace.
    /// Single-label domains such as `localhost` are accepted.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_lowercase();
        let (local, domain) = normalized.split_once('@')?;
        let valid = !local.is_empty()
            && !domain.is_empty()
            && !domain.contains('@')
            && !normalized.chars().any(char::is_whitespace);
        valid.then_some(Self(normalized))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier for the user.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Login address, unique across users.
    pub email: Email,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// Ids of the tasks this user authored, in creation order.
    pub task_ids: Vector<TaskId>,
    /// Timestamp when the account was created.
    pub created_at: Timestamp,
}

impl User {
    /// Creates a user with an empty task list.
    #[must_use]
    pub fn new(
        user_id: UserId,
        name: impl Into<String>,
        email: Email,
        password_hash: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            user_id,
            name: name.into(),
            email,
            password_hash: password_hash.into(),
            task_ids: Vector::new(),
            created_at: timestamp,
        }
    }

    /// Appends a task id to the task list unless it is already present.
    pub fn push_task(&mut self, task_id: TaskId) {
        if !self.task_ids.contains(&task_id) {
            self.task_ids.push_back(task_id);
        }
    }

    /// Removes a task id from the task list. Returns `true` if it was present.
    pub fn pull_task(&mut self, task_id: &TaskId) -> bool {
        let before = self.task_ids.len();
        self.task_ids.retain(|existing| existing != task_id);
        self.task_ids.len() != before
    }
}
