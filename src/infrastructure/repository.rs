//! Repository traits for domain entities.
//!
//! Every operation returns a boxed `Send` future so repositories can be held
//! as `Arc<dyn Trait + Send + Sync>` and swapped at start-up.

use std::time::Duration;

use futures::future::BoxFuture;
use thiserror::Error;

use crate::domain::{Car, CarId, Email, Task, TaskFilter, TaskId, User, UserId};

// =============================================================================
// Repository Error
// =============================================================================

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone)]
pub enum RepositoryError {
    /// Entity was not found.
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// A unique key is already taken.
    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    /// Optimistic locking conflict.
    #[error("Version conflict: expected {expected}, found {found}")]
    VersionConflict { expected: u64, found: u64 },

    /// Database connection or query error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Cache operation error.
    #[error("Cache error: {0}")]
    CacheError(String),
}

/// Future returned by repository operations.
pub type RepositoryFuture<T> = BoxFuture<'static, Result<T, RepositoryError>>;

/// Checks the optimistic-locking rule shared by every backend.
///
/// A stored document at version `n` may only be replaced by version `n + 1`.
///
/// # Errors
///
/// Returns `RepositoryError::VersionConflict` when `incoming` is not the
/// successor of `stored`.
pub const fn check_successor(stored: u64, incoming: u64) -> Result<(), RepositoryError> {
    if incoming == stored.saturating_add(1) {
        Ok(())
    } else {
        Err(RepositoryError::VersionConflict {
            expected: stored.saturating_add(1),
            found: incoming,
        })
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// Pagination parameters for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Page number (0-indexed).
    pub page: u32,
    /// Number of items per page.
    pub page_size: u32,
}

impl Pagination {
    /// Creates new pagination parameters.
    ///
    /// # Panics
    ///
    /// Panics if `page_size` is 0.
    #[must_use]
    pub const fn new(page: u32, page_size: u32) -> Self {
        assert!(page_size > 0, "page_size must be greater than 0");
        Self { page, page_size }
    }

    /// Returns the offset for database queries.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.page as u64 * self.page_size as u64
    }

    /// Returns the limit for database queries.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.page_size
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: 20,
        }
    }
}

/// Paginated result containing items and total count.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    /// The items in the current page.
    pub items: Vec<T>,
    /// Total number of items across all pages.
    pub total: u64,
    /// Current page (0-indexed).
    pub page: u32,
    /// Number of items per page.
    pub page_size: u32,
}

impl<T> PaginatedResult<T> {
    /// Creates a new paginated result.
    #[must_use]
    pub const fn new(items: Vec<T>, total: u64, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            page: pagination.page,
            page_size: pagination.page_size,
        }
    }

    /// Returns the total number of pages.
    #[must_use]
    pub const fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(self.page_size as u64)
    }
}

// =============================================================================
// User Repository
// =============================================================================

/// Repository trait for user accounts.
pub trait UserRepository: Send + Sync {
    /// Finds a user by id.
    fn find_by_id(&self, id: &UserId) -> RepositoryFuture<Option<User>>;

    /// Finds a user by (normalized) e-mail address.
    fn find_by_email(&self, email: &Email) -> RepositoryFuture<Option<User>>;

    /// Inserts a new user.
    ///
    /// Fails with `RepositoryError::Duplicate` when the e-mail is taken.
    fn insert(&self, user: &User) -> RepositoryFuture<()>;
}

// =============================================================================
// Task Repository
// =============================================================================

/// Repository trait for tasks.
///
/// Creation and deletion also maintain the author's `task_ids` list; both
/// documents change together or not at all.
pub trait TaskRepository: Send + Sync {
    /// Finds a task by id.
    fn find_by_id(&self, id: &TaskId) -> RepositoryFuture<Option<Task>>;

    /// Lists the author's tasks, filtered and sorted by `filter`.
    fn list_for_author(&self, author: &UserId, filter: TaskFilter) -> RepositoryFuture<Vec<Task>>;

    /// Inserts a new task (version 1) and appends it to the author's task list.
    ///
    /// Fails with `RepositoryError::NotFound` if the author does not exist.
    fn insert_for_author(&self, task: &Task) -> RepositoryFuture<()>;

    /// Replaces an existing task. The task's version must be the stored
    /// version plus one.
    fn save(&self, task: &Task) -> RepositoryFuture<()>;

    /// Removes the task from the author's task list and deletes it.
    ///
    /// Returns `Ok(true)` if a task document was deleted.
    fn delete_for_author(&self, id: &TaskId, author: &UserId) -> RepositoryFuture<bool>;
}

// =============================================================================
// Car Repository
// =============================================================================

/// Repository trait for car listings.
pub trait CarRepository: Send + Sync {
    /// Finds a listing by id.
    fn find_by_id(&self, id: &CarId) -> RepositoryFuture<Option<Car>>;

    /// Inserts a new listing (version 1).
    fn insert(&self, car: &Car) -> RepositoryFuture<()>;

    /// Replaces an existing listing with optimistic locking.
    fn save(&self, car: &Car) -> RepositoryFuture<()>;

    /// Deletes a listing. Returns `Ok(true)` if it existed.
    fn delete(&self, id: &CarId) -> RepositoryFuture<bool>;

    /// Lists one owner's listings, oldest first.
    fn list_by_owner(&self, owner: &UserId) -> RepositoryFuture<Vec<Car>>;

    /// Lists listings matching `keyword` (see [`Car::matches_keyword`]), oldest first.
    fn search(&self, keyword: &str) -> RepositoryFuture<Vec<Car>>;

    /// Lists all listings with pagination, oldest first.
    fn list(&self, pagination: Pagination) -> RepositoryFuture<PaginatedResult<Car>>;
}

// =============================================================================
// Session Store
// =============================================================================

/// Store of revoked token ids.
///
/// Entries only need to outlive the token they revoke, so each carries a TTL.
pub trait SessionStore: Send + Sync {
    /// Marks a token id as revoked for `ttl`.
    fn revoke(&self, token_id: &str, ttl: Duration) -> RepositoryFuture<()>;

    /// Returns `true` if the token id has been revoked.
    fn is_revoked(&self, token_id: &str) -> RepositoryFuture<bool>;
}

// =============================================================================
// Tests
// =============================================================================
