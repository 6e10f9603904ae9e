//! `PostgreSQL` document-store implementations.
//!
//! Each collection is a table whose `data` column holds the serde-serialized
//! document as JSONB. A few fields are denormalized into plain columns for
//! lookups and ordering.
//!
//! # Features
//!
//! - Connection pooling with `sqlx::PgPool`
//! - Optimistic locking with version checking (`SELECT ... FOR UPDATE`)
//! - Task create/delete and the author's `task_ids` update share one
//!   transaction
//!
//! # Table Schema
//!
//! ```sql
//! CREATE TABLE users (
//!     id UUID PRIMARY KEY,
//!     email TEXT NOT NULL UNIQUE,
//!     data JSONB NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//!
//! CREATE TABLE tasks (
//!     id UUID PRIMARY KEY,
//!     author_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     due_date TIMESTAMPTZ,
//!     data JSONB NOT NULL,
//!     version BIGINT NOT NULL DEFAULT 1,
//!     created_at TIMESTAMPTZ NOT NULL,
//!     updated_at TIMESTAMPTZ NOT NULL
//! );
//!
//! CREATE TABLE cars (
//!     id UUID PRIMARY KEY,
//!     owner_id UUID NOT NULL,
//!     data JSONB NOT NULL,
//!     version BIGINT NOT NULL DEFAULT 1,
//!     created_at TIMESTAMPTZ NOT NULL,
//!     updated_at TIMESTAMPTZ NOT NULL
//! );
//! ```

use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::{
    Car, CarId, DueDateOrder, Email, Task, TaskFilter, TaskId, User, UserId,
};
use crate::infrastructure::{
    CarRepository, PaginatedResult, Pagination, RepositoryError, RepositoryFuture, TaskRepository,
    UserRepository, check_successor,
};

/// Statements run by [`ensure_schema`], in order.
const SCHEMA_STATEMENTS: [&str; 7] = [
    "CREATE TABLE IF NOT EXISTS users (\
        id UUID PRIMARY KEY, \
        email TEXT NOT NULL UNIQUE, \
        data JSONB NOT NULL, \
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW())",
    "CREATE TABLE IF NOT EXISTS tasks (\
        id UUID PRIMARY KEY, \
        author_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE, \
        due_date TIMESTAMPTZ, \
        data JSONB NOT NULL, \
        version BIGINT NOT NULL DEFAULT 1, \
        created_at TIMESTAMPTZ NOT NULL, \
        updated_at TIMESTAMPTZ NOT NULL)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_author_id ON tasks(author_id)",
    "CREATE TABLE IF NOT EXISTS cars (\
        id UUID PRIMARY KEY, \
        owner_id UUID NOT NULL, \
        data JSONB NOT NULL, \
        version BIGINT NOT NULL DEFAULT 1, \
        created_at TIMESTAMPTZ NOT NULL, \
        updated_at TIMESTAMPTZ NOT NULL)",
    "CREATE INDEX IF NOT EXISTS idx_cars_owner_id ON cars(owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_cars_created_at ON cars(created_at)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_due_date ON tasks(author_id, due_date)",
];

/// Creates the document tables and indexes if they do not exist.
///
/// # Errors
///
/// Returns `RepositoryError::DatabaseError` if any statement fails.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), RepositoryError> {
    for statement in SCHEMA_STATEMENTS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(database_error)?;
    }
    tracing::info!("Document schema is up to date");
    Ok(())
}

// =============================================================================
// Helper Functions
// =============================================================================

#[allow(clippy::needless_pass_by_value)]
fn database_error(error: sqlx::Error) -> RepositoryError {
    RepositoryError::DatabaseError(error.to_string())
}

fn to_document<T: Serialize>(value: &T) -> Result<serde_json::Value, RepositoryError> {
    serde_json::to_value(value).map_err(|error| RepositoryError::SerializationError(error.to_string()))
}

fn from_document<T: DeserializeOwned>(data: serde_json::Value) -> Result<T, RepositoryError> {
    serde_json::from_value(data).map_err(|error| RepositoryError::SerializationError(error.to_string()))
}

fn from_documents<T: DeserializeOwned>(
    rows: Vec<(serde_json::Value,)>,
) -> Result<Vec<T>, RepositoryError> {
    rows.into_iter().map(|(data,)| from_document(data)).collect()
}

#[allow(clippy::cast_possible_wrap)]
const fn version_to_database(version: u64) -> i64 {
    version as i64
}

#[allow(clippy::cast_sign_loss)]
const fn version_from_database(version: i64) -> u64 {
    version as u64
}

/// Returns `true` if the error is a unique-constraint violation.
fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(|database| database.is_unique_violation())
}

/// Builds the ORDER BY clause for a due-date ordering.
///
/// A missing due date is the smallest value: first ascending, last descending.
const fn due_date_order_clause(order: DueDateOrder) -> &'static str {
    match order {
        DueDateOrder::Ascending => "ORDER BY due_date ASC NULLS FIRST, created_at ASC",
        DueDateOrder::Descending => "ORDER BY due_date DESC NULLS LAST, created_at DESC",
    }
}

/// Loads a user document inside a transaction, locking the row.
async fn lock_user(
    transaction: &mut Transaction<'_, Postgres>,
    user_id: &UserId,
) -> Result<Option<User>, RepositoryError> {
    let row: Option<(serde_json::Value,)> =
        sqlx::query_as("SELECT data FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id.as_uuid())
            .fetch_optional(&mut **transaction)
            .await
            .map_err(database_error)?;
    row.map(|(data,)| from_document(data)).transpose()
}

/// Writes a user document inside a transaction.
async fn store_user(
    transaction: &mut Transaction<'_, Postgres>,
    user: &User,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE users SET data = $1 WHERE id = $2")
        .bind(to_document(user)?)
        .bind(user.user_id.as_uuid())
        .execute(&mut **transaction)
        .await
        .map_err(database_error)?;
    Ok(())
}

// =============================================================================
// PostgreSQL User Repository
// =============================================================================

/// `PostgreSQL` implementation of `UserRepository`.
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a new repository on the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UserRepository for PostgresUserRepository {
    fn find_by_id(&self, id: &UserId) -> RepositoryFuture<Option<User>> {
        let pool = self.pool.clone();
        let user_id = id.clone();
        Box::pin(async move {
            let row: Option<(serde_json::Value,)> =
                sqlx::query_as("SELECT data FROM users WHERE id = $1")
                    .bind(user_id.as_uuid())
                    .fetch_optional(&pool)
                    .await
                    .map_err(database_error)?;
            row.map(|(data,)| from_document(data)).transpose()
        })
    }

    fn find_by_email(&self, email: &Email) -> RepositoryFuture<Option<User>> {
        let pool = self.pool.clone();
        let email = email.clone();
        Box::pin(async move {
            let row: Option<(serde_json::Value,)> =
                sqlx::query_as("SELECT data FROM users WHERE email = $1")
                    .bind(email.as_str())
                    .fetch_optional(&pool)
                    .await
                    .map_err(database_error)?;
            row.map(|(data,)| from_document(data)).transpose()
        })
    }

    fn insert(&self, user: &User) -> RepositoryFuture<()> {
        let pool = self.pool.clone();
        let user = user.clone();
        Box::pin(async move {
            let data = to_document(&user)?;
            sqlx::query("INSERT INTO users (id, email, data, created_at) VALUES ($1, $2, $3, $4)")
                .bind(user.user_id.as_uuid())
                .bind(user.email.as_str())
                .bind(&data)
                .bind(user.created_at.as_datetime())
                .execute(&pool)
                .await
                .map_err(|error| {
                    if is_unique_violation(&error) {
                        RepositoryError::Duplicate(format!(
                            "email {} is already registered",
                            user.email
                        ))
                    } else {
                        database_error(error)
                    }
                })?;
            Ok(())
        })
    }
}

// =============================================================================
// PostgreSQL Task Repository
// =============================================================================

/// `PostgreSQL` implementation of `TaskRepository`.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: PgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository on the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl TaskRepository for PostgresTaskRepository {
    fn find_by_id(&self, id: &TaskId) -> RepositoryFuture<Option<Task>> {
        let pool = self.pool.clone();
        let task_id = id.clone();
        Box::pin(async move {
            let row: Option<(serde_json::Value,)> =
                sqlx::query_as("SELECT data FROM tasks WHERE id = $1")
                    .bind(task_id.as_uuid())
                    .fetch_optional(&pool)
                    .await
                    .map_err(database_error)?;
            row.map(|(data,)| from_document(data)).transpose()
        })
    }

    fn list_for_author(&self, author: &UserId, filter: TaskFilter) -> RepositoryFuture<Vec<Task>> {
        let pool = self.pool.clone();
        let author = author.clone();
        Box::pin(async move {
            let query = format!(
                "SELECT data FROM tasks \
                 WHERE author_id = $1 \
                   AND ($2::text IS NULL OR data->>'status' = $2) \
                   AND ($3::text IS NULL OR data->>'priority' = $3) \
                 {}",
                due_date_order_clause(filter.order)
            );
            let rows: Vec<(serde_json::Value,)> = sqlx::query_as(&query)
                .bind(author.as_uuid())
                .bind(filter.status.map(|status| status.as_str()))
                .bind(filter.priority.map(|priority| priority.as_str()))
                .fetch_all(&pool)
                .await
                .map_err(database_error)?;
            from_documents(rows)
        })
    }

    fn insert_for_author(&self, task: &Task) -> RepositoryFuture<()> {
        let pool = self.pool.clone();
        let task = task.clone();
        Box::pin(async move {
            if task.version != 1 {
                return Err(RepositoryError::VersionConflict {
                    expected: 1,
                    found: task.version,
                });
            }
            let data = to_document(&task)?;
            let mut transaction = pool.begin().await.map_err(database_error)?;

            let mut author = lock_user(&mut transaction, &task.author)
                .await?
                .ok_or_else(|| RepositoryError::NotFound(format!("user {}", task.author)))?;

            sqlx::query(
                "INSERT INTO tasks (id, author_id, due_date, data, version, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(task.task_id.as_uuid())
            .bind(task.author.as_uuid())
            .bind(task.due_date.as_ref().map(|due| *due.as_datetime()))
            .bind(&data)
            .bind(version_to_database(task.version))
            .bind(task.created_at.as_datetime())
            .bind(task.updated_at.as_datetime())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                if is_unique_violation(&error) {
                    RepositoryError::Duplicate(format!("task {}", task.task_id))
                } else {
                    database_error(error)
                }
            })?;

            author.push_task(task.task_id.clone());
            store_user(&mut transaction, &author).await?;

            transaction.commit().await.map_err(database_error)?;
            Ok(())
        })
    }

    fn save(&self, task: &Task) -> RepositoryFuture<()> {
        let pool = self.pool.clone();
        let task = task.clone();
        Box::pin(async move {
            let data = to_document(&task)?;
            let mut transaction = pool.begin().await.map_err(database_error)?;

            let existing: Option<(i64,)> =
                sqlx::query_as("SELECT version FROM tasks WHERE id = $1 FOR UPDATE")
                    .bind(task.task_id.as_uuid())
                    .fetch_optional(&mut *transaction)
                    .await
                    .map_err(database_error)?;
            let (stored_version,) =
                existing.ok_or_else(|| RepositoryError::NotFound(format!("task {}", task.task_id)))?;
            check_successor(version_from_database(stored_version), task.version)?;

            sqlx::query(
                "UPDATE tasks SET data = $1, version = $2, due_date = $3, updated_at = $4 \
                 WHERE id = $5",
            )
            .bind(&data)
            .bind(version_to_database(task.version))
            .bind(task.due_date.as_ref().map(|due| *due.as_datetime()))
            .bind(task.updated_at.as_datetime())
            .bind(task.task_id.as_uuid())
            .execute(&mut *transaction)
            .await
            .map_err(database_error)?;

            transaction.commit().await.map_err(database_error)?;
            Ok(())
        })
    }

    fn delete_for_author(&self, id: &TaskId, author: &UserId) -> RepositoryFuture<bool> {
        let pool = self.pool.clone();
        let task_id = id.clone();
        let author_id = author.clone();
        Box::pin(async move {
            let mut transaction = pool.begin().await.map_err(database_error)?;

            if let Some(mut user) = lock_user(&mut transaction, &author_id).await?
                && user.pull_task(&task_id)
            {
                store_user(&mut transaction, &user).await?;
            }

            let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
                .bind(task_id.as_uuid())
                .execute(&mut *transaction)
                .await
                .map_err(database_error)?;

            transaction.commit().await.map_err(database_error)?;
            Ok(result.rows_affected() > 0)
        })
    }
}

// =============================================================================
// PostgreSQL Car Repository
// =============================================================================

/// `PostgreSQL` implementation of `CarRepository`.
#[derive(Debug, Clone)]
pub struct PostgresCarRepository {
    pool: PgPool,
}

impl PostgresCarRepository {
    /// Creates a new repository on the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escapes `%`, `_` and `\` so the keyword matches literally inside `ILIKE`.
fn escape_like(keyword: &str) -> String {
    keyword
        .chars()
        .fold(String::with_capacity(keyword.len()), |mut escaped, character| {
            if matches!(character, '%' | '_' | '\\') {
                escaped.push('\\');
            }
            escaped.push(character);
            escaped
        })
}

impl CarRepository for PostgresCarRepository {
    fn find_by_id(&self, id: &CarId) -> RepositoryFuture<Option<Car>> {
        let pool = self.pool.clone();
        let car_id = id.clone();
        Box::pin(async move {
            let row: Option<(serde_json::Value,)> =
                sqlx::query_as("SELECT data FROM cars WHERE id = $1")
                    .bind(car_id.as_uuid())
                    .fetch_optional(&pool)
                    .await
                    .map_err(database_error)?;
            row.map(|(data,)| from_document(data)).transpose()
        })
    }

    fn insert(&self, car: &Car) -> RepositoryFuture<()> {
        let pool = self.pool.clone();
        let car = car.clone();
        Box::pin(async move {
            if car.version != 1 {
                return Err(RepositoryError::VersionConflict {
                    expected: 1,
                    found: car.version,
                });
            }
            let data = to_document(&car)?;
            sqlx::query(
                "INSERT INTO cars (id, owner_id, data, version, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(car.car_id.as_uuid())
            .bind(car.owner.as_uuid())
            .bind(&data)
            .bind(version_to_database(car.version))
            .bind(car.created_at.as_datetime())
            .bind(car.updated_at.as_datetime())
            .execute(&pool)
            .await
            .map_err(|error| {
                if is_unique_violation(&error) {
                    RepositoryError::Duplicate(format!("car {}", car.car_id))
                } else {
                    database_error(error)
                }
            })?;
            Ok(())
        })
    }

    fn save(&self, car: &Car) -> RepositoryFuture<()> {
        let pool = self.pool.clone();
        let car = car.clone();
        Box::pin(async move {
            let data = to_document(&car)?;
            let mut transaction = pool.begin().await.map_err(database_error)?;

            let existing: Option<(i64,)> =
                sqlx::query_as("SELECT version FROM cars WHERE id = $1 FOR UPDATE")
                    .bind(car.car_id.as_uuid())
                    .fetch_optional(&mut *transaction)
                    .await
                    .map_err(database_error)?;
            let (stored_version,) =
                existing.ok_or_else(|| RepositoryError::NotFound(format!("car {}", car.car_id)))?;
            check_successor(version_from_database(stored_version), car.version)?;

            sqlx::query("UPDATE cars SET data = $1, version = $2, updated_at = $3 WHERE id = $4")
                .bind(&data)
                .bind(version_to_database(car.version))
                .bind(car.updated_at.as_datetime())
                .bind(car.car_id.as_uuid())
                .execute(&mut *transaction)
                .await
                .map_err(database_error)?;

            transaction.commit().await.map_err(database_error)?;
            Ok(())
        })
    }

    fn delete(&self, id: &CarId) -> RepositoryFuture<bool> {
        let pool = self.pool.clone();
        let car_id = id.clone();
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM cars WHERE id = $1")
                .bind(car_id.as_uuid())
                .execute(&pool)
                .await
                .map_err(database_error)?;
            Ok(result.rows_affected() > 0)
        })
    }

    fn list_by_owner(&self, owner: &UserId) -> RepositoryFuture<Vec<Car>> {
        let pool = self.pool.clone();
        let owner = owner.clone();
        Box::pin(async move {
            let rows: Vec<(serde_json::Value,)> = sqlx::query_as(
                "SELECT data FROM cars WHERE owner_id = $1 ORDER BY created_at ASC, id ASC",
            )
            .bind(owner.as_uuid())
            .fetch_all(&pool)
            .await
            .map_err(database_error)?;
            from_documents(rows)
        })
    }

    fn search(&self, keyword: &str) -> RepositoryFuture<Vec<Car>> {
        let pool = self.pool.clone();
        let keyword = keyword.trim().to_lowercase();
        Box::pin(async move {
            if keyword.is_empty() {
                return Ok(Vec::new());
            }
            let pattern = format!("%{}%", escape_like(&keyword));
            let rows: Vec<(serde_json::Value,)> = sqlx::query_as(
                "SELECT data FROM cars \
                 WHERE data->>'title' ILIKE $1 \
                    OR data->>'description' ILIKE $1 \
                    OR data->'tags' ? $2 \
                 ORDER BY created_at ASC, id ASC",
            )
            .bind(&pattern)
            .bind(&keyword)
            .fetch_all(&pool)
            .await
            .map_err(database_error)?;
            from_documents(rows)
        })
    }

    fn list(&self, pagination: Pagination) -> RepositoryFuture<PaginatedResult<Car>> {
        let pool = self.pool.clone();
        Box::pin(async move {
            let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cars")
                .fetch_one(&pool)
                .await
                .map_err(database_error)?;
            #[allow(clippy::cast_sign_loss)]
            let total = count as u64;

            if total == 0 {
                return Ok(PaginatedResult::new(Vec::new(), 0, pagination));
            }

            #[allow(clippy::cast_possible_wrap)]
            let offset = pagination.offset() as i64;
            let rows: Vec<(serde_json::Value,)> = sqlx::query_as(
                "SELECT data FROM cars ORDER BY created_at ASC, id ASC LIMIT $1 OFFSET $2",
            )
            .bind(i64::from(pagination.limit()))
            .bind(offset)
            .fetch_all(&pool)
            .await
            .map_err(database_error)?;

            Ok(PaginatedResult::new(from_documents(rows)?, total, pagination))
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
