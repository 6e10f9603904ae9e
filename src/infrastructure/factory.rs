//! Repository factory for runtime backend selection.
//!
//! Documents live either in memory or in `PostgreSQL`; revoked sessions live
//! either in memory or in Redis. Both choices are made from the environment
//! at start-up.
//!
//! # Environment Variables
//!
//! - `STORAGE_MODE`: `in_memory` (default) | `postgres`
//! - `SESSION_STORE`: `in_memory` (default) | `redis`
//! - `DATABASE_URL`: `PostgreSQL` connection URL (required when `STORAGE_MODE=postgres`)
//! - `REDIS_URL`: Redis connection URL (required when `SESSION_STORE=redis`)
//!
//! # Example
//!
//! ```ignore
//! let config = RepositoryConfig::from_env()?;
//! let repositories = RepositoryFactory::new(config).create().await?;
//! let user = repositories.user_repository.find_by_id(&user_id).await?;
//! ```

use std::env;
use std::str::FromStr;
use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;

use super::{
    CarRepository, InMemoryDatabase, InMemorySessionStore, PostgresCarRepository,
    PostgresTaskRepository, PostgresUserRepository, RedisSessionStore, SessionStore,
    TaskRepository, UserRepository, ensure_schema,
};

// =============================================================================
// Configuration Types
// =============================================================================

/// Storage mode for documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// Process-local maps. Suitable for testing and development.
    #[default]
    InMemory,
    /// `PostgreSQL` JSONB tables for production use.
    Postgres,
}

impl FromStr for StorageMode {
    type Err = ConfigurationError;

    /// Parses a storage mode from a string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidStorageMode` if the string is not recognized.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            _ => Err(ConfigurationError::InvalidStorageMode(value.to_string())),
        }
    }
}

/// Backend for revoked session ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStoreMode {
    /// Process-local map. Revocations are lost on restart.
    #[default]
    InMemory,
    /// Redis keys with expiry, shared between instances.
    Redis,
}

impl FromStr for SessionStoreMode {
    type Err = ConfigurationError;

    /// Parses a session store mode from a string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidSessionStoreMode` if the string is not recognized.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(Self::InMemory),
            "redis" => Ok(Self::Redis),
            _ => Err(ConfigurationError::InvalidSessionStoreMode(
                value.to_string(),
            )),
        }
    }
}

/// Configuration for the repository factory.
///
/// Use `RepositoryConfigBuilder` for a fluent API to construct this.
#[derive(Debug, Clone, Default)]
pub struct RepositoryConfig {
    /// Storage mode for user, task and car documents.
    pub storage_mode: StorageMode,
    /// Backend for revoked sessions.
    pub session_store_mode: SessionStoreMode,
    /// `PostgreSQL` connection URL (required when `storage_mode` is `Postgres`).
    pub database_url: Option<String>,
    /// Redis connection URL (required when `session_store_mode` is `Redis`).
    pub redis_url: Option<String>,
}

/// Reads an optional variable, treating empty or whitespace-only values as unset.
fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl RepositoryConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> RepositoryConfigBuilder {
        RepositoryConfigBuilder::default()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if:
    /// - `STORAGE_MODE` or `SESSION_STORE` contains an invalid value
    /// - `DATABASE_URL` is missing when `STORAGE_MODE=postgres`
    /// - `REDIS_URL` is missing when `SESSION_STORE=redis`
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let storage_mode = match env::var("STORAGE_MODE") {
            Ok(value) => value.parse()?,
            Err(env::VarError::NotPresent) => StorageMode::default(),
            Err(env::VarError::NotUnicode(_)) => {
                return Err(ConfigurationError::InvalidStorageMode(
                    "<non-UTF-8 value>".to_string(),
                ));
            }
        };

        let session_store_mode = match env::var("SESSION_STORE") {
            Ok(value) => value.parse()?,
            Err(env::VarError::NotPresent) => SessionStoreMode::default(),
            Err(env::VarError::NotUnicode(_)) => {
                return Err(ConfigurationError::InvalidSessionStoreMode(
                    "<non-UTF-8 value>".to_string(),
                ));
            }
        };

        let config = Self {
            storage_mode,
            session_store_mode,
            database_url: optional_var("DATABASE_URL"),
            redis_url: optional_var("REDIS_URL"),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if required URLs are missing for the selected modes.
    pub const fn validate(&self) -> Result<(), ConfigurationError> {
        if matches!(self.storage_mode, StorageMode::Postgres) && self.database_url.is_none() {
            return Err(ConfigurationError::MissingDatabaseUrl);
        }

        if matches!(self.session_store_mode, SessionStoreMode::Redis) && self.redis_url.is_none() {
            return Err(ConfigurationError::MissingRedisUrl);
        }

        Ok(())
    }
}

/// Builder for `RepositoryConfig`.
///
/// # Example
///
/// ```ignore
/// let config = RepositoryConfig::builder()
///     .storage_mode(StorageMode::Postgres)
///     .database_url("postgres://localhost/kanban")
///     .session_store_mode(SessionStoreMode::Redis)
///     .redis_url("redis://localhost:6379")
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct RepositoryConfigBuilder {
    storage_mode: StorageMode,
    session_store_mode: SessionStoreMode,
    database_url: Option<String>,
    redis_url: Option<String>,
}

impl RepositoryConfigBuilder {
    /// Sets the storage mode.
    #[must_use]
    pub const fn storage_mode(mut self, mode: StorageMode) -> Self {
        self.storage_mode = mode;
        self
    }

    /// Sets the session store mode.
    #[must_use]
    pub const fn session_store_mode(mut self, mode: SessionStoreMode) -> Self {
        self.session_store_mode = mode;
        self
    }

    /// Sets the `PostgreSQL` database URL.
    #[must_use]
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// Sets the Redis URL.
    #[must_use]
    pub fn redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = Some(url.into());
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the configuration is invalid.
    pub fn build(self) -> Result<RepositoryConfig, ConfigurationError> {
        let config = RepositoryConfig {
            storage_mode: self.storage_mode,
            session_store_mode: self.session_store_mode,
            database_url: self.database_url,
            redis_url: self.redis_url,
        };

        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during factory configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Invalid storage mode value.
    #[error("Invalid storage mode: '{0}'. Expected 'in_memory' or 'postgres'")]
    InvalidStorageMode(String),

    /// Invalid session store mode value.
    #[error("Invalid session store mode: '{0}'. Expected 'in_memory' or 'redis'")]
    InvalidSessionStoreMode(String),

    /// Missing `DATABASE_URL` when storage mode is Postgres.
    #[error("DATABASE_URL environment variable is required when STORAGE_MODE=postgres")]
    MissingDatabaseUrl,

    /// Missing `REDIS_URL` when the session store is Redis.
    #[error("REDIS_URL environment variable is required when SESSION_STORE=redis")]
    MissingRedisUrl,
}

/// Errors that can occur during factory initialization.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Database connection or schema error.
    #[error("Database connection error: {0}")]
    DatabaseConnection(String),

    /// Redis connection error.
    #[error("Redis connection error: {0}")]
    RedisConnection(String),
}

// =============================================================================
// Repository Factory
// =============================================================================

/// Collection of initialized repositories.
#[derive(Clone)]
pub struct Repositories {
    /// User accounts.
    pub user_repository: Arc<dyn UserRepository + Send + Sync>,
    /// Tasks, kept in step with each author's task list.
    pub task_repository: Arc<dyn TaskRepository + Send + Sync>,
    /// Car listings.
    pub car_repository: Arc<dyn CarRepository + Send + Sync>,
    /// Revoked session ids.
    pub session_store: Arc<dyn SessionStore + Send + Sync>,
}

impl Repositories {
    /// Creates a fresh set of in-memory repositories.
    #[must_use]
    pub fn in_memory() -> Self {
        let database = InMemoryDatabase::new();
        Self {
            user_repository: Arc::new(database.user_repository()),
            task_repository: Arc::new(database.task_repository()),
            car_repository: Arc::new(database.car_repository()),
            session_store: Arc::new(InMemorySessionStore::new()),
        }
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Repositories")
            .field("user_repository", &"Arc<dyn UserRepository>")
            .field("task_repository", &"Arc<dyn TaskRepository>")
            .field("car_repository", &"Arc<dyn CarRepository>")
            .field("session_store", &"Arc<dyn SessionStore>")
            .finish()
    }
}

/// Factory for creating repository instances based on configuration.
#[derive(Debug, Clone)]
pub struct RepositoryFactory {
    config: RepositoryConfig,
}

impl RepositoryFactory {
    /// Creates a new repository factory with the given configuration.
    #[must_use]
    pub const fn new(config: RepositoryConfig) -> Self {
        Self { config }
    }

    /// Creates a new repository factory from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError::Configuration` if environment configuration is invalid.
    pub fn from_env() -> Result<Self, FactoryError> {
        let config = RepositoryConfig::from_env()?;
        Ok(Self::new(config))
    }

    /// Returns the configuration used by this factory.
    #[must_use]
    pub const fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Creates all repositories based on the configuration.
    ///
    /// In `Postgres` mode the document tables are created if missing.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError` if:
    /// - Database connection or schema creation fails
    /// - The Redis pool cannot be created
    pub async fn create(&self) -> Result<Repositories, FactoryError> {
        let mut repositories = match self.config.storage_mode {
            StorageMode::InMemory => Repositories::in_memory(),
            StorageMode::Postgres => {
                let pool = self.create_postgres_pool().await?;
                Self::create_postgres_repositories(pool)
            }
        };

        if self.config.session_store_mode == SessionStoreMode::Redis {
            repositories.session_store = self.create_redis_session_store()?;
        }

        Ok(repositories)
    }

    /// Creates a `PostgreSQL` connection pool and ensures the schema exists.
    async fn create_postgres_pool(&self) -> Result<PgPool, FactoryError> {
        let database_url = self
            .config
            .database_url
            .as_ref()
            .ok_or(ConfigurationError::MissingDatabaseUrl)?;

        let pool = PgPool::connect(database_url)
            .await
            .map_err(|error| FactoryError::DatabaseConnection(error.to_string()))?;
        ensure_schema(&pool)
            .await
            .map_err(|error| FactoryError::DatabaseConnection(error.to_string()))?;
        Ok(pool)
    }

    /// Creates `PostgreSQL`-backed repositories with an in-memory session store.
    fn create_postgres_repositories(pool: PgPool) -> Repositories {
        Repositories {
            user_repository: Arc::new(PostgresUserRepository::new(pool.clone())),
            task_repository: Arc::new(PostgresTaskRepository::new(pool.clone())),
            car_repository: Arc::new(PostgresCarRepository::new(pool)),
            session_store: Arc::new(InMemorySessionStore::new()),
        }
    }

    /// Creates the Redis-backed session store.
    fn create_redis_session_store(
        &self,
    ) -> Result<Arc<dyn SessionStore + Send + Sync>, FactoryError> {
        let redis_url = self
            .config
            .redis_url
            .as_ref()
            .ok_or(ConfigurationError::MissingRedisUrl)?;

        let store = RedisSessionStore::from_url(redis_url)
            .map_err(|error| FactoryError::RedisConnection(error.to_string()))?;
        Ok(Arc::new(store))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("in_memory", StorageMode::InMemory)]
    #[case("memory", StorageMode::InMemory)]
    #[case("IN_MEMORY", StorageMode::InMemory)]
    #[case("postgres", StorageMode::Postgres)]
    #[case("pg", StorageMode::Postgres)]
    fn test_storage_mode_from_str_valid(#[case] input: &str, #[case] expected: StorageMode) {
        assert_eq!(input.parse::<StorageMode>().unwrap(), expected);
    }

    #[rstest]
    #[case("mongodb")]
    #[case("")]
    fn test_storage_mode_from_str_invalid(#[case] input: &str) {
        assert_eq!(
            input.parse::<StorageMode>().unwrap_err(),
            ConfigurationError::InvalidStorageMode(input.to_string())
        );
    }

    #[rstest]
    #[case("inmemory", SessionStoreMode::InMemory)]
    #[case("redis", SessionStoreMode::Redis)]
    #[case("REDIS", SessionStoreMode::Redis)]
    fn test_session_store_mode_from_str_valid(
        #[case] input: &str,
        #[case] expected: SessionStoreMode,
    ) {
        assert_eq!(input.parse::<SessionStoreMode>().unwrap(), expected);
    }

    #[rstest]
    fn test_session_store_mode_from_str_invalid() {
        assert_eq!(
            "memcached".parse::<SessionStoreMode>().unwrap_err(),
            ConfigurationError::InvalidSessionStoreMode("memcached".to_string())
        );
    }

    #[rstest]
    fn test_repository_config_default() {
        let config = RepositoryConfig::default();
        assert_eq!(config.storage_mode, StorageMode::InMemory);
        assert_eq!(config.session_store_mode, SessionStoreMode::InMemory);
        assert!(config.validate().is_ok());
    }

    #[rstest]
    fn test_validate_postgres_without_url() {
        let result = RepositoryConfig::builder()
            .storage_mode(StorageMode::Postgres)
            .build();
        assert_eq!(result.unwrap_err(), ConfigurationError::MissingDatabaseUrl);
    }

    #[rstest]
    fn test_validate_redis_without_url() {
        let result = RepositoryConfig::builder()
            .session_store_mode(SessionStoreMode::Redis)
            .build();
        assert_eq!(result.unwrap_err(), ConfigurationError::MissingRedisUrl);
    }

    #[rstest]
    fn test_builder_full_production() {
        let config = RepositoryConfig::builder()
            .storage_mode(StorageMode::Postgres)
            .database_url("postgres://localhost/kanban")
            .session_store_mode(SessionStoreMode::Redis)
            .redis_url("redis://localhost:6379")
            .build()
            .unwrap();

        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/kanban")
        );
        assert_eq!(config.redis_url.as_deref(), Some("redis://localhost:6379"));
    }

    #[rstest]
    #[tokio::test]
    async fn test_factory_creates_in_memory_repositories() {
        let repositories = RepositoryFactory::new(RepositoryConfig::default())
            .create()
            .await
            .unwrap();

        assert!(!repositories.session_store.is_revoked("nothing").await.unwrap());
        assert!(format!("{repositories:?}").contains("Arc<dyn TaskRepository>"));
    }

    #[rstest]
    #[tokio::test]
    async fn test_factory_creates_redis_session_store_lazily() {
        // deadpool connects on first use, so building the pool succeeds offline.
        let config = RepositoryConfig::builder()
            .session_store_mode(SessionStoreMode::Redis)
            .redis_url("redis://127.0.0.1:1")
            .build()
            .unwrap();

        assert!(RepositoryFactory::new(config).create().await.is_ok());
    }
}
