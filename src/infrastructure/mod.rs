//! Infrastructure module for external services.
//!
//! This module contains the document repositories, the session store, and
//! the factory that selects their backends.

pub mod factory;
pub mod in_memory;
pub mod postgres;
pub mod redis;
pub mod repository;

pub use factory::{
    ConfigurationError, FactoryError, Repositories, RepositoryConfig, RepositoryConfigBuilder,
    RepositoryFactory, SessionStoreMode, StorageMode,
};
pub use in_memory::{
    InMemoryCarRepository, InMemoryDatabase, InMemorySessionStore, InMemoryTaskRepository,
    InMemoryUserRepository,
};
pub use postgres::{
    PostgresCarRepository, PostgresTaskRepository, PostgresUserRepository, ensure_schema,
};
pub use redis::RedisSessionStore;
pub use repository::{
    CarRepository, PaginatedResult, Pagination, RepositoryError, RepositoryFuture,
    SessionStore, TaskRepository, UserRepository, check_successor,
};
