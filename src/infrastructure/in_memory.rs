//! In-memory repository implementations.
//!
//! [`InMemoryDatabase`] owns one map per collection and hands out repository
//! views that share them. These implementations back tests and local
//! development.
//!
//! # Features
//!
//! - Thread-safe with `Arc<RwLock<...>>`
//! - Optimistic locking with version checking
//! - Task create/delete update the author's task list under both write
//!   locks, always taken in the order tasks, then users

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::domain::{Car, CarId, Email, Task, TaskFilter, TaskId, User, UserId};
use crate::infrastructure::{
    CarRepository, PaginatedResult, Pagination, RepositoryError, RepositoryFuture, SessionStore,
    TaskRepository, UserRepository, check_successor,
};

type Collection<K, V> = Arc<RwLock<HashMap<K, V>>>;

// =============================================================================
// In-Memory Database
// =============================================================================

/// Shared in-memory collections.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    users: Collection<UserId, User>,
    tasks: Collection<TaskId, Task>,
    cars: Collection<CarId, Car>,
}

impl InMemoryDatabase {
    /// Creates an empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a user repository over this database.
    #[must_use]
    pub fn user_repository(&self) -> InMemoryUserRepository {
        InMemoryUserRepository {
            users: Arc::clone(&self.users),
        }
    }

    /// Returns a task repository over this database.
    #[must_use]
    pub fn task_repository(&self) -> InMemoryTaskRepository {
        InMemoryTaskRepository {
            tasks: Arc::clone(&self.tasks),
            users: Arc::clone(&self.users),
        }
    }

    /// Returns a car repository over this database.
    #[must_use]
    pub fn car_repository(&self) -> InMemoryCarRepository {
        InMemoryCarRepository {
            cars: Arc::clone(&self.cars),
        }
    }
}

// =============================================================================
// In-Memory User Repository
// =============================================================================

/// In-memory implementation of `UserRepository`.
#[derive(Debug, Clone)]
pub struct InMemoryUserRepository {
    users: Collection<UserId, User>,
}

impl UserRepository for InMemoryUserRepository {
    fn find_by_id(&self, id: &UserId) -> RepositoryFuture<Option<User>> {
        let users = Arc::clone(&self.users);
        let id = id.clone();
        Box::pin(async move { Ok(users.read().await.get(&id).cloned()) })
    }

    fn find_by_email(&self, email: &Email) -> RepositoryFuture<Option<User>> {
        let users = Arc::clone(&self.users);
        let email = email.clone();
        Box::pin(async move {
            Ok(users
                .read()
                .await
                .values()
                .find(|user| user.email == email)
                .cloned())
        })
    }

    fn insert(&self, user: &User) -> RepositoryFuture<()> {
        let users = Arc::clone(&self.users);
        let user = user.clone();
        Box::pin(async move {
            let mut guard = users.write().await;
            if guard.values().any(|existing| existing.email == user.email) {
                return Err(RepositoryError::Duplicate(format!(
                    "email {} is already registered",
                    user.email
                )));
            }
            if guard.contains_key(&user.user_id) {
                return Err(RepositoryError::Duplicate(format!("user {}", user.user_id)));
            }
            guard.insert(user.user_id.clone(), user);
            Ok(())
        })
    }
}

// =============================================================================
// In-Memory Task Repository
// =============================================================================

/// In-memory implementation of `TaskRepository`.
#[derive(Debug, Clone)]
pub struct InMemoryTaskRepository {
    tasks: Collection<TaskId, Task>,
    users: Collection<UserId, User>,
}

#[allow(clippy::significant_drop_tightening)]
impl TaskRepository for InMemoryTaskRepository {
    fn find_by_id(&self, id: &TaskId) -> RepositoryFuture<Option<Task>> {
        let tasks = Arc::clone(&self.tasks);
        let id = id.clone();
        Box::pin(async move { Ok(tasks.read().await.get(&id).cloned()) })
    }

    fn list_for_author(&self, author: &UserId, filter: TaskFilter) -> RepositoryFuture<Vec<Task>> {
        let tasks = Arc::clone(&self.tasks);
        let author = author.clone();
        Box::pin(async move {
            let guard = tasks.read().await;
            let owned = guard
                .values()
                .filter(|task| task.is_owned_by(&author))
                .cloned();
            Ok(filter.apply(owned))
        })
    }

    fn insert_for_author(&self, task: &Task) -> RepositoryFuture<()> {
        let tasks = Arc::clone(&self.tasks);
        let users = Arc::clone(&self.users);
        let task = task.clone();
        Box::pin(async move {
            let mut task_guard = tasks.write().await;
            let mut user_guard = users.write().await;

            if task.version != 1 {
                return Err(RepositoryError::VersionConflict {
                    expected: 1,
                    found: task.version,
                });
            }
            if task_guard.contains_key(&task.task_id) {
                return Err(RepositoryError::Duplicate(format!("task {}", task.task_id)));
            }
            let author = user_guard
                .get_mut(&task.author)
                .ok_or_else(|| RepositoryError::NotFound(format!("user {}", task.author)))?;

            author.push_task(task.task_id.clone());
            task_guard.insert(task.task_id.clone(), task);
            Ok(())
        })
    }

    fn save(&self, task: &Task) -> RepositoryFuture<()> {
        let tasks = Arc::clone(&self.tasks);
        let task = task.clone();
        Box::pin(async move {
            let mut guard = tasks.write().await;
            let existing = guard
                .get(&task.task_id)
                .ok_or_else(|| RepositoryError::NotFound(format!("task {}", task.task_id)))?;
            check_successor(existing.version, task.version)?;
            guard.insert(task.task_id.clone(), task);
            Ok(())
        })
    }

    fn delete_for_author(&self, id: &TaskId, author: &UserId) -> RepositoryFuture<bool> {
        let tasks = Arc::clone(&self.tasks);
        let users = Arc::clone(&self.users);
        let id = id.clone();
        let author = author.clone();
        Box::pin(async move {
            let mut task_guard = tasks.write().await;
            let mut user_guard = users.write().await;

            if let Some(user) = user_guard.get_mut(&author) {
                user.pull_task(&id);
            }
            Ok(task_guard.remove(&id).is_some())
        })
    }
}

// =============================================================================
// In-Memory Car Repository
// =============================================================================

/// In-memory implementation of `CarRepository`.
#[derive(Debug, Clone)]
pub struct InMemoryCarRepository {
    cars: Collection<CarId, Car>,
}

/// Returns the listings selected by `predicate`, oldest first.
fn sorted_cars(cars: &HashMap<CarId, Car>, predicate: impl Fn(&Car) -> bool) -> Vec<Car> {
    let mut selected: Vec<Car> = cars.values().filter(|car| predicate(car)).cloned().collect();
    selected.sort_by(|left, right| {
        left.created_at
            .cmp(&right.created_at)
            .then_with(|| left.car_id.cmp(&right.car_id))
    });
    selected
}

#[allow(clippy::significant_drop_tightening)]
impl CarRepository for InMemoryCarRepository {
    fn find_by_id(&self, id: &CarId) -> RepositoryFuture<Option<Car>> {
        let cars = Arc::clone(&self.cars);
        let id = id.clone();
        Box::pin(async move { Ok(cars.read().await.get(&id).cloned()) })
    }

    fn insert(&self, car: &Car) -> RepositoryFuture<()> {
        let cars = Arc::clone(&self.cars);
        let car = car.clone();
        Box::pin(async move {
            let mut guard = cars.write().await;
            if car.version != 1 {
                return Err(RepositoryError::VersionConflict {
                    expected: 1,
                    found: car.version,
                });
            }
            if guard.contains_key(&car.car_id) {
                return Err(RepositoryError::Duplicate(format!("car {}", car.car_id)));
            }
            guard.insert(car.car_id.clone(), car);
            Ok(())
        })
    }

    fn save(&self, car: &Car) -> RepositoryFuture<()> {
        let cars = Arc::clone(&self.cars);
        let car = car.clone();
        Box::pin(async move {
            let mut guard = cars.write().await;
            let existing = guard
                .get(&car.car_id)
                .ok_or_else(|| RepositoryError::NotFound(format!("car {}", car.car_id)))?;
            check_successor(existing.version, car.version)?;
            guard.insert(car.car_id.clone(), car);
            Ok(())
        })
    }

    fn delete(&self, id: &CarId) -> RepositoryFuture<bool> {
        let cars = Arc::clone(&self.cars);
        let id = id.clone();
        Box::pin(async move { Ok(cars.write().await.remove(&id).is_some()) })
    }

    fn list_by_owner(&self, owner: &UserId) -> RepositoryFuture<Vec<Car>> {
        let cars = Arc::clone(&self.cars);
        let owner = owner.clone();
        Box::pin(async move {
            let guard = cars.read().await;
            Ok(sorted_cars(&guard, |car| car.is_owned_by(&owner)))
        })
    }

    fn search(&self, keyword: &str) -> RepositoryFuture<Vec<Car>> {
        let cars = Arc::clone(&self.cars);
        let keyword = keyword.to_string();
        Box::pin(async move {
            let guard = cars.read().await;
            Ok(sorted_cars(&guard, |car| car.matches_keyword(&keyword)))
        })
    }

    fn list(&self, pagination: Pagination) -> RepositoryFuture<PaginatedResult<Car>> {
        let cars = Arc::clone(&self.cars);
        Box::pin(async move {
            let guard = cars.read().await;
            let all = sorted_cars(&guard, |_| true);
            let total = all.len() as u64;
            let offset = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
            let items = all
                .into_iter()
                .skip(offset)
                .take(pagination.limit() as usize)
                .collect();
            Ok(PaginatedResult::new(items, total, pagination))
        })
    }
}

// =============================================================================
// In-Memory Session Store
// =============================================================================

/// In-memory implementation of `SessionStore`.
///
/// Expired entries are purged lazily on every revocation.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    revoked: Arc<RwLock<HashMap<String, Instant>>>,
}

impl InMemorySessionStore {
    /// Creates an empty session store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn revoke(&self, token_id: &str, ttl: Duration) -> RepositoryFuture<()> {
        let revoked = Arc::clone(&self.revoked);
        let token_id = token_id.to_string();
        Box::pin(async move {
            let now = Instant::now();
            let mut guard = revoked.write().await;
            guard.retain(|_, expires_at| *expires_at > now);
            guard.insert(token_id, now + ttl);
            Ok(())
        })
    }

    fn is_revoked(&self, token_id: &str) -> RepositoryFuture<bool> {
        let revoked = Arc::clone(&self.revoked);
        let token_id = token_id.to_string();
        Box::pin(async move {
            let guard = revoked.read().await;
            Ok(guard
                .get(&token_id)
                .is_some_and(|expires_at| *expires_at > Instant::now()))
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
