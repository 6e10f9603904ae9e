//! Domain module for the task board and car listings.
//!
//! This module contains domain models, value objects, and pure domain logic.

pub mod board;
pub mod car;
pub mod task;
pub mod user;

pub use board::{Board, BoardMove, ColumnCounts};
pub use car::{Car, CarId, MAX_CAR_IMAGES, Tag};
pub use task::{DueDateOrder, Priority, Task, TaskFilter, TaskId, TaskStatus, Timestamp};
pub use user::{Email, User, UserId};
