//! Kanban board projection.
//!
//! A [`Board`] is the column view of one user's tasks. Moving a card between
//! columns is a pure operation on the board; the caller persists the moved
//! task only when [`Board::move_task`] reports an actual move.
//!
//! Columns are persistent vectors, so the board returned by a move shares
//! every untouched card with the board it was derived from.

use im::Vector;

use super::task::{Task, TaskId, TaskStatus, Timestamp};

/// One user's tasks grouped by status column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    todo: Vector<Task>,
    in_progress: Vector<Task>,
    completed: Vector<Task>,
}

/// Outcome of [`Board::move_task`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardMove {
    /// The task was dropped on the column it already sits in.
    Unchanged,
    /// No task with that id is on the board.
    NotFound,
    /// The task changed columns.
    Moved {
        /// The board after the move.
        board: Board,
        /// The task with its new status and timestamp; not yet persisted.
        task: Task,
    },
}

/// Number of tasks in each column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnCounts {
    pub todo: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl Board {
    /// Builds a board, keeping the iteration order of `tasks` inside each column.
    #[must_use]
    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        tasks.into_iter().fold(Self::default(), |mut board, task| {
            board.column_mut(task.status).push_back(task);
            board
        })
    }

    /// Returns the tasks in the given column.
    #[must_use]
    pub const fn column(&self, status: TaskStatus) -> &Vector<Task> {
        match status {
            TaskStatus::Todo => &self.todo,
            TaskStatus::InProgress => &self.in_progress,
            TaskStatus::Completed => &self.completed,
        }
    }

    const fn column_mut(&mut self, status: TaskStatus) -> &mut Vector<Task> {
        match status {
            TaskStatus::Todo => &mut self.todo,
            TaskStatus::InProgress => &mut self.in_progress,
            TaskStatus::Completed => &mut self.completed,
        }
    }

    /// Returns the total number of tasks on the board.
    #[must_use]
    pub fn len(&self) -> usize {
        self.todo.len() + self.in_progress.len() + self.completed.len()
    }

    /// Returns `true` if the board has no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of tasks per column.
    #[must_use]
    pub fn counts(&self) -> ColumnCounts {
        ColumnCounts {
            todo: self.todo.len(),
            in_progress: self.in_progress.len(),
            completed: self.completed.len(),
        }
    }

    /// Finds a task anywhere on the board.
    #[must_use]
    pub fn find(&self, task_id: &TaskId) -> Option<&Task> {
        TaskStatus::ALL
            .into_iter()
            .flat_map(|status| self.column(status))
            .find(|task| &task.task_id == task_id)
    }

    /// Moves a task to the end of `destination`.
    ///
    /// The moved task gets `destination` as its status and `now` as its
    /// update time. Dropping a task on its own column is a no-op. `self` is
    /// left as it was.
    #[must_use]
    pub fn move_task(&self, task_id: &TaskId, destination: TaskStatus, now: Timestamp) -> BoardMove {
        let Some(source) = self.find(task_id).map(|task| task.status) else {
            return BoardMove::NotFound;
        };
        if source == destination {
            return BoardMove::Unchanged;
        }

        let mut board = self.clone();
        let column = board.column_mut(source);
        let Some(position) = column.iter().position(|task| &task.task_id == task_id) else {
            return BoardMove::NotFound;
        };
        let task = column
            .remove(position)
            .with_status(destination)
            .with_updated_at(now);
        board.column_mut(destination).push_back(task.clone());

        BoardMove::Moved { board, task }
    }

    /// Swaps in `task` for the card with the same id, keeping its position.
    ///
    /// The card must already sit in the column matching `task.status`.
    #[must_use]
    pub fn replace(mut self, task: Task) -> Self {
        if let Some(slot) = self
            .column_mut(task.status)
            .iter_mut()
            .find(|card| card.task_id == task.task_id)
        {
            *slot = task;
        }
        self
    }

    /// Consumes the board, returning the three columns in board order.
    #[must_use]
    pub fn into_columns(self) -> (Vector<Task>, Vector<Task>, Vector<Task>) {
        (self.todo, self.in_progress, self.completed)
    }
}
