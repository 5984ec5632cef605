//! Durable task records.
//!
//! Defines the [`TaskStore`] trait the engine depends on, plus two
//! implementations:
//! - [`memory::InMemoryTaskStore`]: process-local, used in tests and `--in-memory` runs
//! - [`sqlite::SqliteTaskStore`]: SQLite file, survives restarts
//!
//! Writes to a single task are serialized by each implementation. Listing
//! order is ascending deadline, ties broken by task id.

pub mod memory;
pub mod sqlite;

use chrono::{DateTime, FixedOffset};
use roastbot_proto::task::{NewTask, OwnerId, Task, TaskFilter, TaskId};

pub use memory::InMemoryTaskStore;
pub use sqlite::SqliteTaskStore;

/// Errors that can occur during task storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record with the given id exists.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The underlying storage cannot be reached.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be turned back into a task.
    #[error("corrupt task record: {0}")]
    Corrupt(String),

    /// An SQLite call failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Storage capability required by the deadline engine.
pub trait TaskStore: Send + Sync {
    /// Persist a new task, returning the id the store assigned to it.
    fn insert(
        &self,
        task: &NewTask,
    ) -> impl std::future::Future<Output = Result<TaskId, StoreError>> + Send;

    /// Find the first task of `owner` whose description matches exactly and
    /// which passes `filter`.
    ///
    /// "First" means earliest deadline, then smallest id. Descriptions are
    /// not unique, so callers must not assume this identifies a single row.
    fn find_by_owner_and_description(
        &self,
        owner: &OwnerId,
        description: &str,
        filter: TaskFilter,
    ) -> impl std::future::Future<Output = Result<Option<Task>, StoreError>> + Send;

    /// Set the completion flag of a task.
    fn update_completed(
        &self,
        id: &TaskId,
        completed: bool,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Delete a task record.
    fn delete(&self, id: &TaskId) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// All tasks of `owner` passing `filter`, ordered by deadline.
    fn list_by_owner(
        &self,
        owner: &OwnerId,
        filter: TaskFilter,
    ) -> impl std::future::Future<Output = Result<Vec<Task>, StoreError>> + Send;

    /// Incomplete tasks across all owners with `deadline < now`.
    fn list_overdue_incomplete(
        &self,
        now: DateTime<FixedOffset>,
    ) -> impl std::future::Future<Output = Result<Vec<Task>, StoreError>> + Send;

    /// Incomplete tasks across all owners with `deadline > now`.
    fn list_upcoming_incomplete(
        &self,
        now: DateTime<FixedOffset>,
    ) -> impl std::future::Future<Output = Result<Vec<Task>, StoreError>> + Send;
}
