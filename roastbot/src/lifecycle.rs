//! Task state transitions.
//!
//! [`TaskLifecycle`] validates new tasks, persists them, and keeps the
//! reminder scheduler in step with the store: creation arms a reminder,
//! completion and removal cancel it.
//!
//! Tasks are addressed by `(owner, description)`. Descriptions are not
//! unique; when several match, the one with the earliest deadline is used.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use roastbot_proto::task::{MAX_DESCRIPTION_LENGTH, NewTask, OwnerId, Task, TaskFilter};

use crate::clock::Clock;
use crate::notify::Notifier;
use crate::reminder::{ReminderOutcome, ReminderScheduler};
use crate::store::{StoreError, TaskStore};

/// Errors returned by task lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// Malformed arguments, e.g. an empty description.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The deadline is not strictly in the future.
    #[error("deadline {deadline} is not in the future")]
    InvalidDeadline {
        /// The rejected deadline.
        deadline: DateTime<FixedOffset>,
    },

    /// No task matched the owner and description.
    #[error("no task named '{description}' for {owner}")]
    NotFound {
        /// Owner searched.
        owner: OwnerId,
        /// Description searched.
        description: String,
    },

    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TaskError {
    fn not_found(owner: &OwnerId, description: &str) -> Self {
        Self::NotFound {
            owner: owner.clone(),
            description: description.to_string(),
        }
    }
}

/// Create, complete, remove, and list tasks.
pub struct TaskLifecycle<S, N> {
    store: Arc<S>,
    reminders: ReminderScheduler<N>,
    clock: Arc<dyn Clock>,
}

impl<S, N> TaskLifecycle<S, N>
where
    S: TaskStore,
    N: Notifier + 'static,
{
    /// Creates a lifecycle over `store`, arming reminders via `reminders`.
    #[must_use]
    pub fn new(store: Arc<S>, reminders: ReminderScheduler<N>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            reminders,
            clock,
        }
    }

    /// The reminder scheduler owned by this lifecycle.
    #[must_use]
    pub const fn reminders(&self) -> &ReminderScheduler<N> {
        &self.reminders
    }

    /// Validate and persist a new task, then arm its reminder.
    ///
    /// The deadline is normalized to the clock's canonical offset. Nothing is
    /// persisted when validation fails.
    ///
    /// # Errors
    ///
    /// - [`TaskError::InvalidInput`] if the description is blank or longer
    ///   than 256 characters.
    /// - [`TaskError::InvalidDeadline`] if `deadline <= now`.
    /// - [`TaskError::Store`] if the insert fails.
    pub async fn create_task(
        &self,
        owner: &OwnerId,
        description: &str,
        deadline: DateTime<FixedOffset>,
    ) -> Result<(Task, ReminderOutcome), TaskError> {
        validate_description(description)?;
        let deadline = deadline.with_timezone(&self.clock.offset());
        if deadline <= self.clock.now() {
            return Err(TaskError::InvalidDeadline { deadline });
        }

        let new = NewTask {
            owner: owner.clone(),
            description: description.to_string(),
            deadline,
        };
        let id = self.store.insert(&new).await?;
        let task = Task::from_new(id, new);
        let outcome = self.reminders.arm(&task);

        tracing::info!(
            task_id = %task.id,
            owner = %owner,
            deadline = %deadline,
            reminder = ?outcome,
            "task created"
        );
        Ok((task, outcome))
    }

    /// Mark the first incomplete task matching `description` as completed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NotFound`] if no incomplete task matches, which
    /// includes a second completion of the same task.
    pub async fn complete_task(
        &self,
        owner: &OwnerId,
        description: &str,
    ) -> Result<Task, TaskError> {
        let mut task = self
            .store
            .find_by_owner_and_description(owner, description, TaskFilter::Pending)
            .await?
            .ok_or_else(|| TaskError::not_found(owner, description))?;

        match self.store.update_completed(&task.id, true).await {
            Ok(()) => {}
            // Removed between lookup and update.
            Err(StoreError::NotFound(_)) => return Err(TaskError::not_found(owner, description)),
            Err(err) => return Err(err.into()),
        }
        self.reminders.cancel(&task.id);
        task.completed = true;

        tracing::info!(task_id = %task.id, owner = %owner, "task completed");
        Ok(task)
    }

    /// Delete the first task (in any state) matching `description`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NotFound`] if no task matches.
    pub async fn remove_task(&self, owner: &OwnerId, description: &str) -> Result<Task, TaskError> {
        let task = self
            .store
            .find_by_owner_and_description(owner, description, TaskFilter::All)
            .await?
            .ok_or_else(|| TaskError::not_found(owner, description))?;

        match self.store.delete(&task.id).await {
            Ok(()) => {}
            Err(StoreError::NotFound(_)) => return Err(TaskError::not_found(owner, description)),
            Err(err) => return Err(err.into()),
        }
        self.reminders.cancel(&task.id);

        tracing::info!(task_id = %task.id, owner = %owner, "task removed");
        Ok(task)
    }

    /// The owner's tasks passing `filter`, by ascending deadline.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Store`] if the query fails.
    pub async fn list_tasks(&self, owner: &OwnerId, filter: TaskFilter) -> Result<Vec<Task>, TaskError> {
        Ok(self.store.list_by_owner(owner, filter).await?)
    }

    /// Re-arm reminders for incomplete tasks with future deadlines.
    ///
    /// Timers are not persisted, so this runs once at startup against a
    /// durable store. Returns the number of reminders armed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Store`] if the query fails.
    pub async fn restore_reminders(&self) -> Result<usize, TaskError> {
        let upcoming = self
            .store
            .list_upcoming_incomplete(self.clock.now())
            .await?;
        let armed = upcoming
            .iter()
            .filter(|task| matches!(self.reminders.arm(task), ReminderOutcome::Armed { .. }))
            .count();
        tracing::info!(armed, scanned = upcoming.len(), "reminders restored");
        Ok(armed)
    }
}

fn validate_description(description: &str) -> Result<(), TaskError> {
    if description.trim().is_empty() {
        return Err(TaskError::InvalidInput(
            "task description cannot be empty".to_string(),
        ));
    }
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(TaskError::InvalidInput(format!(
            "task description too long (max {MAX_DESCRIPTION_LENGTH} characters)"
        )));
    }
    Ok(())
}
