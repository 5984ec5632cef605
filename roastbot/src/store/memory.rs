//! In-memory task store.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use roastbot_proto::task::{NewTask, OwnerId, Task, TaskFilter, TaskId};
use tokio::sync::RwLock;

use super::{StoreError, TaskStore};

/// In-memory implementation of [`TaskStore`].
///
/// Thread-safe via [`RwLock`]. Not persistent -- all tasks are lost when
/// the process exits.
pub struct InMemoryTaskStore {
    tasks: RwLock<HashMap<TaskId, Task>>,
}

impl InMemoryTaskStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the number of stored tasks.
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Returns `true` if no tasks are stored.
    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }

    async fn collect_sorted(&self, keep: impl Fn(&Task) -> bool + Send) -> Vec<Task> {
        let tasks = self.tasks.read().await;
        let mut out: Vec<Task> = tasks.values().filter(|&t| keep(t)).cloned().collect();
        drop(tasks);
        sort_by_deadline(&mut out);
        out
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

fn sort_by_deadline(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| a.deadline.cmp(&b.deadline).then_with(|| a.id.cmp(&b.id)));
}

impl TaskStore for InMemoryTaskStore {
    async fn insert(&self, task: &NewTask) -> Result<TaskId, StoreError> {
        let id = TaskId::new();
        let stored = Task::from_new(id.clone(), task.clone());
        self.tasks.write().await.insert(id.clone(), stored);
        Ok(id)
    }

    async fn find_by_owner_and_description(
        &self,
        owner: &OwnerId,
        description: &str,
        filter: TaskFilter,
    ) -> Result<Option<Task>, StoreError> {
        let matches = self
            .collect_sorted(|t| {
                t.owner == *owner && t.description == description && filter.admits(t.completed)
            })
            .await;
        Ok(matches.into_iter().next())
    }

    async fn update_completed(&self, id: &TaskId, completed: bool) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        task.completed = completed;
        Ok(())
    }

    async fn delete(&self, id: &TaskId) -> Result<(), StoreError> {
        self.tasks
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn list_by_owner(
        &self,
        owner: &OwnerId,
        filter: TaskFilter,
    ) -> Result<Vec<Task>, StoreError> {
        Ok(self
            .collect_sorted(|t| t.owner == *owner && filter.admits(t.completed))
            .await)
    }

    async fn list_overdue_incomplete(
        &self,
        now: DateTime<FixedOffset>,
    ) -> Result<Vec<Task>, StoreError> {
        Ok(self.collect_sorted(|t| t.is_overdue(now)).await)
    }

    async fn list_upcoming_incomplete(
        &self,
        now: DateTime<FixedOffset>,
    ) -> Result<Vec<Task>, StoreError> {
        Ok(self
            .collect_sorted(|t| !t.completed && t.deadline > now)
            .await)
    }
}
