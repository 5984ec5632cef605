//! Task model for deadline tracking.
//!
//! A [`Task`] belongs to an [`OwnerId`], carries a deadline in the
//! process-wide canonical offset, and flips `completed` exactly once.
//! Identifiers are assigned by the store on insert.

use chrono::{DateTime, FixedOffset, TimeDelta};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum allowed task description length in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 256;

/// How long before the deadline the single reminder fires.
pub const REMINDER_LEAD_MINUTES: i64 = 30;

/// Error returned when a stored task identifier cannot be parsed.
#[derive(Debug, thiserror::Error)]
#[error("invalid task id {raw:?}: {source}")]
pub struct InvalidTaskId {
    /// The rejected input.
    pub raw: String,
    /// Underlying UUID parse failure.
    pub source: uuid::Error,
}

/// Unique identifier for a task, based on UUID v7 for time-ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a new time-ordered task identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `TaskId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Parses the hyphenated string form produced by [`Display`](std::fmt::Display).
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTaskId`] if `raw` is not a UUID.
    pub fn parse(raw: &str) -> Result<Self, InvalidTaskId> {
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|source| InvalidTaskId {
                raw: raw.to_string(),
                source,
            })
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier of the chat or account a task belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(String);

impl OwnerId {
    /// Create a new owner identifier from a string representation.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the string representation of this owner ID.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which tasks a listing should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TaskFilter {
    /// Every task regardless of completion.
    #[default]
    All,
    /// Only tasks that are not completed yet.
    Pending,
    /// Only completed tasks.
    Completed,
}

impl TaskFilter {
    /// Returns `true` if a task with the given completion flag passes the filter.
    #[must_use]
    pub const fn admits(self, completed: bool) -> bool {
        match self {
            Self::All => true,
            Self::Pending => !completed,
            Self::Completed => completed,
        }
    }
}

impl std::fmt::Display for TaskFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// A task as submitted for insertion, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Owner of the task.
    pub owner: OwnerId,
    /// Free-text label, unique per owner only by convention.
    pub description: String,
    /// Deadline in the canonical offset.
    pub deadline: DateTime<FixedOffset>,
}

/// A tracked task with a deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Store-assigned identifier.
    pub id: TaskId,
    /// Owner of the task.
    pub owner: OwnerId,
    /// Free-text label.
    pub description: String,
    /// Deadline in the canonical offset. Immutable after creation.
    pub deadline: DateTime<FixedOffset>,
    /// Set once by completion, never reset.
    pub completed: bool,
}

impl Task {
    /// Builds the stored form of `new` under the given id, not yet completed.
    #[must_use]
    pub fn from_new(id: TaskId, new: NewTask) -> Self {
        Self {
            id,
            owner: new.owner,
            description: new.description,
            deadline: new.deadline,
            completed: false,
        }
    }

    /// The instant the pre-deadline reminder is due.
    #[must_use]
    pub fn reminder_at(&self) -> DateTime<FixedOffset> {
        self.deadline - TimeDelta::minutes(REMINDER_LEAD_MINUTES)
    }

    /// Whether this task belongs in an overdue sweep at `now`.
    ///
    /// Strict comparison: a task whose deadline equals `now` is not overdue yet.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<FixedOffset>) -> bool {
        !self.completed && self.deadline < now
    }
}
