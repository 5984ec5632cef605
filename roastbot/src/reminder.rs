//! One-shot pre-deadline reminders.
//!
//! [`ReminderScheduler`] keeps at most one live timer per task. Each timer is
//! a spawned tokio task sleeping until `deadline - 30min`. Arming again
//! replaces (and aborts) the previous timer; completion and removal cancel
//! it.
//!
//! # Generations
//!
//! Every armed timer carries a generation number. When a timer wakes up it
//! fires only if its generation is still the one registered for the task.
//! A timer that was replaced or cancelled but not yet aborted therefore
//! never delivers. A timer that has already passed that check may still
//! deliver after a concurrent cancel; that race is accepted.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, FixedOffset};
use parking_lot::Mutex;
use roastbot_proto::task::{Task, TaskId};
use tokio::task::JoinHandle;

use crate::clock::{Clock, delay_until};
use crate::notify::Notifier;

/// What arming a reminder did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderOutcome {
    /// A timer will fire at the given instant.
    Armed {
        /// When the reminder is due.
        at: DateTime<FixedOffset>,
    },
    /// The reminder instant had already passed (or the task is completed),
    /// so no timer was created.
    Skipped,
}

/// Text sent to the owner when a reminder fires.
#[must_use]
pub fn reminder_text(description: &str) -> String {
    format!("Reminder: '{description}' is due soon. Don't slack off!")
}

struct ArmedReminder {
    generation: u64,
    handle: JoinHandle<()>,
}

type TimerMap = Arc<Mutex<HashMap<TaskId, ArmedReminder>>>;

/// Arms, replaces, and cancels per-task reminder timers.
pub struct ReminderScheduler<N> {
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
    timers: TimerMap,
    next_generation: AtomicU64,
}

impl<N: Notifier + 'static> ReminderScheduler<N> {
    /// Creates a scheduler delivering through `notifier`.
    #[must_use]
    pub fn new(notifier: Arc<N>, clock: Arc<dyn Clock>) -> Self {
        Self {
            notifier,
            clock,
            timers: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Arm the reminder for `task`, replacing any timer already held for it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn arm(&self, task: &Task) -> ReminderOutcome {
        let at = task.reminder_at();
        let delay = if task.completed {
            None
        } else {
            delay_until(self.clock.now(), at)
        };
        let Some(delay) = delay else {
            self.cancel(&task.id);
            tracing::debug!(task_id = %task.id, "reminder instant already passed, skipping");
            return ReminderOutcome::Skipped;
        };

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let timers = Arc::clone(&self.timers);
        let notifier = Arc::clone(&self.notifier);
        let id = task.id.clone();
        let owner = task.owner.clone();
        let text = reminder_text(&task.description);

        let mut map = self.timers.lock();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut map = timers.lock();
                let current = map
                    .get(&id)
                    .is_some_and(|armed| armed.generation == generation);
                if !current {
                    return;
                }
                map.remove(&id);
            }
            tracing::info!(task_id = %id, owner = %owner, "sending reminder");
            if let Err(err) = notifier.send(&owner, &text).await {
                tracing::warn!(task_id = %id, error = %err, "reminder delivery failed");
            }
        });
        if let Some(previous) = map.insert(
            task.id.clone(),
            ArmedReminder { generation, handle },
        ) {
            previous.handle.abort();
        }
        drop(map);

        tracing::debug!(task_id = %task.id, at = %at, "reminder armed");
        ReminderOutcome::Armed { at }
    }
}

impl<N> ReminderScheduler<N> {
    /// Cancel the outstanding timer for `id`.
    ///
    /// Returns `true` if a timer was outstanding. A no-op if the timer already
    /// fired or none was armed.
    pub fn cancel(&self, id: &TaskId) -> bool {
        let removed = self.timers.lock().remove(id);
        match removed {
            Some(armed) => {
                armed.handle.abort();
                tracing::debug!(task_id = %id, "reminder cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancel every outstanding timer. Used at shutdown.
    pub fn cancel_all(&self) {
        let drained: Vec<ArmedReminder> = self.timers.lock().drain().map(|(_, a)| a).collect();
        for armed in drained {
            armed.handle.abort();
        }
    }

    /// Whether a timer is outstanding for `id`.
    #[must_use]
    pub fn is_armed(&self, id: &TaskId) -> bool {
        self.timers.lock().contains_key(id)
    }

    /// Number of outstanding timers.
    #[must_use]
    pub fn armed_count(&self) -> usize {
        self.timers.lock().len()
    }
}

impl<N> Drop for ReminderScheduler<N> {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
