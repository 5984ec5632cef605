//! Integration tests for SQLite persistence across restarts.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, TimeDelta, TimeZone};
use roastbot::clock::{AnchoredClock, Clock, default_offset};
use roastbot::lifecycle::TaskLifecycle;
use roastbot::notify::{ChannelNotifier, Notification};
use roastbot::reminder::{ReminderScheduler, reminder_text};
use roastbot::roast::RoastSelector;
use roastbot::store::SqliteTaskStore;
use roastbot::sweeper::{OverdueSweeper, SweepConfig};
use roastbot_proto::task::{OwnerId, TaskFilter, TaskId};
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

fn origin() -> DateTime<FixedOffset> {
    default_offset()
        .with_ymd_and_hms(2025, 11, 20, 8, 0, 0)
        .unwrap()
}

/// Unique scratch directory removed on drop.
struct ScratchDir(PathBuf);

impl ScratchDir {
    fn new() -> Self {
        Self(std::env::temp_dir().join(format!("roastbot-persistence-{}", TaskId::new())))
    }

    fn db_path(&self) -> PathBuf {
        self.0.join("data").join("tasks.db")
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

struct Session {
    store: Arc<SqliteTaskStore>,
    lifecycle: TaskLifecycle<SqliteTaskStore, ChannelNotifier>,
    notifier: Arc<ChannelNotifier>,
    clock: Arc<dyn Clock>,
    rx: mpsc::Receiver<Notification>,
}

fn open_session(path: &Path, now: DateTime<FixedOffset>) -> Session {
    let store = Arc::new(SqliteTaskStore::open(path).unwrap());
    let clock: Arc<dyn Clock> = Arc::new(AnchoredClock::new(now));
    let (notifier, rx) = ChannelNotifier::new(16);
    let notifier = Arc::new(notifier);
    let reminders = ReminderScheduler::new(Arc::clone(&notifier), Arc::clone(&clock));
    let lifecycle = TaskLifecycle::new(Arc::clone(&store), reminders, Arc::clone(&clock));
    Session {
        store,
        lifecycle,
        notifier,
        clock,
        rx,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn tasks_and_completion_survive_restart() {
    let scratch = ScratchDir::new();
    let alice = OwnerId::new("alice");

    {
        let session = open_session(&scratch.db_path(), origin());
        for (name, minutes) in [("slides", 180), ("report", 60), ("email", 40)] {
            session
                .lifecycle
                .create_task(&alice, name, origin() + TimeDelta::minutes(minutes))
                .await
                .unwrap();
        }
        session.lifecycle.complete_task(&alice, "report").await.unwrap();
    }

    // Restart an hour later.
    let restarted_at = origin() + TimeDelta::hours(1);
    let session = open_session(&scratch.db_path(), restarted_at);

    let all = session
        .lifecycle
        .list_tasks(&alice, TaskFilter::All)
        .await
        .unwrap();
    let summary: Vec<(&str, bool)> = all
        .iter()
        .map(|t| (t.description.as_str(), t.completed))
        .collect();
    assert_eq!(
        summary,
        vec![("email", false), ("report", true), ("slides", false)]
    );
    assert_eq!(all[2].deadline, origin() + TimeDelta::minutes(180));
    assert_eq!(all[2].deadline.offset(), origin().offset());

    let err = session
        .lifecycle
        .complete_task(&alice, "report")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        roastbot::lifecycle::TaskError::NotFound { .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn restore_rearms_future_reminders_after_restart() {
    let scratch = ScratchDir::new();
    let alice = OwnerId::new("alice");

    {
        let session = open_session(&scratch.db_path(), origin());
        for (name, minutes) in [("slides", 180), ("report", 60), ("email", 40), ("call", 75)] {
            session
                .lifecycle
                .create_task(&alice, name, origin() + TimeDelta::minutes(minutes))
                .await
                .unwrap();
        }
        session.lifecycle.complete_task(&alice, "report").await.unwrap();
        assert_eq!(session.lifecycle.reminders().armed_count(), 3);
    }

    // One hour later: "slides" still has its reminder ahead, "call" is due in
    // 15 minutes so its reminder is gone, "email" is overdue.
    let restarted_at = origin() + TimeDelta::hours(1);
    let mut session = open_session(&scratch.db_path(), restarted_at);
    assert_eq!(session.lifecycle.reminders().armed_count(), 0);

    assert_eq!(session.lifecycle.restore_reminders().await.unwrap(), 1);
    assert_eq!(session.lifecycle.reminders().armed_count(), 1);

    let note = session.rx.recv().await.unwrap();
    assert_eq!(note.owner, alice);
    assert_eq!(note.text, reminder_text("slides"));
    assert_eq!(session.clock.now(), origin() + TimeDelta::minutes(150));
}

#[tokio::test(start_paused = true)]
async fn overdue_tasks_are_swept_after_restart() {
    let scratch = ScratchDir::new();
    let bob = OwnerId::new("bob");

    {
        let session = open_session(&scratch.db_path(), origin());
        session
            .lifecycle
            .create_task(&bob, "pay rent", origin() + TimeDelta::minutes(20))
            .await
            .unwrap();
    }

    let restarted_at = origin() + TimeDelta::days(1);
    let session = open_session(&scratch.db_path(), restarted_at);
    let sweeper = OverdueSweeper::new(
        Arc::clone(&session.store),
        Arc::clone(&session.notifier),
        RoastSelector::seeded(4),
        Arc::clone(&session.clock),
        SweepConfig::default(),
    );

    let swept = sweeper.run_sweep(restarted_at).await.unwrap();
    assert_eq!(swept.len(), 1);
    assert_eq!(swept[0].description, "pay rent");
    assert_eq!(swept[0].owner, bob);
}
