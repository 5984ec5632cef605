//! Integration tests for the full task lifecycle: reminder before the
//! deadline, roasts after it, silence once completed.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, TimeDelta, TimeZone};
use roastbot::clock::{AnchoredClock, Clock, default_offset};
use roastbot::lifecycle::TaskLifecycle;
use roastbot::notify::{ChannelNotifier, Notification};
use roastbot::reminder::{ReminderOutcome, ReminderScheduler, reminder_text};
use roastbot::roast::RoastSelector;
use roastbot::store::InMemoryTaskStore;
use roastbot::sweeper::{OverdueSweeper, SweepConfig};
use roastbot_proto::roast::RoastTier;
use roastbot_proto::task::{OwnerId, TaskFilter};
use tokio::sync::mpsc;
use tokio::time::timeout;

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

fn origin() -> DateTime<FixedOffset> {
    default_offset()
        .with_ymd_and_hms(2025, 6, 2, 14, 0, 0)
        .unwrap()
}

struct Harness {
    clock: Arc<AnchoredClock>,
    lifecycle: TaskLifecycle<InMemoryTaskStore, ChannelNotifier>,
    sweeper: OverdueSweeper<InMemoryTaskStore, ChannelNotifier>,
    rx: mpsc::Receiver<Notification>,
}

fn make_harness() -> Harness {
    let clock = Arc::new(AnchoredClock::new(origin()));
    let store = Arc::new(InMemoryTaskStore::new());
    let (notifier, rx) = ChannelNotifier::new(32);
    let notifier = Arc::new(notifier);

    let reminders = ReminderScheduler::new(Arc::clone(&notifier), clock.clone());
    let lifecycle = TaskLifecycle::new(Arc::clone(&store), reminders, clock.clone());
    let sweeper = OverdueSweeper::new(
        store,
        notifier,
        RoastSelector::seeded(2025),
        clock.clone(),
        SweepConfig::default(),
    );
    Harness {
        clock,
        lifecycle,
        sweeper,
        rx,
    }
}

/// Whether `text` is a roast for `description` carrying one of the fixed messages.
fn is_roast_for(text: &str, description: &str) -> bool {
    let Some((head, message)) = text.split_once('\n') else {
        return false;
    };
    head == format!("You missed your task: '{description}'")
        && RoastTier::ALL
            .iter()
            .any(|tier| tier.messages().iter().any(|m| *m == message))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn remind_then_roast_then_silence_after_completion() {
    let mut h = make_harness();
    let alice = OwnerId::new("alice");
    h.sweeper.start().await;

    let (task, outcome) = h
        .lifecycle
        .create_task(&alice, "write report", origin() + TimeDelta::hours(2))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        ReminderOutcome::Armed {
            at: origin() + TimeDelta::minutes(90)
        }
    );

    // Reminder at now+1h30m, nothing before it.
    let reminder = h.rx.recv().await.unwrap();
    assert_eq!(reminder.owner, alice);
    assert_eq!(reminder.text, reminder_text("write report"));
    assert_eq!(h.clock.now(), origin() + TimeDelta::minutes(90));

    // First sweep after the deadline roasts it.
    let roast = h.rx.recv().await.unwrap();
    assert_eq!(roast.owner, alice);
    assert!(is_roast_for(&roast.text, "write report"));
    let roasted_at = h.clock.now();
    assert!(roasted_at > task.deadline);
    assert!(roasted_at <= origin() + TimeDelta::minutes(121));

    let swept = h
        .sweeper
        .run_sweep(origin() + TimeDelta::minutes(121))
        .await
        .unwrap();
    assert_eq!(swept.len(), 1);
    assert_eq!(swept[0].id, task.id);
    assert!(is_roast_for(&h.rx.recv().await.unwrap().text, "write report"));

    h.lifecycle.complete_task(&alice, "write report").await.unwrap();

    assert!(h.sweeper.run_sweep(h.clock.now()).await.unwrap().is_empty());
    assert!(
        timeout(Duration::from_secs(10 * 60), h.rx.recv())
            .await
            .is_err()
    );
}

#[tokio::test(start_paused = true)]
async fn roasts_repeat_every_sweep_until_completed() {
    let mut h = make_harness();
    let alice = OwnerId::new("alice");
    h.lifecycle
        .create_task(&alice, "gym", origin() + TimeDelta::minutes(5))
        .await
        .unwrap();
    h.sweeper.set_interval(60).await.unwrap();

    // Sweeps at 10s, 70s, ... 310s, 370s. The deadline is 300s.
    for _ in 0..3 {
        let note = h.rx.recv().await.unwrap();
        assert!(is_roast_for(&note.text, "gym"));
    }
    assert_eq!(h.clock.now(), origin() + TimeDelta::seconds(430));

    h.lifecycle.complete_task(&alice, "gym").await.unwrap();
    assert!(timeout(Duration::from_secs(600), h.rx.recv()).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn removed_task_gets_neither_reminder_nor_roast() {
    let mut h = make_harness();
    let bob = OwnerId::new("bob");
    h.sweeper.start().await;

    h.lifecycle
        .create_task(&bob, "taxes", origin() + TimeDelta::hours(1))
        .await
        .unwrap();
    h.lifecycle.remove_task(&bob, "taxes").await.unwrap();

    assert_eq!(h.lifecycle.reminders().armed_count(), 0);
    assert!(timeout(Duration::from_secs(3 * 3600), h.rx.recv()).await.is_err());
    assert!(
        h.lifecycle
            .list_tasks(&bob, TaskFilter::All)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test(start_paused = true)]
async fn owners_are_roasted_independently() {
    let mut h = make_harness();
    let alice = OwnerId::new("alice");
    let bob = OwnerId::new("bob");

    h.lifecycle
        .create_task(&alice, "essay", origin() + TimeDelta::minutes(1))
        .await
        .unwrap();
    h.lifecycle
        .create_task(&bob, "essay", origin() + TimeDelta::minutes(2))
        .await
        .unwrap();
    h.lifecycle.complete_task(&bob, "essay").await.unwrap();

    let swept = h
        .sweeper
        .run_sweep(origin() + TimeDelta::minutes(5))
        .await
        .unwrap();
    assert_eq!(swept.len(), 1);
    assert_eq!(swept[0].owner, alice);

    let note = h.rx.try_recv().unwrap();
    assert_eq!(note.owner, alice);
    assert!(h.rx.try_recv().is_err());
}
