//! Property tests for the overdue predicate and list filters.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{DateTime, FixedOffset, TimeDelta, TimeZone};
use proptest::prelude::*;
use roastbot_proto::task::{OwnerId, Task, TaskFilter, TaskId};

fn base() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(5 * 3600 + 1800)
        .unwrap()
        .with_ymd_and_hms(2025, 1, 1, 9, 0, 0)
        .unwrap()
}

fn task_at(offset_secs: i64, completed: bool) -> Task {
    Task {
        id: TaskId::new(),
        owner: OwnerId::new("owner"),
        description: "task".to_string(),
        deadline: base() + TimeDelta::seconds(offset_secs),
        completed,
    }
}

proptest! {
    #[test]
    fn overdue_iff_past_and_incomplete(
        deadline_secs in -1_000_000i64..1_000_000,
        now_secs in -1_000_000i64..1_000_000,
        completed in any::<bool>(),
    ) {
        let task = task_at(deadline_secs, completed);
        let now = base() + TimeDelta::seconds(now_secs);
        prop_assert_eq!(task.is_overdue(now), !completed && deadline_secs < now_secs);
    }

    #[test]
    fn completed_tasks_are_never_overdue(
        deadline_secs in -1_000_000i64..1_000_000,
        later_secs in 0i64..10_000_000,
    ) {
        let task = task_at(deadline_secs, true);
        let now = base() + TimeDelta::seconds(deadline_secs + later_secs);
        prop_assert!(!task.is_overdue(now));
    }

    #[test]
    fn pending_and_completed_partition_all(completed in any::<bool>()) {
        prop_assert!(TaskFilter::All.admits(completed));
        prop_assert_ne!(
            TaskFilter::Pending.admits(completed),
            TaskFilter::Completed.admits(completed)
        );
    }

    #[test]
    fn reminder_precedes_deadline(deadline_secs in -1_000_000i64..1_000_000) {
        let task = task_at(deadline_secs, false);
        prop_assert_eq!(task.deadline - task.reminder_at(), TimeDelta::minutes(30));
    }
}
