//! Recurring overdue sweep.
//!
//! [`OverdueSweeper`] owns the single recurring timer that scans the store
//! for overdue, incomplete tasks and roasts each owner. The cadence can be
//! changed at runtime with [`OverdueSweeper::set_interval`], which stops the
//! old timer completely before arming the new one.
//!
//! State machine: `Stopped` → `start`/`set_interval` → `Running(interval)` →
//! `set_interval` → `Running(new)` → `stop` (or drop) → `Stopped`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use roastbot_proto::task::Task;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::clock::Clock;
use crate::notify::Notifier;
use crate::roast::{Roast, RoastSelector};
use crate::store::{StoreError, TaskStore};

/// Default seconds between sweeps.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Delay before the first sweep after (re)arming the timer.
pub const SWEEP_INITIAL_DELAY: Duration = Duration::from_secs(10);

/// Errors from sweep configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SweepError {
    /// The interval was zero or negative.
    #[error("sweep interval must be a positive number of seconds, got {0}")]
    InvalidInterval(i64),
}

/// Cadence of the recurring sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepConfig {
    /// Time between sweeps.
    pub interval: Duration,
    /// Time from arming until the first sweep.
    pub initial_delay: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            initial_delay: SWEEP_INITIAL_DELAY,
        }
    }
}

impl SweepConfig {
    /// Config with the given interval and the standard initial delay.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::InvalidInterval`] if `seconds <= 0`.
    pub fn with_interval_secs(seconds: i64) -> Result<Self, SweepError> {
        let secs = u64::try_from(seconds)
            .ok()
            .filter(|s| *s > 0)
            .ok_or(SweepError::InvalidInterval(seconds))?;
        Ok(Self {
            interval: Duration::from_secs(secs),
            initial_delay: SWEEP_INITIAL_DELAY,
        })
    }
}

/// Observable sweeper state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweeperState {
    /// No recurring timer exists.
    Stopped,
    /// A recurring timer is armed.
    Running {
        /// Time between sweeps.
        interval: Duration,
    },
}

/// Text sent to an owner for an overdue task.
#[must_use]
pub fn roast_text(description: &str, roast: &Roast) -> String {
    format!("You missed your task: '{description}'\n{}", roast.message)
}

struct SweepContext<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    selector: RoastSelector,
    clock: Arc<dyn Clock>,
}

impl<S: TaskStore, N: Notifier> SweepContext<S, N> {
    async fn run_sweep(&self, now: DateTime<FixedOffset>) -> Result<Vec<Task>, StoreError> {
        let overdue = self.store.list_overdue_incomplete(now).await?;
        for task in &overdue {
            let roast = self.selector.select();
            tracing::info!(
                task_id = %task.id,
                owner = %task.owner,
                tier = %roast.tier,
                "roasting overdue task"
            );
            let text = roast_text(&task.description, &roast);
            if let Err(err) = self.notifier.send(&task.owner, &text).await {
                tracing::warn!(task_id = %task.id, error = %err, "roast delivery failed");
            }
        }
        Ok(overdue)
    }
}

struct RunningSweep {
    config: SweepConfig,
    handle: JoinHandle<()>,
}

/// Owns the recurring overdue-sweep timer.
pub struct OverdueSweeper<S, N> {
    ctx: Arc<SweepContext<S, N>>,
    default_config: SweepConfig,
    running: Mutex<Option<RunningSweep>>,
}

impl<S, N> OverdueSweeper<S, N>
where
    S: TaskStore + 'static,
    N: Notifier + 'static,
{
    /// Creates a stopped sweeper. [`start`](Self::start) arms `config`.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        notifier: Arc<N>,
        selector: RoastSelector,
        clock: Arc<dyn Clock>,
        config: SweepConfig,
    ) -> Self {
        Self {
            ctx: Arc::new(SweepContext {
                store,
                notifier,
                selector,
                clock,
            }),
            default_config: config,
            running: Mutex::new(None),
        }
    }

    /// Roast every overdue, incomplete task as of `now`.
    ///
    /// Returns the swept tasks. Task state is never modified, so an unchanged
    /// store yields the same set (and the same notifications) every time.
    /// Delivery failures are logged per task and do not abort the sweep.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the overdue query itself fails.
    pub async fn run_sweep(&self, now: DateTime<FixedOffset>) -> Result<Vec<Task>, StoreError> {
        self.ctx.run_sweep(now).await
    }

    /// Arm the default cadence if no timer is running.
    pub async fn start(&self) {
        let mut running = self.running.lock().await;
        if running.is_none() {
            *running = Some(self.spawn(self.default_config));
            tracing::info!(
                interval_secs = self.default_config.interval.as_secs(),
                "overdue sweeper started"
            );
        }
    }

    /// Replace the running cadence with one sweep every `seconds`.
    ///
    /// The old timer is aborted and awaited before the new one is spawned,
    /// and concurrent calls are serialized, so two timers never coexist. The
    /// first sweep comes [`SWEEP_INITIAL_DELAY`] after this call.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::InvalidInterval`] if `seconds <= 0`; the running
    /// timer is left untouched.
    pub async fn set_interval(&self, seconds: i64) -> Result<SweepConfig, SweepError> {
        let config = SweepConfig::with_interval_secs(seconds)?;
        let mut running = self.running.lock().await;
        if let Some(old) = running.take() {
            old.handle.abort();
            let _ = old.handle.await;
        }
        *running = Some(self.spawn(config));
        drop(running);
        tracing::info!(interval_secs = config.interval.as_secs(), "sweep interval changed");
        Ok(config)
    }

    /// Stop the recurring timer, waiting for it to terminate.
    pub async fn stop(&self) {
        let mut running = self.running.lock().await;
        if let Some(old) = running.take() {
            old.handle.abort();
            let _ = old.handle.await;
            tracing::info!("overdue sweeper stopped");
        }
    }

    /// Current state of the recurring timer.
    pub async fn state(&self) -> SweeperState {
        self.running
            .lock()
            .await
            .as_ref()
            .map_or(SweeperState::Stopped, |r| SweeperState::Running {
                interval: r.config.interval,
            })
    }

    fn spawn(&self, config: SweepConfig) -> RunningSweep {
        let ctx = Arc::clone(&self.ctx);
        let start = Instant::now() + config.initial_delay;
        let handle = tokio::spawn(async move {
            let mut tick = tokio::time::interval_at(start, config.interval);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tick.tick().await;
                let now = ctx.clock.now();
                match ctx.run_sweep(now).await {
                    Ok(swept) => tracing::debug!(count = swept.len(), "overdue sweep finished"),
                    Err(err) => tracing::warn!(error = %err, "overdue sweep failed"),
                }
            }
        });
        RunningSweep { config, handle }
    }
}

impl<S, N> Drop for OverdueSweeper<S, N> {
    fn drop(&mut self) {
        if let Some(running) = self.running.get_mut().take() {
            running.handle.abort();
        }
    }
}
