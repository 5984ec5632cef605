//! Time source in the process-wide canonical offset.
//!
//! All deadlines are normalized to one fixed offset (IST, `+05:30`, by
//! default). [`SystemClock`] reads the wall clock; [`AnchoredClock`] derives
//! wall time from tokio's clock so paused-time tests see deadlines and timers
//! advance together.

use std::time::Duration;

use chrono::{DateTime, FixedOffset, Offset, TimeDelta, Utc};

/// Default canonical offset in seconds east of UTC (`+05:30`).
pub const DEFAULT_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Returns the default canonical offset.
#[must_use]
pub fn default_offset() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Supplies "now" in the canonical offset.
pub trait Clock: Send + Sync {
    /// Current time, expressed in [`offset`](Self::offset).
    fn now(&self) -> DateTime<FixedOffset>;

    /// The canonical offset every timestamp is normalized to.
    fn offset(&self) -> FixedOffset;
}

/// Wall-clock time source.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    /// Creates a system clock reporting time in `offset`.
    #[must_use]
    pub const fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(default_offset())
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}

/// A clock pinned to a wall-clock origin and advanced by tokio's clock.
///
/// Under `tokio::time::pause()` the reported time moves only when the
/// runtime auto-advances, in lockstep with sleeps and intervals.
#[derive(Debug, Clone, Copy)]
pub struct AnchoredClock {
    origin: DateTime<FixedOffset>,
    anchor: tokio::time::Instant,
}

impl AnchoredClock {
    /// Anchors `origin` to tokio's current instant.
    #[must_use]
    pub fn new(origin: DateTime<FixedOffset>) -> Self {
        Self {
            origin,
            anchor: tokio::time::Instant::now(),
        }
    }
}

impl Clock for AnchoredClock {
    fn now(&self) -> DateTime<FixedOffset> {
        let elapsed = TimeDelta::from_std(self.anchor.elapsed()).unwrap_or_else(|_| TimeDelta::zero());
        self.origin + elapsed
    }

    fn offset(&self) -> FixedOffset {
        *self.origin.offset()
    }
}

/// How long to wait from `now` until `at`, or `None` if `at` is not in the future.
#[must_use]
pub fn delay_until(now: DateTime<FixedOffset>, at: DateTime<FixedOffset>) -> Option<Duration> {
    if at <= now {
        return None;
    }
    (at - now).to_std().ok()
}
