//! Wall-clock access for heartbeat timestamps.
//!
//! Elapsed time in the heartbeat log is measured in whole wall-clock
//! seconds, the same resolution as a `time_t` difference. Tests swap in
//! [`ManualClock`] to control it.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of wall-clock time.
pub trait WallClock {
    /// Current wall-clock time.
    fn now(&self) -> SystemTime;
}

/// The host's real-time clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    #[inline]
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Settable clock with one-second resolution.
///
/// Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    unix_secs: Arc<AtomicI64>,
}

impl ManualClock {
    /// Create a clock reading `unix_secs` seconds after the epoch.
    pub fn new(unix_secs: i64) -> Self {
        Self {
            unix_secs: Arc::new(AtomicI64::new(unix_secs)),
        }
    }

    /// Move the clock forward (or backward, with a negative value).
    pub fn advance_secs(&self, secs: i64) {
        self.unix_secs.fetch_add(secs, Ordering::Relaxed);
    }

    /// Set the clock to an absolute time.
    pub fn set_unix_secs(&self, secs: i64) {
        self.unix_secs.store(secs, Ordering::Relaxed);
    }
}

impl WallClock for ManualClock {
    fn now(&self) -> SystemTime {
        let secs = self.unix_secs.load(Ordering::Relaxed);
        if secs >= 0 {
            UNIX_EPOCH + Duration::from_secs(secs.unsigned_abs())
        } else {
            UNIX_EPOCH - Duration::from_secs(secs.unsigned_abs())
        }
    }
}

/// Whole seconds between the Unix epoch and `time`, negative before it.
pub fn unix_secs(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_secs()).unwrap_or(i64::MAX),
        Err(e) => {
            // Round toward negative infinity, like time() would report.
            let before = e.duration();
            let secs = i64::try_from(before.as_secs()).unwrap_or(i64::MAX);
            if before.subsec_nanos() > 0 {
                -secs - 1
            } else {
                -secs
            }
        }
    }
}

/// Whole seconds from `start` to `now`. Negative if the clock stepped back.
pub fn elapsed_secs(start: SystemTime, now: SystemTime) -> i64 {
    unix_secs(now).saturating_sub(unix_secs(start))
}
