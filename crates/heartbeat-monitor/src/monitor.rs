//! Polling heartbeat monitor for a simulated target.
//!
//! The host calls [`HeartbeatMonitor::tick`] once per host step. Every
//! `polling_interval` ticks the monitor samples the target cycle, flags a
//! stall if the cycle did not move since the previous sample, and appends
//! a `<cycle>, <seconds since start>` row to the heartbeat log.
//!
//! Sampling only every N ticks keeps timestamping and file I/O off the
//! per-step path, which may run once per simulated cycle.
//!
//! The stall flag is sticky. The monitor never acts on it; the host polls
//! [`HeartbeatMonitor::has_timed_out`] and decides.

use crate::clock::{elapsed_secs, SystemClock, WallClock};
use crate::record::{HeartbeatRecord, HEADER};
use crate::source::CycleSource;
use heartbeat_common::config::{HeartbeatConfig, OpenFailurePolicy, WriteFailurePolicy};
use heartbeat_common::error::{HeartbeatError, HeartbeatResult};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, error, info, trace, warn};

/// One sampling instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatSample {
    /// Target cycle read from the source.
    pub cycle: u64,
    /// Whole wall-clock seconds since construction.
    pub elapsed_secs: i64,
    /// Whether `cycle` equalled the previous sample's cycle.
    pub stalled: bool,
}

impl HeartbeatSample {
    /// The log row for this sample.
    pub fn record(&self) -> HeartbeatRecord {
        HeartbeatRecord {
            cycle: self.cycle,
            elapsed_secs: self.elapsed_secs,
        }
    }
}

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Counted toward the next sample, nothing else happened.
    Waiting {
        /// Trip count after this tick.
        trip_count: u64,
    },
    /// The target was sampled and a row was written.
    Sampled(HeartbeatSample),
}

/// Point-in-time view of the monitor for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorStatus {
    /// Ticks between samples.
    pub polling_interval: u64,
    /// Ticks counted since the last sample.
    pub trip_count: u64,
    /// Cycle seen at the last sample (0 before the first).
    pub last_cycle: u64,
    /// Sticky stall flag.
    pub has_timed_out: bool,
    /// Sampling instants so far.
    pub samples_taken: u64,
    /// Rows that could not be written.
    pub write_failures: u64,
}

/// Heartbeat monitor over a cycle source, a log sink, and a wall clock.
///
/// Defaults to a buffered file log and the system clock. The log is flushed
/// after every row and again on drop.
pub struct HeartbeatMonitor<S, W = BufWriter<File>, C = SystemClock>
where
    S: CycleSource,
    W: Write,
    C: WallClock,
{
    source: S,
    log: W,
    clock: C,
    polling_interval: u64,
    trip_count: u64,
    last_cycle: u64,
    has_timed_out: bool,
    start_time: SystemTime,
    samples_taken: u64,
    last_sample: Option<HeartbeatSample>,
    write_failure_policy: WriteFailurePolicy,
    write_failures: u64,
}

impl<S: CycleSource> HeartbeatMonitor<S> {
    /// Create the heartbeat log at `path` (truncating it) and start monitoring.
    ///
    /// # Errors
    ///
    /// Returns [`HeartbeatError::LogOpen`] if the file cannot be created,
    /// [`HeartbeatError::Config`] for a zero interval, or
    /// [`HeartbeatError::LogWrite`] if the header cannot be written.
    pub fn open(path: &Path, source: S, polling_interval: u64) -> HeartbeatResult<Self> {
        Self::open_with_clock(path, source, SystemClock, polling_interval)
    }

    /// Build a monitor from configuration, applying its open-failure policy.
    ///
    /// With [`OpenFailurePolicy::Abort`] a log that cannot be opened prints a
    /// diagnostic to stderr and aborts the process; this call then never
    /// returns an open error.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid configuration, or for an unopenable log
    /// under [`OpenFailurePolicy::Error`].
    pub fn from_config(config: &HeartbeatConfig, source: S) -> HeartbeatResult<Self> {
        config.validate()?;

        match Self::open(&config.log_path, source, config.polling_interval) {
            Ok(monitor) => Ok(monitor.with_write_failure_policy(config.on_write_failure)),
            Err(e) if config.on_open_failure == OpenFailurePolicy::Abort => fail_fast(&e),
            Err(e) => Err(e),
        }
    }
}

impl<S: CycleSource, C: WallClock> HeartbeatMonitor<S, BufWriter<File>, C> {
    /// Like [`HeartbeatMonitor::open`] with an explicit clock.
    ///
    /// # Errors
    ///
    /// See [`HeartbeatMonitor::open`].
    pub fn open_with_clock(
        path: &Path,
        source: S,
        clock: C,
        polling_interval: u64,
    ) -> HeartbeatResult<Self> {
        let file = File::create(path).map_err(|e| HeartbeatError::LogOpen {
            path: path.to_path_buf(),
            source: e,
        })?;
        info!(path = %path.display(), polling_interval, "Heartbeat log opened");
        Self::with_writer_and_clock(BufWriter::new(file), source, clock, polling_interval)
    }
}

impl<S: CycleSource, W: Write> HeartbeatMonitor<S, W> {
    /// Monitor writing to an arbitrary sink with the system clock.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero interval or if the header cannot be written.
    pub fn with_writer(log: W, source: S, polling_interval: u64) -> HeartbeatResult<Self> {
        Self::with_writer_and_clock(log, source, SystemClock, polling_interval)
    }
}

impl<S, W, C> HeartbeatMonitor<S, W, C>
where
    S: CycleSource,
    W: Write,
    C: WallClock,
{
    /// Fully explicit constructor: writes the header and records the start time.
    ///
    /// # Errors
    ///
    /// Returns [`HeartbeatError::Config`] for a zero interval or
    /// [`HeartbeatError::LogWrite`] if the header cannot be written.
    pub fn with_writer_and_clock(
        mut log: W,
        source: S,
        clock: C,
        polling_interval: u64,
    ) -> HeartbeatResult<Self> {
        if polling_interval == 0 {
            return Err(HeartbeatError::Config(
                "polling_interval must be at least 1".into(),
            ));
        }

        writeln!(log, "{HEADER}")
            .and_then(|()| log.flush())
            .map_err(HeartbeatError::LogWrite)?;

        let start_time = clock.now();

        Ok(Self {
            source,
            log,
            clock,
            polling_interval,
            trip_count: 0,
            last_cycle: 0,
            has_timed_out: false,
            start_time,
            samples_taken: 0,
            last_sample: None,
            write_failure_policy: WriteFailurePolicy::default(),
            write_failures: 0,
        })
    }

    /// Set what [`HeartbeatMonitor::tick`] does when a row cannot be written.
    #[must_use]
    pub fn with_write_failure_policy(mut self, policy: WriteFailurePolicy) -> Self {
        self.write_failure_policy = policy;
        self
    }

    /// Advance the trip counter, sampling when it reaches the interval.
    ///
    /// Write failures are handled by the configured [`WriteFailurePolicy`].
    pub fn tick(&mut self) {
        if let Err(e) = self.try_tick() {
            self.handle_write_failure(&e);
        }
    }

    /// Like [`HeartbeatMonitor::tick`] but reports what happened.
    ///
    /// Monitor state (stall flag, last cycle) is updated even when the row
    /// cannot be written.
    ///
    /// # Errors
    ///
    /// Returns [`HeartbeatError::LogWrite`] if the row cannot be written.
    pub fn try_tick(&mut self) -> HeartbeatResult<TickOutcome> {
        self.trip_count += 1;
        if self.trip_count < self.polling_interval {
            trace!(trip_count = self.trip_count, "Heartbeat waiting");
            return Ok(TickOutcome::Waiting {
                trip_count: self.trip_count,
            });
        }

        self.trip_count = 0;
        let sample = self.sample();
        self.write_record(sample.record())?;
        Ok(TickOutcome::Sampled(sample))
    }

    fn sample(&mut self) -> HeartbeatSample {
        let cycle = self.source.current_cycle();
        let stalled = cycle == self.last_cycle;

        if stalled && !self.has_timed_out {
            warn!(
                cycle,
                polling_interval = self.polling_interval,
                "Target cycle did not advance across a polling interval"
            );
        }
        self.has_timed_out |= stalled;

        let elapsed_secs = elapsed_secs(self.start_time, self.clock.now());
        let sample = HeartbeatSample {
            cycle,
            elapsed_secs,
            stalled,
        };

        debug!(cycle, elapsed_secs, stalled, "Heartbeat sample");

        self.last_cycle = cycle;
        self.samples_taken += 1;
        self.last_sample = Some(sample);
        sample
    }

    fn write_record(&mut self, record: HeartbeatRecord) -> HeartbeatResult<()> {
        writeln!(self.log, "{record}")
            .and_then(|()| self.log.flush())
            .map_err(HeartbeatError::LogWrite)
    }

    fn handle_write_failure(&mut self, err: &HeartbeatError) {
        self.write_failures += 1;
        match self.write_failure_policy {
            WriteFailurePolicy::Abort => fail_fast(err),
            WriteFailurePolicy::Warn => {
                warn!(
                    error = %err,
                    write_failures = self.write_failures,
                    "Heartbeat row dropped"
                );
            }
        }
    }

    /// Flush the log and release the monitor.
    ///
    /// # Errors
    ///
    /// Returns [`HeartbeatError::LogWrite`] if the final flush fails.
    pub fn close(mut self) -> HeartbeatResult<()> {
        self.log.flush().map_err(HeartbeatError::LogWrite)
    }

    /// Sticky stall flag: true once two consecutive samples saw the same cycle.
    #[inline]
    pub fn has_timed_out(&self) -> bool {
        self.has_timed_out
    }

    /// Ticks counted since the last sample.
    #[inline]
    pub fn trip_count(&self) -> u64 {
        self.trip_count
    }

    /// Ticks between samples.
    pub fn polling_interval(&self) -> u64 {
        self.polling_interval
    }

    /// Cycle seen at the last sample, 0 before the first.
    pub fn last_cycle(&self) -> u64 {
        self.last_cycle
    }

    /// Number of sampling instants so far.
    pub fn samples_taken(&self) -> u64 {
        self.samples_taken
    }

    /// Most recent sample, if any.
    pub fn last_sample(&self) -> Option<HeartbeatSample> {
        self.last_sample
    }

    /// Rows that could not be written under [`WriteFailurePolicy::Warn`].
    pub fn write_failures(&self) -> u64 {
        self.write_failures
    }

    /// Wall-clock time captured at construction.
    pub fn start_time(&self) -> SystemTime {
        self.start_time
    }

    /// The log sink.
    pub fn log(&self) -> &W {
        &self.log
    }

    /// Snapshot of the monitor state.
    pub fn status(&self) -> MonitorStatus {
        MonitorStatus {
            polling_interval: self.polling_interval,
            trip_count: self.trip_count,
            last_cycle: self.last_cycle,
            has_timed_out: self.has_timed_out,
            samples_taken: self.samples_taken,
            write_failures: self.write_failures,
        }
    }
}

impl<S, W, C> std::fmt::Debug for HeartbeatMonitor<S, W, C>
where
    S: CycleSource,
    W: Write,
    C: WallClock,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeartbeatMonitor")
            .field("status", &self.status())
            .field("start_time", &self.start_time)
            .finish_non_exhaustive()
    }
}

impl<S, W, C> Drop for HeartbeatMonitor<S, W, C>
where
    S: CycleSource,
    W: Write,
    C: WallClock,
{
    fn drop(&mut self) {
        if let Err(e) = self.log.flush() {
            warn!("Failed to flush heartbeat log on teardown: {}", e);
        }
    }
}

/// Report a fatal heartbeat error and abort the process.
fn fail_fast(err: &HeartbeatError) -> ! {
    error!(error = %err, "Fatal heartbeat error, aborting");
    eprintln!("{err}");
    std::process::abort()
}
