//! Common utilities for acceptance tests.
//!
//! Provides a scripted cycle source and a scratch-directory fixture so
//! each test can replay an exact sequence of target cycles.

use heartbeat_monitor::{CycleSource, HeartbeatMonitor, ManualClock};
use std::cell::Cell;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

/// Cycle source that replays a fixed script, one value per sampling instant.
///
/// Once the script is exhausted the last value repeats.
pub struct ScriptedTarget {
    script: Vec<u64>,
    next: Cell<usize>,
}

impl ScriptedTarget {
    /// Create a target that reports `script` in order.
    pub fn new(script: Vec<u64>) -> Self {
        assert!(!script.is_empty(), "script needs at least one cycle");
        Self {
            script,
            next: Cell::new(0),
        }
    }

    /// Number of times the monitor has read the target.
    pub fn reads(&self) -> usize {
        self.next.get()
    }
}

impl CycleSource for ScriptedTarget {
    fn current_cycle(&self) -> u64 {
        let idx = self.next.get();
        self.next.set(idx + 1);
        self.script[idx.min(self.script.len() - 1)]
    }
}

/// Scratch directory holding one heartbeat log.
pub struct Fixture {
    /// Kept alive so the directory outlives the test body.
    _dir: tempfile::TempDir,
    /// Path of the heartbeat log inside the directory.
    pub log_path: PathBuf,
    /// Clock handed to the monitor.
    pub clock: ManualClock,
}

impl Fixture {
    /// Fresh directory and a clock at an arbitrary fixed time.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let log_path = dir.path().join("heartbeat.csv");
        Self {
            _dir: dir,
            log_path,
            clock: ManualClock::new(1_600_000_000),
        }
    }

    /// Open a file-backed monitor in this fixture.
    pub fn monitor<S: CycleSource>(
        &self,
        source: S,
        polling_interval: u64,
    ) -> HeartbeatMonitor<S, BufWriter<File>, ManualClock> {
        HeartbeatMonitor::open_with_clock(
            &self.log_path,
            source,
            self.clock.clone(),
            polling_interval,
        )
        .expect("failed to open heartbeat log")
    }

    /// Raw log contents.
    pub fn read_log(&self) -> String {
        std::fs::read_to_string(&self.log_path).expect("failed to read heartbeat log")
    }
}
