//! Run summary reported when the host loop exits.

use heartbeat_monitor::MonitorStatus;
use std::time::Duration;

/// Why the host loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The configured number of host steps completed.
    MaxTicks,
    /// SIGTERM/SIGINT or a manual shutdown request.
    Shutdown,
    /// The monitor flagged a stall and `abort_on_stall` was set.
    Stall,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::MaxTicks => write!(f, "max_ticks"),
            StopReason::Shutdown => write!(f, "shutdown"),
            StopReason::Stall => write!(f, "stall"),
        }
    }
}

/// Health verdict for the simulated target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// No stall observed.
    Healthy,
    /// The heartbeat monitor saw the target cycle stop moving.
    Stalled,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Stalled => write!(f, "stalled"),
        }
    }
}

/// Outcome of one host run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Why the loop ended.
    pub reason: StopReason,
    /// Host steps executed.
    pub ticks: u64,
    /// Target cycle at exit.
    pub final_cycle: u64,
    /// Monitor state at exit.
    pub monitor: MonitorStatus,
    /// Wall time spent in the loop.
    pub uptime: Duration,
}

impl RunSummary {
    /// Health verdict derived from the monitor's stall flag.
    pub fn health(&self) -> HealthStatus {
        if self.monitor.has_timed_out {
            HealthStatus::Stalled
        } else {
            HealthStatus::Healthy
        }
    }

    /// Process exit code for this run: 2 when the run was cut short by a stall.
    pub fn exit_code(&self) -> u8 {
        match self.reason {
            StopReason::Stall => 2,
            StopReason::MaxTicks | StopReason::Shutdown => 0,
        }
    }
}
