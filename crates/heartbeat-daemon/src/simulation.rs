//! Simulated target driven by the host loop.
//!
//! Stands in for the bridge's view of the FPGA/software simulation: a cycle
//! counter that moves forward each host step and can be told to freeze at a
//! given cycle to reproduce a hung target.

use heartbeat_common::config::SimulationConfig;
use heartbeat_monitor::SharedCycleCounter;
use tracing::warn;

/// Target whose cycle counter advances per host step.
#[derive(Debug, Clone)]
pub struct SimulatedTarget {
    counter: SharedCycleCounter,
    cycles_per_step: u64,
    stall_at_cycle: Option<u64>,
    stalled: bool,
}

impl SimulatedTarget {
    /// Create a target at cycle 0.
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            counter: SharedCycleCounter::new(0),
            cycles_per_step: config.cycles_per_step,
            stall_at_cycle: config.stall_at_cycle,
            stalled: false,
        }
    }

    /// Handle the monitor reads the cycle through.
    pub fn counter(&self) -> SharedCycleCounter {
        self.counter.clone()
    }

    /// Run one host step. Returns the cycle after the step.
    pub fn step(&mut self) -> u64 {
        let current = self.counter.get();
        let Some(limit) = self.stall_at_cycle else {
            return self.counter.advance(self.cycles_per_step);
        };

        if current >= limit {
            if !self.stalled {
                self.stalled = true;
                warn!(cycle = current, "Simulated target stalled");
            }
            return current;
        }

        self.counter.advance(self.cycles_per_step.min(limit - current))
    }

    /// Current target cycle.
    pub fn cycle(&self) -> u64 {
        self.counter.get()
    }

    /// Whether the target has reached its stall point.
    pub fn is_stalled(&self) -> bool {
        self.stalled
    }
}
