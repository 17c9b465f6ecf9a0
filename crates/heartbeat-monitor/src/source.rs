//! Progress sources the monitor samples.
//!
//! The embedding bridge exposes the simulated target's cycle counter
//! through [`CycleSource`]. Reads are expected to be cheap and free of
//! side effects; the monitor may call them at any sampling instant.

use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Something that reports the simulated target's current cycle.
pub trait CycleSource {
    /// Current target cycle (fastest clock domain).
    fn current_cycle(&self) -> u64;
}

impl<F> CycleSource for F
where
    F: Fn() -> u64,
{
    fn current_cycle(&self) -> u64 {
        self()
    }
}

impl CycleSource for AtomicU64 {
    fn current_cycle(&self) -> u64 {
        self.load(Ordering::Acquire)
    }
}

impl<T: CycleSource + ?Sized> CycleSource for Arc<T> {
    fn current_cycle(&self) -> u64 {
        (**self).current_cycle()
    }
}

impl<T: CycleSource + ?Sized> CycleSource for Rc<T> {
    fn current_cycle(&self) -> u64 {
        (**self).current_cycle()
    }
}

/// Cloneable cycle counter shared between a simulation driver and the monitor.
///
/// The driver side advances it; the monitor side only reads.
#[derive(Debug, Clone, Default)]
pub struct SharedCycleCounter {
    cycle: Arc<AtomicU64>,
}

impl SharedCycleCounter {
    /// Create a counter starting at `initial`.
    pub fn new(initial: u64) -> Self {
        Self {
            cycle: Arc::new(AtomicU64::new(initial)),
        }
    }

    /// Advance the counter by `cycles`, saturating at `u64::MAX`.
    ///
    /// Returns the new value.
    pub fn advance(&self, cycles: u64) -> u64 {
        let mut current = self.cycle.load(Ordering::Acquire);
        loop {
            let next = current.saturating_add(cycles);
            match self.cycle.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }

    /// Overwrite the counter.
    pub fn set(&self, cycle: u64) {
        self.cycle.store(cycle, Ordering::Release);
    }

    /// Read the counter.
    #[inline]
    pub fn get(&self) -> u64 {
        self.cycle.load(Ordering::Acquire)
    }
}

impl CycleSource for SharedCycleCounter {
    #[inline]
    fn current_cycle(&self) -> u64 {
        self.get()
    }
}
