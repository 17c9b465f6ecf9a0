//! Acceptance tests for the simulation heartbeat monitor.
//!
//! These verify the monitor's observable contract against real log files:
//! - Sampling periodicity and trip counter bounds
//! - Sticky stall detection and absence of false positives
//! - Log layout: one header, time-ordered rows

mod acceptance;
