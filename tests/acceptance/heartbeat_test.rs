//! Heartbeat monitor acceptance tests.
//!
//! # Acceptance Criteria
//!
//! - Exactly one sample per `polling_interval` ticks; trip count stays in range
//! - Two equal consecutive samples set the stall flag for good
//! - A target that always advances is never flagged
//! - The header is the first line and appears once
//! - The seconds column never decreases

use super::common::{Fixture, ScriptedTarget};
use heartbeat_monitor::{HeartbeatLog, SharedCycleCounter, TickOutcome, HEADER};
use std::rc::Rc;

#[test]
fn test_periodicity_across_intervals() {
    for interval in [1u64, 2, 3, 7, 64] {
        let fixture = Fixture::new();
        let target = SharedCycleCounter::new(0);
        let mut monitor = fixture.monitor(target.clone(), interval);

        let calls = interval * 25;
        let mut sampled_at = Vec::new();
        for call in 1..=calls {
            target.advance(1);
            if let TickOutcome::Sampled(_) = monitor.try_tick().unwrap() {
                sampled_at.push(call);
            }
            assert!(monitor.trip_count() < interval);
        }

        let expected: Vec<u64> = (1..=25).map(|n| n * interval).collect();
        assert_eq!(sampled_at, expected, "interval {interval}");
        assert!(!monitor.has_timed_out());
    }
}

#[test]
fn test_six_tick_scenario() {
    let fixture = Fixture::new();
    let target = Rc::new(ScriptedTarget::new(vec![100, 100]));
    let mut monitor = fixture.monitor(Rc::clone(&target), 3);

    for call in 1..=6 {
        monitor.tick();
        if call == 3 {
            assert!(!monitor.has_timed_out());
            assert_eq!(monitor.last_cycle(), 100);
        }
    }
    assert!(monitor.has_timed_out());
    // Only sampling instants read the target
    assert_eq!(target.reads(), 2);
    drop(monitor);

    let log = HeartbeatLog::read(&fixture.log_path).unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log.records()[1].cycle, 100);
}

#[test]
fn test_stall_flag_survives_recovery() {
    let fixture = Fixture::new();
    let target = Rc::new(ScriptedTarget::new(vec![10, 20, 20, 30, 40, 50, 60]));
    let mut monitor = fixture.monitor(Rc::clone(&target), 2);

    let mut flag_history = Vec::new();
    for _ in 0..7 {
        monitor.tick();
        monitor.tick();
        flag_history.push(monitor.has_timed_out());
    }
    assert_eq!(
        flag_history,
        vec![false, false, true, true, true, true, true]
    );
}

#[test]
fn test_strictly_increasing_target_never_flagged() {
    let fixture = Fixture::new();
    let script: Vec<u64> = (1..=500).map(|n| n * n).collect();
    let target = Rc::new(ScriptedTarget::new(script));
    let mut monitor = fixture.monitor(Rc::clone(&target), 4);

    for _ in 0..2_000 {
        monitor.tick();
    }
    assert_eq!(monitor.samples_taken(), 500);
    assert!(!monitor.has_timed_out());
}

#[test]
fn test_single_header_before_rows() {
    let fixture = Fixture::new();
    let target = SharedCycleCounter::new(0);
    let mut monitor = fixture.monitor(target.clone(), 2);

    assert_eq!(fixture.read_log(), format!("{HEADER}\n"));

    for _ in 0..10 {
        target.advance(5);
        monitor.tick();
    }
    monitor.close().unwrap();

    let content = fixture.read_log();
    let mut lines = content.lines();
    assert_eq!(lines.next(), Some(HEADER));
    assert_eq!(content.matches(HEADER).count(), 1);
    assert_eq!(lines.count(), 5);
}

#[test]
fn test_seconds_column_non_decreasing() {
    let fixture = Fixture::new();
    let target = SharedCycleCounter::new(0);
    let mut monitor = fixture.monitor(target.clone(), 3);

    for step in 0..60u64 {
        target.advance(2);
        if step % 7 == 0 {
            fixture.clock.advance_secs(1);
        }
        monitor.tick();
    }
    monitor.close().unwrap();

    let log = HeartbeatLog::read(&fixture.log_path).unwrap();
    assert_eq!(log.len(), 20);
    assert!(log.is_time_ordered());
    assert_eq!(log.records()[0].elapsed_secs, 1);
}
