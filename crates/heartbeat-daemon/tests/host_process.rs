//! End-to-end tests that run the `heartbeat-host` binary.
//!
//! These cover the process-level contract: the fail-fast abort when the
//! heartbeat log cannot be opened, and the exit codes of normal and
//! stall-aborted runs.

use heartbeat_monitor::{HeartbeatLog, HEADER};
use std::path::Path;
use std::process::{Command, Output};

fn run_host(dir: &Path, extra: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_heartbeat-host"))
        .current_dir(dir)
        .env_remove("HEARTBEAT_CONFIG_PATH")
        .env("RUST_LOG", "warn")
        .args(extra)
        .output()
        .expect("failed to launch heartbeat-host")
}

/// Write a config with no step delay so runs finish quickly.
fn write_config(dir: &Path, body: &str) -> String {
    let path = dir.join("host.toml");
    let content = format!("[simulation]\nstep_period = \"0s\"\n{body}");
    std::fs::write(&path, content).unwrap();
    path.display().to_string()
}

#[test]
fn test_unopenable_log_aborts_process() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");
    let bad_log = dir.path().join("missing").join("heartbeat.csv");

    let output = run_host(
        dir.path(),
        &[
            "-c",
            &config,
            "--log-path",
            bad_log.to_str().unwrap(),
            "--max-ticks",
            "10",
        ],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("could not open heartbeat output file"),
        "unexpected stderr: {stderr}"
    );
    assert!(!bad_log.exists());
}

#[test]
fn test_clean_run_exits_zero_and_writes_log() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");
    let log_path = dir.path().join("heartbeat.csv");

    let output = run_host(
        dir.path(),
        &[
            "-c",
            &config,
            "--log-path",
            log_path.to_str().unwrap(),
            "-p",
            "4",
            "--max-ticks",
            "40",
        ],
    );

    assert!(output.status.success(), "status: {:?}", output.status);
    let content = std::fs::read_to_string(&log_path).unwrap();
    assert!(content.starts_with(HEADER));

    let log = HeartbeatLog::read(&log_path).unwrap();
    assert_eq!(log.len(), 10);
    assert!(log.stalls().is_empty());
}

#[test]
fn test_stall_with_abort_on_stall_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");
    let log_path = dir.path().join("heartbeat.csv");

    let output = run_host(
        dir.path(),
        &[
            "-c",
            &config,
            "--log-path",
            log_path.to_str().unwrap(),
            "-p",
            "5",
            "--stall-at",
            "12",
            "--abort-on-stall",
            "--max-ticks",
            "10000",
        ],
    );

    assert_eq!(output.status.code(), Some(2));

    let log = HeartbeatLog::read(&log_path).unwrap();
    let cycles: Vec<u64> = log.records().iter().map(|r| r.cycle).collect();
    assert_eq!(cycles, vec![5, 10, 12, 12]);
}

#[test]
fn test_stall_without_abort_runs_to_completion() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "[heartbeat]\npolling_interval = 2\n");
    let log_path = dir.path().join("heartbeat.csv");

    let output = run_host(
        dir.path(),
        &[
            "-c",
            &config,
            "--log-path",
            log_path.to_str().unwrap(),
            "--stall-at",
            "3",
            "--max-ticks",
            "8",
        ],
    );

    assert!(output.status.success());
    let log = HeartbeatLog::read(&log_path).unwrap();
    assert_eq!(log.len(), 4);
    assert_eq!(log.stalls().len(), 2);
}
