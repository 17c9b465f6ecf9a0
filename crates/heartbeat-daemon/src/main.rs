//! Heartbeat host entry point.
//!
//! Plays the embedding bridge: steps a simulated target, ticks the
//! heartbeat monitor once per step, and reports whether the target stalled.

mod diagnostics;
mod signals;
mod simulation;

use anyhow::{Context, Result};
use clap::Parser;
use heartbeat_common::config::HostConfig;
use heartbeat_monitor::HeartbeatMonitor;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{info, warn};

use crate::diagnostics::{RunSummary, StopReason};
use crate::signals::SignalHandler;
use crate::simulation::SimulatedTarget;

/// Host steps between periodic status lines.
const STATUS_EVERY_TICKS: u64 = 100_000;

/// Heartbeat host command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "heartbeat-host",
    about = "Simulation host with a heartbeat monitor that detects stalled targets",
    version,
    long_about = None
)]
struct Args {
    /// Path to a host configuration file (TOML).
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Heartbeat log path (overrides config file).
    #[arg(long, value_name = "FILE")]
    log_path: Option<PathBuf>,

    /// Ticks between heartbeat samples (overrides config file).
    #[arg(long, short = 'p')]
    polling_interval: Option<u64>,

    /// Host steps to run (0 = until signalled).
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Freeze the simulated target at this cycle.
    #[arg(long, value_name = "CYCLE")]
    stall_at: Option<u64>,

    /// Stop with exit code 2 as soon as a stall is detected.
    #[arg(long)]
    abort_on_stall: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    init_logging(&args.log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting heartbeat host");

    let mut config = load_config(&args)?;
    apply_overrides(&mut config, &args);

    info!(
        log_path = %config.heartbeat.log_path.display(),
        polling_interval = config.heartbeat.polling_interval,
        "Configuration loaded"
    );

    let signal_handler = SignalHandler::new().context("Failed to set up signal handlers")?;

    let summary = run_host(&config, &signal_handler)?;
    info!(
        reason = %summary.reason,
        health = %summary.health(),
        ticks = summary.ticks,
        samples = summary.monitor.samples_taken,
        final_cycle = summary.final_cycle,
        write_failures = summary.monitor.write_failures,
        signals = signal_handler.state().signal_count(),
        uptime_ms = summary.uptime.as_millis(),
        "Host shutdown complete"
    );

    Ok(ExitCode::from(summary.exit_code()))
}

/// Initialize logging with the specified log level.
fn init_logging(level: &str) {
    let filter =
        format!("heartbeat_host={level},heartbeat_monitor={level},heartbeat_common={level}");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&filter)),
        )
        .with_target(true)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Resolution priority (first existing file wins):
/// 1. Command-line `--config` argument
/// 2. `HEARTBEAT_CONFIG_PATH` environment variable
/// 3. `/etc/heartbeat/config.toml` (system path)
/// 4. `config/default.toml` (local development)
/// 5. Built-in defaults
fn load_config(args: &Args) -> Result<HostConfig> {
    if let Some(config_path) = &args.config {
        info!(?config_path, "Loading config from command-line argument");
        return HostConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path));
    }

    if let Ok(env_path) = std::env::var("HEARTBEAT_CONFIG_PATH") {
        let config_path = PathBuf::from(&env_path);
        if config_path.exists() {
            info!(?config_path, "Loading config from HEARTBEAT_CONFIG_PATH");
            return HostConfig::from_file(&config_path).with_context(|| {
                format!("Failed to load config from HEARTBEAT_CONFIG_PATH={:?}", env_path)
            });
        }
        warn!(
            path = %env_path,
            "HEARTBEAT_CONFIG_PATH set but file does not exist, checking other locations"
        );
    }

    for candidate in ["/etc/heartbeat/config.toml", "config/default.toml"] {
        let config_path = PathBuf::from(candidate);
        if config_path.exists() {
            info!(?config_path, "Loading config file");
            return HostConfig::from_file(&config_path)
                .with_context(|| format!("Failed to load config from {:?}", config_path));
        }
    }

    info!("No config file found, using built-in defaults");
    Ok(HostConfig::default())
}

/// Command-line flags win over file values.
fn apply_overrides(config: &mut HostConfig, args: &Args) {
    if let Some(path) = &args.log_path {
        config.heartbeat.log_path = path.clone();
    }
    if let Some(interval) = args.polling_interval {
        config.heartbeat.polling_interval = interval;
    }
    if let Some(max_ticks) = args.max_ticks {
        config.simulation.max_ticks = max_ticks;
    }
    if let Some(cycle) = args.stall_at {
        config.simulation.stall_at_cycle = Some(cycle);
    }
    if args.abort_on_stall {
        config.simulation.abort_on_stall = true;
    }
}

/// Step the target and tick the monitor until a stop condition is hit.
fn run_host(config: &HostConfig, signal_handler: &SignalHandler) -> Result<RunSummary> {
    let sim = &config.simulation;
    let mut target = SimulatedTarget::new(sim);

    // Under the abort policy an unopenable log ends the process here.
    let mut monitor = HeartbeatMonitor::from_config(&config.heartbeat, target.counter())
        .context("Failed to start heartbeat monitor")?;

    info!(
        cycles_per_step = sim.cycles_per_step,
        stall_at_cycle = ?sim.stall_at_cycle,
        max_ticks = sim.max_ticks,
        "Entering host loop"
    );

    let started = Instant::now();
    let mut ticks = 0u64;

    let reason = loop {
        if signal_handler.shutdown_requested() {
            info!("Shutdown requested, leaving host loop");
            break StopReason::Shutdown;
        }

        target.step();
        monitor.tick();
        ticks += 1;

        if sim.abort_on_stall && monitor.has_timed_out() {
            warn!(
                ticks,
                cycle = target.cycle(),
                injected = target.is_stalled(),
                "Heartbeat timed out, stopping simulation"
            );
            break StopReason::Stall;
        }

        if sim.max_ticks > 0 && ticks >= sim.max_ticks {
            info!(ticks, "Maximum tick count reached");
            break StopReason::MaxTicks;
        }

        if ticks % STATUS_EVERY_TICKS == 0 {
            info!(
                ticks,
                cycle = target.cycle(),
                samples = monitor.samples_taken(),
                timed_out = monitor.has_timed_out(),
                "Periodic status"
            );
        }

        if !sim.step_period.is_zero() {
            std::thread::sleep(sim.step_period);
        }
    };

    let summary = RunSummary {
        reason,
        ticks,
        final_cycle: target.cycle(),
        monitor: monitor.status(),
        uptime: started.elapsed(),
    };

    monitor.close().context("Failed to flush heartbeat log")?;
    Ok(summary)
}
