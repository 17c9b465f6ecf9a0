//! Configuration structures for the heartbeat monitor and its host.
//!
//! Supports TOML deserialization with defaults that mirror a typical
//! simulation host: `heartbeat.csv` in the working directory, fail-fast
//! on log errors.

use crate::error::{HeartbeatError, HeartbeatResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default number of ticks between two heartbeat samples.
pub const DEFAULT_POLLING_INTERVAL: u64 = 10_000;

/// Default heartbeat log file name.
pub const DEFAULT_LOG_PATH: &str = "heartbeat.csv";

/// Top-level host configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Heartbeat monitor settings.
    pub heartbeat: HeartbeatConfig,

    /// Simulated target settings for the host binary.
    pub simulation: SimulationConfig,
}

/// Heartbeat monitor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartbeatConfig {
    /// Path of the heartbeat CSV log.
    pub log_path: PathBuf,

    /// Ticks between samples. Must be at least 1.
    pub polling_interval: u64,

    /// What the host does when the log cannot be opened.
    pub on_open_failure: OpenFailurePolicy,

    /// What `tick()` does when a row cannot be written.
    pub on_write_failure: WriteFailurePolicy,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            polling_interval: DEFAULT_POLLING_INTERVAL,
            on_open_failure: OpenFailurePolicy::Abort,
            on_write_failure: WriteFailurePolicy::Abort,
        }
    }
}

impl HeartbeatConfig {
    /// Check invariants that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`HeartbeatError::Config`] if the polling interval is zero
    /// or the log path is empty.
    pub fn validate(&self) -> HeartbeatResult<()> {
        if self.polling_interval == 0 {
            return Err(HeartbeatError::Config(
                "polling_interval must be at least 1".into(),
            ));
        }
        if self.log_path.as_os_str().is_empty() {
            return Err(HeartbeatError::Config("log_path must not be empty".into()));
        }
        Ok(())
    }
}

/// Policy for a heartbeat log that cannot be opened at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OpenFailurePolicy {
    /// Print a diagnostic to stderr and abort the process.
    #[default]
    Abort,
    /// Return the error to the caller.
    Error,
}

/// Policy for a heartbeat row that cannot be written mid-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WriteFailurePolicy {
    /// Log the failure and abort the process.
    #[default]
    Abort,
    /// Log a warning, count the failure, keep ticking.
    Warn,
}

/// Simulated target driven by the host binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Target cycles advanced per host step.
    pub cycles_per_step: u64,

    /// Freeze the target counter once it reaches this cycle.
    pub stall_at_cycle: Option<u64>,

    /// Wall-clock pause between host steps.
    #[serde(with = "humantime_serde")]
    pub step_period: Duration,

    /// Host steps to run before exiting (0 = until signalled).
    pub max_ticks: u64,

    /// Stop the run as soon as the monitor reports a stall.
    pub abort_on_stall: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            cycles_per_step: 1,
            stall_at_cycle: None,
            step_period: Duration::from_micros(100),
            max_ticks: 0,
            abort_on_stall: false,
        }
    }
}

impl HostConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Serialize configuration to TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Serde helper module for `Duration` using humantime format.
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
