//! Heartbeat log format.
//!
//! The log is a two-column CSV with a fixed header:
//!
//! ```text
//! Target Cycle (fastest), Seconds Since Start
//! 100, 0
//! 250, 1
//! ```
//!
//! [`HeartbeatLog`] reads a finished log back so offline tools can check a
//! run for stalls without access to the live monitor.

use heartbeat_common::error::{HeartbeatError, HeartbeatResult};
use std::fmt;
use std::path::Path;

/// Header row written once at the top of every heartbeat log.
pub const HEADER: &str = "Target Cycle (fastest), Seconds Since Start";

/// Column separator used by the log.
const SEPARATOR: &str = ", ";

/// One data row of the heartbeat log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatRecord {
    /// Target cycle observed at the sampling instant.
    pub cycle: u64,
    /// Whole wall-clock seconds since the monitor was constructed.
    pub elapsed_secs: i64,
}

impl fmt::Display for HeartbeatRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.cycle, self.elapsed_secs)
    }
}

impl HeartbeatRecord {
    /// Parse a single data row. `line` is the 1-based line number for errors.
    fn parse(text: &str, line: usize) -> HeartbeatResult<Self> {
        let (cycle, elapsed) = text.split_once(',').ok_or_else(|| HeartbeatError::Parse {
            line,
            reason: format!("expected two comma-separated columns, got {text:?}"),
        })?;

        let cycle = cycle.trim().parse().map_err(|e| HeartbeatError::Parse {
            line,
            reason: format!("bad cycle column {cycle:?}: {e}"),
        })?;
        let elapsed_secs = elapsed.trim().parse().map_err(|e| HeartbeatError::Parse {
            line,
            reason: format!("bad seconds column {elapsed:?}: {e}"),
        })?;

        Ok(Self {
            cycle,
            elapsed_secs,
        })
    }
}

/// A row that observed the same target cycle as the row before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StallEvent {
    /// Index (0-based, data rows only) of the row that repeated its predecessor.
    pub row: usize,
    /// The cycle the target was stuck at.
    pub cycle: u64,
    /// Elapsed seconds at the repeating row.
    pub elapsed_secs: i64,
}

/// A parsed heartbeat log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeartbeatLog {
    records: Vec<HeartbeatRecord>,
}

impl HeartbeatLog {
    /// Parse the full text of a heartbeat log.
    ///
    /// A trailing newline is accepted, blank lines elsewhere are not.
    ///
    /// # Errors
    ///
    /// Returns [`HeartbeatError::Parse`] if the header is missing or wrong,
    /// or if any data row is malformed.
    pub fn parse(content: &str) -> HeartbeatResult<Self> {
        let mut lines = content.lines().enumerate();

        match lines.next() {
            Some((_, header)) if header.trim_end() == HEADER => {}
            Some((_, other)) => {
                return Err(HeartbeatError::Parse {
                    line: 1,
                    reason: format!("expected header {HEADER:?}, got {other:?}"),
                })
            }
            None => {
                return Err(HeartbeatError::Parse {
                    line: 1,
                    reason: "empty log, header missing".into(),
                })
            }
        }

        let records = lines
            .map(|(idx, text)| HeartbeatRecord::parse(text, idx + 1))
            .collect::<HeartbeatResult<Vec<_>>>()?;

        Ok(Self { records })
    }

    /// Read and parse a heartbeat log from disk.
    ///
    /// # Errors
    ///
    /// Returns [`HeartbeatError::LogOpen`] if the file cannot be read, or a
    /// parse error as for [`HeartbeatLog::parse`].
    pub fn read(path: &Path) -> HeartbeatResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| HeartbeatError::LogOpen {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Data rows in file order.
    pub fn records(&self) -> &[HeartbeatRecord] {
        &self.records
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log holds no data rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows whose cycle equals the previous row's cycle.
    ///
    /// The first row is compared against cycle 0, the live monitor's
    /// initial value, so a non-empty result matches its stall flag.
    pub fn stalls(&self) -> Vec<StallEvent> {
        let mut previous = 0;
        self.records
            .iter()
            .enumerate()
            .filter_map(|(row, record)| {
                let stalled = record.cycle == previous;
                previous = record.cycle;
                stalled.then_some(StallEvent {
                    row,
                    cycle: record.cycle,
                    elapsed_secs: record.elapsed_secs,
                })
            })
            .collect()
    }

    /// Whether the elapsed-seconds column never decreases.
    pub fn is_time_ordered(&self) -> bool {
        self.records
            .windows(2)
            .all(|pair| pair[0].elapsed_secs <= pair[1].elapsed_secs)
    }
}
