use std::path::PathBuf;
use thiserror::Error;

/// Heartbeat error types covering configuration, log I/O, and log parsing.
#[derive(Debug, Error)]
pub enum HeartbeatError {
    /// Configuration or initialization error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The heartbeat log could not be opened for writing.
    #[error("could not open heartbeat output file {path}: {source}")]
    LogOpen {
        /// Path that was being opened.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Writing or flushing a heartbeat row failed.
    #[error("heartbeat log write failed: {0}")]
    LogWrite(#[source] std::io::Error),

    /// A heartbeat log did not match the expected format.
    #[error("malformed heartbeat log at line {line}: {reason}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },
}

/// Convenience type alias for heartbeat operations.
pub type HeartbeatResult<T> = Result<T, HeartbeatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_open_message_names_path() {
        let err = HeartbeatError::LogOpen {
            path: PathBuf::from("/nope/heartbeat.csv"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("/nope/heartbeat.csv"));
    }

    #[test]
    fn test_write_error_keeps_source() {
        use std::error::Error;

        let err = HeartbeatError::LogWrite(std::io::Error::from(std::io::ErrorKind::WriteZero));
        assert!(err.source().is_some());
    }
}
