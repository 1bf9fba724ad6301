// src/error.rs

//! Crate-wide error type shared by every module.

use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the update client
#[derive(Error, Debug)]
pub enum Error {
    /// Component used before initialization or constructed with bad input
    #[error("Initialization error: {0}")]
    InitError(String),

    /// Filesystem operation failed
    #[error("IO error: {0}")]
    IoError(String),

    /// Fetching data from the update server failed
    #[error("Download error: {0}")]
    DownloadError(String),

    /// A document (manifest, config, version) could not be parsed or validated
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A requested version, file, or config entry does not exist
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Materialized file content does not match the expected checksum
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    /// Binary patch application failed or no delta engine is configured
    #[error("Delta error: {0}")]
    DeltaError(String),

    /// The operation was cancelled before it completed
    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    /// True for the cooperative-cancellation case, which callers treat
    /// as a clean stop rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::ChecksumMismatch {
            expected: "aa".to_string(),
            actual: "bb".to_string(),
        };
        assert_eq!(err.to_string(), "Checksum mismatch: expected aa, got bb");

        let err = Error::DownloadError("connection refused".to_string());
        assert_eq!(err.to_string(), "Download error: connection refused");
    }

    #[test]
    fn test_is_cancelled() {
        assert!(Error::Cancelled.is_cancelled());
        assert!(!Error::IoError("x".to_string()).is_cancelled());
    }
}
