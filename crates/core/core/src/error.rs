//! Error types for bStat footstep recording.
//!
//! Three error families exist, one per collaborator boundary:
//!
//! - [`RecordError`] is what callers of the recorder see.
//! - [`StoreError`] is produced by backing stores and wrapped into
//!   [`RecordError::StoreFailure`] without alteration.
//! - [`ContextError`] is produced by context providers. It never reaches the
//!   caller: the recorder logs it and substitutes an empty value.

use thiserror::Error;

/// Result type for recorder operations.
pub type RecordResult<T> = Result<T, RecordError>;

/// Result type for backing store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for context provider reads.
pub type ContextResult<T> = Result<T, ContextError>;

/// Error returned by [`FootstepRecorder::record`](crate::FootstepRecorder::record).
#[derive(Debug, Error)]
pub enum RecordError {
    /// The raw event failed validation. Nothing was written.
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// The backing store rejected or could not complete the insert.
    #[error("Store failure: {0}")]
    StoreFailure(#[from] StoreError),
}

impl RecordError {
    /// Creates a new invalid event error.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidEvent(reason.into())
    }

    /// Returns true if this error came from the backing store.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::StoreFailure(_))
    }
}

/// Error type for backing store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The store refused the record (constraint violation and similar).
    #[error("Insert rejected: {0}")]
    Rejected(String),

    /// Underlying I/O failed.
    #[error("IO error: {0}")]
    Io(String),

    /// The record could not be encoded for storage.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

/// Error type for context provider reads.
#[derive(Debug, Error)]
pub enum ContextError {
    /// The provider could not produce the value.
    #[error("Context unavailable: {0}")]
    Unavailable(String),

    /// The read did not finish within the configured timeout.
    #[error("Context read timed out")]
    Timeout,
}

impl ContextError {
    /// Creates a new unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_wraps_into_record_error() {
        let err: RecordError = StoreError::Connection("refused".into()).into();
        assert!(err.is_store_failure());
        assert_eq!(err.to_string(), "Store failure: Connection error: refused");
    }

    #[test]
    fn test_invalid_event_is_not_store_failure() {
        let err = RecordError::invalid("action is empty");
        assert!(!err.is_store_failure());
        assert_eq!(err.to_string(), "Invalid event: action is empty");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: StoreError = io.into();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
