//! Error types for the ticker service.
//!
//! All errors are strongly typed using thiserror so callers can match on
//! the exact condition. Storage failures live next to the storage traits
//! (`StorageError`); everything else is defined here.

use thiserror::Error;

use crate::storage::StorageError;

/// Validation errors raised while building configuration or input records.
///
/// These are fatal at startup and never change on retry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Ticker page cap must be a positive number, got {value}")]
    PageCapNotPositive {
        value: i64,
    },

    #[error("Webhook trigger threshold must be at least 1, got {value}")]
    ThresholdNotPositive {
        value: i64,
    },

    #[error("Webhook target URL cannot be empty")]
    EmptyTargetUrl,

    #[error("Invalid value for '{key}': {reason}")]
    InvalidSetting {
        key: String,
        reason: String,
    },
}

/// Execution errors raised while processing an ingestion event.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Storage error: {message}")]
    Storage {
        message: String,
    },

    #[error("Trigger processing aborted after {fired} notification(s): {reason}")]
    TriggerAborted {
        fired: usize,
        reason: String,
    },
}

/// Outbound delivery failures.
///
/// The dispatcher records these and moves on; they never reach the
/// ingestion caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Delivery request to {target} failed: {message}")]
    RequestFailed {
        target: String,
        message: String,
    },

    #[error("Endpoint {target} answered with status {status}")]
    Rejected {
        target: String,
        status: u16,
    },
}

/// Top-level error type.
#[derive(Debug, Error)]
pub enum TickerError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl TickerError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if this is a storage error.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Returns true if the next ingestion event may succeed where this one failed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) | Self::Internal { .. } => false,
            Self::Execution(e) => matches!(
                e,
                ExecutionError::Storage { .. } | ExecutionError::TriggerAborted { .. }
            ),
            Self::Storage(e) => matches!(
                e,
                StorageError::BackendError(_) | StorageError::ConnectionError(_)
            ),
        }
    }
}

/// Result type alias for ticker operations.
pub type TickerResult<T> = Result<T, TickerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_page_cap() {
        let err = ValidationError::PageCapNotPositive { value: -3 };
        let msg = format!("{err}");
        assert!(msg.contains("-3"));
        assert!(msg.contains("positive"));
    }

    #[test]
    fn test_execution_error_trigger_aborted() {
        let err = ExecutionError::TriggerAborted {
            fired: 2,
            reason: "poisoned lock".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("after 2"));
        assert!(msg.contains("poisoned lock"));
    }

    #[test]
    fn test_delivery_error_rejected() {
        let err = DeliveryError::Rejected {
            target: "http://hook".to_string(),
            status: 502,
        };
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn test_ticker_error_from_validation() {
        let err: TickerError = ValidationError::EmptyTargetUrl.into();
        assert!(err.is_validation());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_ticker_error_from_storage() {
        let err: TickerError = StorageError::BackendError("down".to_string()).into();
        assert!(err.is_storage());
        assert!(err.is_retryable());

        let err: TickerError = StorageError::DuplicateKey("x".to_string()).into();
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_ticker_error_internal() {
        let err = TickerError::internal("unexpected state");
        assert!(!err.is_retryable());
        assert!(format!("{err}").contains("unexpected state"));
    }
}
