//! Search index error types.
//!
//! This module defines the unified error type for all search index operations,
//! covering startup configuration, transport and remote failures, and
//! multi-step operations that only partly succeeded.

use std::fmt;

use thiserror::Error;

/// One failed sub-step of a multi-step operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedStep {
    /// The record id or step name that failed.
    pub target: String,
    /// Why it failed.
    pub reason: String,
}

impl FailedStep {
    pub fn new(target: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self {
            target: target.into(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for FailedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.target, self.reason)
    }
}

/// Unified errors from search index operations.
///
/// Used by the `SearchIndexProvider` trait and `SearchIndexService` for all search index
/// operations. Deleting a record that is already absent is not an error and never
/// surfaces here.
#[derive(Debug, Clone, Error)]
pub enum SearchIndexError {
    /// Missing or invalid credentials, index name or endpoint. Fatal at startup.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Validation error (e.g., empty record id, invalid query).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Network failure or timeout talking to the search index backend.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The backend answered with a non-success status.
    #[error("Remote error during {operation} (status {status}): {message}")]
    RemoteError {
        operation: String,
        status: u16,
        message: String,
    },

    /// Failed to parse response from search index backend.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to serialize data for the search index backend.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Some sub-steps of an operation succeeded and others failed.
    #[error(
        "Partial failure during {operation}: {} completed, {} failed ({})",
        .completed.len(),
        .failed.len(),
        join_steps(.failed)
    )]
    PartialFailure {
        operation: String,
        completed: Vec<String>,
        failed: Vec<FailedStep>,
    },

    /// Unknown error.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

fn join_steps(steps: &[FailedStep]) -> String {
    steps
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl SearchIndexError {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::ConfigurationError(msg.into())
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a remote error from a response status and body.
    pub fn remote(operation: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::RemoteError {
            operation: operation.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Create a partial failure error.
    pub fn partial_failure(
        operation: impl Into<String>,
        completed: Vec<String>,
        failed: Vec<FailedStep>,
    ) -> Self {
        Self::PartialFailure {
            operation: operation.into(),
            completed,
            failed,
        }
    }

    /// Create an unknown error.
    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::Unknown(msg.into())
    }

    /// Whether the failure is likely to go away on its own (network trouble,
    /// rate limiting, backend outage). The next event or a manual rebuild is
    /// the recovery path; nothing in this crate retries.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionError(_) => true,
            Self::RemoteError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_failure_message_names_failed_steps() {
        let err = SearchIndexError::partial_failure(
            "delete_recursive",
            vec!["blog".to_string()],
            vec![FailedStep::new("blog/a", "status 500")],
        );
        assert_eq!(
            err.to_string(),
            "Partial failure during delete_recursive: 1 completed, 1 failed (blog/a (status 500))"
        );
    }

    #[test]
    fn test_is_transient() {
        assert!(SearchIndexError::connection("timeout").is_transient());
        assert!(SearchIndexError::remote("save", 429, "slow down").is_transient());
        assert!(SearchIndexError::remote("save", 503, "").is_transient());
        assert!(!SearchIndexError::remote("save", 403, "invalid key").is_transient());
        assert!(!SearchIndexError::configuration("missing key").is_transient());
    }
}
