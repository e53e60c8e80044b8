//! Result types for search index operations.

use crate::errors::{FailedStep, SearchIndexError};

/// Result of a batch operation for a single record.
///
/// This struct represents the outcome of a single operation within a batch (e.g.,
/// deleting one record of a page subtree). It indicates whether the operation
/// succeeded and includes error details if it failed.
#[derive(Debug, Clone)]
pub struct BatchOperationResult {
    /// The record identifier.
    pub object_id: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error if the operation failed.
    pub error: Option<SearchIndexError>,
}

impl BatchOperationResult {
    pub fn succeeded(object_id: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            success: true,
            error: None,
        }
    }

    pub fn failed(object_id: impl Into<String>, error: SearchIndexError) -> Self {
        Self {
            object_id: object_id.into(),
            success: false,
            error: Some(error),
        }
    }
}

/// Summary of a batch operation containing aggregate statistics and individual results.
///
/// This struct provides a complete overview of a multi-record operation, including the
/// total number of items processed, how many succeeded and failed, and detailed results
/// for each individual item in the order they were issued.
#[derive(Debug, Clone, Default)]
pub struct BatchOperationSummary {
    /// Total number of items in the batch.
    pub total: usize,
    /// Number of successful operations.
    pub succeeded: usize,
    /// Number of failed operations.
    pub failed: usize,
    /// Individual results for each item.
    pub results: Vec<BatchOperationResult>,
}

impl BatchOperationSummary {
    /// Build a summary from per-item results.
    pub fn from_results(results: Vec<BatchOperationResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    /// Identifiers of the items that succeeded.
    pub fn completed_ids(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| r.success)
            .map(|r| r.object_id.clone())
            .collect()
    }

    /// The failed items with their reasons.
    pub fn failed_steps(&self) -> Vec<FailedStep> {
        self.results
            .iter()
            .filter(|r| !r.success)
            .map(|r| {
                let reason = r
                    .error
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "unknown failure".to_string());
                FailedStep::new(r.object_id.clone(), reason)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_results_counts() {
        let summary = BatchOperationSummary::from_results(vec![
            BatchOperationResult::succeeded("a"),
            BatchOperationResult::failed("b", SearchIndexError::connection("reset")),
            BatchOperationResult::succeeded("c"),
        ]);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.completed_ids(), vec!["a", "c"]);
        assert_eq!(
            summary.failed_steps(),
            vec![FailedStep::new("b", "Connection error: reset")]
        );
    }

    #[test]
    fn test_empty_summary() {
        let summary = BatchOperationSummary::from_results(vec![]);
        assert_eq!(summary.total, 0);
        assert!(summary.failed_steps().is_empty());
    }
}
