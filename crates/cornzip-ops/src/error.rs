//! Error types for operation runs.

use std::time::Duration;

use cornzip_core::OptionsError;
use thiserror::Error;

use crate::engine::SinkClosed;

/// Why a run ended in the failed state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    /// The run was rejected before it started.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The codec engine reported an error.
    #[error("{0}")]
    Engine(String),

    /// The run did not finish before its deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The engine returned something the operation cannot use.
    #[error("engine contract violated: {0}")]
    Contract(String),
}

/// Errors surfaced to callers of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    /// Empty input set or malformed options.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The runner already has a run in progress.
    #[error("An operation is already in progress")]
    OperationInProgress,

    /// The run failed.
    #[error("Operation failed: {0}")]
    OperationFailed(FailureReason),

    /// The result was requested before the run finished.
    #[error("Operation result is not ready")]
    NotReady,

    /// The run was cancelled.
    #[error("Operation was cancelled")]
    Cancelled,
}

impl From<OptionsError> for RunError {
    fn from(err: OptionsError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

/// Errors reported by a codec engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The engine could not complete the job.
    #[error("{message}")]
    Failed { message: String },

    /// The engine does not implement this capability.
    #[error("{operation} is not supported by this engine")]
    Unsupported { operation: &'static str },

    /// Nobody is listening for progress any more.
    #[error("Progress receiver closed")]
    Detached,
}

impl EngineError {
    /// Create a failure with a message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

impl From<SinkClosed> for EngineError {
    fn from(_: SinkClosed) -> Self {
        Self::Detached
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_error_becomes_invalid_input() {
        let err: RunError = OptionsError::EmptyArchiveName.into();
        assert_eq!(
            err,
            RunError::InvalidInput("Archive name cannot be empty".to_string())
        );
    }

    #[test]
    fn test_failure_message() {
        let err = RunError::OperationFailed(FailureReason::Engine("disk full".into()));
        assert_eq!(err.to_string(), "Operation failed: disk full");
    }
}
