//! # Design
//!
//! - Constant-message errors for admission and enqueue failures.
//! - Rejections surface synchronously to the caller; they never reach the worker.

use thiserror::Error;

use crate::job::CopyJob;

/// Result alias for admission checks.
pub type AdmissionResult<T> = Result<T, AdmissionError>;

/// Reasons a completion notice is turned away before a job is built.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    /// The content identifier was empty.
    #[error("empty content identifier")]
    EmptyIdentifier,
    /// The content identifier is not safe to use as a path segment.
    #[error("unsafe content identifier")]
    UnsafeIdentifier {
        /// Offending identifier value.
        value: String,
        /// Static reason for the rejection.
        reason: &'static str,
    },
}

impl AdmissionError {
    /// Machine-readable rejection label for events and metrics.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::EmptyIdentifier => "empty_identifier",
            Self::UnsafeIdentifier { reason, .. } => reason,
        }
    }
}

/// Failures offering a job to the queue; both variants hand the job back.
#[derive(Debug, Error)]
pub enum EnqueueError {
    /// The queue is at capacity; the caller should retry later.
    #[error("copy queue is full")]
    Full {
        /// The job that was not admitted.
        job: Box<CopyJob>,
    },
    /// The queue has shut down and accepts no further work.
    #[error("copy queue is closed")]
    Closed {
        /// The job that was not admitted.
        job: Box<CopyJob>,
    },
}

impl EnqueueError {
    /// The job that could not be queued.
    #[must_use]
    pub fn job(&self) -> &CopyJob {
        match self {
            Self::Full { job } | Self::Closed { job } => job,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admission_error_reasons_are_stable() {
        assert_eq!(AdmissionError::EmptyIdentifier.reason(), "empty_identifier");
        let unsafe_id = AdmissionError::UnsafeIdentifier {
            value: "../escape".to_string(),
            reason: "invalid_character",
        };
        assert_eq!(unsafe_id.reason(), "invalid_character");
        assert_eq!(unsafe_id.to_string(), "unsafe content identifier");
    }
}
