//! Error types for the topic viewer

use thiserror::Error;

/// Failures reported by the data store and the interaction core.
///
/// None of these are retried. They propagate to whoever fired the
/// event, which decides how to present them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewerError {
    /// Unknown topic, tissue, gene or table, or a missing series
    #[error("not found: {what}")]
    NotFound { what: String },

    /// Programmer error: an operation called in a mode that does not allow it
    #[error("contract violation: {reason}")]
    ContractViolation { reason: String },

    /// Tables disagree with each other (e.g. a gene missing from one statistic)
    #[error("data integrity: {reason}")]
    DataIntegrity { reason: String },
}

impl ViewerError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn contract(reason: impl Into<String>) -> Self {
        Self::ContractViolation {
            reason: reason.into(),
        }
    }

    pub fn integrity(reason: impl Into<String>) -> Self {
        Self::DataIntegrity {
            reason: reason.into(),
        }
    }
}

/// Result type alias for viewer operations
pub type Result<T> = std::result::Result<T, ViewerError>;
