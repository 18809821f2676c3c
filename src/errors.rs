//! Error taxonomy for the scoring pipeline.
//!
//! Every failure is raised at the point of detection and propagated to the
//! caller unchanged; nothing in the crate retries or substitutes defaults.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, IdeologyError>;

#[derive(Debug, Error)]
pub enum IdeologyError {
    /// A threshold or dimension parameter is out of range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Filtering eliminated every target or every source.
    #[error("filtering removed every {entity} (stage: {stage})")]
    EmptyResult {
        entity: &'static str,
        stage: &'static str,
    },

    /// A marginal is zero or a score dimension has no spread.
    #[error("degenerate matrix: {0}")]
    DegenerateMatrix(String),

    /// A required field is missing or malformed in the input rows.
    #[error("schema error at row {row}: {reason}")]
    Schema { row: usize, reason: String },

    /// The SVD backend failed to converge or rejected its input.
    #[error("linear algebra failure: {0}")]
    Linalg(String),

    #[error("invalid pipeline configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl IdeologyError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        IdeologyError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    pub(crate) fn schema(row: usize, reason: impl Into<String>) -> Self {
        IdeologyError::Schema {
            row,
            reason: reason.into(),
        }
    }
}
