//! Layer capability errors.

use thiserror::Error;

use super::DriverError;

#[derive(Debug, Error)]
pub enum LayerError {
    #[error("Observation failed: {0}")]
    ObservationFailed(String),

    #[error("Matching failed: {0}")]
    MatchingFailed(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Review failed: {0}")]
    ReviewFailed(String),

    #[error("Unsupported by layer: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Driver(#[from] DriverError),
}
