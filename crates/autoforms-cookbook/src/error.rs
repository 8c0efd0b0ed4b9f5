//! Cookbook error types.

use thiserror::Error;

use autoforms_protocols::error::{DriverError, StorageError};
use autoforms_protocols::types::ActionKind;

/// Errors from the manual store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Manual must contain at least one step")]
    EmptySteps,

    #[error("Step {0} has an empty locator")]
    EmptyLocator(u32),

    #[error("Duplicate step order: {0}")]
    DuplicateOrder(u32),
}

/// Errors from executing a single step.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("{0} requires a value")]
    MissingValue(ActionKind),

    #[error("Invalid wait duration: {0}")]
    InvalidWait(String),

    #[error("Element not found: {hint} (tried {attempts} strategies)")]
    ElementNotFound { hint: String, attempts: u32 },

    #[error("Navigation failed for {url}: {reason}")]
    Navigation { url: String, reason: String },

    #[error("{action} failed: {source}")]
    Action {
        action: ActionKind,
        #[source]
        source: DriverError,
    },
}

impl StepError {
    /// Validation errors are raised before touching the page.
    pub fn is_validation(&self) -> bool {
        matches!(self, StepError::MissingValue(_) | StepError::InvalidWait(_))
    }
}

/// Errors from the execution engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Manual lookup failed: {0}")]
    Lookup(#[from] StoreError),
}
