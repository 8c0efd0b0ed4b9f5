//! Browser driver errors.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum DriverError {
    /// The element detached from the DOM while it was being queried.
    #[error("Stale element: {0}")]
    StaleElement(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Element not visible: {0}")]
    ElementNotVisible(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("JavaScript error: {0}")]
    JavaScript(String),

    #[error("Action failed: {0}")]
    ActionFailed(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Page closed")]
    PageClosed,
}

impl DriverError {
    /// Whether the error is the detached-element case that warrants a retry.
    pub fn is_stale(&self) -> bool {
        matches!(self, DriverError::StaleElement(_))
    }
}
