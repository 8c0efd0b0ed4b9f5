//! Orchestration errors.

use thiserror::Error;

use autoforms_protocols::error::{DriverError, LayerError};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("No layers configured")]
    NoLayers,

    #[error("Budget exhausted: {0}")]
    BudgetExhausted(String),

    #[error("Stuck on {url} after {repeats} unchanged iterations")]
    Stuck { url: String, repeats: u32 },

    #[error("Layer '{layer}' failed: {source}")]
    Layer {
        layer: String,
        #[source]
        source: LayerError,
    },

    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl OrchestratorError {
    pub fn layer(layer: &str, source: LayerError) -> Self {
        Self::Layer {
            layer: layer.to_string(),
            source,
        }
    }
}
