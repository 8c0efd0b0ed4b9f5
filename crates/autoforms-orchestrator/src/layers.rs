//! Cost-ordered layer stack.

use std::sync::Arc;

use autoforms_protocols::layer::Layer;
use autoforms_protocols::types::LayerTier;

use crate::error::OrchestratorError;

/// Confidence at or above which the cheapest layer acts.
pub const STRUCTURAL_CONFIDENCE: f64 = 0.8;
/// Confidence at or above which the mid-cost layer acts.
pub const LANGUAGE_CONFIDENCE: f64 = 0.6;

/// Layers ordered from cheapest to most capable, one per tier.
#[derive(Clone)]
pub struct LayerStack {
    layers: Vec<Arc<dyn Layer>>,
}

impl LayerStack {
    pub fn new(mut layers: Vec<Arc<dyn Layer>>) -> Result<Self, OrchestratorError> {
        if layers.is_empty() {
            return Err(OrchestratorError::NoLayers);
        }
        layers.sort_by_key(|l| l.tier());
        layers.dedup_by_key(|l| l.tier());
        Ok(Self { layers })
    }

    pub fn cheapest(&self) -> &Arc<dyn Layer> {
        &self.layers[0]
    }

    pub fn most_capable(&self) -> &Arc<dyn Layer> {
        &self.layers[self.layers.len() - 1]
    }

    pub fn get(&self, tier: LayerTier) -> Option<&Arc<dyn Layer>> {
        self.layers.iter().find(|l| l.tier() == tier)
    }

    pub fn has(&self, tier: LayerTier) -> bool {
        self.get(tier).is_some()
    }

    /// Layers at or after `tier`, in escalation order.
    pub fn from_tier(&self, tier: LayerTier) -> impl Iterator<Item = &Arc<dyn Layer>> {
        self.layers.iter().filter(move |l| l.tier() >= tier)
    }

    /// Layers strictly after `tier`.
    pub fn after(&self, tier: LayerTier) -> impl Iterator<Item = &Arc<dyn Layer>> {
        self.layers.iter().filter(move |l| l.tier() > tier)
    }

    pub fn tiers(&self) -> Vec<LayerTier> {
        self.layers.iter().map(|l| l.tier()).collect()
    }

    /// Initial layer for an action matched with `confidence`.
    pub fn assign_tier(&self, confidence: f64) -> LayerTier {
        let cheapest = self.cheapest().tier();
        let language = self.has(LayerTier::Language).then_some(LayerTier::Language);
        let vision = self.has(LayerTier::Vision).then_some(LayerTier::Vision);

        if confidence >= STRUCTURAL_CONFIDENCE {
            cheapest
        } else if confidence >= LANGUAGE_CONFIDENCE {
            language.unwrap_or(cheapest)
        } else {
            vision.or(language).unwrap_or(cheapest)
        }
    }
}

impl std::fmt::Debug for LayerStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.layers.iter().map(|l| l.name().to_string()))
            .finish()
    }
}

#[cfg(test)]
#[path = "layers_tests.rs"]
mod tests;
