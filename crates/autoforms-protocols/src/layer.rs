//! Layer capability protocol.
//!
//! Every observation/execution tier, from structural DOM analysis to
//! vision-model interaction, sits behind this one interface. The
//! orchestrator composes layers as an ordered list.

use async_trait::async_trait;

use crate::error::LayerError;
use crate::types::{
    ActionResult, FieldMatch, FormField, LayerTier, Observation, PlannedAction, UserData,
    Verification,
};

#[async_trait]
pub trait Layer: Send + Sync {
    /// Tier this layer occupies.
    fn tier(&self) -> LayerTier;

    fn name(&self) -> &str;

    /// Cost charged for each invocation of an operation on this layer.
    fn cost(&self) -> f64;

    async fn observe(&self) -> Result<Observation, LayerError>;

    /// Bind fields to values from `data`. Fields without a candidate are omitted.
    async fn process(
        &self,
        fields: &[FormField],
        data: &UserData,
    ) -> Result<Vec<FieldMatch>, LayerError>;

    async fn execute(&self, actions: &[PlannedAction]) -> Result<Vec<ActionResult>, LayerError>;

    async fn review(
        &self,
        actions: &[PlannedAction],
        results: &[ActionResult],
    ) -> Result<Vec<Verification>, LayerError>;

    /// Free-form "advance to the next step" capability.
    ///
    /// Returns `Ok(true)` when the layer clicked something that advances
    /// the flow. Layers without the capability keep the default.
    async fn advance(&self) -> Result<bool, LayerError> {
        Ok(false)
    }
}
