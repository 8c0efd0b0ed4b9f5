//! Forward-only per-action escalation through the layer stack.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use autoforms_protocols::error::{DriverError, LayerError};
use autoforms_protocols::layer::Layer;
use autoforms_protocols::types::{
    ActionAttempt, ActionError, ActionErrorKind, ActionResult, LayerTier, PlannedAction,
};

use crate::budget::CostBudget;
use crate::layers::LayerStack;

/// How one planned action ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationOutcome {
    pub success: bool,
    /// Layer that produced the final result.
    pub tier: Option<LayerTier>,
    #[serde(default)]
    pub result: Option<ActionResult>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Execute `action` starting at its assigned layer.
///
/// Each layer gets up to `max_attempts` executions, each followed by a
/// review on the same layer. An unverified success counts as a failure.
/// Not-found and not-visible errors move on to the next layer at once.
pub async fn execute_with_escalation(
    stack: &LayerStack,
    budget: &mut CostBudget,
    action: &mut PlannedAction,
    max_attempts: u32,
) -> EscalationOutcome {
    let field = action.field.display_name().to_string();
    let start = action.tier;
    let layers: Vec<Arc<dyn Layer>> = stack.from_tier(start).cloned().collect();
    let mut last_tier = None;
    let mut last_result = None;

    for layer in layers {
        let tier = layer.tier();
        last_tier = Some(tier);
        if tier != start {
            info!(field = %field, from = %action.tier, to = %tier, "Escalating action");
        }
        action.tier = tier;

        for attempt in 1..=max_attempts.max(1) {
            // Execute and review are charged separately.
            if !budget.can_afford(layer.cost() * 2.0) {
                warn!(field = %field, budget = %budget.describe(), "Budget exhausted during escalation");
                return EscalationOutcome {
                    success: false,
                    tier: last_tier,
                    result: last_result,
                    error: Some(format!("Budget exhausted before completing field '{}'", field)),
                };
            }

            let result = run_once(layer.as_ref(), budget, action).await;
            let reviewed = review_once(layer.as_ref(), budget, action, &result).await;
            let verified = result.success && reviewed;

            let error = match (&result.error, verified) {
                (_, true) => None,
                (Some(e), false) => Some(e.clone()),
                (None, false) => Some(ActionError::new(
                    ActionErrorKind::Other,
                    "Action not verified",
                )),
            };
            let fast = error.as_ref().is_some_and(|e| e.kind.is_fast_escalation());
            action.attempts.push(ActionAttempt {
                tier,
                attempt,
                executed: result.success,
                verified,
                error: error.clone(),
            });
            last_result = Some(result);

            if verified {
                debug!(field = %field, layer = %tier, attempt, "Action verified");
                return EscalationOutcome {
                    success: true,
                    tier: Some(tier),
                    result: last_result,
                    error: None,
                };
            }

            debug!(
                field = %field,
                layer = %tier,
                attempt,
                error = ?error.as_ref().map(|e| e.message.as_str()),
                "Attempt failed"
            );
            if fast {
                break;
            }
        }
    }

    warn!(field = %field, attempts = action.attempts.len(), "All layers exhausted");
    EscalationOutcome {
        success: false,
        tier: last_tier,
        result: last_result,
        error: Some(format!("All layers exhausted for field '{}'", field)),
    }
}

async fn run_once(layer: &dyn Layer, budget: &mut CostBudget, action: &PlannedAction) -> ActionResult {
    budget.charge(layer.cost());
    let results = match layer.execute(std::slice::from_ref(action)).await {
        Ok(results) => results,
        Err(e) => return ActionResult::failed(&action.id, layer_error(e)),
    };
    results
        .into_iter()
        .find(|r| r.action_id == action.id)
        .unwrap_or_else(|| {
            ActionResult::failed(
                &action.id,
                ActionError::new(ActionErrorKind::Other, "Layer returned no result"),
            )
        })
}

/// Whether the layer confirms the action took effect.
async fn review_once(
    layer: &dyn Layer,
    budget: &mut CostBudget,
    action: &PlannedAction,
    result: &ActionResult,
) -> bool {
    budget.charge(layer.cost());
    match layer
        .review(std::slice::from_ref(action), std::slice::from_ref(result))
        .await
    {
        Ok(verifications) => verifications
            .iter()
            .any(|v| v.action_id == action.id && v.verified),
        Err(e) => {
            debug!(layer = layer.name(), error = %e, "Review failed");
            false
        }
    }
}

/// Classify a layer error for escalation.
fn layer_error(error: LayerError) -> ActionError {
    let kind = match &error {
        LayerError::Driver(DriverError::ElementNotFound(_)) => ActionErrorKind::ElementNotFound,
        LayerError::Driver(DriverError::ElementNotVisible(_)) => ActionErrorKind::ElementNotVisible,
        LayerError::Driver(DriverError::Timeout(_)) => ActionErrorKind::Timeout,
        LayerError::Unsupported(_) => ActionErrorKind::Unsupported,
        _ => ActionErrorKind::Other,
    };
    ActionError::new(kind, error.to_string())
}

#[cfg(test)]
#[path = "escalation_tests.rs"]
mod tests;
