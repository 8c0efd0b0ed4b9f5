//! Recording executed actions as replayable cookbook entries.

use autoforms_protocols::types::{
    ActionKind, CookbookAction, CoordinateReplay, DomReplay, FieldAction, PlannedAction,
};

use crate::escalation::EscalationOutcome;

/// In-progress trace for one orchestrator run.
#[derive(Debug, Clone, Default)]
pub struct TraceBuilder {
    actions: Vec<CookbookAction>,
}

impl TraceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an executed action, successful or not.
    pub fn record(&mut self, action: &PlannedAction, outcome: &EscalationOutcome) -> &CookbookAction {
        let kind = action.action.kind(&action.value);
        let value = carries_value(kind).then(|| action.value.clone());

        let point = outcome
            .result
            .as_ref()
            .and_then(|r| r.point)
            .or_else(|| action.field.bbox.map(|b| b.center()));
        let coordinates = point.map(|(x, y)| CoordinateReplay {
            x,
            y,
            value: value.clone(),
        });

        let entry = CookbookAction {
            order: self.actions.len() as u32,
            action: kind,
            field_label: action.field.display_name().to_string(),
            dom: DomReplay {
                locator: outcome
                    .result
                    .as_ref()
                    .and_then(|r| r.target.clone())
                    .unwrap_or_else(|| action.field.locator.clone()),
                value,
            },
            coordinates,
            tier: outcome.tier.unwrap_or(action.tier),
            success: outcome.success,
            health_score: if outcome.success { 1.0 } else { 0.0 },
            replayable: action.action != FieldAction::Upload,
        };
        self.actions.push(entry);
        &self.actions[self.actions.len() - 1]
    }

    pub fn actions(&self) -> &[CookbookAction] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn into_actions(self) -> Vec<CookbookAction> {
        self.actions
    }
}

fn carries_value(kind: ActionKind) -> bool {
    matches!(kind, ActionKind::Fill | ActionKind::Select)
}
