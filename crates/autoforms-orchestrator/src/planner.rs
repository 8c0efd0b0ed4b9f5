//! Turning field matches into planned actions.

use autoforms_protocols::types::{FieldAction, FieldMatch, FieldType, PlannedAction};

use crate::layers::LayerStack;

/// Operation for a field, derived from its structural type.
pub fn action_for(field_type: FieldType) -> FieldAction {
    match field_type {
        FieldType::Select => FieldAction::Select,
        FieldType::Checkbox => FieldAction::Check,
        FieldType::Radio => FieldAction::ChooseRadio,
        FieldType::File => FieldAction::Upload,
        _ => FieldAction::Fill,
    }
}

/// One action per match, assigned to a layer by confidence.
pub fn plan_actions(matches: Vec<FieldMatch>, stack: &LayerStack) -> Vec<PlannedAction> {
    matches
        .into_iter()
        .map(|m| PlannedAction {
            id: format!("action-{}", m.field.id),
            action: action_for(m.field.field_type),
            tier: stack.assign_tier(m.confidence),
            value: m.value,
            data_key: m.data_key,
            confidence: m.confidence,
            field: m.field,
            attempts: Vec::new(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::test_support::{ScriptedLayer, field};
    use autoforms_protocols::layer::Layer;
    use autoforms_protocols::types::{LayerTier, MatchMethod};

    #[test]
    fn test_action_for_field_types() {
        assert_eq!(action_for(FieldType::Select), FieldAction::Select);
        assert_eq!(action_for(FieldType::Checkbox), FieldAction::Check);
        assert_eq!(action_for(FieldType::Radio), FieldAction::ChooseRadio);
        assert_eq!(action_for(FieldType::File), FieldAction::Upload);
        assert_eq!(action_for(FieldType::Email), FieldAction::Fill);
        assert_eq!(action_for(FieldType::Unknown), FieldAction::Fill);
    }

    #[test]
    fn test_plan_assigns_tiers() {
        let layers: Vec<Arc<dyn Layer>> = vec![
            Arc::new(ScriptedLayer::new(LayerTier::Structural, 0.0)),
            Arc::new(ScriptedLayer::new(LayerTier::Language, 0.1)),
        ];
        let stack = LayerStack::new(layers).unwrap();
        let matches = vec![
            FieldMatch {
                field: field("email", "Email", None),
                data_key: "email".to_string(),
                value: "jane@example.com".to_string(),
                confidence: 0.95,
                method: MatchMethod::Exact,
                tier: LayerTier::Structural,
            },
            FieldMatch {
                field: field("city", "Where do you live?", None),
                data_key: "city".to_string(),
                value: "Berlin".to_string(),
                confidence: 0.65,
                method: MatchMethod::Inferred,
                tier: LayerTier::Language,
            },
        ];

        let actions = plan_actions(matches, &stack);
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].id, "action-email");
        assert_eq!(actions[0].tier, LayerTier::Structural);
        assert_eq!(actions[1].tier, LayerTier::Language);
        assert_eq!(actions[1].value, "Berlin");
        assert!(actions.iter().all(|a| a.attempts.is_empty()));
    }
}
