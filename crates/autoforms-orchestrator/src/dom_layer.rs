//! Structural layer: DOM scan, name/label matching, resolver-driven actions.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use autoforms_cookbook::LocatorResolver;
use autoforms_protocols::driver::Page;
use autoforms_protocols::error::{DriverError, LayerError};
use autoforms_protocols::layer::Layer;
use autoforms_protocols::types::{
    ActionError, ActionErrorKind, ActionKind, ActionResult, FieldAction, FieldMatch, FieldType,
    FormField, LayerTier, LocatorDescriptor, MatchMethod, Observation, PlannedAction, UserData,
    Verification,
};

use crate::scripts::{FORM_SCAN_SCRIPT, READ_VALUE_SCRIPT};

const EXACT_CONFIDENCE: f64 = 0.95;
const PARTIAL_CONFIDENCE: f64 = 0.7;
/// Select whose options do not include the value.
const UNLISTED_OPTION_CONFIDENCE: f64 = 0.5;
const MIN_PARTIAL_LEN: usize = 3;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadBack {
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    checked: bool,
    #[serde(default)]
    selected_text: Option<String>,
}

/// The cheapest layer. Costs nothing and never calls a model.
pub struct DomLayer {
    page: Arc<dyn Page>,
    resolver: LocatorResolver,
}

impl DomLayer {
    pub fn new(page: Arc<dyn Page>, resolver: LocatorResolver) -> Self {
        Self { page, resolver }
    }

    async fn execute_one(&self, action: &PlannedAction) -> ActionResult {
        let field = &action.field;
        if action.action == FieldAction::Upload {
            return ActionResult::failed(
                &action.id,
                ActionError::new(ActionErrorKind::Unsupported, "File upload not supported by DOM layer"),
            );
        }

        let targets_option = is_radio_choice(action);
        let locator = target_locator(action);
        let resolution = self.resolver.resolve(self.page.as_ref(), &locator).await;
        let Some(handle) = resolution.handle else {
            return ActionResult::failed(
                &action.id,
                ActionError::new(
                    ActionErrorKind::ElementNotFound,
                    format!("Element not found: {}", locator.hint()),
                ),
            );
        };

        let outcome = match action.action.kind(&action.value) {
            ActionKind::Fill => handle.fill(&action.value).await,
            ActionKind::Select => handle.select_option(&action.value).await,
            ActionKind::Check => handle.check().await,
            ActionKind::Uncheck => handle.uncheck().await,
            _ => handle.click().await,
        };

        match outcome {
            Ok(()) => {
                let mut result = ActionResult::ok(&action.id);
                result.point = field.bbox.map(|b| b.center());
                result.target = targets_option.then_some(locator);
                result
            }
            Err(e) => ActionResult::failed(&action.id, driver_error(e)),
        }
    }

    async fn verify_one(&self, action: &PlannedAction, result: Option<&ActionResult>) -> Verification {
        let not_verified = |reason: &str| Verification {
            action_id: action.id.clone(),
            verified: false,
            reason: Some(reason.to_string()),
        };

        match result {
            Some(r) if r.success => {}
            Some(r) => {
                let reason = r
                    .error
                    .as_ref()
                    .map(|e| e.message.as_str())
                    .unwrap_or("Execution failed");
                return not_verified(reason);
            }
            None => return not_verified("No execution result"),
        }

        let radio = is_radio_choice(action);
        let args = json!({
            "id": action.field.locator.id,
            "name": action.field.locator.name.clone().or_else(|| action.field.name.clone()),
            "testId": action.field.locator.test_id,
            "radio": radio,
        });
        let state = match self.page.evaluate(READ_VALUE_SCRIPT, args).await {
            Ok(Value::Null) => return not_verified("Element not readable"),
            Ok(v) => match serde_json::from_value::<ReadBack>(v) {
                Ok(state) => state,
                Err(e) => return not_verified(&format!("Unreadable state: {}", e)),
            },
            Err(e) => return not_verified(&e.to_string()),
        };

        let expected = action.value.trim();
        let verified = match action.action.kind(&action.value) {
            _ if radio => state.checked && state.value.as_deref().map(str::trim) == Some(expected),
            ActionKind::Fill => state.value.as_deref().map(str::trim) == Some(expected),
            ActionKind::Select => {
                state.value.as_deref().map(str::trim) == Some(expected)
                    || state
                        .selected_text
                        .as_deref()
                        .is_some_and(|t| t.trim().eq_ignore_ascii_case(expected))
            }
            ActionKind::Uncheck => !state.checked,
            _ => state.checked,
        };

        if verified {
            Verification {
                action_id: action.id.clone(),
                verified: true,
                reason: None,
            }
        } else {
            not_verified("Value did not stick")
        }
    }
}

#[async_trait]
impl Layer for DomLayer {
    fn tier(&self) -> LayerTier {
        LayerTier::Structural
    }

    fn name(&self) -> &str {
        "dom"
    }

    fn cost(&self) -> f64 {
        0.0
    }

    async fn observe(&self) -> Result<Observation, LayerError> {
        let raw = self.page.evaluate(FORM_SCAN_SCRIPT, Value::Null).await?;
        if raw.is_null() {
            return Err(LayerError::ObservationFailed("Empty page scan".to_string()));
        }
        let mut observation: Observation = serde_json::from_value(raw)
            .map_err(|e| LayerError::ObservationFailed(e.to_string()))?;
        for field in &mut observation.fields {
            field.locator = std::mem::take(&mut field.locator).without_empty();
        }
        debug!(
            fields = observation.fields.len(),
            buttons = observation.buttons.len(),
            blocker = ?observation.blocker,
            "DOM scan"
        );
        Ok(observation)
    }

    async fn process(
        &self,
        fields: &[FormField],
        data: &UserData,
    ) -> Result<Vec<FieldMatch>, LayerError> {
        Ok(fields.iter().filter_map(|f| best_match(f, data)).collect())
    }

    async fn execute(&self, actions: &[PlannedAction]) -> Result<Vec<ActionResult>, LayerError> {
        let mut results = Vec::with_capacity(actions.len());
        for action in actions {
            results.push(self.execute_one(action).await);
        }
        Ok(results)
    }

    async fn review(
        &self,
        actions: &[PlannedAction],
        results: &[ActionResult],
    ) -> Result<Vec<Verification>, LayerError> {
        let mut out = Vec::with_capacity(actions.len());
        for action in actions {
            let result = results.iter().find(|r| r.action_id == action.id);
            out.push(self.verify_one(action, result).await);
        }
        Ok(out)
    }
}

fn is_radio_choice(action: &PlannedAction) -> bool {
    action.field.field_type == FieldType::Radio && action.field.name.is_some()
}

/// Radio groups target the option carrying the value.
fn target_locator(action: &PlannedAction) -> LocatorDescriptor {
    let field = &action.field;
    match (&field.field_type, field.name.as_deref()) {
        (FieldType::Radio, Some(name)) => LocatorDescriptor::css(format!(
            "input[type='radio'][name='{}'][value='{}']",
            name, action.value
        )),
        _ => field.locator.clone(),
    }
}

fn driver_error(error: DriverError) -> ActionError {
    let kind = match &error {
        DriverError::ElementNotFound(_) | DriverError::StaleElement(_) => {
            ActionErrorKind::ElementNotFound
        }
        DriverError::ElementNotVisible(_) => ActionErrorKind::ElementNotVisible,
        DriverError::Timeout(_) => ActionErrorKind::Timeout,
        _ => ActionErrorKind::Other,
    };
    ActionError::new(kind, error.to_string())
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn match_confidence(field: &FormField, key: &str) -> Option<(f64, MatchMethod)> {
    let key = normalize(key);
    if key.is_empty() {
        return None;
    }
    let candidates: Vec<String> = [Some(field.label.as_str()), field.name.as_deref(), Some(field.id.as_str())]
        .into_iter()
        .flatten()
        .map(normalize)
        .filter(|c| !c.is_empty())
        .collect();

    if candidates.iter().any(|c| *c == key) {
        return Some((EXACT_CONFIDENCE, MatchMethod::Exact));
    }
    let partial = key.len() >= MIN_PARTIAL_LEN
        && candidates
            .iter()
            .any(|c| c.len() >= MIN_PARTIAL_LEN && (c.contains(&key) || key.contains(c.as_str())));
    partial.then_some((PARTIAL_CONFIDENCE, MatchMethod::Partial))
}

/// Best user-data entry for `field`; ties go to the first key.
fn best_match(field: &FormField, data: &UserData) -> Option<FieldMatch> {
    let mut best: Option<(f64, MatchMethod, &String, &String)> = None;
    for (key, value) in data {
        if value.trim().is_empty() {
            continue;
        }
        let Some((mut confidence, method)) = match_confidence(field, key) else {
            continue;
        };
        if field.field_type == FieldType::Select
            && !field.options.is_empty()
            && !field
                .options
                .iter()
                .any(|o| o.trim().eq_ignore_ascii_case(value.trim()))
        {
            confidence = confidence.min(UNLISTED_OPTION_CONFIDENCE);
        }
        if best.is_none_or(|(c, ..)| confidence > c) {
            best = Some((confidence, method, key, value));
        }
    }

    best.map(|(confidence, method, key, value)| FieldMatch {
        field: field.clone(),
        data_key: key.clone(),
        value: value.clone(),
        confidence,
        method,
        tier: LayerTier::Structural,
    })
}

#[cfg(test)]
#[path = "dom_layer_tests.rs"]
mod tests;
