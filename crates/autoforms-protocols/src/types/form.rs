//! Form observation, matching, and planning types used by the orchestrator.

use serde::{Deserialize, Serialize};

use super::{ActionKind, LocatorDescriptor, ManualStep};

/// Structural type of a detected control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Email,
    Tel,
    Number,
    Date,
    Password,
    Textarea,
    Select,
    Checkbox,
    Radio,
    File,
    #[serde(other)]
    Unknown,
}

/// Bounding box of an element in viewport coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Center point of this box.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// A detected form control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub id: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub locator: LocatorDescriptor,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub bbox: Option<BoundingBox>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub current_value: Option<String>,
    /// Heading or legend the control sits under, if any.
    #[serde(default)]
    pub section: Option<String>,
}

impl FormField {
    pub fn new(id: impl Into<String>, field_type: FieldType, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            field_type,
            label: label.into(),
            name: None,
            locator: LocatorDescriptor::default(),
            options: Vec::new(),
            bbox: None,
            required: false,
            current_value: None,
            section: None,
        }
    }

    /// Whether the control already holds a value.
    pub fn is_filled(&self) -> bool {
        match self.field_type {
            FieldType::Checkbox | FieldType::Radio => {
                self.current_value.as_deref().is_some_and(is_truthy)
            }
            _ => self
                .current_value
                .as_deref()
                .is_some_and(|v| !v.trim().is_empty()),
        }
    }

    /// Label if present, otherwise the name attribute, otherwise the id.
    pub fn display_name(&self) -> &str {
        if !self.label.trim().is_empty() {
            &self.label
        } else if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            name
        } else {
            &self.id
        }
    }
}

/// Named group of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSection {
    pub name: String,
    pub fields: Vec<FormField>,
}

impl FormSection {
    /// A section is filled when every field in it already holds a value.
    pub fn is_filled(&self) -> bool {
        !self.fields.is_empty() && self.fields.iter().all(FormField::is_filled)
    }
}

/// Condition that prevents acting on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "detail")]
pub enum Blocker {
    Login,
    Captcha,
    AccessDenied,
    Other(String),
}

/// A clickable button surfaced by observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageButton {
    pub text: String,
    #[serde(default)]
    pub locator: LocatorDescriptor,
}

/// Result of observing a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub fields: Vec<FormField>,
    #[serde(default)]
    pub buttons: Vec<PageButton>,
    #[serde(default)]
    pub blocker: Option<Blocker>,
}

/// Execution tier, ordered by cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerTier {
    /// Cheap structural DOM analysis.
    Structural,
    /// Mid-cost language-model reasoning over page text.
    Language,
    /// Expensive vision-model interaction.
    Vision,
}

impl LayerTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerTier::Structural => "structural",
            LayerTier::Language => "language",
            LayerTier::Vision => "vision",
        }
    }
}

impl std::fmt::Display for LayerTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a field-to-value binding was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    Exact,
    Partial,
    Inferred,
    Visual,
}

/// A field bound to a candidate value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMatch {
    pub field: FormField,
    pub data_key: String,
    pub value: String,
    pub confidence: f64,
    pub method: MatchMethod,
    pub tier: LayerTier,
}

/// Concrete operation a planned action performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldAction {
    Fill,
    Select,
    Check,
    ChooseRadio,
    Upload,
}

impl FieldAction {
    /// Replay action kind for the given value.
    pub fn kind(&self, value: &str) -> ActionKind {
        match self {
            FieldAction::Fill | FieldAction::Upload => ActionKind::Fill,
            FieldAction::Select => ActionKind::Select,
            FieldAction::Check if is_truthy(value) => ActionKind::Check,
            FieldAction::Check => ActionKind::Uncheck,
            FieldAction::ChooseRadio => ActionKind::Click,
        }
    }
}

/// Error category reported by a layer for one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionErrorKind {
    ElementNotFound,
    ElementNotVisible,
    Timeout,
    InvalidValue,
    Unsupported,
    Other,
}

impl ActionErrorKind {
    /// Categories that skip the remaining attempts on the current layer.
    pub fn is_fast_escalation(&self) -> bool {
        matches!(
            self,
            ActionErrorKind::ElementNotFound | ActionErrorKind::ElementNotVisible
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionError {
    pub kind: ActionErrorKind,
    pub message: String,
}

impl ActionError {
    pub fn new(kind: ActionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// One execution attempt of a planned action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionAttempt {
    pub tier: LayerTier,
    pub attempt: u32,
    pub executed: bool,
    pub verified: bool,
    #[serde(default)]
    pub error: Option<ActionError>,
}

/// A match elevated to a concrete operation with an assigned layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedAction {
    pub id: String,
    pub field: FormField,
    pub action: FieldAction,
    pub value: String,
    pub data_key: String,
    pub confidence: f64,
    pub tier: LayerTier,
    #[serde(default)]
    pub attempts: Vec<ActionAttempt>,
}

/// Layer-reported result of executing one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub action_id: String,
    pub success: bool,
    #[serde(default)]
    pub error: Option<ActionError>,
    /// Viewport point the layer acted on, when known.
    #[serde(default)]
    pub point: Option<(f64, f64)>,
    /// Element the layer acted on, when it differs from the field's own
    /// locator (a radio option rather than the group's first input).
    #[serde(default)]
    pub target: Option<LocatorDescriptor>,
}

impl ActionResult {
    pub fn ok(action_id: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            success: true,
            error: None,
            point: None,
            target: None,
        }
    }

    pub fn failed(action_id: impl Into<String>, error: ActionError) -> Self {
        Self {
            action_id: action_id.into(),
            success: false,
            error: Some(error),
            point: None,
            target: None,
        }
    }
}

/// Layer review of one executed action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub action_id: String,
    pub verified: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

/// DOM-replayable form of an executed action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomReplay {
    pub locator: LocatorDescriptor,
    #[serde(default)]
    pub value: Option<String>,
}

/// Coordinate-based fallback form of an executed action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateReplay {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub value: Option<String>,
}

/// An executed action as emitted into the orchestrator trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookbookAction {
    pub order: u32,
    pub action: ActionKind,
    pub field_label: String,
    pub dom: DomReplay,
    #[serde(default)]
    pub coordinates: Option<CoordinateReplay>,
    pub tier: LayerTier,
    pub success: bool,
    pub health_score: f64,
    /// False for actions a replay cannot reproduce, such as file uploads.
    #[serde(default = "default_replayable")]
    pub replayable: bool,
}

fn default_replayable() -> bool {
    true
}

impl CookbookAction {
    /// Convert to a replayable manual step using the DOM form.
    pub fn to_manual_step(&self) -> ManualStep {
        let mut step = ManualStep::new(self.order, self.action, self.dom.locator.clone())
            .with_description(format!("{} {}", self.action, self.field_label));
        step.value = self.dom.value.clone();
        step.health_score = self.health_score;
        step
    }
}

/// Loose boolean reading used for checkbox values.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "y" | "1" | "on" | "checked"
    )
}

#[cfg(test)]
#[path = "form_tests.rs"]
mod tests;
