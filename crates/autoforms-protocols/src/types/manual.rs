//! Recorded action sequences ("manuals").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::LocatorDescriptor;

/// Upper bound of the stored health scale.
pub const MAX_HEALTH: u32 = 100;

/// One atomic UI action kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Click,
    Fill,
    Select,
    Check,
    Uncheck,
    Hover,
    Press,
    Navigate,
    Wait,
    Scroll,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Click => "click",
            ActionKind::Fill => "fill",
            ActionKind::Select => "select",
            ActionKind::Check => "check",
            ActionKind::Uncheck => "uncheck",
            ActionKind::Hover => "hover",
            ActionKind::Press => "press",
            ActionKind::Navigate => "navigate",
            ActionKind::Wait => "wait",
            ActionKind::Scroll => "scroll",
        }
    }

    /// Actions that cannot run without a non-empty value.
    pub fn requires_value(&self) -> bool {
        matches!(
            self,
            ActionKind::Fill | ActionKind::Select | ActionKind::Press | ActionKind::Navigate
        )
    }

    /// Actions that operate on a resolved element.
    pub fn requires_locator(&self) -> bool {
        !matches!(self, ActionKind::Navigate | ActionKind::Wait)
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_step_health() -> f64 {
    1.0
}

/// One recorded step of a manual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualStep {
    /// Sort key. Unique within a manual, not necessarily contiguous.
    pub order: u32,
    pub action: ActionKind,
    pub locator: LocatorDescriptor,
    /// Literal value, may contain `{{token}}` placeholders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Settle delay override after the action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_after_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_step_health")]
    pub health_score: f64,
}

impl ManualStep {
    pub fn new(order: u32, action: ActionKind, locator: LocatorDescriptor) -> Self {
        Self {
            order,
            action,
            locator,
            value: None,
            wait_after_ms: None,
            description: None,
            health_score: default_step_health(),
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_wait_after(mut self, ms: u64) -> Self {
        self.wait_after_ms = Some(ms);
        self
    }

    /// Label used in failure messages.
    pub fn label(&self) -> String {
        match &self.description {
            Some(d) => d.clone(),
            None => format!("{} {}", self.action, self.locator.hint()),
        }
    }
}

/// Where a manual came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManualSource {
    Recorded,
    Imported,
    Templated,
}

impl ManualSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ManualSource::Recorded => "recorded",
            ManualSource::Imported => "imported",
            ManualSource::Templated => "templated",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "recorded" => Some(ManualSource::Recorded),
            "imported" => Some(ManualSource::Imported),
            "templated" => Some(ManualSource::Templated),
            _ => None,
        }
    }
}

/// A replayable, ordered action sequence for one site and task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionManual {
    pub id: Uuid,
    pub url_pattern: String,
    pub task_pattern: String,
    #[serde(default)]
    pub platform: Option<String>,
    pub steps: Vec<ManualStep>,
    /// Stored on a 0-100 scale.
    pub health_score: u32,
    pub success_count: u32,
    pub failure_count: u32,
    pub source: ManualSource,
    #[serde(default)]
    pub last_used: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ActionManual {
    /// Health as a 0-1 fraction.
    pub fn health(&self) -> f64 {
        f64::from(self.health_score.min(MAX_HEALTH)) / f64::from(MAX_HEALTH)
    }

    /// Steps in ascending `order`.
    pub fn sorted_steps(&self) -> Vec<&ManualStep> {
        let mut steps: Vec<&ManualStep> = self.steps.iter().collect();
        steps.sort_by_key(|s| s.order);
        steps
    }
}

/// Replay outcome used to mutate health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
}

#[cfg(test)]
#[path = "manual_tests.rs"]
mod tests;
