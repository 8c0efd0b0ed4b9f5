//! Section orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Multi-page orchestration limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum pages processed per run.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Execution attempts on one layer before escalating.
    #[serde(default = "default_max_attempts")]
    pub max_attempts_per_layer: u32,

    /// Consecutive unchanged-URL iterations tolerated before aborting.
    #[serde(default = "default_stuck_limit")]
    pub stuck_repeat_limit: u32,

    /// Total layer cost allowed per run.
    #[serde(default = "default_max_cost")]
    pub max_cost: f64,

    /// Total layer invocations allowed per run.
    #[serde(default = "default_max_layer_calls")]
    pub max_layer_calls: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            max_attempts_per_layer: default_max_attempts(),
            stuck_repeat_limit: default_stuck_limit(),
            max_cost: default_max_cost(),
            max_layer_calls: default_max_layer_calls(),
        }
    }
}

fn default_max_pages() -> u32 {
    15
}

fn default_max_attempts() -> u32 {
    2
}

fn default_stuck_limit() -> u32 {
    3
}

fn default_max_cost() -> f64 {
    5.0
}

fn default_max_layer_calls() -> u32 {
    500
}
