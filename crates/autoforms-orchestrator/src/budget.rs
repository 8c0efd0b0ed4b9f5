//! Per-run cost and call budget.

use autoforms_config::OrchestratorConfig;

/// Cost accrues only for layer operations actually invoked.
#[derive(Debug, Clone, PartialEq)]
pub struct CostBudget {
    max_cost: f64,
    max_calls: u32,
    spent: f64,
    calls: u32,
}

impl CostBudget {
    pub fn new(max_cost: f64, max_calls: u32) -> Self {
        Self {
            max_cost,
            max_calls,
            spent: 0.0,
            calls: 0,
        }
    }

    pub fn from_config(config: &OrchestratorConfig) -> Self {
        Self::new(config.max_cost, config.max_layer_calls)
    }

    pub fn charge(&mut self, cost: f64) {
        self.spent += cost.max(0.0);
        self.calls = self.calls.saturating_add(1);
    }

    pub fn is_exhausted(&self) -> bool {
        (self.max_cost > 0.0 && self.spent >= self.max_cost) || self.calls >= self.max_calls
    }

    /// Whether one more operation costing `cost` fits.
    pub fn can_afford(&self, cost: f64) -> bool {
        self.calls < self.max_calls && self.spent + cost.max(0.0) <= self.max_cost
    }

    pub fn spent(&self) -> f64 {
        self.spent
    }

    pub fn calls(&self) -> u32 {
        self.calls
    }

    pub fn describe(&self) -> String {
        format!(
            "spent {:.2} of {:.2}, {} of {} calls",
            self.spent, self.max_cost, self.calls, self.max_calls
        )
    }
}
