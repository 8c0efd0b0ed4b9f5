//! Multi-page form flow driver.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use autoforms_config::OrchestratorConfig;
use autoforms_cookbook::LocatorResolver;
use autoforms_protocols::assisted::{AssistedExecutor, AssistedReport, Job};
use autoforms_protocols::driver::Page;
use autoforms_protocols::layer::Layer;
use autoforms_protocols::types::{
    Blocker, CookbookAction, FieldMatch, FormField, FormSection, Observation, UserData,
};

use crate::budget::CostBudget;
use crate::error::OrchestratorError;
use crate::escalation::execute_with_escalation;
use crate::layers::LayerStack;
use crate::navigation::{NavigationResult, detect_last_page, navigate_next};
use crate::planner::plan_actions;
use crate::sections::group_sections;
use crate::trace::TraceBuilder;

/// Why a run stopped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "blocker")]
pub enum StopReason {
    /// Reached a page with a submit control and no next control.
    Completed,
    /// No navigation control was found; assumed end of flow.
    NoNavigation,
    /// A login wall, CAPTCHA or similar needs outside help.
    Blocked(Blocker),
    BudgetExhausted,
    Stuck,
    PageLimit,
    Error,
}

impl StopReason {
    /// Whether the flow ran to its end.
    pub fn is_terminal_success(&self) -> bool {
        matches!(self, StopReason::Completed | StopReason::NoNavigation)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub pages_processed: u32,
    pub actions_executed: usize,
    pub actions_failed: usize,
    pub trace: Vec<CookbookAction>,
    pub stop: StopReason,
    #[serde(default)]
    pub error: Option<String>,
    /// One message per failed action.
    #[serde(default)]
    pub failures: Vec<String>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.stop.is_terminal_success() && self.actions_failed == 0
    }

    pub fn into_assisted(self) -> AssistedReport {
        let success = self.is_success();
        let error = if success {
            None
        } else {
            let mut messages = self.failures;
            messages.extend(self.error);
            if messages.is_empty() {
                messages.push(format!("Run stopped: {:?}", self.stop));
            }
            Some(messages.join("; "))
        };
        AssistedReport {
            success,
            actions_executed: self.actions_executed,
            actions_failed: self.actions_failed,
            trace: self.trace,
            error,
        }
    }
}

enum PageOutcome {
    Blocked(Blocker),
    LastPage,
    Advanced,
    NoNavigation,
}

/// Mutable state threaded through one run.
struct RunState {
    budget: CostBudget,
    trace: TraceBuilder,
    executed: usize,
    failures: Vec<String>,
}

/// Drives a form flow page by page through a [`LayerStack`].
pub struct SectionOrchestrator {
    stack: LayerStack,
    config: OrchestratorConfig,
    resolver: LocatorResolver,
}

impl SectionOrchestrator {
    pub fn new(stack: LayerStack, config: OrchestratorConfig, resolver: LocatorResolver) -> Self {
        Self {
            stack,
            config,
            resolver,
        }
    }

    pub fn stack(&self) -> &LayerStack {
        &self.stack
    }

    /// Fill the flow starting at the page's current URL.
    pub async fn run(&self, page: &dyn Page, data: &UserData) -> RunReport {
        let mut state = RunState {
            budget: CostBudget::from_config(&self.config),
            trace: TraceBuilder::new(),
            executed: 0,
            failures: Vec::new(),
        };
        let mut pages = 0u32;
        let mut last_url: Option<String> = None;
        let mut repeats = 0u32;

        let (stop, error) = loop {
            if pages >= self.config.max_pages {
                warn!(max_pages = self.config.max_pages, "Page limit reached");
                break (
                    StopReason::PageLimit,
                    Some(format!("Page limit of {} reached", self.config.max_pages)),
                );
            }
            if state.budget.is_exhausted() {
                let err = OrchestratorError::BudgetExhausted(state.budget.describe());
                warn!(error = %err, "Stopping run");
                break (StopReason::BudgetExhausted, Some(err.to_string()));
            }

            let url = match page.url().await {
                Ok(url) => url,
                Err(e) => break (StopReason::Error, Some(OrchestratorError::from(e).to_string())),
            };
            if last_url.as_deref() == Some(url.as_str()) {
                repeats += 1;
                if repeats >= self.config.stuck_repeat_limit {
                    let err = OrchestratorError::Stuck { url, repeats };
                    warn!(error = %err, "Stopping run");
                    break (StopReason::Stuck, Some(err.to_string()));
                }
            } else {
                repeats = 0;
                last_url = Some(url.clone());
            }

            pages += 1;
            info!(page = pages, url = %url, "Processing page");
            match self.process_page(page, data, &mut state).await {
                Ok(PageOutcome::Advanced) => continue,
                Ok(PageOutcome::LastPage) => break (StopReason::Completed, None),
                Ok(PageOutcome::NoNavigation) => break (StopReason::NoNavigation, None),
                Ok(PageOutcome::Blocked(blocker)) => {
                    warn!(blocker = ?blocker, "Page blocked");
                    break (StopReason::Blocked(blocker), None);
                }
                Err(e) => {
                    warn!(error = %e, "Page processing failed");
                    break (StopReason::Error, Some(e.to_string()));
                }
            }
        };

        info!(
            pages,
            executed = state.executed,
            failed = state.failures.len(),
            stop = ?stop,
            "Run finished"
        );
        RunReport {
            pages_processed: pages,
            actions_executed: state.executed,
            actions_failed: state.failures.len(),
            trace: state.trace.into_actions(),
            stop,
            error,
            failures: state.failures,
        }
    }

    async fn process_page(
        &self,
        page: &dyn Page,
        data: &UserData,
        state: &mut RunState,
    ) -> Result<PageOutcome, OrchestratorError> {
        let cheap = self.stack.cheapest().clone();
        let mut latest = observe(&cheap, &mut state.budget).await?;
        if let Some(blocker) = latest.blocker.clone() {
            return Ok(PageOutcome::Blocked(blocker));
        }

        let mut seen: HashSet<String> = latest.fields.iter().map(|f| f.id.clone()).collect();
        let mut queue: VecDeque<FormSection> = group_sections(&latest.fields).into();

        while let Some(section) = queue.pop_front() {
            if section.is_filled() {
                debug!(section = %section.name, "Section already filled");
                continue;
            }
            let unfilled: Vec<FormField> = section
                .fields
                .iter()
                .filter(|f| !f.is_filled())
                .cloned()
                .collect();
            let matches = self.match_fields(&unfilled, data, &mut state.budget).await;
            debug!(
                section = %section.name,
                fields = unfilled.len(),
                matched = matches.len(),
                "Matched section"
            );

            for mut action in plan_actions(matches, &self.stack) {
                let outcome = execute_with_escalation(
                    &self.stack,
                    &mut state.budget,
                    &mut action,
                    self.config.max_attempts_per_layer,
                )
                .await;
                state.trace.record(&action, &outcome);
                if outcome.success {
                    state.executed += 1;
                } else {
                    state.failures.push(outcome.error.unwrap_or_else(|| {
                        format!("Action failed for field '{}'", action.field.display_name())
                    }));
                }

                match observe(&cheap, &mut state.budget).await {
                    Ok(observation) => {
                        let revealed: Vec<FormField> = observation
                            .fields
                            .iter()
                            .filter(|f| seen.insert(f.id.clone()))
                            .cloned()
                            .collect();
                        if !revealed.is_empty() {
                            info!(count = revealed.len(), "New fields revealed");
                            queue.extend(group_sections(&revealed));
                        }
                        latest = observation;
                    }
                    Err(e) => warn!(error = %e, "Re-observation failed"),
                }
            }
        }

        if detect_last_page(&latest) {
            info!("Reached last page");
            return Ok(PageOutcome::LastPage);
        }
        match navigate_next(&self.stack, page, &self.resolver).await {
            NavigationResult::NoNavigation => Ok(PageOutcome::NoNavigation),
            _ => Ok(PageOutcome::Advanced),
        }
    }

    /// Match cheapest first; later layers only see fields still unmatched.
    async fn match_fields(
        &self,
        fields: &[FormField],
        data: &UserData,
        budget: &mut CostBudget,
    ) -> Vec<FieldMatch> {
        let cheap = self.stack.cheapest();
        let layers = std::iter::once(cheap).chain(self.stack.after(cheap.tier()));
        let mut matched: Vec<FieldMatch> = Vec::new();
        let mut remaining: Vec<FormField> = fields.to_vec();

        for layer in layers {
            if remaining.is_empty() {
                break;
            }
            if !budget.can_afford(layer.cost()) {
                debug!(layer = layer.name(), budget = %budget.describe(), "Skipping matcher");
                break;
            }
            budget.charge(layer.cost());
            let found = match layer.process(&remaining, data).await {
                Ok(found) => found,
                Err(e) => {
                    warn!(layer = layer.name(), error = %e, "Matching failed");
                    continue;
                }
            };
            remaining.retain(|f| !found.iter().any(|m| m.field.id == f.id));
            matched.extend(found);
        }

        matched.sort_by_key(|m| {
            fields
                .iter()
                .position(|f| f.id == m.field.id)
                .unwrap_or(usize::MAX)
        });
        matched
    }
}

async fn observe(
    layer: &Arc<dyn Layer>,
    budget: &mut CostBudget,
) -> Result<Observation, OrchestratorError> {
    budget.charge(layer.cost());
    layer
        .observe()
        .await
        .map_err(|e| OrchestratorError::layer(layer.name(), e))
}

#[async_trait]
impl AssistedExecutor for SectionOrchestrator {
    async fn run(&self, page: &dyn Page, job: &Job) -> AssistedReport {
        let at_target = matches!(page.url().await, Ok(url) if url == job.target_url);
        if !at_target {
            if let Err(e) = page.goto(&job.target_url).await {
                return AssistedReport {
                    error: Some(e.to_string()),
                    ..Default::default()
                };
            }
        }
        let data = job.user_data.clone().unwrap_or_default();
        SectionOrchestrator::run(self, page, &data).await.into_assisted()
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
