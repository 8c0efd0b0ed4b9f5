//! Deterministic manual replay.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use autoforms_config::ExecutorConfig;
use autoforms_protocols::driver::Page;
use autoforms_protocols::sink::{EngineEvent, EventSink};
use autoforms_protocols::types::{ActionKind, ActionManual, ManualStep, UserData};

use crate::error::StepError;
use crate::resolver::LocatorResolver;
use crate::template::resolve_tokens;

/// Result of replaying one manual.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub success: bool,
    pub steps_completed: usize,
    /// Position of the failing step in execution order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_step_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReplayReport {
    pub fn failed(steps_completed: usize, index: Option<usize>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            steps_completed,
            failed_step_index: index,
            error: Some(error.into()),
        }
    }
}

/// Replays manual steps in ascending `order`, stopping at the first failure.
pub struct CookbookExecutor {
    resolver: LocatorResolver,
    config: ExecutorConfig,
    sink: Option<Arc<dyn EventSink>>,
}

impl CookbookExecutor {
    pub fn new(resolver: LocatorResolver, config: ExecutorConfig) -> Self {
        Self {
            resolver,
            config,
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn resolver(&self) -> &LocatorResolver {
        &self.resolver
    }

    pub async fn execute_all(
        &self,
        page: &dyn Page,
        manual: &ActionManual,
        user_data: &UserData,
    ) -> ReplayReport {
        let steps = manual.sorted_steps();
        self.emit(EngineEvent::ReplayStarted {
            manual_id: manual.id,
            total_steps: steps.len(),
        })
        .await;

        for (index, step) in steps.iter().enumerate() {
            debug!(manual_id = %manual.id, step = step.order, action = %step.action, "Executing step");
            if let Err(e) = self.execute_step(page, step, user_data).await {
                let message = format!("Step {} ({}) failed: {}", step.order, step.label(), e);
                warn!(
                    manual_id = %manual.id,
                    step = step.order,
                    validation = e.is_validation(),
                    error = %e,
                    "Replay step failed"
                );
                self.emit(EngineEvent::ReplayFailed {
                    manual_id: manual.id,
                    failed_step_index: index,
                    error: message.clone(),
                })
                .await;
                return ReplayReport::failed(index, Some(index), message);
            }
        }

        info!(manual_id = %manual.id, steps = steps.len(), "Replay completed");
        self.emit(EngineEvent::ReplayCompleted {
            manual_id: manual.id,
            steps_completed: steps.len(),
        })
        .await;

        ReplayReport {
            success: true,
            steps_completed: steps.len(),
            failed_step_index: None,
            error: None,
        }
    }

    pub async fn execute_step(
        &self,
        page: &dyn Page,
        step: &ManualStep,
        user_data: &UserData,
    ) -> Result<(), StepError> {
        let value = step
            .value
            .as_deref()
            .map(|v| resolve_tokens(v, user_data).into_owned())
            .filter(|v| !v.is_empty());

        if step.action.requires_locator() {
            self.act_on_element(page, step, value).await?;
        } else if step.action == ActionKind::Navigate {
            let url = value.ok_or(StepError::MissingValue(step.action))?;
            page.goto(&url).await.map_err(|e| StepError::Navigation {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        } else {
            let ms = self.wait_duration(value.as_deref())?;
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }

        let settle = step.wait_after_ms.unwrap_or(self.config.settle_delay_ms);
        if settle > 0 {
            tokio::time::sleep(Duration::from_millis(settle)).await;
        }
        Ok(())
    }

    async fn act_on_element(
        &self,
        page: &dyn Page,
        step: &ManualStep,
        value: Option<String>,
    ) -> Result<(), StepError> {
        let action = step.action;
        if action.requires_value() && value.is_none() {
            return Err(StepError::MissingValue(action));
        }
        let resolution = self.resolver.resolve(page, &step.locator).await;
        let Some(handle) = resolution.handle else {
            return Err(StepError::ElementNotFound {
                hint: step.locator.hint(),
                attempts: resolution.attempts,
            });
        };
        let value = value.unwrap_or_default();
        let result = match action {
            ActionKind::Click => handle.click().await,
            ActionKind::Fill => handle.fill(&value).await,
            ActionKind::Select => handle.select_option(&value).await,
            ActionKind::Check => handle.check().await,
            ActionKind::Uncheck => handle.uncheck().await,
            ActionKind::Hover => handle.hover().await,
            ActionKind::Press => handle.press(&value).await,
            ActionKind::Scroll => handle.scroll_into_view().await,
            ActionKind::Navigate | ActionKind::Wait => Ok(()),
        };
        result.map_err(|source| StepError::Action { action, source })
    }

    fn wait_duration(&self, value: Option<&str>) -> Result<u64, StepError> {
        let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(self.config.default_wait_ms);
        };
        let ms: f64 = raw
            .parse()
            .map_err(|_| StepError::InvalidWait(raw.to_string()))?;
        if !ms.is_finite() || ms < 0.0 {
            return Err(StepError::InvalidWait(raw.to_string()));
        }
        Ok(ms.round() as u64)
    }

    async fn emit(&self, event: EngineEvent) {
        let Some(sink) = &self.sink else {
            return;
        };
        if let Err(e) = sink.emit(event).await {
            debug!(error = %e, "Event sink failed");
        }
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
