//! Replay-first job execution with AI-assisted fallback.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use autoforms_protocols::assisted::{AssistedExecutor, AssistedReport, Job};
use autoforms_protocols::driver::Page;
use autoforms_protocols::sink::{EngineEvent, EventSink};
use autoforms_protocols::types::{ActionManual, ManualStep, UserData};

use crate::error::EngineError;
use crate::executor::{CookbookExecutor, ReplayReport};
use crate::health::is_replayable;
use crate::platform::detect_platform;
use crate::sink::TracingEventSink;
use crate::store::{ManualMeta, ManualStore};
use crate::template::templatize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionMode {
    #[serde(rename = "cookbook")]
    Cookbook,
    #[serde(rename = "ai-assisted")]
    AiAssisted,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Cookbook => "cookbook",
            ExecutionMode::AiAssisted => "ai-assisted",
        }
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a job did not complete through replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    NoManualFound,
    HealthTooLow,
    CookbookFailed,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::NoManualFound => "no_manual_found",
            FallbackReason::HealthTooLow => "health_too_low",
            FallbackReason::CookbookFailed => "cookbook_failed",
        }
    }
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final result of one job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOutcome {
    pub job_id: String,
    pub mode: ExecutionMode,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_id: Option<Uuid>,
    /// Replay steps completed, including those before a failure.
    pub steps_completed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<FallbackReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assisted: Option<AssistedReport>,
    /// Manual saved from a successful assisted run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_manual_id: Option<Uuid>,
}

impl JobOutcome {
    fn fallback(job: &Job, reason: FallbackReason) -> Self {
        Self {
            job_id: job.id.clone(),
            mode: ExecutionMode::AiAssisted,
            success: false,
            manual_id: None,
            steps_completed: 0,
            reason: Some(reason),
            error: None,
            assisted: None,
            saved_manual_id: None,
        }
    }
}

/// Drives one job: replay when a healthy manual exists, otherwise the
/// assisted path.
pub struct ExecutionEngine {
    store: Arc<ManualStore>,
    executor: CookbookExecutor,
    sink: Arc<dyn EventSink>,
    assisted: Option<Arc<dyn AssistedExecutor>>,
}

impl ExecutionEngine {
    pub fn new(store: Arc<ManualStore>, executor: CookbookExecutor) -> Self {
        Self {
            store,
            executor,
            sink: Arc::new(TracingEventSink),
            assisted: None,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_assisted(mut self, assisted: Arc<dyn AssistedExecutor>) -> Self {
        self.assisted = Some(assisted);
        self
    }

    pub fn store(&self) -> &Arc<ManualStore> {
        &self.store
    }

    pub async fn execute(&self, page: &dyn Page, job: &Job) -> Result<JobOutcome, EngineError> {
        let platform = detect_platform(&job.target_url);
        let manual = self
            .store
            .lookup(&job.target_url, &job.job_type, platform)
            .await?;

        let Some(manual) = manual else {
            info!(job_id = %job.id, url = %job.target_url, "No manual found");
            let outcome = JobOutcome::fallback(job, FallbackReason::NoManualFound);
            return Ok(self.run_assisted(page, job, outcome).await);
        };

        if !is_replayable(manual.health()) {
            info!(
                job_id = %job.id,
                manual_id = %manual.id,
                health = manual.health(),
                "Manual health too low for replay"
            );
            let mut outcome = JobOutcome::fallback(job, FallbackReason::HealthTooLow);
            outcome.manual_id = Some(manual.id);
            return Ok(self.run_assisted(page, job, outcome).await);
        }

        let report = self.replay(page, job, &manual).await;
        if report.success {
            if let Err(e) = self.store.record_success(&manual.id).await {
                warn!(manual_id = %manual.id, error = %e, "Failed to record success");
            }
            info!(job_id = %job.id, manual_id = %manual.id, steps = report.steps_completed, "Job completed by replay");
            return Ok(JobOutcome {
                job_id: job.id.clone(),
                mode: ExecutionMode::Cookbook,
                success: true,
                manual_id: Some(manual.id),
                steps_completed: report.steps_completed,
                reason: None,
                error: None,
                assisted: None,
                saved_manual_id: None,
            });
        }

        if let Err(e) = self.store.record_failure(&manual.id).await {
            warn!(manual_id = %manual.id, error = %e, "Failed to record failure");
        }
        let error = report
            .error
            .unwrap_or_else(|| "Replay failed".to_string());
        self.emit(EngineEvent::ModeSwitch {
            job_id: job.id.clone(),
            from: ExecutionMode::Cookbook.to_string(),
            to: ExecutionMode::AiAssisted.to_string(),
            reason: error.clone(),
        })
        .await;

        let mut outcome = JobOutcome::fallback(job, FallbackReason::CookbookFailed);
        outcome.manual_id = Some(manual.id);
        outcome.steps_completed = report.steps_completed;
        outcome.error = Some(error);
        Ok(self.run_assisted(page, job, outcome).await)
    }

    /// Replay with panics from the driver normalized into a failed report.
    async fn replay(&self, page: &dyn Page, job: &Job, manual: &ActionManual) -> ReplayReport {
        let user_data = job.user_data.clone().unwrap_or_default();
        AssertUnwindSafe(self.executor.execute_all(page, manual, &user_data))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                let message = panic_message(panic.as_ref());
                warn!(manual_id = %manual.id, error = %message, "Replay panicked");
                ReplayReport::failed(0, None, message)
            })
    }

    async fn run_assisted(&self, page: &dyn Page, job: &Job, mut outcome: JobOutcome) -> JobOutcome {
        let Some(assisted) = &self.assisted else {
            return outcome;
        };

        let report = assisted.run(page, job).await;
        outcome.success = report.success;
        if report.success {
            outcome.saved_manual_id = self.save_trace(job, &report).await;
        }
        outcome.assisted = Some(report);
        outcome
    }

    /// Persist the successful part of an assisted trace for future replay.
    async fn save_trace(&self, job: &Job, report: &AssistedReport) -> Option<Uuid> {
        let user_data = job.user_data.clone().unwrap_or_default();
        let steps = trace_to_steps(report, &user_data);
        if steps.is_empty() {
            return None;
        }

        let meta = ManualMeta::for_url(&job.target_url, job.job_type.clone());
        match self.store.save_from_trace(steps, meta).await {
            Ok(manual) => Some(manual.id),
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "Failed to save assisted trace");
                None
            }
        }
    }

    async fn emit(&self, event: EngineEvent) {
        if let Err(e) = self.sink.emit(event).await {
            tracing::debug!(error = %e, "Event sink failed");
        }
    }
}

fn trace_to_steps(report: &AssistedReport, user_data: &UserData) -> Vec<ManualStep> {
    report
        .trace
        .iter()
        .filter(|a| a.success && a.replayable && !a.dom.locator.is_empty())
        .enumerate()
        .map(|(i, action)| {
            let mut step = action.to_manual_step();
            step.order = i as u32;
            step.value = step.value.map(|v| templatize(&v, user_data));
            step
        })
        .collect()
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("Replay panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("Replay panicked: {}", s)
    } else {
        "Replay panicked".to_string()
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
