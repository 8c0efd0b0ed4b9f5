//! Event sink that writes lifecycle events to the log.

use async_trait::async_trait;
use tracing::info;

use autoforms_protocols::sink::{EngineEvent, EventSink, SinkError};

/// Writes every [`EngineEvent`] as an `info!` record.
#[derive(Debug, Clone, Default)]
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn emit(&self, event: EngineEvent) -> Result<(), SinkError> {
        match &event {
            EngineEvent::ReplayStarted {
                manual_id,
                total_steps,
            } => info!(%manual_id, total_steps, "Replay started"),
            EngineEvent::ReplayCompleted {
                manual_id,
                steps_completed,
            } => info!(%manual_id, steps_completed, "Replay completed"),
            EngineEvent::ReplayFailed {
                manual_id,
                failed_step_index,
                error,
            } => info!(%manual_id, failed_step_index, %error, "Replay failed"),
            EngineEvent::ModeSwitch {
                job_id,
                from,
                to,
                reason,
            } => info!(%job_id, %from, %to, %reason, "Execution mode switched"),
        }
        Ok(())
    }
}
