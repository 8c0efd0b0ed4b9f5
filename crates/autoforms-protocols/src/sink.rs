//! Best-effort lifecycle event output.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
#[error("Event sink error: {0}")]
pub struct SinkError(pub String);

/// Events emitted by replay and the execution engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    ReplayStarted {
        manual_id: Uuid,
        total_steps: usize,
    },
    ReplayCompleted {
        manual_id: Uuid,
        steps_completed: usize,
    },
    ReplayFailed {
        manual_id: Uuid,
        failed_step_index: usize,
        error: String,
    },
    ModeSwitch {
        job_id: String,
        from: String,
        to: String,
        reason: String,
    },
}

/// Receiver of engine events. Callers never let a sink failure affect
/// the operation that produced the event.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: EngineEvent) -> Result<(), SinkError>;
}
