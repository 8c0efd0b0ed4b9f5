//! Live recording of interaction events into manual steps.
//!
//! Events arrive over a per-job channel and are consumed by a single task,
//! so each step's `order` is its position in the capture sequence.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use autoforms_protocols::driver::{EventSource, Page};
use autoforms_protocols::error::DriverError;
use autoforms_protocols::event::InteractionEvent;
use autoforms_protocols::types::{ActionKind, LocatorDescriptor, ManualStep, UserData};

use crate::scripts::ELEMENT_AT_POINT_SCRIPT;
use crate::template::templatize;

/// Locator used for steps that do not target an element.
const PAGE_SELECTOR: &str = "body";

#[derive(Default)]
struct RecorderState {
    steps: Vec<ManualStep>,
    last_click: Option<LocatorDescriptor>,
}

struct RecorderCore {
    page: Arc<dyn Page>,
    user_data: UserData,
    state: Mutex<RecorderState>,
}

struct Worker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Turns a live run into replayable steps.
pub struct TraceRecorder {
    core: Arc<RecorderCore>,
    worker: Mutex<Option<Worker>>,
}

impl TraceRecorder {
    /// `user_data` drives templatization of typed values.
    pub fn new(page: Arc<dyn Page>, user_data: UserData) -> Self {
        Self {
            core: Arc::new(RecorderCore {
                page,
                user_data,
                state: Mutex::new(RecorderState::default()),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Subscribe to `source`. No-op while already recording.
    pub fn start(&self, source: &dyn EventSource) -> Result<(), DriverError> {
        let mut worker = self.worker.lock();
        if worker.as_ref().is_some_and(|w| !w.handle.is_finished()) {
            debug!("Recorder already active");
            return Ok(());
        }

        let rx = source.subscribe()?;
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(consume(self.core.clone(), rx, cancel.clone()));
        *worker = Some(Worker { cancel, handle });
        debug!("Recorder started");
        Ok(())
    }

    /// Unsubscribe, keeping captured steps. No-op when not recording.
    ///
    /// Events already delivered are recorded before this returns.
    pub async fn stop(&self) {
        let Some(worker) = self.worker.lock().take() else {
            return;
        };
        worker.cancel.cancel();
        if let Err(e) = worker.handle.await {
            debug!(error = %e, "Recorder task ended abnormally");
        }
        debug!(steps = self.core.state.lock().steps.len(), "Recorder stopped");
    }

    pub fn is_active(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .is_some_and(|w| !w.handle.is_finished())
    }

    pub fn steps(&self) -> Vec<ManualStep> {
        self.core.state.lock().steps.clone()
    }

    /// Drop captured steps and the last-click memo.
    pub fn reset(&self) {
        let mut state = self.core.state.lock();
        state.steps.clear();
        state.last_click = None;
    }

    /// Record one event directly, bypassing the subscription.
    pub async fn record(&self, event: InteractionEvent) {
        self.core.record(event).await;
    }
}

async fn consume(
    core: Arc<RecorderCore>,
    mut rx: mpsc::UnboundedReceiver<InteractionEvent>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            event = rx.recv() => match event {
                Some(event) => core.record(event).await,
                None => return,
            },
        }
    }

    // Events delivered before the stop are still recorded.
    rx.close();
    while let Some(event) = rx.recv().await {
        core.record(event).await;
    }
}

impl RecorderCore {
    async fn record(&self, event: InteractionEvent) {
        trace!(?event, "Recording event");
        match event {
            InteractionEvent::Click { x, y } => self.record_click(x, y, None).await,
            InteractionEvent::DoubleClick { x, y } => {
                self.record_click(x, y, Some("Double click")).await
            }
            InteractionEvent::RightClick { x, y } => {
                self.record_click(x, y, Some("Right click")).await
            }
            InteractionEvent::TypeText { text } => {
                let Some(locator) = self.state.lock().last_click.clone() else {
                    debug!("Typed text without a prior click dropped");
                    return;
                };
                let value = templatize(&text, &self.user_data);
                self.push(ManualStep::new(0, ActionKind::Fill, locator).with_value(value));
            }
            InteractionEvent::Scroll { x, y, .. } => {
                if let Some(locator) = self.element_at(x, y).await {
                    self.push(ManualStep::new(0, ActionKind::Scroll, locator));
                }
            }
            InteractionEvent::Navigate { url } => {
                self.push(
                    ManualStep::new(0, ActionKind::Navigate, page_locator()).with_value(url),
                );
            }
            InteractionEvent::KeyPress { key } => {
                let locator = self
                    .state
                    .lock()
                    .last_click
                    .clone()
                    .unwrap_or_else(page_locator);
                self.push(
                    ManualStep::new(0, ActionKind::Press, locator).with_value(canonical_key(&key)),
                );
            }
            InteractionEvent::Wait { ms } => {
                self.push(
                    ManualStep::new(0, ActionKind::Wait, page_locator()).with_value(ms.to_string()),
                );
            }
            InteractionEvent::MouseMove { .. }
            | InteractionEvent::Screenshot
            | InteractionEvent::Focus
            | InteractionEvent::Ignored => {}
        }
    }

    async fn record_click(&self, x: f64, y: f64, description: Option<&str>) {
        let Some(locator) = self.element_at(x, y).await else {
            self.state.lock().last_click = None;
            return;
        };
        let mut step = ManualStep::new(0, ActionKind::Click, locator.clone());
        if let Some(d) = description {
            step = step.with_description(format!("{} {}", d, locator.hint()));
        }
        self.state.lock().last_click = Some(locator);
        self.push(step);
    }

    /// Reverse DOM lookup at a viewport point.
    async fn element_at(&self, x: f64, y: f64) -> Option<LocatorDescriptor> {
        let value = match self
            .page
            .evaluate(ELEMENT_AT_POINT_SCRIPT, json!({ "x": x, "y": y }))
            .await
        {
            Ok(v) if !v.is_null() => v,
            Ok(_) => {
                debug!(x, y, "No element at point");
                return None;
            }
            Err(e) => {
                debug!(x, y, error = %e, "Element lookup failed");
                return None;
            }
        };

        match serde_json::from_value::<LocatorDescriptor>(value) {
            Ok(desc) => Some(desc.without_empty()).filter(|d| !d.is_empty()),
            Err(e) => {
                debug!(error = %e, "Unreadable element descriptor");
                None
            }
        }
    }

    fn push(&self, mut step: ManualStep) {
        let mut state = self.state.lock();
        step.order = state.steps.len() as u32;
        trace!(order = step.order, action = %step.action, "Captured step");
        state.steps.push(step);
    }
}

fn page_locator() -> LocatorDescriptor {
    LocatorDescriptor::css(PAGE_SELECTOR)
}

/// Normalize key aliases to the names drivers accept.
fn canonical_key(key: &str) -> String {
    let canonical = match key.trim().to_ascii_lowercase().as_str() {
        "enter" | "return" => "Enter",
        "tab" => "Tab",
        "esc" | "escape" => "Escape",
        "backspace" => "Backspace",
        "del" | "delete" => "Delete",
        "space" | "spacebar" => "Space",
        "up" | "arrowup" => "ArrowUp",
        "down" | "arrowdown" => "ArrowDown",
        "left" | "arrowleft" => "ArrowLeft",
        "right" | "arrowright" => "ArrowRight",
        "home" => "Home",
        "end" => "End",
        "pageup" => "PageUp",
        "pagedown" => "PageDown",
        _ => {
            if key == " " {
                return "Space".to_string();
            }
            let mut chars = key.trim().chars();
            return match chars.next() {
                Some(first) if key.trim().chars().count() > 1 => {
                    first.to_uppercase().chain(chars).collect()
                }
                _ => key.to_string(),
            };
        }
    };
    canonical.to_string()
}

#[cfg(test)]
#[path = "recorder_tests.rs"]
mod tests;
