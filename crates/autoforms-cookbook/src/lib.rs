//! # AutoForms Cookbook
//!
//! The replay side of AutoForms: a health-scored cache of recorded action
//! sequences ("manuals"), multi-strategy element resolution, deterministic
//! replay, live recording, and the engine that picks replay over the
//! AI-assisted path.
//!
//! ## Flow
//!
//! ```text
//! Job ──► ExecutionEngine ──► ManualStore.lookup
//!              │                    │
//!              │  healthy manual    ▼
//!              ├──────────────► CookbookExecutor ──► LocatorResolver ──► Page
//!              │                    │
//!              │  miss / failure    ▼ record_success / record_failure
//!              └──────────────► AssistedExecutor ──► trace ──► save_from_trace
//! ```

mod engine;
mod error;
mod executor;
pub mod health;
mod memory_repo;
pub mod pattern;
mod platform;
mod recorder;
mod resolver;
mod scripts;
mod sink;
mod store;
pub mod template;

#[cfg(test)]
mod test_support;

pub use engine::{ExecutionEngine, ExecutionMode, FallbackReason, JobOutcome};
pub use error::{EngineError, StepError, StoreError};
pub use executor::{CookbookExecutor, ReplayReport};
pub use health::compute_health;
pub use memory_repo::MemoryManualRepository;
pub use pattern::{url_matches_pattern, url_to_pattern};
pub use platform::detect_platform;
pub use recorder::TraceRecorder;
pub use resolver::{LocatorResolver, Resolution};
pub use sink::TracingEventSink;
pub use store::{ManualMeta, ManualStore};
