//! # AutoForms Protocols
//!
//! Core protocol definitions (traits) and the shared data model for the
//! AutoForms replay engine. Contains only interface definitions - no
//! implementations.
//!
//! ## Core Traits
//!
//! - [`Page`] / [`Locator`] - Browser driver surface consumed by replay
//! - [`EventSource`] - Serial stream of live interaction events
//! - [`ManualRepository`] - Filtered row store for recorded manuals
//! - [`Layer`] - One observation/execution tier of the orchestrator
//! - [`EventSink`] - Best-effort lifecycle event output
//! - [`AssistedExecutor`] - The AI-assisted fallback path

pub mod assisted;
pub mod driver;
pub mod error;
pub mod event;
pub mod layer;
pub mod sink;
pub mod storage;
pub mod types;

pub use assisted::{AssistedExecutor, AssistedReport, Job};
pub use driver::{EventSource, Locator, LocatorQuery, Page};
pub use error::{DriverError, LayerError, StorageError};
pub use event::InteractionEvent;
pub use layer::Layer;
pub use sink::{EngineEvent, EventSink, SinkError};
pub use storage::{ManualQuery, ManualRepository, ManualUpdate, NewManual};
pub use types::*;
