//! # AutoForms Orchestrator
//!
//! Drives a multi-page form flow through an ordered stack of layers,
//! cheapest first, escalating individual actions to more capable layers
//! when execution or verification fails.
//!
//! ```text
//! page loop ──► observe (cheapest) ──► sections ──► match ──► plan
//!                                                             │
//!        re-observe ◄── trace ◄── execute_with_escalation ◄───┘
//!                                   structural → language → vision
//! ```

mod budget;
mod dom_layer;
mod error;
mod escalation;
mod layers;
mod navigation;
mod orchestrator;
mod planner;
mod scripts;
mod sections;
mod trace;

#[cfg(test)]
mod test_support;

pub use budget::CostBudget;
pub use dom_layer::DomLayer;
pub use error::OrchestratorError;
pub use escalation::{EscalationOutcome, execute_with_escalation};
pub use layers::LayerStack;
pub use navigation::{NavigationResult, detect_last_page, navigate_next};
pub use orchestrator::{RunReport, SectionOrchestrator, StopReason};
pub use planner::{action_for, plan_actions};
pub use sections::group_sections;
pub use trace::TraceBuilder;
