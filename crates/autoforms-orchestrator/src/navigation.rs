//! Moving between pages of a multi-step flow.

use tracing::{debug, info, warn};

use autoforms_cookbook::LocatorResolver;
use autoforms_protocols::driver::Page;
use autoforms_protocols::types::{LocatorDescriptor, Observation};

use crate::layers::LayerStack;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationResult {
    /// The most capable layer advanced the flow.
    Layer(String),
    /// A structural button candidate was clicked.
    Selector(String),
    /// Nothing to click; assumed end of flow.
    NoNavigation,
}

impl NavigationResult {
    pub fn advanced(&self) -> bool {
        !matches!(self, NavigationResult::NoNavigation)
    }
}

const NEXT_WORDS: &[&str] = &["next", "continue", "proceed", "save and continue"];
const SUBMIT_WORDS: &[&str] = &["submit", "apply", "confirm", "finish", "send", "review and submit"];

/// Structural next/submit button candidates, most specific first.
fn next_candidates() -> Vec<LocatorDescriptor> {
    let mut out = vec![
        LocatorDescriptor::test_id("bottom-navigation-next-button"),
        LocatorDescriptor::css("[data-automation-id='bottom-navigation-next-button']"),
    ];
    for label in ["Next", "Continue", "Save and Continue", "Submit", "Submit Application", "Apply"] {
        out.push(LocatorDescriptor::default().with_role("button", Some(label.to_string())));
    }
    out.push(LocatorDescriptor::css("button[type='submit']"));
    out.push(LocatorDescriptor::css("input[type='submit']"));
    out
}

/// Advance to the next page.
///
/// Tries the most capable layer's own advance capability, then the
/// structural candidates in order.
pub async fn navigate_next(
    stack: &LayerStack,
    page: &dyn Page,
    resolver: &LocatorResolver,
) -> NavigationResult {
    let layer = stack.most_capable();
    match layer.advance().await {
        Ok(true) => {
            info!(layer = layer.name(), "Layer advanced the flow");
            return NavigationResult::Layer(layer.name().to_string());
        }
        Ok(false) => debug!(layer = layer.name(), "Layer did not advance"),
        Err(e) => warn!(layer = layer.name(), error = %e, "Layer advance failed"),
    }

    for candidate in next_candidates() {
        let resolution = resolver.resolve(page, &candidate).await;
        let Some(handle) = resolution.handle else {
            continue;
        };
        match handle.click().await {
            Ok(()) => {
                let hint = candidate.hint();
                info!(selector = %hint, "Clicked navigation button");
                return NavigationResult::Selector(hint);
            }
            Err(e) => debug!(selector = %candidate.hint(), error = %e, "Navigation click failed"),
        }
    }

    debug!("No navigation control found");
    NavigationResult::NoNavigation
}

fn matches_any(text: &str, words: &[&str]) -> bool {
    let text = text.trim().to_lowercase();
    words
        .iter()
        .any(|w| text == *w || text.starts_with(&format!("{} ", w)))
}

/// Terminal iff a submit-type button is present and no next-type button.
pub fn detect_last_page(observation: &Observation) -> bool {
    let has_submit = observation
        .buttons
        .iter()
        .any(|b| matches_any(&b.text, SUBMIT_WORDS));
    let has_next = observation
        .buttons
        .iter()
        .any(|b| matches_any(&b.text, NEXT_WORDS));
    has_submit && !has_next
}

#[cfg(test)]
#[path = "navigation_tests.rs"]
mod tests;
