//! Browser driver surface consumed by replay, recording, and layers.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::DriverError;
use crate::event::InteractionEvent;

/// One query a driver knows how to turn into a locator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocatorQuery {
    TestId(String),
    Role { role: String, name: Option<String> },
    AriaLabel(String),
    /// `name` attribute.
    Name(String),
    /// Element `id` attribute.
    Id(String),
    Text(String),
    Css(String),
    Xpath(String),
}

/// A lazily evaluated element query.
#[async_trait]
pub trait Locator: Send + Sync {
    /// Number of elements currently matching.
    async fn count(&self) -> Result<usize, DriverError>;

    /// Narrow to the first match.
    fn first(&self) -> Arc<dyn Locator>;

    async fn click(&self) -> Result<(), DriverError>;

    async fn fill(&self, value: &str) -> Result<(), DriverError>;

    async fn select_option(&self, value: &str) -> Result<(), DriverError>;

    async fn check(&self) -> Result<(), DriverError>;

    async fn uncheck(&self) -> Result<(), DriverError>;

    async fn hover(&self) -> Result<(), DriverError>;

    async fn press(&self, key: &str) -> Result<(), DriverError>;

    async fn scroll_into_view(&self) -> Result<(), DriverError>;
}

/// A live page.
#[async_trait]
pub trait Page: Send + Sync {
    /// Current URL.
    async fn url(&self) -> Result<String, DriverError>;

    /// Evaluate a script in the page with JSON arguments.
    async fn evaluate(
        &self,
        script: &str,
        args: serde_json::Value,
    ) -> Result<serde_json::Value, DriverError>;

    /// Page-level navigation.
    async fn goto(&self, url: &str) -> Result<(), DriverError>;

    /// Build a locator for one strategy.
    fn locate(&self, query: &LocatorQuery) -> Arc<dyn Locator>;
}

/// Source of live interaction events.
///
/// Each subscription is a dedicated channel with exactly one consumer;
/// dropping the receiver unsubscribes.
pub trait EventSource: Send + Sync {
    fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<InteractionEvent>, DriverError>;
}
