//! Multi-strategy element resolution.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace};

use autoforms_config::LocatorConfig;
use autoforms_protocols::driver::{Locator, LocatorQuery, Page};
use autoforms_protocols::error::DriverError;
use autoforms_protocols::types::{LocatorDescriptor, LocatorStrategy};

/// Result of resolving one descriptor.
pub struct Resolution {
    /// First matching element, if any strategy matched.
    pub handle: Option<Arc<dyn Locator>>,
    pub strategy: LocatorStrategy,
    /// Number of strategies tried.
    pub attempts: u32,
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        self.handle.is_some()
    }
}

impl std::fmt::Debug for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolution")
            .field("found", &self.handle.is_some())
            .field("strategy", &self.strategy)
            .field("attempts", &self.attempts)
            .finish()
    }
}

/// Resolves descriptors by trying strategies in fixed priority.
#[derive(Debug, Clone)]
pub struct LocatorResolver {
    timeout: Duration,
    stale_retry_delay: Duration,
}

impl Default for LocatorResolver {
    fn default() -> Self {
        Self::new(&LocatorConfig::default())
    }
}

impl LocatorResolver {
    pub fn new(config: &LocatorConfig) -> Self {
        Self {
            timeout: Duration::from_millis(config.timeout_ms),
            stale_retry_delay: Duration::from_millis(config.stale_retry_delay_ms),
        }
    }

    /// Present strategies in priority order.
    ///
    /// `name` is skipped when `role` is present.
    pub fn strategies(descriptor: &LocatorDescriptor) -> Vec<(LocatorStrategy, LocatorQuery)> {
        let mut out = Vec::new();
        if let Some(v) = &descriptor.test_id {
            out.push((LocatorStrategy::TestId, LocatorQuery::TestId(v.clone())));
        }
        if let Some(r) = &descriptor.role {
            out.push((
                LocatorStrategy::Role,
                LocatorQuery::Role {
                    role: r.role.clone(),
                    name: r.name.clone(),
                },
            ));
        }
        if let Some(v) = &descriptor.aria_label {
            out.push((LocatorStrategy::AriaLabel, LocatorQuery::AriaLabel(v.clone())));
        }
        if let (Some(v), None) = (&descriptor.name, &descriptor.role) {
            out.push((LocatorStrategy::Name, LocatorQuery::Name(v.clone())));
        }
        if let Some(v) = &descriptor.id {
            out.push((LocatorStrategy::Id, LocatorQuery::Id(v.clone())));
        }
        if let Some(v) = &descriptor.text {
            out.push((LocatorStrategy::Text, LocatorQuery::Text(v.clone())));
        }
        if let Some(v) = &descriptor.css {
            out.push((LocatorStrategy::Css, LocatorQuery::Css(v.clone())));
        }
        if let Some(v) = &descriptor.xpath {
            out.push((LocatorStrategy::Xpath, LocatorQuery::Xpath(v.clone())));
        }
        out
    }

    pub async fn resolve(&self, page: &dyn Page, descriptor: &LocatorDescriptor) -> Resolution {
        let mut attempts = 0;
        for (strategy, query) in Self::strategies(descriptor) {
            attempts += 1;
            let locator = page.locate(&query);
            match self.probe(locator.as_ref(), strategy).await {
                Ok(true) => {
                    debug!(strategy = %strategy, attempts, "Resolved element");
                    return Resolution {
                        handle: Some(locator.first()),
                        strategy,
                        attempts,
                    };
                }
                Ok(false) => trace!(strategy = %strategy, "No match"),
                Err(e) => debug!(strategy = %strategy, error = %e, "Strategy failed"),
            }
        }

        Resolution {
            handle: None,
            strategy: LocatorStrategy::None,
            attempts,
        }
    }

    /// Whether `locator` matches, retrying a stale error once.
    async fn probe(
        &self,
        locator: &dyn Locator,
        strategy: LocatorStrategy,
    ) -> Result<bool, DriverError> {
        match self.count(locator).await {
            Err(e) if e.is_stale() => {
                trace!(strategy = %strategy, "Stale element, retrying once");
                tokio::time::sleep(self.stale_retry_delay).await;
                self.count(locator).await.map(|n| n > 0)
            }
            other => other.map(|n| n > 0),
        }
    }

    async fn count(&self, locator: &dyn Locator) -> Result<usize, DriverError> {
        match tokio::time::timeout(self.timeout, locator.count()).await {
            Ok(result) => result,
            Err(_) => Err(DriverError::Timeout(format!(
                "count() exceeded {}ms",
                self.timeout.as_millis()
            ))),
        }
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
