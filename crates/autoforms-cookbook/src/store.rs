//! Health-scored manual cache.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use autoforms_config::StoreConfig;
use autoforms_protocols::storage::{ManualQuery, ManualRepository, ManualUpdate, NewManual};
use autoforms_protocols::types::{ActionManual, ManualSource, ManualStep, Outcome};

use crate::error::StoreError;
use crate::health::{IMPORTED_INITIAL_HEALTH, RECORDED_INITIAL_HEALTH, compute_health};
use crate::pattern::{url_matches_pattern, url_to_pattern};
use crate::platform::detect_platform;

/// Where a saved manual applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualMeta {
    pub url_pattern: String,
    pub task_pattern: String,
    pub platform: Option<String>,
}

impl ManualMeta {
    pub fn new(url_pattern: impl Into<String>, task_pattern: impl Into<String>) -> Self {
        Self {
            url_pattern: url_pattern.into(),
            task_pattern: task_pattern.into(),
            platform: None,
        }
    }

    /// Pattern and platform derived from a concrete URL.
    pub fn for_url(url: &str, task_pattern: impl Into<String>) -> Self {
        Self {
            url_pattern: url_to_pattern(url),
            task_pattern: task_pattern.into(),
            platform: detect_platform(url).map(str::to_string),
        }
    }

    pub fn with_platform(mut self, platform: Option<String>) -> Self {
        self.platform = platform;
        self
    }
}

/// Manual lookup, persistence and outcome recording over a repository.
pub struct ManualStore {
    repo: Arc<dyn ManualRepository>,
    config: StoreConfig,
    /// Serializes outcome read-modify-write through this store.
    outcome_lock: Mutex<()>,
}

impl ManualStore {
    pub fn new(repo: Arc<dyn ManualRepository>, config: StoreConfig) -> Self {
        Self {
            repo,
            config,
            outcome_lock: Mutex::new(()),
        }
    }

    pub fn repository(&self) -> &Arc<dyn ManualRepository> {
        &self.repo
    }

    /// First healthy candidate whose pattern matches `url`.
    ///
    /// Candidates are scanned in descending health order, so a healthier
    /// broad pattern wins over a less healthy exact one.
    pub async fn lookup(
        &self,
        url: &str,
        task: &str,
        platform: Option<&str>,
    ) -> Result<Option<ActionManual>, StoreError> {
        let candidates = self.list(task, platform).await?;
        let found = candidates
            .into_iter()
            .find(|m| url_matches_pattern(url, &m.url_pattern));

        match &found {
            Some(m) => debug!(manual_id = %m.id, url_pattern = %m.url_pattern, "Manual matched"),
            None => debug!(url, task, "No manual matched"),
        }
        Ok(found)
    }

    /// Healthy candidates for a task, healthiest first.
    pub async fn list(
        &self,
        task: &str,
        platform: Option<&str>,
    ) -> Result<Vec<ActionManual>, StoreError> {
        let query = ManualQuery::new(task)
            .with_platform(platform.map(str::to_string))
            .with_limit(self.config.lookup_limit);
        let mut rows = self.repo.select(&query).await?;
        rows.retain(|m| m.health_score > 0);
        rows.truncate(self.config.lookup_limit);
        Ok(rows)
    }

    pub async fn get(&self, id: &Uuid) -> Result<Option<ActionManual>, StoreError> {
        Ok(self.repo.get(id).await?)
    }

    /// Persist steps captured from a live run.
    pub async fn save_from_trace(
        &self,
        steps: Vec<ManualStep>,
        meta: ManualMeta,
    ) -> Result<ActionManual, StoreError> {
        self.save(steps, meta, ManualSource::Recorded, RECORDED_INITIAL_HEALTH)
            .await
    }

    /// Persist steps from an imported action book.
    pub async fn save_from_action_book(
        &self,
        steps: Vec<ManualStep>,
        meta: ManualMeta,
    ) -> Result<ActionManual, StoreError> {
        self.save(steps, meta, ManualSource::Imported, IMPORTED_INITIAL_HEALTH)
            .await
    }

    async fn save(
        &self,
        steps: Vec<ManualStep>,
        meta: ManualMeta,
        source: ManualSource,
        health_score: u32,
    ) -> Result<ActionManual, StoreError> {
        validate_steps(&steps)?;
        let manual = self
            .repo
            .insert(NewManual {
                url_pattern: meta.url_pattern,
                task_pattern: meta.task_pattern,
                platform: meta.platform,
                steps,
                health_score,
                source,
            })
            .await?;
        info!(
            manual_id = %manual.id,
            source = source.as_str(),
            steps = manual.steps.len(),
            url_pattern = %manual.url_pattern,
            "Saved manual"
        );
        Ok(manual)
    }

    /// Returns the updated manual, or `None` when the id is unknown.
    pub async fn record_success(&self, id: &Uuid) -> Result<Option<ActionManual>, StoreError> {
        self.record_outcome(id, Outcome::Success).await
    }

    /// Returns the updated manual, or `None` when the id is unknown.
    pub async fn record_failure(&self, id: &Uuid) -> Result<Option<ActionManual>, StoreError> {
        self.record_outcome(id, Outcome::Failure).await
    }

    pub async fn record_outcome(
        &self,
        id: &Uuid,
        outcome: Outcome,
    ) -> Result<Option<ActionManual>, StoreError> {
        let _guard = self.outcome_lock.lock().await;

        let Some(manual) = self.repo.get(id).await? else {
            debug!(manual_id = %id, "Outcome for unknown manual ignored");
            return Ok(None);
        };

        let health_score = compute_health(manual.health_score, manual.failure_count, outcome);
        let update = match outcome {
            Outcome::Success => ManualUpdate {
                health_score: Some(health_score),
                success_count: Some(manual.success_count.saturating_add(1)),
                last_used: Some(Utc::now()),
                ..Default::default()
            },
            Outcome::Failure => ManualUpdate {
                health_score: Some(health_score),
                failure_count: Some(manual.failure_count.saturating_add(1)),
                ..Default::default()
            },
        };

        let updated = self.repo.update(id, update).await?;
        debug!(
            manual_id = %id,
            ?outcome,
            from = manual.health_score,
            to = health_score,
            "Recorded outcome"
        );
        Ok(updated)
    }
}

fn validate_steps(steps: &[ManualStep]) -> Result<(), StoreError> {
    if steps.is_empty() {
        return Err(StoreError::EmptySteps);
    }
    let mut seen = HashSet::new();
    for step in steps {
        if step.locator.is_empty() {
            return Err(StoreError::EmptyLocator(step.order));
        }
        if !seen.insert(step.order) {
            return Err(StoreError::DuplicateOrder(step.order));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
