//! Storage contract for recorded manuals.
//!
//! Backends behave like a filtered row store: filtered select, get by id,
//! insert returning the stored row, and partial update by id.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StorageError;
use crate::types::{ActionManual, ManualSource, ManualStep};

/// Core trait for manual storage backends.
#[async_trait]
pub trait ManualRepository: Send + Sync {
    /// Returns the backend ID.
    fn id(&self) -> &str;

    /// Rows with `task_pattern` equal to the query task, health above zero,
    /// and (when given) the same platform; ordered by health descending and
    /// truncated to `limit`.
    async fn select(&self, query: &ManualQuery) -> Result<Vec<ActionManual>, StorageError>;

    async fn get(&self, id: &Uuid) -> Result<Option<ActionManual>, StorageError>;

    async fn insert(&self, manual: NewManual) -> Result<ActionManual, StorageError>;

    /// Apply the set fields of `update`. Returns `None` for an unknown id.
    async fn update(
        &self,
        id: &Uuid,
        update: ManualUpdate,
    ) -> Result<Option<ActionManual>, StorageError>;
}

/// Filtered select parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualQuery {
    pub task_pattern: String,
    #[serde(default)]
    pub platform: Option<String>,
    pub limit: usize,
}

impl ManualQuery {
    pub fn new(task_pattern: impl Into<String>) -> Self {
        Self {
            task_pattern: task_pattern.into(),
            platform: None,
            limit: 10,
        }
    }

    pub fn with_platform(mut self, platform: Option<String>) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Row to insert. Id and timestamps are assigned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewManual {
    pub url_pattern: String,
    pub task_pattern: String,
    pub platform: Option<String>,
    pub steps: Vec<ManualStep>,
    pub health_score: u32,
    pub source: ManualSource,
}

/// Partial update. Unset fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManualUpdate {
    pub health_score: Option<u32>,
    pub success_count: Option<u32>,
    pub failure_count: Option<u32>,
    pub last_used: Option<DateTime<Utc>>,
    pub steps: Option<Vec<ManualStep>>,
}

impl ManualUpdate {
    pub fn is_empty(&self) -> bool {
        self.health_score.is_none()
            && self.success_count.is_none()
            && self.failure_count.is_none()
            && self.last_used.is_none()
            && self.steps.is_none()
    }
}
