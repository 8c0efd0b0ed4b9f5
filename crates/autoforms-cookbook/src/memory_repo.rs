//! In-memory manual repository.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use autoforms_protocols::error::StorageError;
use autoforms_protocols::storage::{ManualQuery, ManualRepository, ManualUpdate, NewManual};
use autoforms_protocols::types::{ActionManual, MAX_HEALTH};

/// Process-local repository for tests and the `memory` storage backend.
pub struct MemoryManualRepository {
    id: String,
    manuals: RwLock<HashMap<Uuid, ActionManual>>,
}

impl MemoryManualRepository {
    pub fn new() -> Self {
        Self {
            id: "memory".to_string(),
            manuals: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.manuals.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.manuals.read().await.is_empty()
    }
}

impl Default for MemoryManualRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ManualRepository for MemoryManualRepository {
    fn id(&self) -> &str {
        &self.id
    }

    async fn select(&self, query: &ManualQuery) -> Result<Vec<ActionManual>, StorageError> {
        let manuals = self.manuals.read().await;
        let mut rows: Vec<ActionManual> = manuals
            .values()
            .filter(|m| m.task_pattern == query.task_pattern && m.health_score > 0)
            .filter(|m| match &query.platform {
                Some(p) => m.platform.as_deref() == Some(p.as_str()),
                None => true,
            })
            .cloned()
            .collect();

        rows.sort_by(|a, b| {
            b.health_score
                .cmp(&a.health_score)
                .then(a.created_at.cmp(&b.created_at))
        });
        rows.truncate(query.limit);
        Ok(rows)
    }

    async fn get(&self, id: &Uuid) -> Result<Option<ActionManual>, StorageError> {
        Ok(self.manuals.read().await.get(id).cloned())
    }

    async fn insert(&self, manual: NewManual) -> Result<ActionManual, StorageError> {
        let now = Utc::now();
        let row = ActionManual {
            id: Uuid::new_v4(),
            url_pattern: manual.url_pattern,
            task_pattern: manual.task_pattern,
            platform: manual.platform,
            steps: manual.steps,
            health_score: manual.health_score.min(MAX_HEALTH),
            success_count: 0,
            failure_count: 0,
            source: manual.source,
            last_used: None,
            created_at: now,
            updated_at: now,
        };
        self.manuals.write().await.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        id: &Uuid,
        update: ManualUpdate,
    ) -> Result<Option<ActionManual>, StorageError> {
        let mut manuals = self.manuals.write().await;
        let Some(row) = manuals.get_mut(id) else {
            return Ok(None);
        };

        if let Some(h) = update.health_score {
            row.health_score = h.min(MAX_HEALTH);
        }
        if let Some(n) = update.success_count {
            row.success_count = n;
        }
        if let Some(n) = update.failure_count {
            row.failure_count = n;
        }
        if let Some(ts) = update.last_used {
            row.last_used = Some(ts);
        }
        if let Some(steps) = update.steps {
            row.steps = steps;
        }
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }
}
