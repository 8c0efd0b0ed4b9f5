//! SQLite manual repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{OptionalExtension, Row, params};
use std::path::Path;
use tokio_rusqlite::Connection;
use tracing::debug;
use uuid::Uuid;

use autoforms_protocols::error::StorageError;
use autoforms_protocols::storage::{ManualQuery, ManualRepository, ManualUpdate, NewManual};
use autoforms_protocols::types::{ActionManual, MAX_HEALTH, ManualSource, ManualStep};

use crate::schema::init_schema;

#[cfg(test)]
#[path = "backend_tests.rs"]
mod tests;

const COLUMNS: &str = "id, url_pattern, task_pattern, platform, steps, health_score, \
                       success_count, failure_count, source, last_used, created_at, updated_at";

/// SQLite-based manual repository.
pub struct SqliteManualRepository {
    conn: Connection,
}

impl SqliteManualRepository {
    /// Create a new in-memory database.
    pub async fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| StorageError::ConnectionError(e.to_string()))?;
        Self::init(conn).await
    }

    /// Open or create a file-backed database.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        debug!(path = %path.display(), "Opening manual database");
        let conn = Connection::open(path)
            .await
            .map_err(|e| StorageError::ConnectionError(e.to_string()))?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.call(|conn| Ok(init_schema(conn)?))
            .await
            .map_err(|e| StorageError::QueryError(e.to_string()))?;
        Ok(Self { conn })
    }
}

/// A `manuals` row as stored, before decoding.
#[derive(Debug, Clone)]
struct ManualRow {
    id: String,
    url_pattern: String,
    task_pattern: String,
    platform: Option<String>,
    steps: String,
    /// 0-100, stored as REAL.
    health_score: f64,
    success_count: u32,
    failure_count: u32,
    source: String,
    last_used: Option<String>,
    created_at: String,
    updated_at: String,
}

impl ManualRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            url_pattern: row.get(1)?,
            task_pattern: row.get(2)?,
            platform: row.get(3)?,
            steps: row.get(4)?,
            health_score: row.get(5)?,
            success_count: row.get(6)?,
            failure_count: row.get(7)?,
            source: row.get(8)?,
            last_used: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }

    fn decode(self) -> Result<ActionManual, StorageError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| StorageError::SerializationError(format!("id {}: {}", self.id, e)))?;
        let steps: Vec<ManualStep> = serde_json::from_str(&self.steps)?;
        let source = ManualSource::parse(&self.source).ok_or_else(|| {
            StorageError::SerializationError(format!("unknown source '{}'", self.source))
        })?;
        Ok(ActionManual {
            id,
            url_pattern: self.url_pattern,
            task_pattern: self.task_pattern,
            platform: self.platform,
            steps,
            health_score: self.health_score.round().clamp(0.0, f64::from(MAX_HEALTH)) as u32,
            success_count: self.success_count,
            failure_count: self.failure_count,
            source,
            last_used: self.last_used.as_deref().map(parse_time).transpose()?,
            created_at: parse_time(&self.created_at)?,
            updated_at: parse_time(&self.updated_at)?,
        })
    }
}

/// Fixed-width so that text ordering matches time ordering.
fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_time(s: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::SerializationError(format!("timestamp '{}': {}", s, e)))
}

#[async_trait]
impl ManualRepository for SqliteManualRepository {
    fn id(&self) -> &str {
        "sqlite"
    }

    async fn select(&self, query: &ManualQuery) -> Result<Vec<ActionManual>, StorageError> {
        let task = query.task_pattern.clone();
        let platform = query.platform.clone();
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);

        let rows = self
            .conn
            .call(move |conn| {
                let sql = format!(
                    "SELECT {} FROM manuals
                     WHERE task_pattern = ?1 AND health_score > 0
                       AND (?2 IS NULL OR platform = ?2)
                     ORDER BY health_score DESC, created_at ASC
                     LIMIT ?3",
                    COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![task, platform, limit], ManualRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(|e| StorageError::QueryError(e.to_string()))?;

        rows.into_iter().map(ManualRow::decode).collect()
    }

    async fn get(&self, id: &Uuid) -> Result<Option<ActionManual>, StorageError> {
        let id = id.to_string();
        let row = self
            .conn
            .call(move |conn| {
                let sql = format!("SELECT {} FROM manuals WHERE id = ?1", COLUMNS);
                Ok(conn
                    .query_row(&sql, [&id], ManualRow::from_row)
                    .optional()?)
            })
            .await
            .map_err(|e| StorageError::QueryError(e.to_string()))?;

        row.map(ManualRow::decode).transpose()
    }

    async fn insert(&self, manual: NewManual) -> Result<ActionManual, StorageError> {
        let now = format_time(Utc::now());
        let row = ManualRow {
            id: Uuid::new_v4().to_string(),
            url_pattern: manual.url_pattern,
            task_pattern: manual.task_pattern,
            platform: manual.platform,
            steps: serde_json::to_string(&manual.steps)?,
            health_score: f64::from(manual.health_score.min(MAX_HEALTH)),
            success_count: 0,
            failure_count: 0,
            source: manual.source.as_str().to_string(),
            last_used: None,
            created_at: now.clone(),
            updated_at: now,
        };

        let stored = row.clone();
        self.conn
            .call(move |conn| {
                conn.execute(
                    &format!(
                        "INSERT INTO manuals ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                        COLUMNS
                    ),
                    params![
                        stored.id,
                        stored.url_pattern,
                        stored.task_pattern,
                        stored.platform,
                        stored.steps,
                        stored.health_score,
                        stored.success_count,
                        stored.failure_count,
                        stored.source,
                        stored.last_used,
                        stored.created_at,
                        stored.updated_at
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(|e| StorageError::QueryError(e.to_string()))?;

        debug!(id = %row.id, task = %row.task_pattern, "Inserted manual");
        row.decode()
    }

    async fn update(
        &self,
        id: &Uuid,
        update: ManualUpdate,
    ) -> Result<Option<ActionManual>, StorageError> {
        let id = id.to_string();
        let steps = update.steps.as_ref().map(serde_json::to_string).transpose()?;
        let last_used = update.last_used.map(format_time);
        let now = format_time(Utc::now());

        let row = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let sql = format!("SELECT {} FROM manuals WHERE id = ?1", COLUMNS);
                let Some(mut row) = tx.query_row(&sql, [&id], ManualRow::from_row).optional()?
                else {
                    return Ok(None);
                };

                if let Some(h) = update.health_score {
                    row.health_score = f64::from(h.min(MAX_HEALTH));
                }
                if let Some(n) = update.success_count {
                    row.success_count = n;
                }
                if let Some(n) = update.failure_count {
                    row.failure_count = n;
                }
                if let Some(ts) = last_used {
                    row.last_used = Some(ts);
                }
                if let Some(s) = steps {
                    row.steps = s;
                }
                row.updated_at = now;

                tx.execute(
                    "UPDATE manuals SET steps = ?1, health_score = ?2, success_count = ?3,
                     failure_count = ?4, last_used = ?5, updated_at = ?6 WHERE id = ?7",
                    params![
                        row.steps,
                        row.health_score,
                        row.success_count,
                        row.failure_count,
                        row.last_used,
                        row.updated_at,
                        row.id
                    ],
                )?;
                tx.commit()?;
                Ok(Some(row))
            })
            .await
            .map_err(|e| StorageError::QueryError(e.to_string()))?;

        row.map(ManualRow::decode).transpose()
    }
}
