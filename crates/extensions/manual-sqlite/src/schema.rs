//! Database schema management.

use rusqlite::Connection;
use tokio_rusqlite::Error;

/// Initialize the database schema.
pub fn init_schema(conn: &Connection) -> Result<(), Error> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS manuals (
    id TEXT PRIMARY KEY,
    url_pattern TEXT NOT NULL,
    task_pattern TEXT NOT NULL,
    platform TEXT,
    steps TEXT NOT NULL,
    health_score REAL NOT NULL,
    success_count INTEGER NOT NULL DEFAULT 0,
    failure_count INTEGER NOT NULL DEFAULT 0,
    source TEXT NOT NULL,
    last_used TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_manuals_task ON manuals(task_pattern, health_score);
CREATE INDEX IF NOT EXISTS idx_manuals_platform ON manuals(platform);
"#;
