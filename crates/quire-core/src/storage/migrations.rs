//! Database migrations

use crate::error::Result;
use rusqlite::Connection;
use tracing::{debug, info};

/// Run all database migrations
pub fn run_migrations(conn: &Connection) -> Result<()> {
    info!("Running database migrations");

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
        "#,
    )?;

    // Run migrations in order
    let migrations: Vec<(&str, &str)> = vec![
        ("001_recent_documents", MIGRATION_001_RECENT_DOCUMENTS),
        ("002_metadata_cache", MIGRATION_002_METADATA_CACHE),
    ];

    for (name, sql) in migrations {
        if !migration_applied(conn, name)? {
            debug!("Applying migration: {}", name);
            conn.execute_batch(sql)?;
            mark_migration_applied(conn, name)?;
            info!("Applied migration: {}", name);
        }
    }

    info!("All migrations completed");
    Ok(())
}

fn migration_applied(conn: &Connection, name: &str) -> Result<bool> {
    let count: i32 = conn.query_row(
        "SELECT COUNT(*) FROM migrations WHERE name = ?",
        [name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn mark_migration_applied(conn: &Connection, name: &str) -> Result<()> {
    conn.execute("INSERT INTO migrations (name) VALUES (?)", [name])?;
    Ok(())
}

const MIGRATION_001_RECENT_DOCUMENTS: &str = r#"
-- Recently opened documents with their bookmark tokens
CREATE TABLE IF NOT EXISTS recent_documents (
    id TEXT PRIMARY KEY,
    path TEXT NOT NULL UNIQUE,
    display_name TEXT NOT NULL,
    bookmark BLOB NOT NULL,
    last_opened_at DATETIME NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_recent_documents_opened ON recent_documents(last_opened_at DESC);
"#;

const MIGRATION_002_METADATA_CACHE: &str = r#"
-- Best-effort metadata, refreshed when the document is opened
ALTER TABLE recent_documents ADD COLUMN file_size INTEGER;
ALTER TABLE recent_documents ADD COLUMN modified_at DATETIME;
ALTER TABLE recent_documents ADD COLUMN metadata_refreshed_at DATETIME;
"#;
