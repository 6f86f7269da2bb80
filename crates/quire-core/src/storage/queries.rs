//! Database query implementations

use crate::error::Result;
use crate::types::*;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::PathBuf;

// ===== Recent Document Queries =====

const RECENT_COLUMNS: &str = "id, path, display_name, bookmark, last_opened_at, \
                              file_size, modified_at, metadata_refreshed_at";

/// Insert or replace a recent document, keyed by path
pub fn upsert_recent_document(conn: &Connection, record: &RecentDocumentRecord) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO recent_documents
            (id, path, display_name, bookmark, last_opened_at, file_size, modified_at, metadata_refreshed_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(path) DO UPDATE SET
            id = excluded.id,
            display_name = excluded.display_name,
            bookmark = excluded.bookmark,
            last_opened_at = excluded.last_opened_at,
            file_size = excluded.file_size,
            modified_at = excluded.modified_at,
            metadata_refreshed_at = excluded.metadata_refreshed_at
        "#,
        params![
            record.id,
            record.path.to_string_lossy(),
            record.display_name,
            record.bookmark,
            record.last_opened_at.to_rfc3339(),
            record.metadata.size.map(|s| s as i64),
            record.metadata.modified.map(|t| t.to_rfc3339()),
            record.metadata.refreshed_at.map(|t| t.to_rfc3339()),
        ],
    )?;

    Ok(())
}

/// Replace the bookmark token after a staleness repair
pub fn update_recent_bookmark(conn: &Connection, id: &str, bookmark: &[u8]) -> Result<()> {
    conn.execute(
        "UPDATE recent_documents SET bookmark = ? WHERE id = ?",
        params![bookmark, id],
    )?;
    Ok(())
}

/// Store refreshed metadata and bump the last-opened time
pub fn update_recent_metadata(
    conn: &Connection,
    id: &str,
    metadata: &DocumentMetadata,
    last_opened_at: chrono::DateTime<chrono::Utc>,
) -> Result<()> {
    conn.execute(
        r#"
        UPDATE recent_documents
        SET file_size = ?, modified_at = ?, metadata_refreshed_at = ?, last_opened_at = ?
        WHERE id = ?
        "#,
        params![
            metadata.size.map(|s| s as i64),
            metadata.modified.map(|t| t.to_rfc3339()),
            metadata.refreshed_at.map(|t| t.to_rfc3339()),
            last_opened_at.to_rfc3339(),
            id,
        ],
    )?;
    Ok(())
}

/// Get a recent document by ID
pub fn get_recent_document(conn: &Connection, id: &str) -> Result<Option<RecentDocumentRecord>> {
    let result = conn
        .query_row(
            &format!("SELECT {} FROM recent_documents WHERE id = ?", RECENT_COLUMNS),
            params![id],
            row_to_recent,
        )
        .optional()?;

    Ok(result)
}

/// Get a recent document by its file path
pub fn get_recent_document_by_path(
    conn: &Connection,
    path: &std::path::Path,
) -> Result<Option<RecentDocumentRecord>> {
    let result = conn
        .query_row(
            &format!("SELECT {} FROM recent_documents WHERE path = ?", RECENT_COLUMNS),
            params![path.to_string_lossy()],
            row_to_recent,
        )
        .optional()?;

    Ok(result)
}

/// List recent documents, most recently opened first
pub fn list_recent_documents(conn: &Connection, limit: usize) -> Result<Vec<RecentDocumentRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM recent_documents ORDER BY last_opened_at DESC LIMIT ?",
        RECENT_COLUMNS
    ))?;

    let records = stmt
        .query_map(params![limit as i64], row_to_recent)?
        .filter_map(|r| r.ok())
        .collect();

    Ok(records)
}

/// Delete a recent document
pub fn delete_recent_document(conn: &Connection, id: &str) -> Result<()> {
    conn.execute("DELETE FROM recent_documents WHERE id = ?", params![id])?;
    Ok(())
}

// ===== Helper Functions =====

fn row_to_recent(row: &Row<'_>) -> rusqlite::Result<RecentDocumentRecord> {
    Ok(RecentDocumentRecord {
        id: row.get(0)?,
        path: PathBuf::from(row.get::<_, String>(1)?),
        display_name: row.get(2)?,
        bookmark: row.get(3)?,
        last_opened_at: parse_time(4, &row.get::<_, String>(4)?)?,
        metadata: DocumentMetadata {
            size: row.get::<_, Option<i64>>(5)?.map(|s| s as u64),
            modified: row
                .get::<_, Option<String>>(6)?
                .map(|s| parse_time(6, &s))
                .transpose()?,
            refreshed_at: row
                .get::<_, Option<String>>(7)?
                .map(|s| parse_time(7, &s))
                .transpose()?,
        },
    })
}

fn parse_time(idx: usize, s: &str) -> rusqlite::Result<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&chrono::Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}
