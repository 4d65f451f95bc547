// SPDX-FileCopyrightText: 2026 Addrag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection handling and schema bootstrap.
//!
//! The schema is applied idempotently on every open, so a fresh database
//! file becomes usable without a separate migration step.

use addrag_core::AddragError;
use tokio_rusqlite::Connection;
use tracing::info;

/// Convert a tokio-rusqlite error into AddragError::Storage.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> AddragError {
    AddragError::Storage {
        source: Box::new(e),
    }
}

/// Schema for the two Addrag tables: per-session conversation turns and
/// per-field candidate vocabularies.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS conversation_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL,
    query TEXT NOT NULL,
    response TEXT NOT NULL,
    score TEXT,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);
CREATE INDEX IF NOT EXISTS idx_history_session ON conversation_history(session_id);

CREATE TABLE IF NOT EXISTS field_candidates (
    field_name TEXT PRIMARY KEY NOT NULL,
    values_json TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);
";

/// Opens (or creates) the database at `path` and applies the schema.
///
/// Parent directories are created as needed. WAL mode is enabled for
/// file-backed databases.
pub async fn open_database(path: &str) -> Result<Connection, AddragError> {
    if let Some(parent) = std::path::Path::new(path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| AddragError::Storage {
            source: Box::new(e),
        })?;
    }

    let conn = Connection::open(path)
        .await
        .map_err(|e| AddragError::Storage {
            source: Box::new(e),
        })?;

    apply_schema(&conn).await?;
    info!(path, "database opened");
    Ok(conn)
}

/// Opens an in-memory database with the schema applied. Used by tests and
/// ephemeral tooling.
pub async fn open_in_memory() -> Result<Connection, AddragError> {
    let conn = Connection::open_in_memory()
        .await
        .map_err(|e| AddragError::Storage {
            source: Box::new(e),
        })?;
    apply_schema(&conn).await?;
    Ok(conn)
}

async fn apply_schema(conn: &Connection) -> Result<(), AddragError> {
    conn.call(|conn| -> Result<(), rusqlite::Error> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    })
    .await
    .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_in_memory_applies_schema() {
        let conn = open_in_memory().await.unwrap();

        let tables: Vec<String> = conn
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                )?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .unwrap();

        assert!(tables.contains(&"conversation_history".to_string()));
        assert!(tables.contains(&"field_candidates".to_string()));
    }

    #[tokio::test]
    async fn open_database_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/addrag.db");
        let path_str = path.to_string_lossy().into_owned();

        let conn = open_database(&path_str).await.unwrap();
        drop(conn);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn open_database_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("addrag.db");
        let path_str = path.to_string_lossy().into_owned();

        let first = open_database(&path_str).await.unwrap();
        drop(first);
        // Second open must not fail on the existing schema.
        let second = open_database(&path_str).await;
        assert!(second.is_ok());
    }
}
