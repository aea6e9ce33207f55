//! SQLite-backed session storage.
//!
//! One row per session: `(session_id PK, state_data TEXT, created_at,
//! updated_at)`. Upserts are idempotent, timestamps are epoch
//! milliseconds, and every connection call runs on the blocking pool.

use crate::backend::{component_count, epoch_ms, SessionBackend, SessionInfo};
use crate::{validate_identifier, SessionError};
use async_trait::async_trait;
use axon_core::SessionId;
use rusqlite::params;
use std::path::{Path, PathBuf};

/// Session storage in a SQLite database file.
pub struct SqliteSessionBackend {
    db_path: PathBuf,
    table: String,
}

impl SqliteSessionBackend {
    /// Open (or create) the database and ensure the table exists.
    ///
    /// The table name must pass [`validate_identifier`].
    pub fn new(path: impl AsRef<Path>, table: impl Into<String>) -> Result<Self, SessionError> {
        let table = table.into();
        validate_identifier(&table)?;
        let db_path = path.as_ref().to_path_buf();
        let conn = rusqlite::Connection::open(&db_path)
            .map_err(|e| SessionError::Storage(e.to_string()))?;
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    session_id TEXT PRIMARY KEY,
                    state_data TEXT NOT NULL,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL
                )"
            ),
            [],
        )
        .map_err(|e| SessionError::Storage(e.to_string()))?;
        Ok(Self { db_path, table })
    }

    /// Open with the default table name `sessions`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        Self::new(path, "sessions")
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, SessionError>
    where
        T: Send + 'static,
        F: FnOnce(&rusqlite::Connection, &str) -> Result<T, rusqlite::Error> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        let table = self.table.clone();
        tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&db_path)
                .map_err(|e| SessionError::Storage(e.to_string()))?;
            f(&conn, &table).map_err(|e| SessionError::Storage(e.to_string()))
        })
        .await
        .map_err(|e| SessionError::Storage(e.to_string()))?
    }
}

#[async_trait]
impl SessionBackend for SqliteSessionBackend {
    async fn put(
        &self,
        id: &SessionId,
        document: serde_json::Value,
    ) -> Result<(), SessionError> {
        let payload = serde_json::to_string(&document)
            .map_err(|e| SessionError::Storage(e.to_string()))?;
        let session_id = id.to_string();
        let now = epoch_ms() as i64;
        self.with_conn(move |conn, table| {
            conn.execute(
                &format!(
                    "INSERT INTO {table} (session_id, state_data, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?3)
                     ON CONFLICT(session_id) DO UPDATE SET
                         state_data = excluded.state_data,
                         updated_at = excluded.updated_at"
                ),
                params![session_id, payload, now],
            )?;
            Ok(())
        })
        .await
    }

    async fn get(&self, id: &SessionId) -> Result<Option<serde_json::Value>, SessionError> {
        let session_id = id.to_string();
        let payload: Option<String> = self
            .with_conn(move |conn, table| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT state_data FROM {table} WHERE session_id = ?1"
                ))?;
                let mut rows = stmt.query(params![session_id])?;
                match rows.next()? {
                    Some(row) => Ok(Some(row.get(0)?)),
                    None => Ok(None),
                }
            })
            .await?;
        match payload {
            Some(payload) => serde_json::from_str(&payload)
                .map(Some)
                .map_err(|e| SessionError::Corrupt(e.to_string())),
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &SessionId) -> Result<bool, SessionError> {
        let session_id = id.to_string();
        let affected = self
            .with_conn(move |conn, table| {
                conn.execute(
                    &format!("DELETE FROM {table} WHERE session_id = ?1"),
                    params![session_id],
                )
            })
            .await?;
        Ok(affected > 0)
    }

    async fn list(&self) -> Result<Vec<SessionId>, SessionError> {
        let ids: Vec<String> = self
            .with_conn(move |conn, table| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT session_id FROM {table} ORDER BY session_id"
                ))?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect()
            })
            .await?;
        Ok(ids.into_iter().map(SessionId::new).collect())
    }

    async fn info(&self, id: &SessionId) -> Result<Option<SessionInfo>, SessionError> {
        let session_id = id.to_string();
        let row: Option<(String, i64)> = self
            .with_conn(move |conn, table| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT state_data, updated_at FROM {table} WHERE session_id = ?1"
                ))?;
                let mut rows = stmt.query(params![session_id])?;
                match rows.next()? {
                    Some(row) => Ok(Some((row.get(0)?, row.get(1)?))),
                    None => Ok(None),
                }
            })
            .await?;
        match row {
            Some((payload, updated_at)) => {
                let document: serde_json::Value = serde_json::from_str(&payload)
                    .map_err(|e| SessionError::Corrupt(e.to_string()))?;
                Ok(Some(SessionInfo {
                    size_bytes: payload.len() as u64,
                    components: component_count(&document),
                    last_modified_ms: updated_at as u64,
                }))
            }
            None => Ok(None),
        }
    }
}
