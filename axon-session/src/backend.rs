//! The storage backend contract for aggregated session documents.

use crate::SessionError;
use async_trait::async_trait;
use axon_core::SessionId;
use std::time::{SystemTime, UNIX_EPOCH};

/// Metadata about one stored session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// Size of the stored document in bytes.
    pub size_bytes: u64,
    /// Number of component state dicts in the document.
    pub components: usize,
    /// Last modification time, epoch milliseconds.
    pub last_modified_ms: u64,
}

/// Stores one aggregated JSON document per session.
///
/// `put` must be atomic per session — a concurrent `get` sees either the
/// previous document or the new one, never a partial write. Concurrent
/// `put`s for the same id are serialized by the backend; the last write
/// wins.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Write the aggregated document, creating or overwriting in place.
    async fn put(&self, id: &SessionId, document: serde_json::Value)
        -> Result<(), SessionError>;

    /// Read the aggregated document. `None` if the session does not exist.
    async fn get(&self, id: &SessionId) -> Result<Option<serde_json::Value>, SessionError>;

    /// Remove the session. Returns whether it existed.
    async fn delete(&self, id: &SessionId) -> Result<bool, SessionError>;

    /// Ids of every stored session.
    async fn list(&self) -> Result<Vec<SessionId>, SessionError>;

    /// Metadata for one session. `None` if it does not exist.
    async fn info(&self, id: &SessionId) -> Result<Option<SessionInfo>, SessionError>;
}

/// Current time as epoch milliseconds.
pub(crate) fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Number of top-level component entries in a session document.
pub(crate) fn component_count(document: &serde_json::Value) -> usize {
    document.as_object().map(|o| o.len()).unwrap_or(0)
}
