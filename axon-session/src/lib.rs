#![deny(missing_docs)]
//! # axon-session — durable capture of conversational state
//!
//! A [`SessionManager`] aggregates the state dicts of a set of
//! [`StateModule`]s into one JSON document per session and hands it to a
//! [`SessionBackend`] for an atomic write. Loading is the mirror image:
//! the document is read once and each named component restores itself with
//! `strict = false`.
//!
//! Backends:
//! - [`FsSessionBackend`] — one `<root>/<session_id>.json` file per
//!   session, written via temp-file + rename (the default)
//! - [`MemorySessionBackend`] — process-local, for tests and ephemeral use
//! - [`KvSessionBackend`] — payload plus `:meta` timestamp keys over any
//!   [`KvStore`]
//! - [`SqliteSessionBackend`] — one row per session with idempotent upserts

pub mod backend;
pub mod fs;
pub mod kv;
pub mod memory;
pub mod sqlite;

pub use backend::{SessionBackend, SessionInfo};
pub use fs::FsSessionBackend;
pub use kv::{InMemoryKv, KvSessionBackend, KvStore};
pub use memory::MemorySessionBackend;
pub use sqlite::SqliteSessionBackend;

use axon_core::{SessionId, StateError, StateModule};
use std::sync::Arc;
use thiserror::Error;

/// Errors from session storage and restoration.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session does not exist.
    #[error("session not found: {0}")]
    NotFound(String),

    /// The stored document is not valid session state.
    #[error("session corrupt: {0}")]
    Corrupt(String),

    /// The session id failed validation.
    #[error("invalid session id: {0}")]
    InvalidId(String),

    /// A schema or table identifier failed validation.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// The storage layer failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// A component failed to capture or restore its state.
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// I/O error during a storage operation.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Validate a session id: non-empty, no path separators, at most 255
/// characters.
pub fn validate_session_id(id: &str) -> Result<(), SessionError> {
    if id.is_empty() {
        return Err(SessionError::InvalidId("empty".into()));
    }
    if id.len() > 255 {
        return Err(SessionError::InvalidId(format!(
            "{} characters exceeds the 255 limit",
            id.len()
        )));
    }
    if id.contains('/') || id.contains('\\') {
        return Err(SessionError::InvalidId(format!(
            "'{id}' contains a path separator"
        )));
    }
    Ok(())
}

/// Validate a schema or table identifier: letters, digits and underscores
/// only, at most 64 characters.
pub fn validate_identifier(name: &str) -> Result<(), SessionError> {
    if name.is_empty() || name.len() > 64 {
        return Err(SessionError::InvalidIdentifier(format!(
            "'{name}' must be 1..=64 characters"
        )));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(SessionError::InvalidIdentifier(format!(
            "'{name}' may only contain letters, digits and underscores"
        )));
    }
    Ok(())
}

/// Aggregates component state into per-session documents on a backend.
pub struct SessionManager {
    backend: Arc<dyn SessionBackend>,
}

impl SessionManager {
    /// A manager over the given backend.
    pub fn new(backend: Arc<dyn SessionBackend>) -> Self {
        Self { backend }
    }

    /// Capture every component and write the aggregated document
    /// atomically. Overwrites in place.
    pub async fn save(
        &self,
        id: &SessionId,
        components: &[Arc<dyn StateModule>],
    ) -> Result<(), SessionError> {
        validate_session_id(id.as_str())?;
        let mut document = serde_json::Map::new();
        for component in components {
            let dict = component.state_dict().await?;
            document.insert(component.component_name().to_string(), dict);
        }
        tracing::debug!(session = %id, components = components.len(), "saving session");
        self.backend
            .put(id, serde_json::Value::Object(document))
            .await
    }

    /// Read the aggregated document and restore each named component with
    /// `strict = false`. Returns whether the session existed.
    ///
    /// When the session is missing, returns `Ok(false)` if `allow_missing`
    /// and [`SessionError::NotFound`] otherwise. Components absent from
    /// the document are left untouched.
    pub async fn load(
        &self,
        id: &SessionId,
        allow_missing: bool,
        components: &[Arc<dyn StateModule>],
    ) -> Result<bool, SessionError> {
        validate_session_id(id.as_str())?;
        let document = match self.backend.get(id).await? {
            Some(document) => document,
            None if allow_missing => return Ok(false),
            None => return Err(SessionError::NotFound(id.to_string())),
        };
        let object = document
            .as_object()
            .ok_or_else(|| SessionError::Corrupt("document is not a JSON object".into()))?;
        for component in components {
            if let Some(dict) = object.get(component.component_name()) {
                component.load_state_dict(dict.clone(), false).await?;
            }
        }
        tracing::debug!(session = %id, "loaded session");
        Ok(true)
    }

    /// Whether a session exists.
    pub async fn exists(&self, id: &SessionId) -> Result<bool, SessionError> {
        validate_session_id(id.as_str())?;
        Ok(self.backend.info(id).await?.is_some())
    }

    /// Ids of every stored session.
    pub async fn list(&self) -> Result<Vec<SessionId>, SessionError> {
        self.backend.list().await
    }

    /// Remove a session. Returns whether it existed.
    pub async fn delete(&self, id: &SessionId) -> Result<bool, SessionError> {
        validate_session_id(id.as_str())?;
        self.backend.delete(id).await
    }

    /// Metadata for one session.
    pub async fn info(&self, id: &SessionId) -> Result<Option<SessionInfo>, SessionError> {
        validate_session_id(id.as_str())?;
        self.backend.info(id).await
    }
}
