//! Key-value backed session storage.
//!
//! Layout: `<prefix><session_id>` holds the JSON payload and
//! `<prefix><session_id>:meta` holds the last-modified time as epoch
//! milliseconds. Any store that can get/set/scan string keys can carry
//! sessions by implementing [`KvStore`].

use crate::backend::{component_count, epoch_ms, SessionBackend, SessionInfo};
use crate::SessionError;
use async_trait::async_trait;
use axon_core::SessionId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

const META_SUFFIX: &str = ":meta";

/// Minimal string key-value store contract.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a value.
    async fn get(&self, key: &str) -> Result<Option<String>, SessionError>;

    /// Write a value, creating or overwriting.
    async fn set(&self, key: &str, value: String) -> Result<(), SessionError>;

    /// Remove a key. Returns whether it existed.
    async fn remove(&self, key: &str) -> Result<bool, SessionError>;

    /// Every key starting with the prefix.
    async fn keys(&self, prefix: &str) -> Result<Vec<String>, SessionError>;
}

/// A `HashMap`-backed [`KvStore`] for tests and single-process use.
pub struct InMemoryKv {
    data: RwLock<HashMap<String, String>>,
}

impl InMemoryKv {
    /// An empty store.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryKv {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for InMemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.data.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), SessionError> {
        self.data.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, SessionError> {
        Ok(self.data.write().await.remove(key).is_some())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, SessionError> {
        Ok(self
            .data
            .read()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

/// Session storage over any [`KvStore`].
pub struct KvSessionBackend {
    kv: Arc<dyn KvStore>,
    prefix: String,
}

impl KvSessionBackend {
    /// A backend storing sessions under the given key prefix.
    pub fn new(kv: Arc<dyn KvStore>, prefix: impl Into<String>) -> Self {
        Self {
            kv,
            prefix: prefix.into(),
        }
    }

    fn payload_key(&self, id: &SessionId) -> String {
        format!("{}{id}", self.prefix)
    }

    fn meta_key(&self, id: &SessionId) -> String {
        format!("{}{id}{META_SUFFIX}", self.prefix)
    }
}

#[async_trait]
impl SessionBackend for KvSessionBackend {
    async fn put(
        &self,
        id: &SessionId,
        document: serde_json::Value,
    ) -> Result<(), SessionError> {
        let payload = serde_json::to_string(&document)
            .map_err(|e| SessionError::Storage(e.to_string()))?;
        self.kv.set(&self.payload_key(id), payload).await?;
        self.kv
            .set(&self.meta_key(id), epoch_ms().to_string())
            .await?;
        Ok(())
    }

    async fn get(&self, id: &SessionId) -> Result<Option<serde_json::Value>, SessionError> {
        match self.kv.get(&self.payload_key(id)).await? {
            Some(payload) => {
                let document = serde_json::from_str(&payload)
                    .map_err(|e| SessionError::Corrupt(e.to_string()))?;
                Ok(Some(document))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &SessionId) -> Result<bool, SessionError> {
        let existed = self.kv.remove(&self.payload_key(id)).await?;
        let _ = self.kv.remove(&self.meta_key(id)).await?;
        Ok(existed)
    }

    async fn list(&self) -> Result<Vec<SessionId>, SessionError> {
        let mut ids: Vec<SessionId> = self
            .kv
            .keys(&self.prefix)
            .await?
            .into_iter()
            .filter(|k| !k.ends_with(META_SUFFIX))
            .filter_map(|k| k.strip_prefix(&self.prefix).map(SessionId::new))
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn info(&self, id: &SessionId) -> Result<Option<SessionInfo>, SessionError> {
        let payload = match self.kv.get(&self.payload_key(id)).await? {
            Some(payload) => payload,
            None => return Ok(None),
        };
        let document: serde_json::Value = serde_json::from_str(&payload)
            .map_err(|e| SessionError::Corrupt(e.to_string()))?;
        let last_modified_ms = self
            .kv
            .get(&self.meta_key(id))
            .await?
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        Ok(Some(SessionInfo {
            size_bytes: payload.len() as u64,
            components: component_count(&document),
            last_modified_ms,
        }))
    }
}
