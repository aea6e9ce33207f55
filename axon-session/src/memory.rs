//! Process-local session storage, for tests and ephemeral deployments.

use crate::backend::{component_count, epoch_ms, SessionBackend, SessionInfo};
use crate::SessionError;
use async_trait::async_trait;
use axon_core::SessionId;
use std::collections::HashMap;
use tokio::sync::RwLock;

struct Stored {
    document: serde_json::Value,
    last_modified_ms: u64,
}

/// Session documents in a `HashMap` behind a `RwLock`.
pub struct MemorySessionBackend {
    sessions: RwLock<HashMap<String, Stored>>,
}

impl MemorySessionBackend {
    /// An empty store.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemorySessionBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionBackend for MemorySessionBackend {
    async fn put(
        &self,
        id: &SessionId,
        document: serde_json::Value,
    ) -> Result<(), SessionError> {
        self.sessions.write().await.insert(
            id.to_string(),
            Stored {
                document,
                last_modified_ms: epoch_ms(),
            },
        );
        Ok(())
    }

    async fn get(&self, id: &SessionId) -> Result<Option<serde_json::Value>, SessionError> {
        Ok(self
            .sessions
            .read()
            .await
            .get(id.as_str())
            .map(|s| s.document.clone()))
    }

    async fn delete(&self, id: &SessionId) -> Result<bool, SessionError> {
        Ok(self.sessions.write().await.remove(id.as_str()).is_some())
    }

    async fn list(&self) -> Result<Vec<SessionId>, SessionError> {
        let mut ids: Vec<SessionId> = self
            .sessions
            .read()
            .await
            .keys()
            .map(SessionId::new)
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn info(&self, id: &SessionId) -> Result<Option<SessionInfo>, SessionError> {
        Ok(self.sessions.read().await.get(id.as_str()).map(|s| {
            let size = serde_json::to_vec(&s.document)
                .map(|v| v.len() as u64)
                .unwrap_or(0);
            SessionInfo {
                size_bytes: size,
                components: component_count(&s.document),
                last_modified_ms: s.last_modified_ms,
            }
        }))
    }
}
