#![deny(missing_docs)]
//! In-memory implementation of axon-core's Memory contract.
//!
//! Messages live in a `Vec` behind a `RwLock`. Appends are atomic with
//! respect to snapshots, and snapshots are plain copies, so a reader never
//! observes a half-written log. State capture serializes the full ordered
//! list; restoration replaces it wholesale.

use async_trait::async_trait;
use axon_core::{Memory, Message, StateError, StateModule};
use tokio::sync::RwLock;

/// The state-dict key the message log is stored under.
const MESSAGES_KEY: &str = "messages";

/// Ordered, append-only message log backed by a `Vec` behind a `RwLock`.
pub struct InMemoryMemory {
    name: String,
    messages: RwLock<Vec<Message>>,
}

impl InMemoryMemory {
    /// An empty memory with the default component name `"memory"`.
    pub fn new() -> Self {
        Self::named("memory")
    }

    /// An empty memory with an explicit component name (for systems that
    /// persist more than one memory per session).
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            messages: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryMemory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Memory for InMemoryMemory {
    async fn append(&self, message: Message) {
        self.messages.write().await.push(message);
    }

    async fn append_all(&self, messages: Vec<Message>) {
        self.messages.write().await.extend(messages);
    }

    async fn snapshot(&self) -> Vec<Message> {
        self.messages.read().await.clone()
    }

    async fn clear(&self) {
        self.messages.write().await.clear();
    }

    async fn size(&self) -> usize {
        self.messages.read().await.len()
    }
}

#[async_trait]
impl StateModule for InMemoryMemory {
    fn component_name(&self) -> &str {
        &self.name
    }

    async fn state_dict(&self) -> Result<serde_json::Value, StateError> {
        let messages = self.messages.read().await;
        let encoded = serde_json::to_value(&*messages)
            .map_err(|e| StateError::Serialization(e.to_string()))?;
        Ok(serde_json::json!({ MESSAGES_KEY: encoded }))
    }

    async fn load_state_dict(
        &self,
        state: serde_json::Value,
        strict: bool,
    ) -> Result<(), StateError> {
        let obj = state
            .as_object()
            .ok_or_else(|| StateError::Serialization("state dict must be an object".into()))?;

        if strict {
            if let Some(key) = obj.keys().find(|k| k.as_str() != MESSAGES_KEY) {
                return Err(StateError::UnknownKey {
                    component: self.name.clone(),
                    key: key.clone(),
                });
            }
        }

        let restored: Vec<Message> = match obj.get(MESSAGES_KEY) {
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| StateError::BadMessage(e.to_string()))?,
            None => Vec::new(),
        };

        *self.messages.write().await = restored;
        Ok(())
    }
}
