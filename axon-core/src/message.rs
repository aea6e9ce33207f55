//! Messages — immutable, typed units of conversation.

use crate::content::{text_of, ContentBlock};
use crate::error::StateError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A human user.
    User,
    /// The agent / model.
    Assistant,
    /// System instructions.
    System,
    /// A tool reporting results.
    Tool,
    /// Control messages steering the engine; may carry no content.
    Control,
}

/// A message in a conversation.
///
/// Messages are immutable once constructed: producers build them with the
/// constructors below, append them to memory, and never touch them again.
/// Sharing by reference is therefore safe everywhere.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Stable identifier, unique within a session.
    pub id: String,
    /// Sender identity, used when formatting multi-agent conversations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The author role. Fixed at construction.
    pub role: Role,
    /// The content blocks, in order. May be empty for control messages.
    pub content: Vec<ContentBlock>,
    /// Free-form metadata attached by the producer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, serde_json::Value>>,
}

impl Message {
    /// Create a message with a fresh id from a role and content blocks.
    pub fn new(role: Role, content: Vec<ContentBlock>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: None,
            role,
            content,
            metadata: None,
        }
    }

    /// Create a user message with a single text block.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![ContentBlock::text(text)])
    }

    /// Create an assistant message with a single text block.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, vec![ContentBlock::text(text)])
    }

    /// Create a system message with a single text block.
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, vec![ContentBlock::text(text)])
    }

    /// Create a tool message carrying a single tool-result block.
    pub fn tool(tool_use_id: impl Into<String>, content: Vec<ContentBlock>, is_error: bool) -> Self {
        Self::new(
            Role::Tool,
            vec![ContentBlock::tool_result(tool_use_id, content, is_error)],
        )
    }

    /// Attach a sender name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attach a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value);
        self
    }

    /// Concatenated text of all `Text` blocks, in order.
    pub fn text(&self) -> String {
        text_of(&self.content)
    }

    /// The tool-use blocks of this message as `(id, name, input)` triples.
    pub fn tool_uses(&self) -> Vec<(&str, &str, &serde_json::Value)> {
        self.content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::ToolUse { id, name, input } => {
                    Some((id.as_str(), name.as_str(), input))
                }
                _ => None,
            })
            .collect()
    }

    /// Decode a message from a JSON value, failing with a typed error on
    /// unknown roles or block tags.
    pub fn from_value(value: serde_json::Value) -> Result<Self, StateError> {
        serde_json::from_value(value).map_err(|e| StateError::BadMessage(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_wire_names_are_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(serde_json::to_string(&Role::Tool).unwrap(), "\"tool\"");
        assert_eq!(
            serde_json::to_string(&Role::Control).unwrap(),
            "\"control\""
        );
    }

    #[test]
    fn messages_get_unique_ids() {
        let a = Message::user("hi");
        let b = Message::user("hi");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn builder_attaches_name_and_metadata() {
        let msg = Message::assistant("hello")
            .with_name("planner")
            .with_metadata("temperature", json!(0.2));
        assert_eq!(msg.name.as_deref(), Some("planner"));
        assert_eq!(msg.metadata.unwrap()["temperature"], json!(0.2));
    }

    #[test]
    fn unknown_role_is_a_bad_message() {
        let value = json!({
            "id": "m1",
            "role": "narrator",
            "content": []
        });
        let err = Message::from_value(value).unwrap_err();
        assert!(matches!(err, StateError::BadMessage(_)));
    }

    #[test]
    fn roundtrip_preserves_block_order() {
        let msg = Message::new(
            Role::Assistant,
            vec![
                ContentBlock::thinking("let me see"),
                ContentBlock::text("the answer"),
                ContentBlock::tool_use("c1", "add", json!({"a": 1})),
            ],
        );
        let value = serde_json::to_value(&msg).unwrap();
        let back = Message::from_value(value).unwrap();
        assert_eq!(msg, back);
        assert_eq!(back.text(), "the answer");
        assert_eq!(back.tool_uses().len(), 1);
    }

    #[test]
    fn control_message_may_be_empty() {
        let msg = Message::new(Role::Control, vec![]);
        assert!(msg.content.is_empty());
        assert_eq!(msg.text(), "");
    }
}
