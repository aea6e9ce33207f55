//! Request, response, and streaming fragment types for the model port.

use axon_core::{ContentBlock, Message};
use serde::{Deserialize, Serialize};

/// JSON-Schema description of a tool, as advertised to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolSchema {
    /// Tool name (unique).
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the tool's parameters.
    pub parameters: serde_json::Value,
    /// Whether the model must adhere strictly to the schema.
    #[serde(default)]
    pub strict: bool,
}

/// Tool selection strategy for the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ToolChoice {
    /// Model decides whether to use tools.
    Auto,
    /// Model must not use tools.
    None,
    /// Model must use at least one tool.
    Required,
    /// Model must use the named tool.
    Specific {
        /// Name of the required tool.
        name: String,
    },
}

/// A request for one streaming completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model identifier (`None` = backend default).
    pub model: Option<String>,
    /// Conversation messages, in the order the model should see them.
    pub messages: Vec<Message>,
    /// Tools available for this request.
    pub tools: Vec<ToolSchema>,
    /// System prompt.
    pub system: Option<String>,
    /// Tool selection strategy.
    pub tool_choice: Option<ToolChoice>,
    /// Backend-specific passthrough.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

impl ChatRequest {
    /// A request with just messages; everything else defaulted.
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            model: None,
            messages,
            tools: vec![],
            system: None,
            tool_choice: None,
            extra: None,
        }
    }
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural end of the response.
    EndTurn,
    /// The model wants tools invoked.
    ToolUse,
    /// Output hit the token limit.
    MaxTokens,
    /// Content was filtered.
    ContentFilter,
}

/// Token usage for one completion (or a running total across a call).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the prompt.
    pub input_tokens: u64,
    /// Tokens generated.
    pub output_tokens: u64,
}

impl TokenUsage {
    /// Add another usage sample into this total.
    pub fn accumulate(&mut self, other: &TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

/// One streamed fragment of a response.
///
/// Fragments carry partial content; concatenating them per the rules in
/// [`crate::aggregate`] reconstructs the full response. Every fragment of
/// one response carries the same `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatResponseChunk {
    /// Response id shared by all fragments of one response.
    pub id: String,
    /// Partial content carried by this fragment.
    pub content: Vec<ChunkBlock>,
    /// Present on the final fragment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<StopReason>,
    /// Usage, usually reported on the final fragment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

/// A partial content block within a streamed fragment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChunkBlock {
    /// A text delta.
    Text {
        /// The appended text.
        text: String,
    },
    /// A thinking delta.
    Thinking {
        /// The appended thinking text.
        thinking: String,
    },
    /// A tool-use delta, keyed by the call id. `name` is present on the
    /// first delta of a call; `input_delta` carries a slice of the raw
    /// argument JSON text.
    ToolUse {
        /// Call id this delta belongs to.
        id: String,
        /// Tool name (first delta of the call).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        /// Appended raw argument text.
        #[serde(default)]
        input_delta: String,
    },
}

impl ChatResponseChunk {
    /// A text-delta fragment.
    pub fn text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: vec![ChunkBlock::Text { text: text.into() }],
            stop_reason: None,
            usage: None,
        }
    }

    /// A thinking-delta fragment.
    pub fn thinking(id: impl Into<String>, thinking: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: vec![ChunkBlock::Thinking {
                thinking: thinking.into(),
            }],
            stop_reason: None,
            usage: None,
        }
    }

    /// A tool-use delta fragment.
    pub fn tool_use(
        id: impl Into<String>,
        call_id: impl Into<String>,
        name: Option<&str>,
        input_delta: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            content: vec![ChunkBlock::ToolUse {
                id: call_id.into(),
                name: name.map(str::to_owned),
                input_delta: input_delta.into(),
            }],
            stop_reason: None,
            usage: None,
        }
    }

    /// A terminal fragment carrying the stop reason and usage.
    pub fn finish(id: impl Into<String>, stop_reason: StopReason, usage: TokenUsage) -> Self {
        Self {
            id: id.into(),
            content: vec![],
            stop_reason: Some(stop_reason),
            usage: Some(usage),
        }
    }
}

/// A fully merged model response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    /// Response id.
    pub id: String,
    /// Merged content blocks.
    pub content: Vec<ContentBlock>,
    /// Why the model stopped, if it reported a reason.
    pub stop_reason: Option<StopReason>,
    /// Usage for this response.
    pub usage: TokenUsage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_block_serde_is_tagged() {
        let chunk = ChatResponseChunk::tool_use("r1", "c1", Some("add"), "{\"a\"");
        let value = serde_json::to_value(&chunk).unwrap();
        assert_eq!(value["content"][0]["type"], "tool_use");
        assert_eq!(value["content"][0]["name"], "add");
        let back: ChatResponseChunk = serde_json::from_value(value).unwrap();
        assert_eq!(chunk, back);
    }

    #[test]
    fn stop_reason_wire_names() {
        assert_eq!(
            serde_json::to_string(&StopReason::EndTurn).unwrap(),
            "\"end_turn\""
        );
        assert_eq!(
            serde_json::to_string(&StopReason::ToolUse).unwrap(),
            "\"tool_use\""
        );
    }

    #[test]
    fn usage_accumulates() {
        let mut total = TokenUsage::default();
        total.accumulate(&TokenUsage {
            input_tokens: 10,
            output_tokens: 5,
        });
        total.accumulate(&TokenUsage {
            input_tokens: 7,
            output_tokens: 3,
        });
        assert_eq!(total.input_tokens, 17);
        assert_eq!(total.output_tokens, 8);
    }
}
