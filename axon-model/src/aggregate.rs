//! Merging streamed fragments into a final response.
//!
//! The merging rules:
//! - Text deltas concatenate in arrival order.
//! - Thinking deltas concatenate in arrival order, kept separate from text.
//! - Tool-use deltas merge by call id: the name comes from the first delta
//!   that carries one, argument text concatenates. When the stream ends,
//!   arguments for each call parse as JSON; an empty argument string parses
//!   as `{}`, and a parse failure becomes a [`BadToolCall`] instead of a
//!   content block.

use crate::types::{ChatResponse, ChatResponseChunk, ChunkBlock, StopReason, TokenUsage};
use axon_core::ContentBlock;

/// A tool call whose argument text did not parse as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct BadToolCall {
    /// The call id.
    pub id: String,
    /// Tool name, if any delta carried one.
    pub name: String,
    /// The raw argument text as received.
    pub raw: String,
    /// The parse error.
    pub error: String,
}

/// The merged response plus any calls with unparseable arguments.
#[derive(Debug, Clone)]
pub struct AggregateOutcome {
    /// The merged response. Bad calls are excluded from its content.
    pub response: ChatResponse,
    /// Calls whose arguments failed to parse.
    pub bad_calls: Vec<BadToolCall>,
}

#[derive(Debug, Default)]
struct PendingCall {
    id: String,
    name: Option<String>,
    args: String,
}

/// Accumulates fragments of one response.
#[derive(Debug, Default)]
pub struct ResponseAggregator {
    id: Option<String>,
    thinking: String,
    text: String,
    calls: Vec<PendingCall>,
    stop_reason: Option<StopReason>,
    usage: TokenUsage,
}

impl ResponseAggregator {
    /// A fresh, empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one fragment in.
    pub fn push(&mut self, chunk: &ChatResponseChunk) {
        if self.id.is_none() {
            self.id = Some(chunk.id.clone());
        }
        for block in &chunk.content {
            match block {
                ChunkBlock::Text { text } => self.text.push_str(text),
                ChunkBlock::Thinking { thinking } => self.thinking.push_str(thinking),
                ChunkBlock::ToolUse {
                    id,
                    name,
                    input_delta,
                } => {
                    let index = match self.calls.iter().position(|c| c.id == *id) {
                        Some(index) => index,
                        None => {
                            self.calls.push(PendingCall {
                                id: id.clone(),
                                ..PendingCall::default()
                            });
                            self.calls.len() - 1
                        }
                    };
                    let call = &mut self.calls[index];
                    if call.name.is_none() {
                        call.name = name.clone();
                    }
                    call.args.push_str(input_delta);
                }
            }
        }
        if let Some(stop) = chunk.stop_reason {
            self.stop_reason = Some(stop);
        }
        if let Some(usage) = &chunk.usage {
            self.usage.accumulate(usage);
        }
    }

    /// Finish the stream: parse per-call arguments and build the response.
    pub fn finish(self) -> AggregateOutcome {
        let mut content = Vec::new();
        if !self.thinking.is_empty() {
            content.push(ContentBlock::thinking(self.thinking));
        }
        if !self.text.is_empty() {
            content.push(ContentBlock::text(self.text));
        }

        let mut bad_calls = Vec::new();
        for call in self.calls {
            let raw = call.args.trim();
            let parsed = if raw.is_empty() {
                Ok(serde_json::Value::Object(serde_json::Map::new()))
            } else {
                serde_json::from_str::<serde_json::Value>(raw)
            };
            let name = call.name.unwrap_or_default();
            match parsed {
                Ok(input) => content.push(ContentBlock::tool_use(call.id, name, input)),
                Err(e) => bad_calls.push(BadToolCall {
                    id: call.id,
                    name,
                    raw: call.args,
                    error: e.to_string(),
                }),
            }
        }

        AggregateOutcome {
            response: ChatResponse {
                id: self.id.unwrap_or_default(),
                content,
                stop_reason: self.stop_reason,
                usage: self.usage,
            },
            bad_calls,
        }
    }
}
