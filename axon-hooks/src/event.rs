//! The lifecycle event taxonomy.
//!
//! One tagged union covers both audiences: hooks receive these events
//! in-process, and the engine's public stream yields the same values to
//! external subscribers.

use axon_core::{ContentBlock, Message};
use axon_model::{ChatResponseChunk, ToolSchema};
use serde::{Deserialize, Serialize};

/// Which part of a call an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Call setup / teardown.
    Call,
    /// The model is producing a response.
    Reasoning,
    /// Tools are executing.
    Acting,
    /// A hook itself.
    Hook,
}

/// The kind of a reported error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed request or invalid identifier.
    BadInput,
    /// The model emitted un-parseable tool arguments.
    BadToolArguments,
    /// A tool executed and failed.
    Tool,
    /// A tool exceeded its execution budget.
    ToolTimeout,
    /// Model transport or protocol failure.
    Model,
    /// A hook raised.
    Hook,
    /// Cooperative cancellation.
    Cancelled,
    /// The whole-call budget elapsed.
    Timeout,
    /// The event buffer overflowed.
    Overflow,
}

/// A tool call the engine is about to dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingToolCall {
    /// Call id, unique within the turn.
    pub id: String,
    /// Tool name.
    pub name: String,
    /// Parsed JSON arguments.
    pub input: serde_json::Value,
}

/// One lifecycle event of a call.
///
/// Events marked *modifiable* thread their payload through the hook
/// pipeline — the last hook's output wins. The others are notifications;
/// hook return values are ignored for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AgentEvent {
    /// The engine is about to begin a turn. Notification.
    PreCall {
        /// The input messages for this call.
        input: Vec<Message>,
    },

    /// About to call the model. Modifiable: a hook may replace the
    /// messages or the tool list.
    PreReasoning {
        /// Messages that will be sent to the model.
        messages: Vec<Message>,
        /// Tools that will be advertised.
        tools: Vec<ToolSchema>,
    },

    /// A streaming fragment arrived from the model. Notification.
    ReasoningChunk {
        /// The fragment.
        chunk: ChatResponseChunk,
    },

    /// Reasoning for this step finished. Modifiable: a hook may replace
    /// the candidate assistant message before tool dispatch.
    PostReasoning {
        /// The aggregated assistant message candidate.
        candidate: Message,
    },

    /// About to dispatch tool calls. Modifiable: a hook may add, remove,
    /// or replace calls.
    PreActing {
        /// The calls that will be dispatched.
        calls: Vec<PendingToolCall>,
    },

    /// A streaming fragment arrived from a tool. Notification.
    ActingChunk {
        /// The call this fragment belongs to.
        call_id: String,
        /// The partial output block.
        block: ContentBlock,
    },

    /// Tools for this step finished. Modifiable: a hook may replace the
    /// result messages.
    PostActing {
        /// The tool-result messages, in deterministic call-id order.
        results: Vec<Message>,
    },

    /// The turn finished. Modifiable: a hook may replace the terminal
    /// assistant message.
    PostCall {
        /// The terminal assistant message.
        reply: Message,
    },

    /// Something failed. Notification; exactly one per error.
    Error {
        /// Where the error happened.
        phase: Phase,
        /// What kind of error it was.
        kind: ErrorKind,
        /// Human-readable detail.
        message: String,
    },
}

impl AgentEvent {
    /// Whether hooks may rewrite this event's payload.
    pub fn is_modifiable(&self) -> bool {
        matches!(
            self,
            AgentEvent::PreReasoning { .. }
                | AgentEvent::PostReasoning { .. }
                | AgentEvent::PreActing { .. }
                | AgentEvent::PostActing { .. }
                | AgentEvent::PostCall { .. }
        )
    }

    /// Stable name of the event variant, for logging and encoding.
    pub fn name(&self) -> &'static str {
        match self {
            AgentEvent::PreCall { .. } => "pre_call",
            AgentEvent::PreReasoning { .. } => "pre_reasoning",
            AgentEvent::ReasoningChunk { .. } => "reasoning_chunk",
            AgentEvent::PostReasoning { .. } => "post_reasoning",
            AgentEvent::PreActing { .. } => "pre_acting",
            AgentEvent::ActingChunk { .. } => "acting_chunk",
            AgentEvent::PostActing { .. } => "post_acting",
            AgentEvent::PostCall { .. } => "post_call",
            AgentEvent::Error { .. } => "error",
        }
    }
}
