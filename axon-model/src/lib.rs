#![deny(missing_docs)]
//! # axon-model — the chat model port
//!
//! Defines [`ChatModel`], the abstract interface the engine uses to obtain
//! a streaming chat response from a prompt and an optional tool list, plus
//! the fragment types a stream is made of and the [`ResponseAggregator`]
//! that merges fragments into a final response.
//!
//! The port is pure from the engine's point of view: it reads its inputs,
//! emits fragments, and never touches memory. Concrete backends (HTTP
//! clients for specific vendors) implement this trait outside the core.

pub mod aggregate;
pub mod port;
pub mod types;

pub use aggregate::{AggregateOutcome, BadToolCall, ResponseAggregator};
pub use port::{ChatModel, ChatStream, ModelError};
pub use types::{
    ChatRequest, ChatResponse, ChatResponseChunk, ChunkBlock, StopReason, TokenUsage, ToolChoice,
    ToolSchema,
};
