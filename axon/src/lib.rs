#![deny(missing_docs)]
//! # axon — umbrella crate
//!
//! Provides a single import surface for the axon agent framework.
//! Re-exports the component crates behind feature flags, plus a
//! `prelude` for the happy path.

pub use axon_core;
pub use axon_model;

#[cfg(feature = "agent")]
pub use axon_agent;
#[cfg(feature = "agent")]
pub use axon_hooks;
#[cfg(feature = "agent")]
pub use axon_memory;
#[cfg(feature = "agent")]
pub use axon_tool;

#[cfg(feature = "session")]
pub use axon_session;

#[cfg(feature = "server")]
pub use axon_server;

/// Happy-path imports for composing axon systems.
pub mod prelude {
    pub use axon_core::{
        AgentId, ContentBlock, DurationMs, ExecutionContext, InterruptKind, MediaSource, Memory,
        Message, Role, SessionId, StateModule,
    };

    pub use axon_model::{
        ChatModel, ChatRequest, ChatResponse, ChatResponseChunk, ChatStream, ChunkBlock,
        ModelError, StopReason, TokenUsage, ToolChoice, ToolSchema,
    };

    #[cfg(feature = "agent")]
    pub use axon_agent::{AgentConfig, AgentReply, AgentRun, FinishReason, ReactAgent};
    #[cfg(feature = "agent")]
    pub use axon_hooks::{AgentEvent, Hook, HookRegistry};
    #[cfg(feature = "agent")]
    pub use axon_memory::InMemoryMemory;
    #[cfg(feature = "agent")]
    pub use axon_tool::{ParamKind, ParamSpec, ToolEntry, Toolkit};

    #[cfg(feature = "session")]
    pub use axon_session::{FsSessionBackend, MemorySessionBackend, SessionManager};

    #[cfg(feature = "server")]
    pub use axon_server::{AgentDefinition, AppState};
}
