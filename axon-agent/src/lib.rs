#![deny(missing_docs)]
//! # axon-agent — the streaming ReAct engine
//!
//! [`ReactAgent`] orchestrates memory, a model port, a toolkit, and a hook
//! pipeline through the reason → act → observe loop. Each call:
//!
//! 1. emits `PreCall` and appends the input to memory,
//! 2. loops: snapshot memory, advertise tool schemas, stream the model
//!    response through the hooks, dispatch any requested tool calls
//!    concurrently, append results in deterministic call-id order,
//! 3. finishes when the model stops calling tools, the iteration budget
//!    runs out, a schema-only tool suspends the call, or the call is
//!    interrupted.
//!
//! The call's event sequence is available both to registered hooks and as
//! a lazy stream ([`AgentRun::events`]) for external adapters. Events for
//! one call are totally ordered; the buffer between the model stream and
//! the engine is bounded and overflowing it aborts the call.

pub mod config;
pub mod engine;
pub mod error;

pub use config::AgentConfig;
pub use engine::{
    AgentReply, AgentRun, CallOptions, FinishReason, ReactAgent, ReactAgentBuilder,
    INTERRUPTED_REPLY,
};
pub use error::AgentError;
