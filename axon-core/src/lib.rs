#![deny(missing_docs)]
//! # axon-core — message model and state contracts for axon agents
//!
//! This crate defines the types and traits that cross every boundary in an
//! axon system:
//!
//! | Piece | Types | What it does |
//! |-------|-------|--------------|
//! | Messages | [`Message`], [`ContentBlock`], [`Role`] | Typed, immutable conversational content |
//! | State | [`StateModule`] | Save/load contract implemented by stateful components |
//! | Memory | [`Memory`] | Ordered append-only message log owned by one agent |
//! | Context | [`ExecutionContext`] | Per-call cancellation, deadline, tracing, scratch data |
//!
//! Everything here is deliberately backend-free: no model vendor, no storage
//! engine, no HTTP. Implementations live in the sibling crates.

pub mod content;
pub mod context;
pub mod duration;
pub mod error;
pub mod id;
pub mod memory;
pub mod message;
pub mod state;
pub mod trace;

// Re-exports for convenience
pub use content::{ContentBlock, MediaSource};
pub use context::{ExecutionContext, InterruptKind};
pub use duration::DurationMs;
pub use error::StateError;
pub use id::{AgentId, SessionId};
pub use memory::Memory;
pub use message::{Message, Role};
pub use state::StateModule;
pub use trace::{process_tracer, set_process_tracer, NoopTracer, Tracer};
