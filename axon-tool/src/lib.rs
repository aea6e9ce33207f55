#![deny(missing_docs)]
//! # axon-tool — tool registry and invocation for axon agents
//!
//! The [`Toolkit`] registers callables under explicit logical names,
//! derives and caches a JSON-Schema descriptor per tool at registration
//! time, and executes calls as a finite stream of [`ToolChunk`]s ending in
//! exactly one terminal outcome. Arguments are validated against the
//! descriptor before any user code runs; unknown names, validation
//! failures, timeouts and cancellation all surface as terminal error
//! chunks rather than panics or hung futures.
//!
//! Tools registered by descriptor only (no body) yield a `Suspended`
//! outcome when called — the signal that an external executor must satisfy
//! the call.

pub mod schema;
pub mod toolkit;

pub use schema::{object_schema, validate, ParamKind, ParamSpec};
pub use toolkit::{
    StreamingToolHandler, ToolCallOutcome, ToolCallStatus, ToolChunk, ToolDescriptor, ToolEntry,
    ToolError, ToolHandler, ToolStream, Toolkit,
};
