//! Engine-level errors.

use axon_model::ModelError;
use thiserror::Error;

/// Errors that terminate an agent call.
///
/// Per-tool failures (bad arguments, tool errors, tool timeouts) never
/// appear here — they are recorded as error tool results and the loop
/// continues. Cancellation is not an error either: an interrupted call
/// completes with an interruption-marker reply.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AgentError {
    /// Malformed request or invalid configuration. The call fails before
    /// memory is touched.
    #[error("bad input: {0}")]
    BadInput(String),

    /// The model transport or protocol failed.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// A modifiable hook dispatch ended in an unrecovered failure.
    #[error("hook error: {0}")]
    Hook(String),

    /// The model emitted two tool calls with the same id in one turn.
    #[error("duplicate tool call id: {0}")]
    DuplicateCallId(String),

    /// The event buffer between the model stream and the engine
    /// overflowed.
    #[error("event buffer overflow")]
    Overflow,

    /// Catch-all. Include context.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
