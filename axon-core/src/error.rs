//! Errors shared by the state and message layers.

use thiserror::Error;

/// Errors from state serialization and restoration.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StateError {
    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A state document contained a key the component does not own.
    /// Only raised when loading with `strict = true`.
    #[error("unknown key '{key}' for component '{component}'")]
    UnknownKey {
        /// The component that rejected the key.
        component: String,
        /// The offending key.
        key: String,
    },

    /// A message failed to decode (unknown role or content-block tag).
    #[error("bad message: {0}")]
    BadMessage(String),

    /// Catch-all. Include context.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
