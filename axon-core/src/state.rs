//! The StateModule contract — how a component becomes save/loadable.

use crate::error::StateError;
use async_trait::async_trait;

/// A component whose state can be captured and restored.
///
/// Implementors declare a component name (the key they appear under in an
/// aggregated session document) and serialize the attributes they own into
/// a JSON-shaped mapping. The session layer aggregates one `state_dict`
/// per component into a single document and writes it atomically.
///
/// Implementations:
/// - `InMemoryMemory` (the conversation log)
/// - agents that carry their own durable attributes
///
/// Restoration uses interior mutability (`&self`) so modules can be shared
/// as `Arc<dyn StateModule>` between an engine and a session manager.
#[async_trait]
pub trait StateModule: Send + Sync {
    /// The name this component's state appears under in a session document.
    fn component_name(&self) -> &str;

    /// Capture this component's state as a JSON object mapping attribute
    /// names to values.
    async fn state_dict(&self) -> Result<serde_json::Value, StateError>;

    /// Restore state from a previously captured dict.
    ///
    /// When `strict` is true, keys the component does not recognize cause
    /// [`StateError::UnknownKey`] and nothing is mutated. When false,
    /// unknown keys are ignored.
    async fn load_state_dict(&self, state: serde_json::Value, strict: bool)
        -> Result<(), StateError>;
}
