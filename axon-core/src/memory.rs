//! The Memory contract — an ordered message log scoped to one agent.

use crate::message::Message;
use crate::state::StateModule;
use async_trait::async_trait;

/// Ordered, append-only log of messages.
///
/// One memory belongs to one agent instance. The engine only ever appends;
/// external callers may clear or replace wholesale through the
/// [`StateModule`] side of the contract. Iteration order equals insertion
/// order, and insertion order is the conversational order the model sees.
///
/// Implementations must make `append` atomic with respect to `snapshot`:
/// a snapshot never observes a half-written message.
#[async_trait]
pub trait Memory: StateModule {
    /// Append one message to the end of the log.
    async fn append(&self, message: Message);

    /// Append several messages, preserving their order, as one atomic unit.
    async fn append_all(&self, messages: Vec<Message>);

    /// A consistent point-in-time copy of the log, in insertion order.
    async fn snapshot(&self) -> Vec<Message>;

    /// Remove every message.
    async fn clear(&self);

    /// Number of messages currently stored.
    async fn size(&self) -> usize;
}
