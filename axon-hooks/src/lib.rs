#![deny(missing_docs)]
//! # axon-hooks — ordered interception of agent lifecycle events
//!
//! A [`Hook`] observes (and, for modifiable events, rewrites) the in-flight
//! computation of an agent call. Hooks register on a [`HookRegistry`] and
//! fire in ascending priority order; a modifiable event's final payload is
//! the output of the last hook that ran. Hooks share the engine's
//! cooperative scheduler and are bounded by a per-hook budget — a hook
//! that needs I/O must do it asynchronously.
//!
//! A raising hook never halts dispatch by itself: the failure is recorded,
//! the pipeline continues with the previous payload, and the engine emits
//! one `Error` event per failure. Only a modifiable dispatch whose final
//! failure no later hook recovered fails the phase.

pub mod event;

pub use event::{AgentEvent, ErrorKind, PendingToolCall, Phase};

use axon_core::ExecutionContext;
use async_trait::async_trait;
use std::mem::discriminant;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Default hook priority. Lower fires earlier.
pub const DEFAULT_HOOK_PRIORITY: i32 = 100;

/// Errors raised by hooks.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum HookError {
    /// The hook failed.
    #[error("hook failed: {0}")]
    Failed(String),

    /// The hook exceeded the configured budget.
    #[error("hook budget exceeded")]
    BudgetExceeded,

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// An ordered interceptor around lifecycle events.
///
/// For modifiable events, return the (possibly rewritten) event; returning
/// a different variant than the one received counts as a failure and the
/// previous payload is kept. For notification events the return value is
/// ignored — return the event unchanged.
#[async_trait]
pub trait Hook: Send + Sync {
    /// Identifies this hook in error events and logs.
    fn name(&self) -> &str;

    /// Dispatch priority. Lower fires earlier; ties keep registration
    /// order. Defaults to [`DEFAULT_HOOK_PRIORITY`].
    fn priority(&self) -> i32 {
        DEFAULT_HOOK_PRIORITY
    }

    /// Called for every event of a call.
    async fn on_event(
        &self,
        event: AgentEvent,
        ctx: &ExecutionContext,
    ) -> Result<AgentEvent, HookError>;
}

/// One hook failure observed during a dispatch.
#[derive(Debug, Clone)]
pub struct HookFailure {
    /// Name of the failing hook.
    pub hook: String,
    /// The failure message.
    pub message: String,
    /// Whether a later hook completed successfully after this failure.
    pub recovered: bool,
}

/// The result of dispatching one event through the pipeline.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// The final event payload (the last successful hook's output for
    /// modifiable events; the original for notifications).
    pub event: AgentEvent,
    /// Failures observed along the way, in firing order.
    pub failures: Vec<HookFailure>,
}

impl DispatchOutcome {
    /// Whether the dispatch ended in an unrecovered failure.
    pub fn failed(&self) -> bool {
        self.failures.last().is_some_and(|f| !f.recovered)
    }
}

/// An ordered pipeline of hooks.
pub struct HookRegistry {
    hooks: Vec<Arc<dyn Hook>>,
}

impl HookRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Add a hook, keeping the pipeline sorted by ascending priority.
    /// Hooks with equal priority keep their registration order.
    pub fn add(&mut self, hook: Arc<dyn Hook>) {
        self.hooks.push(hook);
        self.hooks.sort_by_key(|h| h.priority());
    }

    /// Number of registered hooks.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Dispatch one event through the pipeline.
    ///
    /// Each hook is bounded by `budget` when one is configured. A failing
    /// hook is recorded and dispatch continues with the previous payload;
    /// a hook that returns a different event variant than it received is
    /// treated the same way.
    pub async fn dispatch(
        &self,
        event: AgentEvent,
        ctx: &ExecutionContext,
        budget: Option<Duration>,
    ) -> DispatchOutcome {
        let modifiable = event.is_modifiable();
        let mut current = event;
        let mut failures: Vec<HookFailure> = Vec::new();

        for hook in &self.hooks {
            let attempt = hook.on_event(current.clone(), ctx);
            let result = match budget {
                Some(limit) => match tokio::time::timeout(limit, attempt).await {
                    Ok(result) => result,
                    Err(_) => Err(HookError::BudgetExceeded),
                },
                None => attempt.await,
            };

            match result {
                Ok(next) => {
                    if modifiable {
                        if discriminant(&next) == discriminant(&current) {
                            current = next;
                        } else {
                            tracing::warn!(
                                hook = hook.name(),
                                "hook returned a different event variant; keeping previous payload"
                            );
                            failures.push(HookFailure {
                                hook: hook.name().to_string(),
                                message: "hook returned a different event variant".into(),
                                recovered: false,
                            });
                            continue;
                        }
                    }
                    for failure in &mut failures {
                        failure.recovered = true;
                    }
                }
                Err(e) => {
                    tracing::warn!(hook = hook.name(), error = %e, "hook raised");
                    failures.push(HookFailure {
                        hook: hook.name().to_string(),
                        message: e.to_string(),
                        recovered: false,
                    });
                }
            }
        }

        DispatchOutcome {
            event: current,
            failures,
        }
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}
