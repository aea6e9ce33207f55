//! Engine configuration.

use axon_core::DurationMs;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for one [`crate::ReactAgent`].
///
/// Serializes with stable integer-millisecond durations, so a config can
/// live in a file or a state dict. Defaults: ten reasoning steps, a
/// 256-event stream buffer, no timeouts, no hook budget, no system
/// prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum reasoning steps per call. Must be positive.
    pub max_iters: u32,
    /// Whole-call budget. Elapsing behaves like cancellation of kind
    /// timeout.
    pub call_timeout: Option<DurationMs>,
    /// Per-tool-invocation budget, enforced by the toolkit.
    pub tool_timeout: Option<DurationMs>,
    /// Per-hook budget for each dispatch.
    pub hook_budget: Option<DurationMs>,
    /// Bound of the event buffer between the model stream and the engine.
    /// Must be positive. Exceeding it aborts the call with an overflow
    /// error.
    pub stream_buffer_size: usize,
    /// Base system prompt sent with every model request.
    pub system_prompt: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iters: 10,
            call_timeout: None,
            tool_timeout: None,
            hook_budget: None,
            stream_buffer_size: 256,
            system_prompt: None,
        }
    }
}

impl AgentConfig {
    /// Set the maximum number of reasoning steps.
    #[must_use]
    pub fn with_max_iters(mut self, max_iters: u32) -> Self {
        self.max_iters = max_iters;
        self
    }

    /// Set the whole-call timeout.
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout.into());
        self
    }

    /// Set the per-tool execution timeout.
    #[must_use]
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = Some(timeout.into());
        self
    }

    /// Set the per-hook budget.
    #[must_use]
    pub fn with_hook_budget(mut self, budget: Duration) -> Self {
        self.hook_budget = Some(budget.into());
        self
    }

    /// Set the event buffer bound.
    #[must_use]
    pub fn with_stream_buffer_size(mut self, size: usize) -> Self {
        self.stream_buffer_size = size;
        self
    }

    /// Set the base system prompt.
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Check the numeric bounds. The engine refuses to start a call with
    /// an invalid configuration.
    pub(crate) fn check(&self) -> Result<(), String> {
        if self.max_iters == 0 {
            return Err("max_iters must be positive".into());
        }
        if self.stream_buffer_size == 0 {
            return Err("stream_buffer_size must be positive".into());
        }
        Ok(())
    }
}
