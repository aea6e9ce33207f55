//! Per-call execution context: cancellation, deadline, tracing, scratch data.

use crate::trace::{process_tracer, Tracer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Why a call was interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterruptKind {
    /// Explicit cancellation by the caller.
    Cancelled,
    /// The whole-call deadline elapsed.
    Timeout,
}

/// Handle carried through a single agent call.
///
/// Cheap to clone — all fields are shared. The engine creates one per call
/// and threads it through hooks and tool invocations; everything that can
/// suspend checks the cancellation token, and hooks use the scratch map to
/// pass data between firing points.
#[derive(Clone)]
pub struct ExecutionContext {
    call_id: Arc<str>,
    token: CancellationToken,
    deadline: Option<Instant>,
    tracer: Arc<dyn Tracer>,
    interrupt: Arc<Mutex<Option<InterruptKind>>>,
    scratch: Arc<Mutex<HashMap<String, serde_json::Value>>>,
}

impl ExecutionContext {
    /// Create a context with a fresh cancellation token and the process
    /// tracer.
    pub fn new(call_id: impl Into<String>) -> Self {
        Self {
            call_id: Arc::from(call_id.into()),
            token: CancellationToken::new(),
            deadline: None,
            tracer: process_tracer(),
            interrupt: Arc::new(Mutex::new(None)),
            scratch: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Set an absolute deadline for the call.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Replace the tracer handle.
    #[must_use]
    pub fn with_tracer(mut self, tracer: Arc<dyn Tracer>) -> Self {
        self.tracer = tracer;
        self
    }

    /// Correlation id of the call this context belongs to.
    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    /// The cancellation token. Clone it into spawned work.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Interrupt the call. Idempotent: the first kind wins, repeated calls
    /// are no-ops.
    pub fn interrupt(&self, kind: InterruptKind) {
        {
            let mut slot = self.interrupt.lock().unwrap_or_else(|e| e.into_inner());
            if slot.is_none() {
                *slot = Some(kind);
            }
        }
        self.token.cancel();
    }

    /// Whether the call has been interrupted.
    pub fn is_interrupted(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The interrupt kind, if the call was interrupted.
    pub fn interrupt_kind(&self) -> Option<InterruptKind> {
        *self.interrupt.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The call deadline, if one was set.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time remaining until the deadline. `None` means no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// The tracer handle for this call.
    pub fn tracer(&self) -> &Arc<dyn Tracer> {
        &self.tracer
    }

    /// Record a trace event for this call.
    pub fn trace(&self, phase: &str, detail: serde_json::Value) {
        self.tracer.event(&self.call_id, phase, &detail);
    }

    /// Store a scratch value for later firing points.
    pub fn put_scratch(&self, key: impl Into<String>, value: serde_json::Value) {
        self.scratch
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.into(), value);
    }

    /// Read a scratch value by key.
    pub fn get_scratch(&self, key: &str) -> Option<serde_json::Value> {
        self.scratch
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("call_id", &self.call_id)
            .field("interrupted", &self.is_interrupted())
            .field("deadline", &self.deadline)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupt_is_idempotent_and_keeps_first_kind() {
        let ctx = ExecutionContext::new("call-1");
        assert!(!ctx.is_interrupted());
        assert_eq!(ctx.interrupt_kind(), None);

        ctx.interrupt(InterruptKind::Timeout);
        ctx.interrupt(InterruptKind::Cancelled);

        assert!(ctx.is_interrupted());
        assert_eq!(ctx.interrupt_kind(), Some(InterruptKind::Timeout));
    }

    #[test]
    fn clones_share_cancellation() {
        let ctx = ExecutionContext::new("call-2");
        let other = ctx.clone();
        other.interrupt(InterruptKind::Cancelled);
        assert!(ctx.is_interrupted());
    }

    #[test]
    fn scratch_passes_values_between_holders() {
        let ctx = ExecutionContext::new("call-3");
        let other = ctx.clone();
        ctx.put_scratch("seen", serde_json::json!(3));
        assert_eq!(other.get_scratch("seen"), Some(serde_json::json!(3)));
        assert_eq!(other.get_scratch("missing"), None);
    }

    #[test]
    fn remaining_counts_down_from_deadline() {
        let ctx = ExecutionContext::new("call-4")
            .with_deadline(Instant::now() + Duration::from_secs(60));
        let remaining = ctx.remaining().unwrap();
        assert!(remaining <= Duration::from_secs(60));
        assert!(remaining > Duration::from_secs(50));
    }
}
