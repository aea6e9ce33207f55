//! Tracing handle threaded through the execution context.
//!
//! Tracing is opt-in: the default is a no-op, and nothing in the engine
//! requires a process-wide collector. A process default can be installed
//! for ergonomics and is replaceable atomically at any time.

use std::sync::{Arc, OnceLock, RwLock};

/// Receives structured trace events for a call.
///
/// Implementations must be cheap to call; the engine invokes the tracer on
/// the hot path of every phase transition. Anything expensive belongs in a
/// buffer behind the implementation.
pub trait Tracer: Send + Sync {
    /// Record one event: the call it belongs to, the phase it happened in,
    /// and a JSON detail payload.
    fn event(&self, call_id: &str, phase: &str, detail: &serde_json::Value);
}

/// The default tracer: discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracer;

impl Tracer for NoopTracer {
    fn event(&self, _call_id: &str, _phase: &str, _detail: &serde_json::Value) {}
}

fn slot() -> &'static RwLock<Arc<dyn Tracer>> {
    static SLOT: OnceLock<RwLock<Arc<dyn Tracer>>> = OnceLock::new();
    SLOT.get_or_init(|| RwLock::new(Arc::new(NoopTracer)))
}

/// The current process-wide tracer. Defaults to [`NoopTracer`].
pub fn process_tracer() -> Arc<dyn Tracer> {
    slot().read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// Replace the process-wide tracer. Contexts created after this call pick
/// up the new tracer; existing contexts keep the handle they were built
/// with.
pub fn set_process_tracer(tracer: Arc<dyn Tracer>) {
    *slot().write().unwrap_or_else(|e| e.into_inner()) = tracer;
}
