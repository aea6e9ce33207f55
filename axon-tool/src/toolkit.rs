//! The tool registry and its invocation entry point.

use crate::schema::{object_schema, validate, ParamSpec};
use axon_core::{ContentBlock, ExecutionContext};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use thiserror::Error;
use tokio_stream::wrappers::ReceiverStream;

/// Errors raised by tool handlers.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool is not registered.
    #[error("tool not found: {0}")]
    NotFound(String),

    /// The input did not match the tool's parameter schema.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The tool ran and failed.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// Execution was cancelled.
    #[error("cancelled")]
    Cancelled,

    /// Execution exceeded the configured timeout.
    #[error("timeout")]
    Timeout,

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// How an invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    /// Completed normally.
    Ok,
    /// The tool failed (including invalid input and unknown names).
    Error,
    /// The invocation exceeded its time budget.
    Timeout,
    /// The invocation was cancelled.
    Cancelled,
    /// The tool has no in-process body; an external executor must
    /// satisfy the call.
    Suspended,
}

/// Terminal outcome of one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallOutcome {
    /// Output blocks produced by the tool.
    pub content: Vec<ContentBlock>,
    /// How the invocation ended.
    pub status: ToolCallStatus,
}

impl ToolCallOutcome {
    /// A successful outcome with the given output.
    pub fn ok(content: Vec<ContentBlock>) -> Self {
        Self {
            content,
            status: ToolCallStatus::Ok,
        }
    }

    /// A failing outcome carrying a diagnostic message.
    pub fn error(status: ToolCallStatus, message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(message)],
            status,
        }
    }

    /// Whether this outcome should be recorded as an error result.
    pub fn is_error(&self) -> bool {
        matches!(
            self.status,
            ToolCallStatus::Error | ToolCallStatus::Timeout | ToolCallStatus::Cancelled
        )
    }
}

/// One item of an invocation stream: either a partial output block from a
/// streaming tool, or the terminal outcome. Every invocation stream yields
/// exactly one `Done`, always last.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolChunk {
    /// A partial output block.
    Fragment(ContentBlock),
    /// The terminal outcome.
    Done(ToolCallOutcome),
}

/// A finite, lazy sequence of invocation chunks.
pub type ToolStream = Pin<Box<dyn Stream<Item = ToolChunk> + Send>>;

type UnaryFuture = Pin<Box<dyn Future<Output = Result<Vec<ContentBlock>, ToolError>> + Send>>;

/// Object-safe handler for unary tools: one input, one output.
pub trait ToolHandler: Send + Sync {
    /// Execute the tool.
    fn call(&self, input: serde_json::Value, ctx: ExecutionContext) -> UnaryFuture;
}

impl<F, Fut> ToolHandler for F
where
    F: Fn(serde_json::Value, ExecutionContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<ContentBlock>, ToolError>> + Send + 'static,
{
    fn call(&self, input: serde_json::Value, ctx: ExecutionContext) -> UnaryFuture {
        Box::pin(self(input, ctx))
    }
}

/// Object-safe handler for streaming tools. The returned stream should end
/// with a `Done` chunk; if it ends without one, the toolkit synthesizes an
/// empty successful outcome.
pub trait StreamingToolHandler: Send + Sync {
    /// Execute the tool, yielding chunks as they become available.
    fn call(&self, input: serde_json::Value, ctx: ExecutionContext) -> ToolStream;
}

impl<F> StreamingToolHandler for F
where
    F: Fn(serde_json::Value, ExecutionContext) -> ToolStream + Send + Sync,
{
    fn call(&self, input: serde_json::Value, ctx: ExecutionContext) -> ToolStream {
        self(input, ctx)
    }
}

/// Cached descriptor of a registered tool. Identity is by `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique logical name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Derived JSON Schema for the parameters.
    pub parameters: serde_json::Value,
    /// Whether the model must adhere strictly to the schema.
    pub strict: bool,
}

enum ToolBody {
    Unary(Arc<dyn ToolHandler>),
    Streaming(Arc<dyn StreamingToolHandler>),
    SchemaOnly,
}

/// A registered tool: descriptor plus (optionally) a body.
pub struct ToolEntry {
    descriptor: ToolDescriptor,
    params: Option<Vec<ParamSpec>>,
    body: ToolBody,
}

impl ToolEntry {
    fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        params: Vec<ParamSpec>,
        body: ToolBody,
    ) -> Self {
        let parameters = object_schema(&params);
        Self {
            descriptor: ToolDescriptor {
                name: name.into(),
                description: description.into(),
                parameters,
                strict: false,
            },
            params: Some(params),
            body,
        }
    }

    /// A unary tool backed by an async function or closure.
    pub fn unary<H>(
        name: impl Into<String>,
        description: impl Into<String>,
        params: Vec<ParamSpec>,
        handler: H,
    ) -> Self
    where
        H: ToolHandler + 'static,
    {
        Self::new(name, description, params, ToolBody::Unary(Arc::new(handler)))
    }

    /// A streaming tool backed by a handler yielding chunks.
    pub fn streaming<H>(
        name: impl Into<String>,
        description: impl Into<String>,
        params: Vec<ParamSpec>,
        handler: H,
    ) -> Self
    where
        H: StreamingToolHandler + 'static,
    {
        Self::new(
            name,
            description,
            params,
            ToolBody::Streaming(Arc::new(handler)),
        )
    }

    /// A schema-only tool: advertised to the model, satisfied externally.
    pub fn schema_only(
        name: impl Into<String>,
        description: impl Into<String>,
        params: Vec<ParamSpec>,
    ) -> Self {
        Self::new(name, description, params, ToolBody::SchemaOnly)
    }

    /// A schema-only tool registered from a raw JSON Schema (e.g. one that
    /// arrived over HTTP). No argument validation is performed — the
    /// external executor owns it.
    pub fn schema_only_raw(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
        strict: bool,
    ) -> Self {
        Self {
            descriptor: ToolDescriptor {
                name: name.into(),
                description: description.into(),
                parameters,
                strict,
            },
            params: None,
            body: ToolBody::SchemaOnly,
        }
    }

    /// Mark the descriptor strict.
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.descriptor.strict = true;
        self
    }

    /// The cached descriptor.
    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    /// Whether this tool has no in-process body.
    pub fn is_schema_only(&self) -> bool {
        matches!(self.body, ToolBody::SchemaOnly)
    }
}

/// Registry of tools shared by reference across engines.
///
/// The descriptor map is replaced copy-on-write on every mutation, so
/// lookups take a snapshot without holding a lock across the call.
pub struct Toolkit {
    entries: RwLock<Arc<HashMap<String, Arc<ToolEntry>>>>,
}

impl Toolkit {
    /// An empty toolkit.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Arc::new(HashMap::new())),
        }
    }

    fn snapshot(&self) -> Arc<HashMap<String, Arc<ToolEntry>>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Register a tool. Registering a name that already exists replaces the
    /// prior entry and logs a warning.
    pub fn register(&self, entry: ToolEntry) {
        let name = entry.descriptor.name.clone();
        let mut guard = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let mut map: HashMap<_, _> = (**guard).clone();
        if map.insert(name.clone(), Arc::new(entry)).is_some() {
            tracing::warn!(tool = %name, "replacing existing tool registration");
        } else {
            tracing::debug!(tool = %name, "registered tool");
        }
        *guard = Arc::new(map);
    }

    /// Remove a tool by name. Returns whether it was present.
    pub fn remove(&self, name: &str) -> bool {
        let mut guard = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let mut map: HashMap<_, _> = (**guard).clone();
        let removed = map.remove(name).is_some();
        if removed {
            *guard = Arc::new(map);
        }
        removed
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<ToolEntry>> {
        self.snapshot().get(name).cloned()
    }

    /// Whether a tool with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.snapshot().contains_key(name)
    }

    /// Descriptors of all registered tools, sorted by name.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        let snapshot = self.snapshot();
        let mut all: Vec<ToolDescriptor> = snapshot
            .values()
            .map(|e| e.descriptor.clone())
            .collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Whether the toolkit is empty.
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Invoke a tool.
    ///
    /// Returns a finite stream ending with exactly one [`ToolChunk::Done`].
    /// Argument validation runs before dispatch; on failure the stream is a
    /// single terminal error chunk and no user code executes. The optional
    /// `timeout` bounds the whole invocation; the context's cancellation
    /// token is honored at every suspension point.
    pub fn invoke(
        &self,
        call_id: &str,
        name: &str,
        input: serde_json::Value,
        ctx: ExecutionContext,
        timeout: Option<Duration>,
    ) -> ToolStream {
        tracing::debug!(call_id, tool = name, "invoking tool");
        let entry = match self.get(name) {
            Some(entry) => entry,
            None => {
                return done_stream(ToolCallOutcome::error(
                    ToolCallStatus::Error,
                    format!("tool not found: {name}"),
                ));
            }
        };

        if let Some(params) = &entry.params {
            if let Err(e) = validate(params, &input) {
                return done_stream(ToolCallOutcome::error(ToolCallStatus::Error, e));
            }
        }

        match &entry.body {
            ToolBody::SchemaOnly => done_stream(ToolCallOutcome {
                content: vec![],
                status: ToolCallStatus::Suspended,
            }),
            ToolBody::Unary(handler) => {
                let fut = handler.call(input, ctx.clone());
                let token = ctx.token();
                Box::pin(futures::stream::once(async move {
                    let outcome = run_unary(fut, token, timeout).await;
                    ToolChunk::Done(outcome)
                }))
            }
            ToolBody::Streaming(handler) => {
                let inner = handler.call(input, ctx.clone());
                drive_streaming(inner, ctx, timeout)
            }
        }
    }
}

impl Default for Toolkit {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Toolkit {
    /// A shallow copy sharing the registered entries. Later registrations
    /// on either copy do not affect the other.
    fn clone(&self) -> Self {
        Self {
            entries: RwLock::new(self.snapshot()),
        }
    }
}

fn done_stream(outcome: ToolCallOutcome) -> ToolStream {
    Box::pin(futures::stream::once(async move {
        ToolChunk::Done(outcome)
    }))
}

async fn run_unary(
    fut: UnaryFuture,
    token: tokio_util::sync::CancellationToken,
    timeout: Option<Duration>,
) -> ToolCallOutcome {
    let work = async move {
        match timeout {
            Some(budget) => match tokio::time::timeout(budget, fut).await {
                Ok(result) => result,
                Err(_) => Err(ToolError::Timeout),
            },
            None => fut.await,
        }
    };
    tokio::select! {
        _ = token.cancelled() => {
            ToolCallOutcome::error(ToolCallStatus::Cancelled, "tool execution cancelled")
        }
        result = work => match result {
            Ok(content) => ToolCallOutcome::ok(content),
            Err(ToolError::Timeout) => {
                ToolCallOutcome::error(ToolCallStatus::Timeout, "tool execution timed out")
            }
            Err(ToolError::Cancelled) => {
                ToolCallOutcome::error(ToolCallStatus::Cancelled, "tool execution cancelled")
            }
            Err(e) => ToolCallOutcome::error(ToolCallStatus::Error, e.to_string()),
        },
    }
}

fn drive_streaming(
    mut inner: ToolStream,
    ctx: ExecutionContext,
    timeout: Option<Duration>,
) -> ToolStream {
    let (tx, rx) = tokio::sync::mpsc::channel::<ToolChunk>(16);
    let token = ctx.token();
    tokio::spawn(async move {
        // The deadline bounds the whole invocation, not individual chunks.
        let deadline = tokio::time::Instant::now()
            + timeout.unwrap_or_else(|| Duration::from_secs(60 * 60 * 24 * 365));
        let timed = timeout.is_some();
        loop {
            let item = tokio::select! {
                _ = token.cancelled() => {
                    let _ = tx
                        .send(ToolChunk::Done(ToolCallOutcome::error(
                            ToolCallStatus::Cancelled,
                            "tool execution cancelled",
                        )))
                        .await;
                    return;
                }
                _ = tokio::time::sleep_until(deadline), if timed => {
                    let _ = tx
                        .send(ToolChunk::Done(ToolCallOutcome::error(
                            ToolCallStatus::Timeout,
                            "tool execution timed out",
                        )))
                        .await;
                    return;
                }
                item = inner.next() => item,
            };
            match item {
                Some(ToolChunk::Done(outcome)) => {
                    let _ = tx.send(ToolChunk::Done(outcome)).await;
                    return;
                }
                Some(chunk) => {
                    if tx.send(chunk).await.is_err() {
                        return;
                    }
                }
                None => {
                    // Stream ended without a terminal marker.
                    let _ = tx.send(ToolChunk::Done(ToolCallOutcome::ok(vec![]))).await;
                    return;
                }
            }
        }
    });
    Box::pin(ReceiverStream::new(rx))
}
