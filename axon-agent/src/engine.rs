//! The ReAct engine: reason → act → observe, streamed.

use crate::config::AgentConfig;
use crate::error::AgentError;
use async_trait::async_trait;
use axon_core::{
    AgentId, ContentBlock, ExecutionContext, InterruptKind, Memory, Message, Role, StateError,
    StateModule,
};
use axon_hooks::{AgentEvent, ErrorKind, HookRegistry, PendingToolCall, Phase};
use axon_model::{
    AggregateOutcome, ChatModel, ChatRequest, ChatStream, ModelError, ResponseAggregator,
    StopReason, TokenUsage, ToolSchema,
};
use axon_memory::InMemoryMemory;
use axon_tool::{ToolCallOutcome, ToolCallStatus, ToolChunk, ToolDescriptor, Toolkit};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

/// The reply text of a call that was interrupted before completion.
pub const INTERRUPTED_REPLY: &str = "[interrupted] the call was cancelled before completion";

/// Per-call overrides threaded into every model request of the call.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Model identifier forwarded to the port (`None` = backend default).
    pub model: Option<String>,
    /// Tool selection strategy forwarded to the port.
    pub tool_choice: Option<axon_model::ToolChoice>,
}

/// Why a call finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// The model produced a final response.
    Complete,
    /// The iteration budget was reached.
    MaxIters,
    /// A schema-only tool was requested; an external executor must
    /// complete the call.
    Suspended,
    /// The call was cancelled or timed out.
    Interrupted,
}

/// The terminal result of one call.
#[derive(Debug, Clone)]
pub struct AgentReply {
    /// The terminal assistant message.
    pub message: Message,
    /// Why the call finished.
    pub finish: FinishReason,
    /// Token usage accumulated across all steps.
    pub usage: TokenUsage,
    /// Number of reasoning steps used.
    pub steps: u32,
}

/// A running call: its event stream, cancellation handle, and outcome.
pub struct AgentRun {
    /// Per-call context; `context.interrupt(..)` cancels the call.
    pub context: ExecutionContext,
    /// Lazy event sequence mirroring the hook events. Ends after
    /// `PostCall`.
    pub events: ReceiverStream<AgentEvent>,
    /// Resolves to the terminal reply once the call finishes.
    pub outcome: JoinHandle<Result<AgentReply, AgentError>>,
}

/// Events plus hook dispatch for one call.
#[derive(Clone)]
struct EventSink {
    tx: mpsc::Sender<AgentEvent>,
    hooks: Arc<HookRegistry>,
    ctx: ExecutionContext,
    budget: Option<Duration>,
}

impl EventSink {
    async fn forward(&self, event: AgentEvent) {
        // A dropped subscriber is ignored; a slow one applies backpressure.
        let _ = self.tx.send(event).await;
    }

    /// Notification events: hooks observe, failures become `Error`
    /// events, the payload is forwarded unchanged.
    async fn notify(&self, event: AgentEvent) {
        let outcome = self.hooks.dispatch(event, &self.ctx, self.budget).await;
        self.forward(outcome.event).await;
        for failure in &outcome.failures {
            self.error(
                Phase::Hook,
                ErrorKind::Hook,
                format!("{}: {}", failure.hook, failure.message),
            )
            .await;
        }
    }

    /// Emit one `Error` event. Hook failures while delivering it are
    /// logged by the registry, not re-reported.
    async fn error(&self, phase: Phase, kind: ErrorKind, message: String) {
        tracing::warn!(call_id = self.ctx.call_id(), ?phase, ?kind, %message, "call error");
        self.ctx
            .trace("error", serde_json::json!({"kind": format!("{kind:?}"), "message": message}));
        let event = AgentEvent::Error {
            phase,
            kind,
            message,
        };
        let outcome = self.hooks.dispatch(event, &self.ctx, self.budget).await;
        self.forward(outcome.event).await;
    }

    /// Modifiable events: the last hook's output wins. An unrecovered
    /// failure fails the phase.
    async fn modify(&self, event: AgentEvent) -> Result<AgentEvent, AgentError> {
        let outcome = self.hooks.dispatch(event, &self.ctx, self.budget).await;
        for failure in &outcome.failures {
            self.error(
                Phase::Hook,
                ErrorKind::Hook,
                format!("{}: {}", failure.hook, failure.message),
            )
            .await;
        }
        if outcome.failed() {
            let message = outcome
                .failures
                .last()
                .map(|f| f.message.clone())
                .unwrap_or_default();
            return Err(AgentError::Hook(message));
        }
        self.forward(outcome.event.clone()).await;
        Ok(outcome.event)
    }
}

enum ReasoningEnd {
    Done(AggregateOutcome),
    Interrupted,
    Overflow,
    Failed(ModelError),
}

/// The ReAct agent: runs the reason/act loop over one memory, one model,
/// one toolkit, and one hook list.
///
/// Calls on the same agent are serialized — a new call does not start
/// until the previous one has emitted `PostCall`. Messages appended to
/// memory survive across calls, which is what makes a session resumable.
pub struct ReactAgent {
    name: AgentId,
    model: Arc<dyn ChatModel>,
    toolkit: Arc<Toolkit>,
    memory: Arc<dyn Memory>,
    hooks: Arc<HookRegistry>,
    config: AgentConfig,
    gate: tokio::sync::Mutex<()>,
}

/// Builder for [`ReactAgent`]. Only the model is required.
pub struct ReactAgentBuilder {
    name: AgentId,
    model: Arc<dyn ChatModel>,
    toolkit: Option<Arc<Toolkit>>,
    memory: Option<Arc<dyn Memory>>,
    hooks: HookRegistry,
    config: AgentConfig,
}

impl ReactAgentBuilder {
    /// Set the agent id (also the sender name on its messages and its
    /// component name in session documents).
    #[must_use]
    pub fn name(mut self, name: impl Into<AgentId>) -> Self {
        self.name = name.into();
        self
    }

    /// Share a toolkit with this agent.
    #[must_use]
    pub fn toolkit(mut self, toolkit: Arc<Toolkit>) -> Self {
        self.toolkit = Some(toolkit);
        self
    }

    /// Bind a memory. Defaults to a fresh [`InMemoryMemory`].
    #[must_use]
    pub fn memory(mut self, memory: Arc<dyn Memory>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Add a hook to the pipeline.
    #[must_use]
    pub fn hook(mut self, hook: Arc<dyn axon_hooks::Hook>) -> Self {
        self.hooks.add(hook);
        self
    }

    /// Set the engine configuration.
    #[must_use]
    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the agent.
    pub fn build(self) -> ReactAgent {
        ReactAgent {
            name: self.name,
            model: self.model,
            toolkit: self.toolkit.unwrap_or_else(|| Arc::new(Toolkit::new())),
            memory: self
                .memory
                .unwrap_or_else(|| Arc::new(InMemoryMemory::new())),
            hooks: Arc::new(self.hooks),
            config: self.config,
            gate: tokio::sync::Mutex::new(()),
        }
    }
}

impl ReactAgent {
    /// Start building an agent around a model port.
    pub fn builder(model: Arc<dyn ChatModel>) -> ReactAgentBuilder {
        ReactAgentBuilder {
            name: AgentId::new("agent"),
            model,
            toolkit: None,
            memory: None,
            hooks: HookRegistry::new(),
            config: AgentConfig::default(),
        }
    }

    /// The agent's id.
    pub fn name(&self) -> &AgentId {
        &self.name
    }

    /// The agent's memory.
    pub fn memory(&self) -> &Arc<dyn Memory> {
        &self.memory
    }

    /// The agent's toolkit.
    pub fn toolkit(&self) -> &Arc<Toolkit> {
        &self.toolkit
    }

    /// The engine configuration.
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Start a call, returning its event stream and outcome handle.
    pub fn start(self: &Arc<Self>, input: Vec<Message>) -> AgentRun {
        self.start_with(input, CallOptions::default())
    }

    /// Start a call with per-call overrides.
    pub fn start_with(self: &Arc<Self>, input: Vec<Message>, options: CallOptions) -> AgentRun {
        let mut ctx = ExecutionContext::new(uuid::Uuid::new_v4().to_string());
        if let Some(timeout) = self.config.call_timeout {
            ctx = ctx.with_deadline(Instant::now() + timeout.to_std());
        }
        let (tx, rx) = mpsc::channel(self.config.stream_buffer_size.max(1));
        let agent = Arc::clone(self);
        let run_ctx = ctx.clone();
        let outcome = tokio::spawn(async move {
            // Serialize calls on this agent.
            let _gate = agent.gate.lock().await;
            let watchdog = agent.config.call_timeout.map(|timeout| {
                let ctx = run_ctx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(timeout.to_std()).await;
                    ctx.interrupt(InterruptKind::Timeout);
                })
            });
            let sink = EventSink {
                tx,
                hooks: agent.hooks.clone(),
                ctx: run_ctx.clone(),
                budget: agent.config.hook_budget.map(|b| b.to_std()),
            };
            let result = agent.run_call(input, options, &run_ctx, &sink).await;
            if let Some(watchdog) = watchdog {
                watchdog.abort();
            }
            result
        });
        AgentRun {
            context: ctx,
            events: ReceiverStream::new(rx),
            outcome,
        }
    }

    /// Run a call to completion, draining the event stream internally.
    pub async fn call(self: &Arc<Self>, input: Vec<Message>) -> Result<AgentReply, AgentError> {
        self.call_with(input, CallOptions::default()).await
    }

    /// Run a call to completion with per-call overrides.
    pub async fn call_with(
        self: &Arc<Self>,
        input: Vec<Message>,
        options: CallOptions,
    ) -> Result<AgentReply, AgentError> {
        let AgentRun {
            mut events,
            outcome,
            ..
        } = self.start_with(input, options);
        while events.next().await.is_some() {}
        match outcome.await {
            Ok(result) => result,
            Err(e) => Err(AgentError::Other(Box::new(e))),
        }
    }

    async fn run_call(
        &self,
        input: Vec<Message>,
        options: CallOptions,
        ctx: &ExecutionContext,
        sink: &EventSink,
    ) -> Result<AgentReply, AgentError> {
        if let Err(message) = self.config.check() {
            return Err(AgentError::BadInput(message));
        }
        ctx.trace("pre_call", serde_json::json!({"agent": self.name}));
        sink.notify(AgentEvent::PreCall {
            input: input.clone(),
        })
        .await;
        self.memory.append_all(input).await;

        let mut usage = TokenUsage::default();
        let mut steps: u32 = 0;
        let mut seen_call_ids: HashSet<String> = HashSet::new();

        loop {
            steps += 1;
            if ctx.is_interrupted() {
                return self.interrupted(sink, Phase::Reasoning, usage, steps).await;
            }

            // -- Reasoning --
            let messages: Vec<Message> = self
                .memory
                .snapshot()
                .await
                .into_iter()
                .filter(|m| m.role != Role::Control)
                .collect();
            let tools: Vec<ToolSchema> = self
                .toolkit
                .descriptors()
                .into_iter()
                .map(descriptor_to_schema)
                .collect();
            let event = match sink
                .modify(AgentEvent::PreReasoning { messages, tools })
                .await
            {
                Ok(event) => event,
                Err(e) => return Err(self.abort(sink, e).await),
            };
            let AgentEvent::PreReasoning { messages, tools } = event else {
                return Err(self
                    .abort(sink, AgentError::Hook("event variant changed".into()))
                    .await);
            };

            let request = ChatRequest {
                model: options.model.clone(),
                messages,
                tools,
                system: self.config.system_prompt.clone(),
                tool_choice: options.tool_choice.clone(),
                extra: None,
            };
            let stream = match self.model.stream(request).await {
                Ok(stream) => stream,
                Err(e) => {
                    sink.error(Phase::Reasoning, ErrorKind::Model, e.to_string())
                        .await;
                    return Err(self.abort(sink, AgentError::Model(e)).await);
                }
            };

            let outcome = match self.consume_reasoning(stream, ctx, sink).await {
                ReasoningEnd::Done(outcome) => outcome,
                ReasoningEnd::Interrupted => {
                    return self.interrupted(sink, Phase::Reasoning, usage, steps).await;
                }
                ReasoningEnd::Overflow => {
                    sink.error(
                        Phase::Reasoning,
                        ErrorKind::Overflow,
                        format!(
                            "event buffer exceeded {} fragments",
                            self.config.stream_buffer_size
                        ),
                    )
                    .await;
                    return Err(self.abort(sink, AgentError::Overflow).await);
                }
                ReasoningEnd::Failed(e) => {
                    sink.error(Phase::Reasoning, ErrorKind::Model, e.to_string())
                        .await;
                    return Err(self.abort(sink, AgentError::Model(e)).await);
                }
            };
            usage.accumulate(&outcome.response.usage);

            match outcome.response.stop_reason {
                Some(StopReason::MaxTokens) => {
                    let e = ModelError::Backend("output truncated (max_tokens)".into());
                    sink.error(Phase::Reasoning, ErrorKind::Model, e.to_string())
                        .await;
                    return Err(self.abort(sink, AgentError::Model(e)).await);
                }
                Some(StopReason::ContentFilter) => {
                    let e = ModelError::Backend("content filtered".into());
                    sink.error(Phase::Reasoning, ErrorKind::Model, e.to_string())
                        .await;
                    return Err(self.abort(sink, AgentError::Model(e)).await);
                }
                _ => {}
            }

            // Candidate assistant message: merged content plus one ToolUse
            // block per unparseable call.
            let bad_ids: HashSet<&str> =
                outcome.bad_calls.iter().map(|b| b.id.as_str()).collect();
            let mut blocks = outcome.response.content.clone();
            for bad in &outcome.bad_calls {
                blocks.push(ContentBlock::ToolUse {
                    id: bad.id.clone(),
                    name: bad.name.clone(),
                    input: serde_json::Value::String(bad.raw.clone()),
                });
            }
            let candidate = Message::new(Role::Assistant, blocks).with_name(self.name.as_str());

            for (id, _, _) in candidate.tool_uses() {
                if !seen_call_ids.insert(id.to_string()) {
                    sink.error(
                        Phase::Reasoning,
                        ErrorKind::BadInput,
                        format!("duplicate tool call id: {id}"),
                    )
                    .await;
                    return Err(self
                        .abort(sink, AgentError::DuplicateCallId(id.to_string()))
                        .await);
                }
            }

            let event = match sink.modify(AgentEvent::PostReasoning { candidate }).await {
                Ok(event) => event,
                Err(e) => return Err(self.abort(sink, e).await),
            };
            let AgentEvent::PostReasoning { candidate } = event else {
                return Err(self
                    .abort(sink, AgentError::Hook("event variant changed".into()))
                    .await);
            };

            let pending: Vec<PendingToolCall> = candidate
                .tool_uses()
                .into_iter()
                .filter(|(id, _, _)| !bad_ids.contains(id))
                .map(|(id, name, input)| PendingToolCall {
                    id: id.to_string(),
                    name: name.to_string(),
                    input: input.clone(),
                })
                .collect();

            if pending.is_empty() && outcome.bad_calls.is_empty() {
                return self
                    .finish(sink, candidate, FinishReason::Complete, usage, steps, true)
                    .await;
            }

            self.memory.append(candidate.clone()).await;

            // -- Acting --
            let mut results: Vec<Message> = Vec::new();
            for bad in &outcome.bad_calls {
                sink.error(
                    Phase::Reasoning,
                    ErrorKind::BadToolArguments,
                    format!("tool call {}: {}", bad.id, bad.error),
                )
                .await;
                results.push(Message::tool(
                    bad.id.as_str(),
                    vec![ContentBlock::text(format!(
                        "invalid tool arguments: {}",
                        bad.error
                    ))],
                    true,
                ));
            }

            let acted = !pending.is_empty();
            let mut suspended = false;
            if acted {
                let event = match sink.modify(AgentEvent::PreActing { calls: pending }).await {
                    Ok(event) => event,
                    Err(e) => return Err(self.abort(sink, e).await),
                };
                let AgentEvent::PreActing { calls } = event else {
                    return Err(self
                        .abort(sink, AgentError::Hook("event variant changed".into()))
                        .await);
                };

                let mut step_ids = HashSet::new();
                for call in &calls {
                    if !step_ids.insert(call.id.clone()) {
                        sink.error(
                            Phase::Acting,
                            ErrorKind::BadInput,
                            format!("duplicate tool call id: {}", call.id),
                        )
                        .await;
                        return Err(self
                            .abort(sink, AgentError::DuplicateCallId(call.id.clone()))
                            .await);
                    }
                }

                if ctx.is_interrupted() {
                    return self.interrupted(sink, Phase::Acting, usage, steps).await;
                }

                // Tool calls within one step run concurrently and join
                // before PostActing.
                let invocations: Vec<_> = calls
                    .into_iter()
                    .map(|call| {
                        let stream = self.toolkit.invoke(
                            &call.id,
                            &call.name,
                            call.input.clone(),
                            ctx.clone(),
                            self.config.tool_timeout.map(|t| t.to_std()),
                        );
                        let sink = sink.clone();
                        async move {
                            let started = Instant::now();
                            let mut stream = stream;
                            let mut terminal = None;
                            while let Some(chunk) = stream.next().await {
                                match chunk {
                                    ToolChunk::Fragment(block) => {
                                        sink.notify(AgentEvent::ActingChunk {
                                            call_id: call.id.clone(),
                                            block,
                                        })
                                        .await;
                                    }
                                    ToolChunk::Done(outcome) => {
                                        terminal = Some(outcome);
                                        break;
                                    }
                                }
                            }
                            let outcome =
                                terminal.unwrap_or_else(|| ToolCallOutcome::ok(vec![]));
                            (call.id, call.name, outcome, started.elapsed())
                        }
                    })
                    .collect();
                let completed = futures::future::join_all(invocations).await;

                if ctx.is_interrupted() {
                    return self.interrupted(sink, Phase::Acting, usage, steps).await;
                }

                for (id, name, outcome, elapsed) in completed {
                    match outcome.status {
                        ToolCallStatus::Error => {
                            sink.error(
                                Phase::Acting,
                                ErrorKind::Tool,
                                format!(
                                    "tool {name} ({id}) failed: {}",
                                    axon_core::content::text_of(&outcome.content)
                                ),
                            )
                            .await;
                        }
                        ToolCallStatus::Timeout => {
                            sink.error(
                                Phase::Acting,
                                ErrorKind::ToolTimeout,
                                format!("tool {name} ({id}) timed out after {elapsed:?}"),
                            )
                            .await;
                        }
                        ToolCallStatus::Suspended => {
                            suspended = true;
                            continue;
                        }
                        _ => {}
                    }
                    let content = if outcome.content.is_empty()
                        && outcome.status == ToolCallStatus::Ok
                    {
                        vec![ContentBlock::text("")]
                    } else {
                        outcome.content.clone()
                    };
                    results.push(Message::tool(id.as_str(), content, outcome.is_error()));
                }
            }

            // Deterministic order: lexicographic by call id.
            results.sort_by(|a, b| tool_result_id(a).cmp(&tool_result_id(b)));

            if acted {
                let event = match sink.modify(AgentEvent::PostActing { results }).await {
                    Ok(event) => event,
                    Err(e) => return Err(self.abort(sink, e).await),
                };
                let AgentEvent::PostActing { results } = event else {
                    return Err(self
                        .abort(sink, AgentError::Hook("event variant changed".into()))
                        .await);
                };
                self.memory.append_all(results).await;
            } else {
                self.memory.append_all(results).await;
            }

            if suspended {
                return self
                    .finish(sink, candidate, FinishReason::Suspended, usage, steps, false)
                    .await;
            }
            if steps >= self.config.max_iters {
                return self
                    .finish(sink, candidate, FinishReason::MaxIters, usage, steps, false)
                    .await;
            }
        }
    }

    /// Consume the model stream through a bounded buffer, fanning each
    /// fragment through the hook pipeline in arrival order.
    async fn consume_reasoning(
        &self,
        mut stream: ChatStream,
        ctx: &ExecutionContext,
        sink: &EventSink,
    ) -> ReasoningEnd {
        let (ftx, mut frx) = mpsc::channel(self.config.stream_buffer_size);
        let overflowed = Arc::new(AtomicBool::new(false));
        let pump_overflowed = overflowed.clone();
        // The pump decouples the model stream from event delivery: a slow
        // subscriber backpressures the engine, never the model. The bounded
        // buffer absorbs the difference; exceeding it aborts the call.
        let pump = tokio::spawn(async move {
            while let Some(item) = stream.next().await {
                match ftx.try_send(item) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        pump_overflowed.store(true, Ordering::SeqCst);
                        break;
                    }
                    Err(TrySendError::Closed(_)) => break,
                }
            }
        });

        let token = ctx.token();
        let mut aggregator = ResponseAggregator::new();
        let end = loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break ReasoningEnd::Interrupted,
                item = frx.recv() => match item {
                    Some(Ok(chunk)) => {
                        sink.notify(AgentEvent::ReasoningChunk {
                            chunk: chunk.clone(),
                        })
                        .await;
                        aggregator.push(&chunk);
                    }
                    Some(Err(e)) => break ReasoningEnd::Failed(e),
                    None => break ReasoningEnd::Done(aggregator.finish()),
                },
            }
        };
        pump.abort();
        if overflowed.load(Ordering::SeqCst) {
            return ReasoningEnd::Overflow;
        }
        end
    }

    async fn finish(
        &self,
        sink: &EventSink,
        terminal: Message,
        finish: FinishReason,
        usage: TokenUsage,
        steps: u32,
        append: bool,
    ) -> Result<AgentReply, AgentError> {
        let original_id = terminal.id.clone();
        let event = sink
            .modify(AgentEvent::PostCall { reply: terminal })
            .await?;
        let AgentEvent::PostCall { reply } = event else {
            return Err(AgentError::Hook("event variant changed".into()));
        };
        if append || reply.id != original_id {
            self.memory.append(reply.clone()).await;
        }
        sink.ctx
            .trace("post_call", serde_json::json!({"finish": format!("{finish:?}")}));
        Ok(AgentReply {
            message: reply,
            finish,
            usage,
            steps,
        })
    }

    async fn interrupted(
        &self,
        sink: &EventSink,
        phase: Phase,
        usage: TokenUsage,
        steps: u32,
    ) -> Result<AgentReply, AgentError> {
        let kind = match sink.ctx.interrupt_kind() {
            Some(InterruptKind::Timeout) => ErrorKind::Timeout,
            _ => ErrorKind::Cancelled,
        };
        sink.error(phase, kind, "call interrupted".into()).await;
        let marker = Message::new(
            Role::Assistant,
            vec![ContentBlock::text(INTERRUPTED_REPLY)],
        )
        .with_name(self.name.as_str());
        self.finish(sink, marker, FinishReason::Interrupted, usage, steps, false)
            .await
    }

    /// Emit a best-effort `PostCall` so the event grammar holds even for
    /// failed calls, then hand the error back.
    async fn abort(&self, sink: &EventSink, err: AgentError) -> AgentError {
        let reply = Message::assistant(format!("error: {err}")).with_name(self.name.as_str());
        let _ = sink.modify(AgentEvent::PostCall { reply }).await;
        err
    }
}

#[async_trait]
impl StateModule for ReactAgent {
    fn component_name(&self) -> &str {
        self.name.as_str()
    }

    async fn state_dict(&self) -> Result<serde_json::Value, StateError> {
        Ok(serde_json::json!({"memory": self.memory.state_dict().await?}))
    }

    async fn load_state_dict(
        &self,
        state: serde_json::Value,
        strict: bool,
    ) -> Result<(), StateError> {
        let obj = state
            .as_object()
            .ok_or_else(|| StateError::Serialization("state dict must be an object".into()))?;
        if strict {
            if let Some(key) = obj.keys().find(|k| k.as_str() != "memory") {
                return Err(StateError::UnknownKey {
                    component: self.name.to_string(),
                    key: key.clone(),
                });
            }
        }
        if let Some(memory_state) = obj.get("memory") {
            self.memory
                .load_state_dict(memory_state.clone(), strict)
                .await?;
        }
        Ok(())
    }
}

fn descriptor_to_schema(descriptor: ToolDescriptor) -> ToolSchema {
    ToolSchema {
        name: descriptor.name,
        description: descriptor.description,
        parameters: descriptor.parameters,
        strict: descriptor.strict,
    }
}

fn tool_result_id(message: &Message) -> String {
    message
        .content
        .iter()
        .find_map(|b| match b {
            ContentBlock::ToolResult { tool_use_id, .. } => Some(tool_use_id.clone()),
            _ => None,
        })
        .unwrap_or_default()
}
