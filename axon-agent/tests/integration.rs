use async_trait::async_trait;
use axon_agent::{AgentConfig, AgentError, AgentRun, FinishReason, ReactAgent, INTERRUPTED_REPLY};
use axon_core::{
    AgentId, ContentBlock, ExecutionContext, InterruptKind, Message, Role, StateModule,
};
use axon_hooks::{AgentEvent, ErrorKind, Hook, HookError};
use axon_model::{
    ChatModel, ChatRequest, ChatResponseChunk, ChatStream, ModelError, StopReason, TokenUsage,
};
use axon_session::{MemorySessionBackend, SessionManager};
use axon_tool::{ParamSpec, ToolEntry, Toolkit};
use futures::StreamExt;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

// -- Mock model --

struct MockModel {
    scripts: Mutex<VecDeque<Vec<Result<ChatResponseChunk, ModelError>>>>,
    delay: Option<Duration>,
}

impl MockModel {
    fn new(scripts: Vec<Vec<Result<ChatResponseChunk, ModelError>>>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            delay: None,
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl ChatModel for MockModel {
    async fn stream(&self, _request: ChatRequest) -> Result<ChatStream, ModelError> {
        let items = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .expect("MockModel: no scripted response left");
        match self.delay {
            Some(delay) => Ok(Box::pin(futures::stream::iter(items).then(
                move |item| async move {
                    tokio::time::sleep(delay).await;
                    item
                },
            ))),
            None => Ok(Box::pin(futures::stream::iter(items))),
        }
    }
}

fn text_reply(text: &str) -> Vec<Result<ChatResponseChunk, ModelError>> {
    let mut chunk = ChatResponseChunk::text("r", text);
    chunk.stop_reason = Some(StopReason::EndTurn);
    chunk.usage = Some(TokenUsage {
        input_tokens: 10,
        output_tokens: 5,
    });
    vec![Ok(chunk)]
}

fn tool_reply(calls: &[(&str, &str, &str)]) -> Vec<Result<ChatResponseChunk, ModelError>> {
    let mut chunk = ChatResponseChunk {
        id: "r".into(),
        content: vec![],
        stop_reason: Some(StopReason::ToolUse),
        usage: Some(TokenUsage {
            input_tokens: 10,
            output_tokens: 15,
        }),
    };
    for (id, name, args) in calls {
        chunk
            .content
            .push(axon_model::ChunkBlock::ToolUse {
                id: (*id).into(),
                name: Some((*name).into()),
                input_delta: (*args).into(),
            });
    }
    vec![Ok(chunk)]
}

fn add_tool() -> ToolEntry {
    ToolEntry::unary(
        "add",
        "Add two integers",
        vec![
            ParamSpec::integer("a", "first operand"),
            ParamSpec::integer("b", "second operand"),
        ],
        |input: serde_json::Value, _ctx: ExecutionContext| async move {
            let a = input["a"].as_i64().unwrap_or_default();
            let b = input["b"].as_i64().unwrap_or_default();
            Ok(vec![ContentBlock::text((a + b).to_string())])
        },
    )
}

async fn drain(run: AgentRun) -> (Vec<AgentEvent>, Result<axon_agent::AgentReply, AgentError>) {
    let AgentRun {
        mut events,
        outcome,
        ..
    } = run;
    let mut seen = Vec::new();
    while let Some(event) = events.next().await {
        seen.push(event);
    }
    let result = outcome.await.expect("call task panicked");
    (seen, result)
}

fn names(events: &[AgentEvent]) -> Vec<&'static str> {
    events.iter().map(|e| e.name()).collect()
}

// -- Scenario 1: plain text reply --

#[tokio::test]
async fn plain_text_reply() {
    let model = Arc::new(MockModel::new(vec![text_reply("hello")]));
    let agent = Arc::new(ReactAgent::builder(model).build());

    let (events, result) = drain(agent.start(vec![Message::user("hi")])).await;
    let reply = result.unwrap();

    assert_eq!(reply.finish, FinishReason::Complete);
    assert_eq!(reply.message.text(), "hello");
    assert_eq!(reply.message.name.as_deref(), Some("agent"));
    assert_eq!(reply.steps, 1);
    assert_eq!(reply.usage.input_tokens, 10);

    assert_eq!(
        names(&events),
        vec![
            "pre_call",
            "pre_reasoning",
            "reasoning_chunk",
            "post_reasoning",
            "post_call"
        ]
    );

    let memory = agent.memory().snapshot().await;
    assert_eq!(memory.len(), 2);
    assert_eq!(memory[0].role, Role::User);
    assert_eq!(memory[1].role, Role::Assistant);
    assert_eq!(memory[1].text(), "hello");
}

// -- Scenario 2: single tool call --

#[tokio::test]
async fn single_tool_call() {
    let model = Arc::new(MockModel::new(vec![
        tool_reply(&[("c1", "add", r#"{"a": 17, "b": 25}"#)]),
        text_reply("The answer is 42."),
    ]));
    let toolkit = Arc::new(Toolkit::new());
    toolkit.register(add_tool());
    let agent = Arc::new(ReactAgent::builder(model).toolkit(toolkit).build());

    let (events, result) = drain(agent.start(vec![Message::user("add 17 and 25")])).await;
    let reply = result.unwrap();
    assert_eq!(reply.finish, FinishReason::Complete);
    assert_eq!(reply.message.text(), "The answer is 42.");

    assert_eq!(
        names(&events),
        vec![
            "pre_call",
            "pre_reasoning",
            "reasoning_chunk",
            "post_reasoning",
            "pre_acting",
            "post_acting",
            "pre_reasoning",
            "reasoning_chunk",
            "post_reasoning",
            "post_call",
        ]
    );

    let post_acting = events
        .iter()
        .find_map(|e| match e {
            AgentEvent::PostActing { results } => Some(results.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(post_acting.len(), 1);

    let memory = agent.memory().snapshot().await;
    assert_eq!(memory.len(), 4);
    assert_eq!(memory[1].tool_uses().len(), 1);
    match &memory[2].content[0] {
        ContentBlock::ToolResult {
            tool_use_id,
            content,
            is_error,
        } => {
            assert_eq!(tool_use_id, "c1");
            assert_eq!(axon_core::content::text_of(content), "42");
            assert!(!is_error);
        }
        other => panic!("expected tool_result, got {other:?}"),
    }
    assert_eq!(memory[3].text(), "The answer is 42.");
}

// -- Scenario 3: two parallel tool calls --

#[tokio::test]
async fn parallel_tool_calls_are_concurrent_and_ordered() {
    let model = Arc::new(MockModel::new(vec![
        tool_reply(&[
            ("c1", "get_weather", r#"{"city": "BJ"}"#),
            ("c2", "get_weather", r#"{"city": "SH"}"#),
        ]),
        text_reply("Both sunny."),
    ]));
    let toolkit = Arc::new(Toolkit::new());
    toolkit.register(ToolEntry::unary(
        "get_weather",
        "Weather by city",
        vec![ParamSpec::string("city", "city code")],
        |input: serde_json::Value, _ctx: ExecutionContext| async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let city = input["city"].as_str().unwrap_or_default().to_string();
            Ok(vec![ContentBlock::text(format!("{city}: sunny"))])
        },
    ));
    let agent = Arc::new(ReactAgent::builder(model).toolkit(toolkit).build());

    let started = Instant::now();
    let reply = agent.call(vec![Message::user("weather?")]).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(reply.finish, FinishReason::Complete);
    // Two 100ms tools ran concurrently, not back to back.
    assert!(elapsed < Duration::from_millis(190), "took {elapsed:?}");

    let memory = agent.memory().snapshot().await;
    let result_ids: Vec<String> = memory
        .iter()
        .filter(|m| m.role == Role::Tool)
        .map(|m| match &m.content[0] {
            ContentBlock::ToolResult { tool_use_id, .. } => tool_use_id.clone(),
            other => panic!("expected tool_result, got {other:?}"),
        })
        .collect();
    assert_eq!(result_ids, vec!["c1", "c2"]);
}

// -- Scenario 4: malformed tool arguments --

#[tokio::test]
async fn malformed_arguments_never_run_the_tool() {
    let ran = Arc::new(AtomicBool::new(false));
    let ran_probe = ran.clone();

    let model = Arc::new(MockModel::new(vec![
        tool_reply(&[("c1", "add", r#"{"a": 17,"#)]),
        text_reply("recovered"),
    ]));
    let toolkit = Arc::new(Toolkit::new());
    toolkit.register(ToolEntry::unary(
        "add",
        "Add two integers",
        vec![
            ParamSpec::integer("a", "first operand"),
            ParamSpec::integer("b", "second operand"),
        ],
        move |_input: serde_json::Value, _ctx: ExecutionContext| {
            let ran = ran_probe.clone();
            async move {
                ran.store(true, Ordering::SeqCst);
                Ok(vec![ContentBlock::text("never")])
            }
        },
    ));
    let agent = Arc::new(ReactAgent::builder(model).toolkit(toolkit).build());

    let (events, result) = drain(agent.start(vec![Message::user("add")])).await;
    let reply = result.unwrap();

    assert!(!ran.load(Ordering::SeqCst), "tool body must not run");
    assert_eq!(reply.finish, FinishReason::Complete);
    assert_eq!(reply.message.text(), "recovered");

    let error_kinds: Vec<ErrorKind> = events
        .iter()
        .filter_map(|e| match e {
            AgentEvent::Error { kind, .. } => Some(*kind),
            _ => None,
        })
        .collect();
    assert_eq!(error_kinds, vec![ErrorKind::BadToolArguments]);

    let memory = agent.memory().snapshot().await;
    // user, assistant-with-ToolUse, tool-error-result, terminal assistant
    assert_eq!(memory.len(), 4);
    assert_eq!(memory[1].tool_uses().len(), 1);
    match &memory[2].content[0] {
        ContentBlock::ToolResult {
            tool_use_id,
            is_error,
            ..
        } => {
            assert_eq!(tool_use_id, "c1");
            assert!(is_error);
        }
        other => panic!("expected tool_result, got {other:?}"),
    }
}

// -- Scenario 5: tool timeout --

#[tokio::test]
async fn tool_timeout_is_local_to_the_call_id() {
    let model = Arc::new(MockModel::new(vec![
        tool_reply(&[("c1", "sleepy", "{}")]),
        text_reply("moving on"),
    ]));
    let toolkit = Arc::new(Toolkit::new());
    toolkit.register(ToolEntry::unary(
        "sleepy",
        "Sleeps far too long",
        vec![],
        |_input: serde_json::Value, _ctx: ExecutionContext| async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(vec![ContentBlock::text("done")])
        },
    ));
    let agent = Arc::new(
        ReactAgent::builder(model)
            .toolkit(toolkit)
            .config(AgentConfig::default().with_tool_timeout(Duration::from_millis(100)))
            .build(),
    );

    let started = Instant::now();
    let (events, result) = drain(agent.start(vec![Message::user("sleep")])).await;
    let reply = result.unwrap();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(reply.finish, FinishReason::Complete);
    assert_eq!(reply.message.text(), "moving on");

    let timeout_errors: Vec<_> = events
        .iter()
        .filter(|e| {
            matches!(
                e,
                AgentEvent::Error {
                    kind: ErrorKind::ToolTimeout,
                    ..
                }
            )
        })
        .collect();
    assert_eq!(timeout_errors.len(), 1);

    let memory = agent.memory().snapshot().await;
    match &memory[2].content[0] {
        ContentBlock::ToolResult { is_error, .. } => assert!(is_error),
        other => panic!("expected tool_result, got {other:?}"),
    }
}

// -- Scenario 6: cancellation mid-stream --

#[tokio::test]
async fn cancellation_mid_stream_yields_interruption_marker() {
    let model = Arc::new(
        MockModel::new(vec![vec![
            Ok(ChatResponseChunk::text("r", "chunk one ")),
            Ok(ChatResponseChunk::text("r", "chunk two ")),
            Ok(ChatResponseChunk::text("r", "chunk three")),
        ]])
        .with_delay(Duration::from_millis(50)),
    );
    let agent = Arc::new(ReactAgent::builder(model).build());

    let AgentRun {
        context,
        mut events,
        outcome,
    } = agent.start(vec![Message::user("stream")]);

    let mut seen = Vec::new();
    while let Some(event) = events.next().await {
        if matches!(event, AgentEvent::ReasoningChunk { .. }) && !context.is_interrupted() {
            context.interrupt(InterruptKind::Cancelled);
            // Repeated cancellation is a no-op.
            context.interrupt(InterruptKind::Cancelled);
        }
        seen.push(event);
    }
    let reply = outcome.await.unwrap().unwrap();

    assert_eq!(reply.finish, FinishReason::Interrupted);
    assert_eq!(reply.message.role, Role::Assistant);
    assert_eq!(reply.message.content.len(), 1);
    assert_eq!(reply.message.text(), INTERRUPTED_REPLY);

    // Error(reasoning, cancelled) precedes PostCall; nothing follows it.
    let error_index = seen
        .iter()
        .position(|e| {
            matches!(
                e,
                AgentEvent::Error {
                    kind: ErrorKind::Cancelled,
                    phase: axon_hooks::Phase::Reasoning,
                    ..
                }
            )
        })
        .expect("cancellation error event");
    assert_eq!(seen.last().unwrap().name(), "post_call");
    assert!(error_index < seen.len() - 1);

    // Memory reflects only what was appended before the abort.
    let memory = agent.memory().snapshot().await;
    assert_eq!(memory.len(), 1);
    assert_eq!(memory[0].role, Role::User);
}

// -- Whole-call timeout --

#[tokio::test]
async fn call_timeout_behaves_like_cancellation() {
    let model = Arc::new(
        MockModel::new(vec![vec![
            Ok(ChatResponseChunk::text("r", "a")),
            Ok(ChatResponseChunk::text("r", "b")),
            Ok(ChatResponseChunk::text("r", "c")),
        ]])
        .with_delay(Duration::from_millis(200)),
    );
    let agent = Arc::new(
        ReactAgent::builder(model)
            .config(AgentConfig::default().with_call_timeout(Duration::from_millis(120)))
            .build(),
    );

    let (events, result) = drain(agent.start(vec![Message::user("slow")])).await;
    let reply = result.unwrap();
    assert_eq!(reply.finish, FinishReason::Interrupted);
    assert!(events.iter().any(|e| matches!(
        e,
        AgentEvent::Error {
            kind: ErrorKind::Timeout,
            ..
        }
    )));
}

// -- Iteration budget --

#[tokio::test]
async fn max_iters_bounds_reasoning_steps() {
    let model = Arc::new(MockModel::new(vec![
        tool_reply(&[("c1", "add", r#"{"a": 1, "b": 2}"#)]),
        tool_reply(&[("c2", "add", r#"{"a": 3, "b": 4}"#)]),
        tool_reply(&[("c3", "add", r#"{"a": 5, "b": 6}"#)]),
    ]));
    let toolkit = Arc::new(Toolkit::new());
    toolkit.register(add_tool());
    let agent = Arc::new(
        ReactAgent::builder(model)
            .toolkit(toolkit)
            .config(AgentConfig::default().with_max_iters(2))
            .build(),
    );

    let (events, result) = drain(agent.start(vec![Message::user("loop")])).await;
    let reply = result.unwrap();

    assert_eq!(reply.finish, FinishReason::MaxIters);
    assert_eq!(reply.steps, 2);
    let reasoning_count = events
        .iter()
        .filter(|e| matches!(e, AgentEvent::PreReasoning { .. }))
        .count();
    assert_eq!(reasoning_count, 2);
}

// -- Model failure terminates the call --

#[tokio::test]
async fn model_stream_error_fails_the_call() {
    let model = Arc::new(MockModel::new(vec![vec![
        Ok(ChatResponseChunk::text("r", "partial")),
        Err(ModelError::Disconnected {
            reason: "connection reset".into(),
        }),
    ]]));
    let agent = Arc::new(ReactAgent::builder(model).build());

    let (events, result) = drain(agent.start(vec![Message::user("hi")])).await;
    assert!(matches!(result, Err(AgentError::Model(_))));

    let model_errors = events
        .iter()
        .filter(|e| {
            matches!(
                e,
                AgentEvent::Error {
                    kind: ErrorKind::Model,
                    ..
                }
            )
        })
        .count();
    assert_eq!(model_errors, 1);
    // The grammar still closes with PostCall.
    assert_eq!(events.last().unwrap().name(), "post_call");
}

// -- Empty tool output is synthesized --

#[tokio::test]
async fn empty_tool_output_becomes_empty_text_result() {
    let model = Arc::new(MockModel::new(vec![
        tool_reply(&[("c1", "quiet", "{}")]),
        text_reply("ok"),
    ]));
    let toolkit = Arc::new(Toolkit::new());
    toolkit.register(ToolEntry::unary(
        "quiet",
        "Produces no output",
        vec![],
        |_input: serde_json::Value, _ctx: ExecutionContext| async move { Ok(vec![]) },
    ));
    let agent = Arc::new(ReactAgent::builder(model).toolkit(toolkit).build());

    agent.call(vec![Message::user("quiet")]).await.unwrap();
    let memory = agent.memory().snapshot().await;
    match &memory[2].content[0] {
        ContentBlock::ToolResult {
            content, is_error, ..
        } => {
            assert!(!is_error);
            assert_eq!(content, &vec![ContentBlock::text("")]);
        }
        other => panic!("expected tool_result, got {other:?}"),
    }
}

// -- Duplicate call ids fail the turn --

struct DuplicatingHook;

#[async_trait]
impl Hook for DuplicatingHook {
    fn name(&self) -> &str {
        "duplicator"
    }
    async fn on_event(
        &self,
        event: AgentEvent,
        _ctx: &ExecutionContext,
    ) -> Result<AgentEvent, HookError> {
        match event {
            AgentEvent::PreActing { mut calls } => {
                let copy = calls[0].clone();
                calls.push(copy);
                Ok(AgentEvent::PreActing { calls })
            }
            other => Ok(other),
        }
    }
}

#[tokio::test]
async fn duplicate_call_id_is_an_invariant_violation() {
    let model = Arc::new(MockModel::new(vec![tool_reply(&[(
        "c1",
        "add",
        r#"{"a": 1, "b": 2}"#,
    )])]));
    let toolkit = Arc::new(Toolkit::new());
    toolkit.register(add_tool());
    let agent = Arc::new(
        ReactAgent::builder(model)
            .toolkit(toolkit)
            .hook(Arc::new(DuplicatingHook))
            .build(),
    );

    let (_events, result) = drain(agent.start(vec![Message::user("dup")])).await;
    assert!(matches!(result, Err(AgentError::DuplicateCallId(id)) if id == "c1"));
}

// -- Scenario 7: session save / load --

#[tokio::test]
async fn session_roundtrip_restores_the_conversation() {
    let backend = Arc::new(MemorySessionBackend::new());
    let manager = SessionManager::new(backend);
    let session = axon_core::SessionId::new("alice");

    let model = Arc::new(MockModel::new(vec![
        tool_reply(&[("c1", "add", r#"{"a": 17, "b": 25}"#)]),
        text_reply("The answer is 42."),
    ]));
    let toolkit = Arc::new(Toolkit::new());
    toolkit.register(add_tool());
    let first = Arc::new(
        ReactAgent::builder(model)
            .name(AgentId::new("assistant"))
            .toolkit(toolkit.clone())
            .build(),
    );
    assert_eq!(first.name(), &AgentId::new("assistant"));
    first
        .call(vec![Message::user("add 17 and 25")])
        .await
        .unwrap();

    let components: Vec<Arc<dyn StateModule>> = vec![first.clone()];
    manager.save(&session, &components).await.unwrap();

    // A new engine bound to the same session id sees the full exchange.
    let next_model = Arc::new(MockModel::new(vec![text_reply("as I said, 42")]));
    let second = Arc::new(
        ReactAgent::builder(next_model)
            .name("assistant")
            .toolkit(toolkit)
            .build(),
    );
    let components: Vec<Arc<dyn StateModule>> = vec![second.clone()];
    assert!(manager.load(&session, false, &components).await.unwrap());

    assert_eq!(
        first.memory().snapshot().await,
        second.memory().snapshot().await
    );

    let (events, result) = drain(second.start(vec![Message::user("what was it?")])).await;
    result.unwrap();
    let prompt = events
        .iter()
        .find_map(|e| match e {
            AgentEvent::PreReasoning { messages, .. } => Some(messages.clone()),
            _ => None,
        })
        .unwrap();
    // user, assistant-with-ToolUse, tool-result, terminal assistant, new user
    assert_eq!(prompt.len(), 5);
}

// -- Scenario 8: tool suspension --

#[tokio::test]
async fn schema_only_tool_suspends_and_resumes() {
    let model = Arc::new(MockModel::new(vec![
        tool_reply(&[("c1", "ask_browser", r#"{"url": "https://example.com"}"#)]),
        text_reply("done browsing"),
    ]));
    let toolkit = Arc::new(Toolkit::new());
    toolkit.register(ToolEntry::schema_only(
        "ask_browser",
        "Open a page in the user's browser",
        vec![ParamSpec::string("url", "page to open")],
    ));
    let agent = Arc::new(ReactAgent::builder(model).toolkit(toolkit).build());

    let reply = agent.call(vec![Message::user("browse")]).await.unwrap();
    assert_eq!(reply.finish, FinishReason::Suspended);
    assert_eq!(reply.message.tool_uses().len(), 1);

    // No result for the pending call yet.
    let memory = agent.memory().snapshot().await;
    assert!(memory.iter().all(|m| m.role != Role::Tool));

    // The external executor answers; the engine resumes from memory.
    agent
        .memory()
        .append(Message::tool(
            "c1",
            vec![ContentBlock::text("Example Domain")],
            false,
        ))
        .await;
    let reply = agent.call(vec![]).await.unwrap();
    assert_eq!(reply.finish, FinishReason::Complete);
    assert_eq!(reply.message.text(), "done browsing");

    // ToolUse precedes its ToolResult in memory.
    let memory = agent.memory().snapshot().await;
    let use_index = memory
        .iter()
        .position(|m| !m.tool_uses().is_empty())
        .unwrap();
    let result_index = memory.iter().position(|m| m.role == Role::Tool).unwrap();
    assert!(use_index < result_index);
}

// -- Hooks can rewrite the terminal reply --

struct Redactor;

#[async_trait]
impl Hook for Redactor {
    fn name(&self) -> &str {
        "redactor"
    }
    async fn on_event(
        &self,
        event: AgentEvent,
        _ctx: &ExecutionContext,
    ) -> Result<AgentEvent, HookError> {
        match event {
            AgentEvent::PostCall { .. } => Ok(AgentEvent::PostCall {
                reply: Message::assistant("[redacted]"),
            }),
            other => Ok(other),
        }
    }
}

#[tokio::test]
async fn post_call_hook_replaces_the_reply() {
    let model = Arc::new(MockModel::new(vec![text_reply("secret")]));
    let agent = Arc::new(
        ReactAgent::builder(model)
            .hook(Arc::new(Redactor))
            .build(),
    );
    let reply = agent.call(vec![Message::user("hi")]).await.unwrap();
    assert_eq!(reply.message.text(), "[redacted]");
}

// -- Calls on one agent serialize --

#[tokio::test]
async fn concurrent_calls_are_serialized() {
    let model = Arc::new(
        MockModel::new(vec![text_reply("one"), text_reply("two")])
            .with_delay(Duration::from_millis(50)),
    );
    let agent = Arc::new(ReactAgent::builder(model).build());

    let a = agent.clone();
    let b = agent.clone();
    let (ra, rb) = tokio::join!(
        async move { a.call(vec![Message::user("first")]).await },
        async move { b.call(vec![Message::user("second")]).await },
    );
    ra.unwrap();
    rb.unwrap();

    // Serialized calls interleave nothing: each user message is directly
    // followed by its assistant reply.
    let memory = agent.memory().snapshot().await;
    assert_eq!(memory.len(), 4);
    assert_eq!(memory[0].role, Role::User);
    assert_eq!(memory[1].role, Role::Assistant);
    assert_eq!(memory[2].role, Role::User);
    assert_eq!(memory[3].role, Role::Assistant);
}

// -- Config validation --

#[tokio::test]
async fn invalid_config_fails_before_touching_memory() {
    let model = Arc::new(MockModel::new(vec![text_reply("unused")]));
    let agent = Arc::new(
        ReactAgent::builder(model)
            .config(AgentConfig::default().with_max_iters(0))
            .build(),
    );
    let result = agent.call(vec![Message::user("hi")]).await;
    assert!(matches!(result, Err(AgentError::BadInput(_))));
    assert_eq!(agent.memory().size().await, 0);
}

// -- json helper kept exercised --

#[tokio::test]
async fn tool_args_are_parsed_json_objects() {
    let model = Arc::new(MockModel::new(vec![
        tool_reply(&[("c1", "add", r#"{"a": 2, "b": 3}"#)]),
        text_reply("5"),
    ]));
    let toolkit = Arc::new(Toolkit::new());
    toolkit.register(add_tool());
    let agent = Arc::new(ReactAgent::builder(model).toolkit(toolkit).build());

    let (events, _) = drain(agent.start(vec![Message::user("add")])).await;
    let calls = events
        .iter()
        .find_map(|e| match e {
            AgentEvent::PreActing { calls } => Some(calls.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(calls[0].input, json!({"a": 2, "b": 3}));
}
