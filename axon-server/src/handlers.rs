//! The chat-completions handlers: unary JSON and SSE streaming.

use crate::app::{AcquireError, AppState};
use crate::dto::*;
use axon_agent::{AgentError, AgentRun, CallOptions, FinishReason, ReactAgent};
use axon_core::{AgentId, Message, Role, SessionId};
use axon_hooks::AgentEvent;
use axon_model::ChunkBlock;
use axon_tool::ToolEntry;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use serde_json::json;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

pub(crate) async fn chat_completions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<ChatCompletionRequest>,
) -> Response {
    handle(state, None, headers, request).await
}

pub(crate) async fn chat_completions_for_agent(
    State(state): State<Arc<AppState>>,
    Path(agent): Path<String>,
    headers: HeaderMap,
    Json(request): Json<ChatCompletionRequest>,
) -> Response {
    handle(state, Some(agent), headers, request).await
}

async fn handle(
    state: Arc<AppState>,
    path_agent: Option<String>,
    headers: HeaderMap,
    request: ChatCompletionRequest,
) -> Response {
    // Resolution order: path, header, body, configured default, "default".
    let agent: AgentId = path_agent
        .map(AgentId::new)
        .or_else(|| {
            headers
                .get("x-agent-id")
                .and_then(|v| v.to_str().ok())
                .map(AgentId::new)
        })
        .or_else(|| request.agent.as_deref().map(AgentId::new))
        .or_else(|| state.config().default_agent.clone())
        .unwrap_or_else(|| AgentId::new("default"));

    let session_id = match &request.session_id {
        Some(id) if !id.trim().is_empty() => id.clone(),
        _ => uuid::Uuid::new_v4().to_string(),
    };
    if let Err(e) = axon_session::validate_session_id(&session_id) {
        return error_response(StatusCode::BAD_REQUEST, e.to_string());
    }
    let session = SessionId::new(session_id);

    let engine = match state.acquire(&agent, &session).await {
        Ok(engine) => engine,
        Err(AcquireError::UnknownAgent) => {
            return error_response(StatusCode::NOT_FOUND, format!("unknown agent: {agent}"));
        }
        Err(AcquireError::Session(e)) => {
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    // Client-supplied tools are advertised schema-only; the client
    // executes them through the suspension protocol.
    for tool in &request.tools {
        if tool.tool_type == "function" && !engine.toolkit().contains(&tool.function.name) {
            engine.toolkit().register(ToolEntry::schema_only_raw(
                tool.function.name.clone(),
                tool.function.description.clone().unwrap_or_default(),
                tool.function.parameters.clone().unwrap_or_else(|| {
                    json!({"type": "object", "properties": {}, "required": []})
                }),
                tool.function.strict.unwrap_or(false),
            ));
        }
    }

    let mut converted = Vec::with_capacity(request.messages.len());
    for message in &request.messages {
        match to_core_message(message) {
            Ok(core) => converted.push(core),
            Err(BadRequest(e)) => return error_response(StatusCode::BAD_REQUEST, e),
        }
    }
    // A resumed session already holds the transcript; only the trailing
    // user/tool messages of the replayed conversation are new.
    let input = if engine.memory().size().await > 0 {
        suffix_after_last_assistant(converted)
    } else {
        converted
    };

    let options = CallOptions {
        model: Some(request.model.clone()),
        tool_choice: request.tool_choice.as_ref().and_then(parse_tool_choice),
    };
    let response_id = format!("chatcmpl-{}", uuid::Uuid::new_v4().simple());
    let created = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    if request.stream {
        stream_call(
            state,
            engine,
            session,
            input,
            options,
            response_id,
            created,
            request.model,
        )
    } else {
        unary_call(
            state,
            engine,
            session,
            input,
            options,
            response_id,
            created,
            request.model,
        )
        .await
    }
}

#[allow(clippy::too_many_arguments)]
async fn unary_call(
    state: Arc<AppState>,
    engine: Arc<ReactAgent>,
    session: SessionId,
    input: Vec<Message>,
    options: CallOptions,
    response_id: String,
    created: u64,
    model: String,
) -> Response {
    let result = engine.call_with(input, options).await;
    state.persist(&session, &engine).await;

    let (message, finish_reason) = match result {
        Ok(reply) => (
            ResponseMessage {
                role: "assistant",
                content: reply.message.text(),
                tool_calls: pending_tool_calls(&reply.message),
            },
            finish_str(reply.finish).to_string(),
        ),
        Err(AgentError::BadInput(e)) => {
            return error_response(StatusCode::BAD_REQUEST, e);
        }
        Err(e) => (
            ResponseMessage {
                role: "assistant",
                content: e.to_string(),
                tool_calls: None,
            },
            "error".to_string(),
        ),
    };

    Json(ChatCompletionResponse {
        id: response_id,
        object: "chat.completion",
        created,
        model,
        choices: vec![ResponseChoice {
            index: 0,
            message,
            finish_reason,
        }],
    })
    .into_response()
}

#[allow(clippy::too_many_arguments)]
fn stream_call(
    state: Arc<AppState>,
    engine: Arc<ReactAgent>,
    session: SessionId,
    input: Vec<Message>,
    options: CallOptions,
    response_id: String,
    created: u64,
    model: String,
) -> Response {
    let run = engine.start_with(input, options);
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(64);

    tokio::spawn(async move {
        let AgentRun {
            context,
            mut events,
            outcome,
        } = run;
        let mut encoder = ChunkEncoder::new(response_id, created, model);

        while let Some(event) = events.next().await {
            for chunk in encoder.encode(&event) {
                if send_chunk(&tx, &chunk).await.is_err() {
                    // Client went away: cancel the call and stop encoding.
                    context.interrupt(axon_core::InterruptKind::Cancelled);
                }
            }
        }

        let terminal = match outcome.await {
            Ok(Ok(reply)) => {
                let content = match reply.finish {
                    // The interruption marker was never streamed.
                    FinishReason::Interrupted => Some(reply.message.text()),
                    _ => None,
                };
                encoder.terminal(content, finish_str(reply.finish))
            }
            Ok(Err(e)) => encoder.terminal(Some(e.to_string()), "error"),
            Err(e) => encoder.terminal(Some(format!("internal error: {e}")), "error"),
        };
        let _ = send_chunk(&tx, &terminal).await;
        let _ = tx.send(Ok(Event::default().data("[DONE]"))).await;

        state.persist(&session, &engine).await;
    });

    Sse::new(ReceiverStream::new(rx))
        .keep_alive(KeepAlive::default())
        .into_response()
}

async fn send_chunk(
    tx: &mpsc::Sender<Result<Event, Infallible>>,
    chunk: &ChatCompletionChunk,
) -> Result<(), ()> {
    let data = serde_json::to_string(chunk).map_err(|_| ())?;
    tx.send(Ok(Event::default().data(data)))
        .await
        .map_err(|_| ())
}

/// Turns agent events into chat-completion chunk frames. Every frame of
/// one call shares the same response id.
struct ChunkEncoder {
    id: String,
    created: u64,
    model: String,
    sent_role: bool,
    call_indices: HashMap<String, u32>,
}

impl ChunkEncoder {
    fn new(id: String, created: u64, model: String) -> Self {
        Self {
            id,
            created,
            model,
            sent_role: false,
            call_indices: HashMap::new(),
        }
    }

    fn frame(&self, delta: Delta, finish_reason: Option<String>) -> ChatCompletionChunk {
        ChatCompletionChunk {
            id: self.id.clone(),
            object: "chat.completion.chunk",
            created: self.created,
            model: self.model.clone(),
            choices: vec![ChunkChoice {
                index: 0,
                delta,
                finish_reason,
            }],
        }
    }

    fn terminal(&self, content: Option<String>, finish_reason: &str) -> ChatCompletionChunk {
        self.frame(
            Delta {
                role: None,
                content,
                tool_calls: None,
            },
            Some(finish_reason.to_string()),
        )
    }

    fn encode(&mut self, event: &AgentEvent) -> Vec<ChatCompletionChunk> {
        let AgentEvent::ReasoningChunk { chunk } = event else {
            return vec![];
        };
        let mut frames = Vec::new();
        if !self.sent_role {
            self.sent_role = true;
            frames.push(self.frame(
                Delta {
                    role: Some("assistant"),
                    content: Some(String::new()),
                    tool_calls: None,
                },
                None,
            ));
        }
        for block in &chunk.content {
            match block {
                ChunkBlock::Text { text } => {
                    frames.push(self.frame(
                        Delta {
                            role: None,
                            content: Some(text.clone()),
                            tool_calls: None,
                        },
                        None,
                    ));
                }
                // Reasoning traces stay server-side.
                ChunkBlock::Thinking { .. } => {}
                ChunkBlock::ToolUse {
                    id,
                    name,
                    input_delta,
                } => {
                    let next_index = self.call_indices.len() as u32;
                    let (index, first) = match self.call_indices.get(id) {
                        Some(index) => (*index, false),
                        None => {
                            self.call_indices.insert(id.clone(), next_index);
                            (next_index, true)
                        }
                    };
                    frames.push(self.frame(
                        Delta {
                            role: None,
                            content: None,
                            tool_calls: Some(vec![DeltaToolCall {
                                index,
                                id: first.then(|| id.clone()),
                                function: DeltaFunctionCall {
                                    name: if first { name.clone() } else { None },
                                    arguments: Some(input_delta.clone())
                                        .filter(|s| !s.is_empty()),
                                },
                            }]),
                        },
                        None,
                    ));
                }
            }
        }
        frames
    }
}

fn finish_str(finish: FinishReason) -> &'static str {
    match finish {
        FinishReason::Complete => "stop",
        FinishReason::MaxIters => "max_iters",
        FinishReason::Suspended => "tool_suspended",
        FinishReason::Interrupted => "error",
    }
}

fn pending_tool_calls(message: &Message) -> Option<Vec<ResponseToolCall>> {
    let calls: Vec<ResponseToolCall> = message
        .tool_uses()
        .into_iter()
        .map(|(id, name, input)| ResponseToolCall {
            id: id.to_string(),
            call_type: "function",
            function: ResponseFunctionCall {
                name: name.to_string(),
                arguments: match input {
                    serde_json::Value::String(raw) => raw.clone(),
                    other => other.to_string(),
                },
            },
        })
        .collect();
    if calls.is_empty() {
        None
    } else {
        Some(calls)
    }
}

fn suffix_after_last_assistant(messages: Vec<Message>) -> Vec<Message> {
    match messages.iter().rposition(|m| m.role == Role::Assistant) {
        Some(index) => messages.into_iter().skip(index + 1).collect(),
        None => messages,
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(json!({"error": {"message": message, "type": "invalid_request_error"}})),
    )
        .into_response()
}
