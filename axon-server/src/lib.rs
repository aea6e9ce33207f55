#![deny(missing_docs)]
//! # axon-server — chat-completions HTTP surface for axon agents
//!
//! Exposes registered [`AgentDefinition`]s at
//! `POST /v1/chat/completions` (and `POST /v1/agents/{agent}/chat/completions`)
//! in the OpenAI chat-completions wire format, unary and SSE. Requests may
//! carry a `session_id`; the server binds a per-session engine whose
//! memory is loaded from the configured session backend before the call
//! and written back after it. Client-supplied tools are advertised
//! schema-only and satisfied through the suspension protocol:
//! `finish_reason: "tool_suspended"` hands the pending calls to the
//! client, and the follow-up request's `{role: "tool", tool_call_id, ...}`
//! messages resume the engine from memory.
//!
//! Stream errors are delivered as a terminal frame with
//! `finish_reason: "error"` over HTTP 200, followed by the `[DONE]`
//! sentinel, so clients can always parse the error frame.

mod app;
mod dto;
mod handlers;

pub use app::{AgentDefinition, AppState, AppStateBuilder, ServerConfig};
pub use dto::{
    ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, ChatMessage,
    ContentPart, Delta, MessageContent, RequestTool,
};

use axum::routing::post;
use axum::Router;
use std::sync::Arc;

/// Build the router over the given state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/chat/completions", post(handlers::chat_completions))
        .route(
            "/v1/agents/:agent/chat/completions",
            post(handlers::chat_completions_for_agent),
        )
        .with_state(state)
}

/// Serve the router on an already-bound listener.
pub async fn serve(
    listener: tokio::net::TcpListener,
    state: Arc<AppState>,
) -> std::io::Result<()> {
    tracing::info!(addr = ?listener.local_addr().ok(), "axon server listening");
    axum::serve(listener, router(state)).await
}
