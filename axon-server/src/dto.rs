//! Chat-completions request and response DTOs.
//!
//! Field names match the OpenAI Chat Completions wire format. Message
//! `content` can be a plain string or an array of typed parts; both are
//! accepted. `session_id` and `agent` are extensions.

use axon_core::{ContentBlock, MediaSource, Message, Role};
use axon_model::ToolChoice;
use serde::{Deserialize, Serialize};

/// Request body for `POST /v1/chat/completions`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionRequest {
    /// Model name, echoed in responses and forwarded to the model port.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<ChatMessage>,
    /// Tools the client wants advertised; executed client-side via the
    /// suspension protocol.
    #[serde(default)]
    pub tools: Vec<RequestTool>,
    /// Tool selection strategy: `"auto"`, `"none"`, `"required"`, or
    /// `{"type": "function", "function": {"name": ...}}`.
    #[serde(default)]
    pub tool_choice: Option<serde_json::Value>,
    /// When true, the response is a `text/event-stream`.
    #[serde(default)]
    pub stream: bool,
    /// Conversation continuity across requests (extension).
    #[serde(default)]
    pub session_id: Option<String>,
    /// Agent to address (extension; see also the path and header forms).
    #[serde(default)]
    pub agent: Option<String>,
}

/// One message in the request.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    /// `user`, `assistant`, `system`, or `tool`.
    pub role: String,
    /// String or array-of-parts content.
    pub content: Option<MessageContent>,
    /// For `tool` messages: the call this result answers.
    #[serde(default)]
    pub tool_call_id: Option<String>,
    /// For replayed `assistant` messages: the calls it made.
    #[serde(default)]
    pub tool_calls: Option<Vec<RequestToolCall>>,
    /// Optional sender name.
    #[serde(default)]
    pub name: Option<String>,
}

/// Message content: a plain string or an array of typed parts.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text.
    Text(String),
    /// Typed parts (text, image_url).
    Parts(Vec<ContentPart>),
}

/// One part of a multi-part message content array.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentPart {
    /// Part type: `text` or `image_url`.
    #[serde(rename = "type")]
    pub part_type: String,
    /// Text content when `type` is `text`.
    #[serde(default)]
    pub text: Option<String>,
    /// Image reference when `type` is `image_url`.
    #[serde(default)]
    pub image_url: Option<ImageUrl>,
}

/// An image referenced by URL.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageUrl {
    /// The image URL.
    pub url: String,
}

/// A tool advertised by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestTool {
    /// Always `function`.
    #[serde(rename = "type")]
    pub tool_type: String,
    /// The function descriptor.
    pub function: RequestFunction,
}

/// Function descriptor within a request tool.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestFunction {
    /// Tool name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,
    /// JSON Schema for the parameters.
    #[serde(default)]
    pub parameters: Option<serde_json::Value>,
    /// Strict schema adherence flag.
    #[serde(default)]
    pub strict: Option<bool>,
}

/// A tool call inside a replayed assistant message.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestToolCall {
    /// Call id.
    pub id: String,
    /// The function invocation.
    pub function: RequestFunctionCall,
}

/// Function name plus raw argument text.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestFunctionCall {
    /// Tool name.
    pub name: String,
    /// Raw JSON argument text.
    #[serde(default)]
    pub arguments: String,
}

// --- Responses ---

/// Unary response body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionResponse {
    /// Response id, shared with every stream fragment of the same call.
    pub id: String,
    /// Always `chat.completion`.
    pub object: &'static str,
    /// Unix timestamp, seconds.
    pub created: u64,
    /// Model name echoed from the request.
    pub model: String,
    /// The single choice.
    pub choices: Vec<ResponseChoice>,
}

/// One choice of a unary response.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseChoice {
    /// Choice index (always 0).
    pub index: u32,
    /// The assistant message.
    pub message: ResponseMessage,
    /// `stop`, `error`, `tool_suspended`, or `max_iters`.
    pub finish_reason: String,
}

/// The assistant message of a unary response.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseMessage {
    /// Always `assistant`.
    pub role: &'static str,
    /// Concatenated text content.
    pub content: String,
    /// Pending tool calls, present when the call suspended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ResponseToolCall>>,
}

/// A tool call reported back to the client.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseToolCall {
    /// Call id to echo back in the `tool` message.
    pub id: String,
    /// Always `function`.
    #[serde(rename = "type")]
    pub call_type: &'static str,
    /// The function invocation.
    pub function: ResponseFunctionCall,
}

/// Function name plus serialized arguments.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseFunctionCall {
    /// Tool name.
    pub name: String,
    /// Argument JSON as text.
    pub arguments: String,
}

/// One stream fragment.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionChunk {
    /// Response id, identical across all fragments of one response.
    pub id: String,
    /// Always `chat.completion.chunk`.
    pub object: &'static str,
    /// Unix timestamp, seconds.
    pub created: u64,
    /// Model name echoed from the request.
    pub model: String,
    /// The single choice delta.
    pub choices: Vec<ChunkChoice>,
}

/// One choice of a stream fragment.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkChoice {
    /// Choice index (always 0).
    pub index: u32,
    /// The delta payload.
    pub delta: Delta,
    /// Present on the terminal fragment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Incremental message content.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Delta {
    /// `assistant`, sent on the first fragment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'static str>,
    /// Appended text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Tool-call deltas.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<DeltaToolCall>>,
}

/// A tool-call delta within a stream fragment.
#[derive(Debug, Clone, Serialize)]
pub struct DeltaToolCall {
    /// Stable index of this call within the response.
    pub index: u32,
    /// Call id, sent on the first delta of the call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The function delta.
    pub function: DeltaFunctionCall,
}

/// Function name / argument-text delta.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeltaFunctionCall {
    /// Tool name, sent on the first delta of the call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Appended raw argument text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

// --- Conversions ---

/// Errors converting a request into core messages.
#[derive(Debug)]
pub struct BadRequest(pub String);

/// Convert one request message into a core [`Message`].
pub fn to_core_message(message: &ChatMessage) -> Result<Message, BadRequest> {
    let role = match message.role.as_str() {
        "user" => Role::User,
        "assistant" => Role::Assistant,
        "system" => Role::System,
        "tool" => Role::Tool,
        other => return Err(BadRequest(format!("unknown role: {other}"))),
    };

    let mut blocks = Vec::new();
    match &message.content {
        Some(MessageContent::Text(text)) if !text.is_empty() => {
            blocks.push(ContentBlock::text(text.clone()));
        }
        Some(MessageContent::Parts(parts)) => {
            for part in parts {
                match part.part_type.as_str() {
                    "text" => {
                        if let Some(text) = &part.text {
                            blocks.push(ContentBlock::text(text.clone()));
                        }
                    }
                    "image_url" => {
                        if let Some(image) = &part.image_url {
                            blocks.push(ContentBlock::Image {
                                source: MediaSource::Url {
                                    url: image.url.clone(),
                                },
                            });
                        }
                    }
                    other => {
                        return Err(BadRequest(format!("unknown content part type: {other}")))
                    }
                }
            }
        }
        _ => {}
    }

    if role == Role::Tool {
        let call_id = message
            .tool_call_id
            .clone()
            .ok_or_else(|| BadRequest("tool message requires tool_call_id".into()))?;
        let result = Message::tool(call_id, blocks, false);
        return Ok(apply_name(result, message));
    }

    if let Some(calls) = &message.tool_calls {
        for call in calls {
            let input = serde_json::from_str(&call.arguments_or_empty())
                .unwrap_or(serde_json::Value::String(call.function.arguments.clone()));
            blocks.push(ContentBlock::tool_use(
                call.id.clone(),
                call.function.name.clone(),
                input,
            ));
        }
    }

    Ok(apply_name(Message::new(role, blocks), message))
}

fn apply_name(core: Message, message: &ChatMessage) -> Message {
    match &message.name {
        Some(name) => core.with_name(name),
        None => core,
    }
}

impl RequestToolCall {
    fn arguments_or_empty(&self) -> String {
        if self.function.arguments.trim().is_empty() {
            "{}".to_string()
        } else {
            self.function.arguments.clone()
        }
    }
}

/// Parse the request `tool_choice` value.
pub fn parse_tool_choice(value: &serde_json::Value) -> Option<ToolChoice> {
    match value {
        serde_json::Value::String(s) => match s.as_str() {
            "auto" => Some(ToolChoice::Auto),
            "none" => Some(ToolChoice::None),
            "required" => Some(ToolChoice::Required),
            _ => None,
        },
        serde_json::Value::Object(obj) => obj
            .get("function")
            .and_then(|f| f.get("name"))
            .and_then(|n| n.as_str())
            .map(|name| ToolChoice::Specific { name: name.into() }),
        _ => None,
    }
}
