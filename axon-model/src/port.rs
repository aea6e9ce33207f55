//! The ChatModel trait and model-side errors.

use crate::types::{ChatRequest, ChatResponseChunk};
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Errors from a model backend.
///
/// A streaming completion can fail before the first fragment (the stream
/// never opened) or mid-response (the transport dropped, a fragment was
/// undecodable, or the backend reported its own fault inside the stream).
/// The engine terminates the turn on any of them; the variants keep the
/// distinction for operators and retry policies.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ModelError {
    /// The stream could not be opened: connection, DNS, or TLS failure.
    #[error("connect failed: {0}")]
    Connect(String),

    /// The backend refused the request before any fragment arrived.
    #[error("request rejected (status {status}): {reason}")]
    Rejected {
        /// Protocol status code reported by the backend.
        status: u16,
        /// The backend's refusal message.
        reason: String,
    },

    /// The backend throttled the request.
    #[error("throttled, retry after {retry_after:?}")]
    Throttled {
        /// Suggested delay before retrying, if the backend advertised one.
        retry_after: Option<Duration>,
    },

    /// The transport dropped mid-response.
    #[error("stream disconnected: {reason}")]
    Disconnected {
        /// What the transport reported when the stream broke.
        reason: String,
    },

    /// A fragment arrived but could not be decoded.
    #[error("malformed fragment: {0}")]
    MalformedFragment(String),

    /// The backend reported a failure of its own (an in-stream error
    /// frame, truncated output, filtered content).
    #[error("backend fault: {0}")]
    Backend(String),

    /// Catch-all for other errors.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ModelError {
    /// Whether retrying the request might succeed. Transport-shaped
    /// failures are; refusals and decode failures are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ModelError::Connect(_)
                | ModelError::Throttled { .. }
                | ModelError::Disconnected { .. }
        )
    }
}

/// A lazy sequence of response fragments.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<ChatResponseChunk, ModelError>> + Send>>;

/// The model port — an abstract chat-style model the engine drives.
///
/// Implementations read the request, emit fragments, and never touch the
/// agent's memory. A refusal surfaces as `Err` from [`stream`]; anything
/// that goes wrong after the stream opened surfaces as an `Err` item
/// inside it. The engine decides what happens to the turn.
///
/// [`stream`]: ChatModel::stream
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Start one streaming completion.
    async fn stream(&self, request: ChatRequest) -> Result<ChatStream, ModelError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    struct FlakyModel;

    #[async_trait]
    impl ChatModel for FlakyModel {
        async fn stream(&self, _request: ChatRequest) -> Result<ChatStream, ModelError> {
            Ok(Box::pin(futures::stream::iter(vec![
                Ok(ChatResponseChunk::text("r1", "partial ans")),
                Err(ModelError::Disconnected {
                    reason: "peer reset".into(),
                }),
            ])))
        }
    }

    struct GatedModel;

    #[async_trait]
    impl ChatModel for GatedModel {
        async fn stream(&self, _request: ChatRequest) -> Result<ChatStream, ModelError> {
            Err(ModelError::Rejected {
                status: 401,
                reason: "missing api key".into(),
            })
        }
    }

    #[test]
    fn mid_stream_disconnect_arrives_as_a_stream_item() {
        futures::executor::block_on(async {
            let mut stream = FlakyModel
                .stream(ChatRequest::new(vec![]))
                .await
                .expect("stream opens before the transport drops");
            assert!(stream.next().await.unwrap().is_ok());
            let failure = stream.next().await.unwrap().unwrap_err();
            assert!(matches!(failure, ModelError::Disconnected { .. }));
            assert!(failure.is_retryable());
            assert!(stream.next().await.is_none());
        });
    }

    #[test]
    fn refused_requests_never_open_a_stream() {
        futures::executor::block_on(async {
            let err = match GatedModel.stream(ChatRequest::new(vec![])).await {
                Err(e) => e,
                Ok(_) => panic!("expected stream() to return an error"),
            };
            assert_eq!(
                err.to_string(),
                "request rejected (status 401): missing api key"
            );
            assert!(!err.is_retryable());
        });
    }

    #[test]
    fn retryable_kinds_are_transport_shaped() {
        assert!(ModelError::Connect("dns lookup failed".into()).is_retryable());
        assert!(ModelError::Throttled {
            retry_after: Some(Duration::from_secs(2)),
        }
        .is_retryable());
        assert!(!ModelError::MalformedFragment("expected a JSON object".into()).is_retryable());
        assert!(!ModelError::Backend("output truncated (max_tokens)".into()).is_retryable());
    }

    #[test]
    fn throttled_display_carries_the_advertised_delay() {
        let err = ModelError::Throttled {
            retry_after: Some(Duration::from_millis(250)),
        };
        assert!(err.to_string().contains("250ms"));
        let bare = ModelError::Throttled { retry_after: None };
        assert!(bare.to_string().starts_with("throttled"));
    }
}
