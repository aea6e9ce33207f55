//! Content blocks — the typed units a message is composed of.

use serde::{Deserialize, Serialize};

/// A single block of structured content within a message.
///
/// The JSON encoding is discriminated by a `type` tag. Decoding a block
/// with an unknown tag fails; there is no catch-all variant, so nothing
/// is silently dropped on either side of the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text.
    Text {
        /// The text content.
        text: String,
    },

    /// Reasoning trace from a thinking-capable model. Not shown to
    /// downstream users by default.
    Thinking {
        /// The thinking text.
        thinking: String,
    },

    /// Image content.
    Image {
        /// Where the image bytes come from.
        source: MediaSource,
    },

    /// Audio content.
    Audio {
        /// Where the audio bytes come from.
        source: MediaSource,
    },

    /// Video content.
    Video {
        /// Where the video bytes come from.
        source: MediaSource,
    },

    /// A tool invocation request emitted by the model.
    ToolUse {
        /// Identifier for this call, unique within the turn.
        id: String,
        /// Name of the tool to invoke.
        name: String,
        /// Tool input as a JSON object.
        input: serde_json::Value,
    },

    /// The outcome of a tool invocation.
    ToolResult {
        /// The `ToolUse` id this result answers.
        tool_use_id: String,
        /// Output blocks produced by the tool.
        content: Vec<ContentBlock>,
        /// Whether the invocation failed.
        is_error: bool,
    },
}

/// Source for media content: either a URL or an inline base64 payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaSource {
    /// Base64-encoded bytes plus their MIME type.
    Base64 {
        /// MIME type, e.g. `image/png`.
        media_type: String,
        /// The base64-encoded data.
        data: String,
    },
    /// URL pointing at the media.
    Url {
        /// The media URL.
        url: String,
    },
}

impl ContentBlock {
    /// Create a text block.
    pub fn text(s: impl Into<String>) -> Self {
        ContentBlock::Text { text: s.into() }
    }

    /// Create a thinking block.
    pub fn thinking(s: impl Into<String>) -> Self {
        ContentBlock::Thinking { thinking: s.into() }
    }

    /// Create a tool-use block.
    pub fn tool_use(
        id: impl Into<String>,
        name: impl Into<String>,
        input: serde_json::Value,
    ) -> Self {
        ContentBlock::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    /// Create a tool-result block.
    pub fn tool_result(
        tool_use_id: impl Into<String>,
        content: Vec<ContentBlock>,
        is_error: bool,
    ) -> Self {
        ContentBlock::ToolResult {
            tool_use_id: tool_use_id.into(),
            content,
            is_error,
        }
    }
}

/// Concatenate the text of all `Text` blocks in order, ignoring every
/// other block kind.
pub fn text_of(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .filter_map(|b| match b {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_block_roundtrip() {
        let block = ContentBlock::text("hello");
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["type"], "text");
        let back: ContentBlock = serde_json::from_value(value).unwrap();
        assert_eq!(block, back);
    }

    #[test]
    fn tool_use_roundtrip() {
        let block = ContentBlock::tool_use("c1", "add", json!({"a": 1, "b": 2}));
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["type"], "tool_use");
        assert_eq!(value["id"], "c1");
        let back: ContentBlock = serde_json::from_value(value).unwrap();
        assert_eq!(block, back);
    }

    #[test]
    fn tool_result_carries_nested_blocks() {
        let block =
            ContentBlock::tool_result("c1", vec![ContentBlock::text("42")], false);
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["type"], "tool_result");
        assert_eq!(value["content"][0]["type"], "text");
        let back: ContentBlock = serde_json::from_value(value).unwrap();
        assert_eq!(block, back);
    }

    #[test]
    fn media_source_tagged() {
        let block = ContentBlock::Image {
            source: MediaSource::Url {
                url: "https://example.com/a.png".into(),
            },
        };
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["source"]["type"], "url");
    }

    #[test]
    fn unknown_block_tag_fails_to_decode() {
        let value = json!({"type": "hologram", "data": "x"});
        let result: Result<ContentBlock, _> = serde_json::from_value(value);
        assert!(result.is_err());
    }

    #[test]
    fn text_of_skips_non_text() {
        let blocks = vec![
            ContentBlock::thinking("hmm"),
            ContentBlock::text("a"),
            ContentBlock::tool_use("c1", "t", json!({})),
            ContentBlock::text("b"),
        ];
        assert_eq!(text_of(&blocks), "ab");
    }
}
