//! Content block types carried inside assistant and user messages.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A typed content block inside a [`super::Message`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text.
    Text { text: String },
    /// The agent invoking a tool.
    ToolUse {
        id: String,
        name: String,
        #[serde(default, deserialize_with = "object_or_empty")]
        input: Map<String, Value>,
    },
    /// The output of a previous tool invocation.
    ToolResult {
        tool_use_id: String,
        #[serde(default)]
        content: ToolResultContent,
        #[serde(default)]
        is_error: bool,
    },
}

/// Tool input that is `null` or not an object becomes an empty map.
fn object_or_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => map,
        _ => Map::new(),
    })
}

/// What a tool returned: either plain text or structured JSON
/// (usually an array of nested content parts).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolResultContent {
    Text(String),
    Structured(Value),
}

impl Default for ToolResultContent {
    fn default() -> Self {
        ToolResultContent::Text(String::new())
    }
}

impl ToolResultContent {
    /// Flatten the result into display text.
    ///
    /// Structured results made of `{"type":"text","text":..}` parts are joined
    /// with newlines; anything else is pretty-printed JSON.
    pub fn to_display_text(&self) -> String {
        match self {
            ToolResultContent::Text(text) => text.clone(),
            ToolResultContent::Structured(Value::Array(parts)) => {
                let texts: Vec<&str> = parts
                    .iter()
                    .filter_map(|p| p.get("text").and_then(Value::as_str))
                    .collect();
                if texts.len() == parts.len() {
                    texts.join("\n")
                } else {
                    serde_json::to_string_pretty(parts).unwrap_or_default()
                }
            }
            ToolResultContent::Structured(other) => {
                serde_json::to_string_pretty(other).unwrap_or_default()
            }
        }
    }
}

impl ContentBlock {
    /// Parse a single raw content block, returning `None` for block kinds the
    /// chat model does not carry (thinking, images, ...).
    pub fn from_value(value: &Value) -> Option<Self> {
        match serde_json::from_value::<ContentBlock>(value.clone()) {
            Ok(block) => Some(block),
            Err(e) => {
                log::trace!(
                    "skipping content block type={:?}: {e}",
                    value.get("type").and_then(Value::as_str)
                );
                None
            }
        }
    }

    /// Parse a raw `content` field. Bare strings become a single text block.
    pub fn parse_list(value: &Value) -> Vec<ContentBlock> {
        match value {
            Value::String(text) => vec![ContentBlock::Text { text: text.clone() }],
            Value::Array(items) => items.iter().filter_map(ContentBlock::from_value).collect(),
            _ => Vec::new(),
        }
    }

    /// Shorthand for a text block.
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }
}
