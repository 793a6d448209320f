//! The normalized, renderer-facing chat message model.
//!
//! Every message the chat panel shows is a [`ChatMessage`]. Raw backend
//! events are turned into these by [`crate::normalize`]; the session
//! controller synthesizes the rest (user input, cancellation and error
//! notices).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::content::ContentBlock;

/// Text of the notice shown when a turn is cancelled.
pub const CANCELLED_NOTICE: &str = "Request cancelled";

/// Token accounting reported with an assistant message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_creation_input_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_read_input_tokens: Option<u64>,
}

/// Payload of an assistant or user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Backend message id (`msg_...`), absent on locally authored messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: String,
    pub content: Vec<ContentBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl Message {
    /// Parse the `message` payload of an assistant/user event.
    ///
    /// `default_role` is used when the payload omits `role`.
    pub fn from_value(value: &Value, default_role: &str) -> Option<Self> {
        let obj = value.as_object()?;
        let usage = obj
            .get("usage")
            .and_then(|u| serde_json::from_value::<Usage>(u.clone()).ok());
        Some(Self {
            id: obj.get("id").and_then(Value::as_str).map(String::from),
            role: obj
                .get("role")
                .and_then(Value::as_str)
                .unwrap_or(default_role)
                .to_string(),
            content: obj
                .get("content")
                .map(ContentBlock::parse_list)
                .unwrap_or_default(),
            model: obj.get("model").and_then(Value::as_str).map(String::from),
            usage,
        })
    }

    /// A locally authored user message holding a single text block.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            id: None,
            role: "user".to_string(),
            content: vec![ContentBlock::text(text)],
            model: None,
            usage: None,
        }
    }

    /// All text blocks joined with blank lines.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Subtype of a system message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemSubtype {
    /// The backend assigned a session id.
    Init,
    /// Informational notice (e.g. cancellation).
    Success,
    /// A failure the user should see.
    Error,
}

/// Payload of a system message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub subtype: SystemSubtype,
    /// The freshly assigned session id, present on `init`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_session_id: Option<String>,
    /// Human-readable notice text for synthesized messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

fn default_result_subtype() -> String {
    "success".to_string()
}

/// Final summary of one turn, taken from the backend `result` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultInfo {
    #[serde(default = "default_result_subtype")]
    pub subtype: String,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub duration_api_ms: u64,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default)]
    pub num_turns: u32,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub total_cost_usd: f64,
}

impl ResultInfo {
    /// Parse a `result` event field by field. Missing or mistyped fields fall
    /// back to their defaults so the event itself is never lost.
    pub fn from_value(value: &Value) -> Self {
        let num = |key: &str| -> u64 {
            value
                .get(key)
                .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f.max(0.0).round() as u64)))
                .unwrap_or(0)
        };
        Self {
            subtype: value
                .get("subtype")
                .and_then(Value::as_str)
                .map(String::from)
                .unwrap_or_else(default_result_subtype),
            duration_ms: num("duration_ms"),
            duration_api_ms: num("duration_api_ms"),
            is_error: value.get("is_error").and_then(Value::as_bool).unwrap_or(false),
            num_turns: u32::try_from(num("num_turns")).unwrap_or(u32::MAX),
            result: value.get("result").and_then(Value::as_str).map(String::from),
            total_cost_usd: value
                .get("total_cost_usd")
                .and_then(Value::as_f64)
                .unwrap_or(0.0),
        }
    }
}

/// The four message kinds the renderer understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatMessageKind {
    Assistant { message: Message },
    User { message: Message },
    Result(ResultInfo),
    System(SystemInfo),
}

/// A normalized chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Locally generated unique id.
    pub id: String,
    /// Conversation this message belongs to.
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    /// True for text the user typed, false for tool results surfaced under
    /// the `user` kind.
    #[serde(default)]
    pub is_user_input: bool,
    #[serde(flatten)]
    pub kind: ChatMessageKind,
}

impl ChatMessage {
    /// Stamp a new message with a fresh id and the current time.
    pub fn new(session_id: impl Into<String>, kind: ChatMessageKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            timestamp: Utc::now(),
            is_user_input: false,
            kind,
        }
    }

    /// A message the user typed into the panel.
    pub fn user_input(session_id: impl Into<String>, text: impl Into<String>) -> Self {
        let mut msg = Self::new(
            session_id,
            ChatMessageKind::User {
                message: Message::user_text(text),
            },
        );
        msg.is_user_input = true;
        msg
    }

    /// A synthesized system notice.
    pub fn system(
        session_id: impl Into<String>,
        subtype: SystemSubtype,
        text: impl Into<String>,
    ) -> Self {
        Self::new(
            session_id,
            ChatMessageKind::System(SystemInfo {
                subtype,
                init_session_id: None,
                text: Some(text.into()),
            }),
        )
    }

    /// The notice appended when a turn is cancelled.
    pub fn cancelled(session_id: impl Into<String>) -> Self {
        Self::system(session_id, SystemSubtype::Success, CANCELLED_NOTICE)
    }

    /// A user-visible failure notice.
    pub fn error(session_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::system(session_id, SystemSubtype::Error, text)
    }

    /// Short kind name: `assistant`, `user`, `result` or `system`.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ChatMessageKind::Assistant { .. } => "assistant",
            ChatMessageKind::User { .. } => "user",
            ChatMessageKind::Result(_) => "result",
            ChatMessageKind::System(_) => "system",
        }
    }

    /// The session id assigned by a `system/init` message, if this is one.
    pub fn init_session_id(&self) -> Option<&str> {
        match &self.kind {
            ChatMessageKind::System(SystemInfo {
                subtype: SystemSubtype::Init,
                init_session_id,
                ..
            }) => init_session_id.as_deref(),
            _ => None,
        }
    }

    pub fn is_cancellation_notice(&self) -> bool {
        matches!(
            &self.kind,
            ChatMessageKind::System(SystemInfo { subtype: SystemSubtype::Success, text: Some(t), .. })
                if t == CANCELLED_NOTICE
        )
    }

    /// The assistant/user payload, if any.
    pub fn message(&self) -> Option<&Message> {
        match &self.kind {
            ChatMessageKind::Assistant { message } | ChatMessageKind::User { message } => {
                Some(message)
            }
            _ => None,
        }
    }
}
