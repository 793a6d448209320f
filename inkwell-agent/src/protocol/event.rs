//! Raw events emitted by the Claude CLI in `stream-json` output mode.
//!
//! Each stdout line is one JSON object with a `type` discriminator
//! (`system`, `assistant`, `user`, `result`). These are **not** serde-derived
//! as a whole because unknown or partial events must survive parsing and be
//! dropped later, not rejected here.

use serde_json::Value;

use super::message::{Message, ResultInfo};

/// A parsed stream event.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Session lifecycle event. `subtype == "init"` carries the session id.
    System {
        subtype: Option<String>,
        session_id: Option<String>,
        model: Option<String>,
    },
    /// An assistant turn fragment. `message` is `None` when the payload is missing.
    Assistant {
        session_id: Option<String>,
        message: Option<Message>,
    },
    /// A user-role message, in practice tool results echoed back.
    User {
        session_id: Option<String>,
        message: Option<Message>,
    },
    /// End-of-turn summary.
    Result {
        session_id: Option<String>,
        info: ResultInfo,
    },
    /// Anything else, preserved as raw JSON.
    Unknown(Value),
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(String::from)
}

impl StreamEvent {
    /// Parse a raw JSON event.
    pub fn from_value(value: &Value) -> Self {
        let session_id = str_field(value, "session_id");
        match value.get("type").and_then(Value::as_str) {
            Some("system") => StreamEvent::System {
                subtype: str_field(value, "subtype"),
                session_id,
                model: str_field(value, "model"),
            },
            Some("assistant") => StreamEvent::Assistant {
                session_id,
                message: value
                    .get("message")
                    .and_then(|m| Message::from_value(m, "assistant")),
            },
            Some("user") => StreamEvent::User {
                session_id,
                message: value
                    .get("message")
                    .and_then(|m| Message::from_value(m, "user")),
            },
            Some("result") => StreamEvent::Result {
                session_id,
                info: ResultInfo::from_value(value),
            },
            _ => StreamEvent::Unknown(value.clone()),
        }
    }

    /// The session id carried by the event itself, if any.
    pub fn session_id(&self) -> Option<&str> {
        match self {
            StreamEvent::System { session_id, .. }
            | StreamEvent::Assistant { session_id, .. }
            | StreamEvent::User { session_id, .. }
            | StreamEvent::Result { session_id, .. } => session_id.as_deref(),
            StreamEvent::Unknown(_) => None,
        }
    }

    /// The session id announced by a `system/init` event.
    pub fn init_session_id(&self) -> Option<&str> {
        match self {
            StreamEvent::System {
                subtype: Some(subtype),
                session_id: Some(id),
                ..
            } if subtype == "init" => Some(id),
            _ => None,
        }
    }
}
