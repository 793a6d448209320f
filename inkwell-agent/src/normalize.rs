//! Mapping from raw [`StreamEvent`]s to [`ChatMessage`]s.
//!
//! | event            | result                                   |
//! |------------------|------------------------------------------|
//! | `system/init`    | `system/init` carrying the new session id |
//! | other `system`   | dropped                                  |
//! | `assistant`      | `assistant`, only with a message payload |
//! | `user`           | `user`, only with a message payload      |
//! | `result`         | `result`                                 |
//! | anything else    | dropped                                  |

use uuid::Uuid;

use crate::protocol::{ChatMessage, ChatMessageKind, StreamEvent, SystemInfo, SystemSubtype};

const PLACEHOLDER_PREFIX: &str = "local-";

/// Session id used before the backend has assigned one.
pub fn placeholder_session_id() -> String {
    format!("{PLACEHOLDER_PREFIX}{}", Uuid::new_v4())
}

/// True for ids minted by [`placeholder_session_id`].
pub fn is_placeholder_session_id(id: &str) -> bool {
    id.starts_with(PLACEHOLDER_PREFIX)
}

/// Normalize one event.
///
/// The message's session id is the event's own id, else `active_session_id`,
/// else a fresh placeholder. Returns `None` for events with no chat
/// representation.
pub fn normalize_event(event: &StreamEvent, active_session_id: Option<&str>) -> Option<ChatMessage> {
    let kind = match event {
        StreamEvent::System { .. } => {
            let id = event.init_session_id()?;
            ChatMessageKind::System(SystemInfo {
                subtype: SystemSubtype::Init,
                init_session_id: Some(id.to_string()),
                text: None,
            })
        }
        StreamEvent::Assistant { message, .. } => ChatMessageKind::Assistant {
            message: message.clone()?,
        },
        StreamEvent::User { message, .. } => ChatMessageKind::User {
            message: message.clone()?,
        },
        StreamEvent::Result { info, .. } => ChatMessageKind::Result(info.clone()),
        StreamEvent::Unknown(raw) => {
            log::debug!(
                "dropping unmappable stream event type={:?}",
                raw.get("type").and_then(|t| t.as_str())
            );
            return None;
        }
    };

    let session_id = event
        .session_id()
        .or(active_session_id)
        .map(String::from)
        .unwrap_or_else(placeholder_session_id);
    Some(ChatMessage::new(session_id, kind))
}
