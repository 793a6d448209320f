//! Stream protocol and chat message type definitions.
//!
//! The module is organized by domain:
//! - [`event`] - Raw `stream-json` events as emitted by the backend
//! - [`message`] - The normalized [`ChatMessage`] model consumed by the renderer
//! - [`content`] - Content blocks carried inside messages

pub mod content;
pub mod event;
pub mod message;

pub use content::{ContentBlock, ToolResultContent};
pub use event::StreamEvent;
pub use message::{
    CANCELLED_NOTICE, ChatMessage, ChatMessageKind, Message, ResultInfo, SystemInfo,
    SystemSubtype, Usage,
};

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_system_init() {
        let event = StreamEvent::from_value(&json!({
            "type": "system",
            "subtype": "init",
            "session_id": "sess-1",
            "model": "claude-sonnet-4-5",
            "tools": ["Read", "Write"]
        }));
        assert_eq!(event.init_session_id(), Some("sess-1"));
        assert_eq!(event.session_id(), Some("sess-1"));
    }

    #[test]
    fn test_non_init_system_has_no_init_session() {
        let event = StreamEvent::from_value(&json!({
            "type": "system",
            "subtype": "compact_boundary",
            "session_id": "sess-1"
        }));
        assert!(event.init_session_id().is_none());
    }

    #[test]
    fn test_parse_assistant_with_mixed_blocks() {
        let event = StreamEvent::from_value(&json!({
            "type": "assistant",
            "session_id": "s",
            "message": {
                "id": "msg_1",
                "role": "assistant",
                "model": "claude-sonnet-4-5",
                "content": [
                    { "type": "thinking", "thinking": "hmm" },
                    { "type": "text", "text": "Reading the note." },
                    { "type": "tool_use", "id": "tu_1", "name": "Read", "input": { "file_path": "a.md" } }
                ],
                "usage": { "input_tokens": 12, "output_tokens": 7 }
            }
        }));
        let StreamEvent::Assistant {
            message: Some(message),
            ..
        } = event
        else {
            panic!("expected assistant with payload");
        };
        assert_eq!(message.id.as_deref(), Some("msg_1"));
        assert_eq!(message.content.len(), 2, "thinking block is skipped");
        assert_eq!(message.text(), "Reading the note.");
        match &message.content[1] {
            ContentBlock::ToolUse { id, name, input } => {
                assert_eq!(id, "tu_1");
                assert_eq!(name, "Read");
                assert_eq!(input["file_path"], "a.md");
            }
            other => panic!("expected tool_use, got {other:?}"),
        }
        assert_eq!(message.usage.as_ref().map(|u| u.output_tokens), Some(7));
    }

    #[test]
    fn test_parse_assistant_without_payload() {
        let event = StreamEvent::from_value(&json!({ "type": "assistant", "session_id": "s" }));
        assert!(matches!(event, StreamEvent::Assistant { message: None, .. }));
    }

    #[test]
    fn test_parse_user_tool_result_variants() {
        let event = StreamEvent::from_value(&json!({
            "type": "user",
            "message": {
                "role": "user",
                "content": [
                    { "type": "tool_result", "tool_use_id": "tu_1", "content": "file body" },
                    { "type": "tool_result", "tool_use_id": "tu_2", "is_error": true,
                      "content": [{ "type": "text", "text": "line 1" }, { "type": "text", "text": "line 2" }] }
                ]
            }
        }));
        let StreamEvent::User {
            message: Some(message),
            ..
        } = event
        else {
            panic!("expected user with payload");
        };
        match &message.content[0] {
            ContentBlock::ToolResult {
                content, is_error, ..
            } => {
                assert_eq!(content, &ToolResultContent::Text("file body".into()));
                assert!(!is_error);
            }
            other => panic!("expected tool_result, got {other:?}"),
        }
        match &message.content[1] {
            ContentBlock::ToolResult {
                content, is_error, ..
            } => {
                assert!(is_error);
                assert_eq!(content.to_display_text(), "line 1\nline 2");
            }
            other => panic!("expected tool_result, got {other:?}"),
        }
    }

    #[test]
    fn test_user_string_content_becomes_text_block() {
        let msg = Message::from_value(&json!({ "content": "plain" }), "user").unwrap();
        assert_eq!(msg.role, "user");
        assert_eq!(msg.content, vec![ContentBlock::text("plain")]);
    }

    #[test]
    fn test_parse_result_defaults_subtype() {
        let event = StreamEvent::from_value(&json!({
            "type": "result",
            "duration_ms": 3200,
            "duration_api_ms": 2900,
            "is_error": false,
            "num_turns": 2,
            "result": "done",
            "total_cost_usd": 0.0123
        }));
        match event {
            StreamEvent::Result { info, .. } => {
                assert_eq!(info.subtype, "success");
                assert_eq!(info.duration_ms, 3200);
                assert_eq!(info.num_turns, 2);
                assert_eq!(info.result.as_deref(), Some("done"));
            }
            other => panic!("expected result, got {other:?}"),
        }
    }

    #[test]
    fn test_tool_use_with_null_input_is_kept() {
        let event = StreamEvent::from_value(&json!({
            "type": "assistant",
            "message": {
                "role": "assistant",
                "content": [
                    { "type": "tool_use", "id": "tu_1", "name": "LS", "input": null },
                    { "type": "tool_use", "id": "tu_2", "name": "Bash", "input": "ls" }
                ]
            }
        }));
        let StreamEvent::Assistant {
            message: Some(message),
            ..
        } = event
        else {
            panic!("expected assistant with payload");
        };
        assert_eq!(message.content.len(), 2);
        for block in &message.content {
            match block {
                ContentBlock::ToolUse { input, .. } => assert!(input.is_empty()),
                other => panic!("expected tool_use, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_result_with_mistyped_fields_keeps_defaults() {
        let event = StreamEvent::from_value(&json!({
            "type": "result",
            "is_error": "yes",
            "num_turns": null,
            "duration_ms": 1234.0,
            "total_cost_usd": null,
            "result": "partial"
        }));
        match event {
            StreamEvent::Result { info, .. } => {
                assert_eq!(info.subtype, "success");
                assert_eq!(info.duration_ms, 1234);
                assert_eq!(info.num_turns, 0);
                assert!(!info.is_error);
                assert_eq!(info.total_cost_usd, 0.0);
                assert_eq!(info.result.as_deref(), Some("partial"));
            }
            other => panic!("expected result, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_unknown_type() {
        let event = StreamEvent::from_value(&json!({ "type": "stream_event", "event": {} }));
        assert!(matches!(event, StreamEvent::Unknown(_)));
        let event = StreamEvent::from_value(&json!({ "no_type": true }));
        assert!(matches!(event, StreamEvent::Unknown(_)));
    }

    #[test]
    fn test_chat_message_serializes_kind_tag() {
        let msg = ChatMessage::user_input("s", "hello");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "user");
        assert_eq!(json["is_user_input"], true);
        assert_eq!(json["message"]["content"][0]["text"], "hello");
    }

    #[test]
    fn test_cancellation_notice_detection() {
        assert!(ChatMessage::cancelled("s").is_cancellation_notice());
        assert!(!ChatMessage::error("s", "boom").is_cancellation_notice());
        assert!(!ChatMessage::user_input("s", CANCELLED_NOTICE).is_cancellation_notice());
    }
}
