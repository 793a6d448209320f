//! The example transcript shown by the "load example" button.
//!
//! The canned events go through the same adapter and normalization as a live
//! turn, using a [`ScriptedBackend`] instead of the CLI.

use std::sync::Arc;

use inkwell_agent::{
    AgentError, CancelToken, ChatMessage, QueryRequest, ScriptedBackend, StreamAdapter,
    StreamHandler,
};
use serde_json::{Value, json};

/// Prompt shown as the user's message in the example.
pub const EXAMPLE_PROMPT: &str = "Find my notes about the garden project and list open tasks.";

const EXAMPLE_SESSION: &str = "example-session";

/// Raw backend events for the example conversation.
pub fn example_events() -> Vec<Value> {
    vec![
        json!({"type": "system", "subtype": "init", "session_id": EXAMPLE_SESSION,
               "model": "claude-sonnet-4-5", "cwd": "/vault"}),
        json!({"type": "assistant", "session_id": EXAMPLE_SESSION, "message": {
            "id": "msg_example_1", "role": "assistant", "model": "claude-sonnet-4-5",
            "content": [
                {"type": "text", "text": "I'll search the vault for garden notes."},
                {"type": "tool_use", "id": "toolu_1", "name": "Grep",
                 "input": {"pattern": "garden", "path": "/vault"}}
            ],
            "usage": {"input_tokens": 412, "output_tokens": 38}
        }}),
        json!({"type": "user", "session_id": EXAMPLE_SESSION, "message": {
            "role": "user",
            "content": [{"type": "tool_result", "tool_use_id": "toolu_1",
                         "content": "Projects/Garden.md\nDaily/2025-04-02.md"}]
        }}),
        json!({"type": "assistant", "session_id": EXAMPLE_SESSION, "message": {
            "id": "msg_example_2", "role": "assistant",
            "content": [{"type": "tool_use", "id": "toolu_2", "name": "Read",
                         "input": {"file_path": "/vault/Projects/Garden.md"}}]
        }}),
        json!({"type": "user", "session_id": EXAMPLE_SESSION, "message": {
            "role": "user",
            "content": [{"type": "tool_result", "tool_use_id": "toolu_2", "content": [
                {"type": "text", "text": "# Garden\n- [x] Order seeds\n- [ ] Build raised bed\n- [ ] Fix irrigation timer"}
            ]}]
        }}),
        json!({"type": "assistant", "session_id": EXAMPLE_SESSION, "message": {
            "id": "msg_example_3", "role": "assistant",
            "content": [{"type": "text", "text": "Open tasks in **Projects/Garden.md**:\n\n- Build raised bed\n- Fix irrigation timer"}]
        }}),
        json!({"type": "result", "subtype": "success", "session_id": EXAMPLE_SESSION,
               "duration_ms": 6120, "duration_api_ms": 5480, "is_error": false,
               "num_turns": 3, "result": "Two open tasks found.", "total_cost_usd": 0.0184}),
    ]
}

#[derive(Default)]
struct Collector {
    messages: Vec<ChatMessage>,
}

impl StreamHandler for Collector {
    fn on_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    fn on_error(&mut self, error: AgentError) {
        log::warn!("Example transcript error: {error}");
    }

    fn on_complete(&mut self) {}
}

/// Build the example conversation: the user prompt followed by the
/// normalized example events.
pub async fn example_transcript() -> Vec<ChatMessage> {
    let adapter = StreamAdapter::new(Arc::new(ScriptedBackend::new(example_events())));
    let mut collector = Collector {
        messages: vec![ChatMessage::user_input(EXAMPLE_SESSION, EXAMPLE_PROMPT)],
    };
    let request = QueryRequest {
        prompt: EXAMPLE_PROMPT.to_string(),
        ..Default::default()
    };
    adapter
        .run(request, &mut collector, &CancelToken::new(), None)
        .await;
    collector.messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_example_transcript_shape() {
        let messages = example_transcript().await;
        let kinds: Vec<&str> = messages.iter().map(ChatMessage::kind_name).collect();
        assert_eq!(
            kinds,
            vec!["user", "system", "assistant", "user", "assistant", "user", "assistant", "result"]
        );
        assert!(messages[0].is_user_input);
        assert!(!messages[3].is_user_input);
        assert!(messages.iter().skip(1).all(|m| m.session_id == EXAMPLE_SESSION));
    }
}
