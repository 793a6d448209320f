//! The stream adapter: one round-trip to the agent backend.
//!
//! [`StreamAdapter::run`] opens a backend stream, pulls events in arrival
//! order, normalizes each into a [`ChatMessage`], tracks the session id
//! announced by `system/init`, and finishes on stream end, error or
//! cancellation. Nothing escapes as an error: failures go to
//! [`StreamHandler::on_error`], cancellation becomes a system notice, and
//! [`StreamHandler::on_complete`] runs exactly once on every path.

use std::sync::Arc;

use crate::backend::{AgentBackend, EventStream, QueryRequest};
use crate::cancel::CancelToken;
use crate::error::AgentError;
use crate::normalize::{normalize_event, placeholder_session_id};
use crate::protocol::{ChatMessage, StreamEvent};

/// Receives the output of one [`StreamAdapter::run`] call.
pub trait StreamHandler: Send {
    /// A normalized message, in event arrival order.
    fn on_message(&mut self, message: ChatMessage);
    /// The call failed for a reason other than cancellation.
    fn on_error(&mut self, error: AgentError);
    /// The call is over. Always the last callback.
    fn on_complete(&mut self);
}

/// Why the event loop stopped.
#[derive(Debug)]
enum Outcome {
    Finished,
    Cancelled,
    Failed(AgentError),
}

/// Wraps a backend and runs single queries against it.
pub struct StreamAdapter<B: AgentBackend> {
    backend: Arc<B>,
}

impl<B: AgentBackend> Clone for StreamAdapter<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: AgentBackend> StreamAdapter<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Run one query.
    ///
    /// `cancel` is the call's own cancellation flag; `external` is an
    /// optional second flag (e.g. the panel closing). Either one aborts the
    /// call. Returns the active session id: the last id announced by an init
    /// event, or `request.resume` if none arrived.
    pub async fn run<H: StreamHandler>(
        &self,
        request: QueryRequest,
        handler: &mut H,
        cancel: &CancelToken,
        external: Option<&CancelToken>,
    ) -> Option<String> {
        let mut active_session_id = request.resume.clone();
        let is_cancelled = || cancel.is_cancelled() || external.is_some_and(|e| e.is_cancelled());

        let outcome = if is_cancelled() {
            Outcome::Cancelled
        } else {
            match self.backend.open(request) {
                Ok(stream) => {
                    consume(stream, handler, cancel, external, &mut active_session_id).await
                }
                Err(e) if is_cancelled() => {
                    log::debug!("open failed after cancellation: {e}");
                    Outcome::Cancelled
                }
                Err(e) => Outcome::Failed(e),
            }
        };

        match outcome {
            Outcome::Finished => {
                log::debug!("stream finished (session={active_session_id:?})");
            }
            Outcome::Cancelled => {
                log::info!("stream cancelled (session={active_session_id:?})");
                let session_id = active_session_id
                    .clone()
                    .unwrap_or_else(placeholder_session_id);
                handler.on_message(ChatMessage::cancelled(session_id));
            }
            Outcome::Failed(e) => {
                log::warn!("stream failed: {e}");
                handler.on_error(e);
            }
        }
        handler.on_complete();
        active_session_id
    }
}

/// Pull events until the stream ends, fails, or either token fires.
async fn consume<H: StreamHandler>(
    mut stream: EventStream,
    handler: &mut H,
    cancel: &CancelToken,
    external: Option<&CancelToken>,
    active_session_id: &mut Option<String>,
) -> Outcome {
    let external_fired = async {
        match external {
            Some(token) => token.cancelled().await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(external_fired);
    let is_cancelled = || cancel.is_cancelled() || external.is_some_and(|e| e.is_cancelled());

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Outcome::Cancelled,
            _ = &mut external_fired => return Outcome::Cancelled,
            next = stream.next() => next,
        };

        // Remaining events are discarded once cancellation is requested.
        if is_cancelled() {
            return Outcome::Cancelled;
        }

        let value = match next {
            None => return Outcome::Finished,
            Some(Ok(value)) => value,
            Some(Err(e)) => return Outcome::Failed(e),
        };

        let event = StreamEvent::from_value(&value);
        let message = normalize_event(&event, active_session_id.as_deref());
        if let Some(id) = event.init_session_id() {
            log::info!("session initialised: {id}");
            *active_session_id = Some(id.to_string());
        }
        if let Some(message) = message {
            handler.on_message(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ChatMessageKind, SystemSubtype};
    use crate::scripted::ScriptedBackend;
    use serde_json::json;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder {
        messages: Vec<ChatMessage>,
        errors: Vec<String>,
        completions: usize,
        /// Fire this token after the n-th message.
        cancel_after: Option<(usize, CancelToken)>,
    }

    impl StreamHandler for Recorder {
        fn on_message(&mut self, message: ChatMessage) {
            assert_eq!(self.completions, 0, "message after completion");
            self.messages.push(message);
            if let Some((n, token)) = &self.cancel_after
                && self.messages.len() == *n
            {
                token.cancel();
            }
        }
        fn on_error(&mut self, error: AgentError) {
            self.errors.push(error.to_string());
        }
        fn on_complete(&mut self) {
            self.completions += 1;
        }
    }

    impl Recorder {
        fn kinds(&self) -> Vec<&'static str> {
            self.messages.iter().map(ChatMessage::kind_name).collect()
        }
    }

    fn request(resume: Option<&str>) -> QueryRequest {
        QueryRequest {
            prompt: "hello".to_string(),
            model: "claude-sonnet-4-5".to_string(),
            resume: resume.map(String::from),
            ..Default::default()
        }
    }

    fn basic_events() -> Vec<serde_json::Value> {
        vec![
            json!({"type": "system", "subtype": "init", "session_id": "A"}),
            json!({"type": "assistant", "message": {"content": [{"type": "text", "text": "hi"}]}}),
            json!({"type": "result", "result": "done", "duration_ms": 1200}),
        ]
    }

    fn adapter(backend: ScriptedBackend) -> StreamAdapter<ScriptedBackend> {
        StreamAdapter::new(Arc::new(backend))
    }

    #[tokio::test]
    async fn test_basic_turn() {
        let adapter = adapter(ScriptedBackend::new(basic_events()));
        let mut rec = Recorder::default();
        let sid = adapter
            .run(request(None), &mut rec, &CancelToken::new(), None)
            .await;
        assert_eq!(sid.as_deref(), Some("A"));
        assert_eq!(rec.kinds(), vec!["system", "assistant", "result"]);
        assert_eq!(rec.completions, 1);
        assert!(rec.errors.is_empty());
        // Messages after init inherit the announced session id.
        assert_eq!(rec.messages[1].session_id, "A");
    }

    #[tokio::test]
    async fn test_unmappable_events_dropped_in_place() {
        let adapter = adapter(ScriptedBackend::new(vec![
            json!({"type": "system", "subtype": "status"}),
            json!({"type": "assistant", "message": {"content": "one"}}),
            json!({"type": "stream_event"}),
            json!({"type": "assistant"}),
            json!({"type": "user", "message": {"content": [{"type": "tool_result", "tool_use_id": "t", "content": "x"}]}}),
            json!({"type": "result"}),
        ]));
        let mut rec = Recorder::default();
        adapter
            .run(request(None), &mut rec, &CancelToken::new(), None)
            .await;
        assert_eq!(rec.kinds(), vec!["assistant", "user", "result"]);
        assert!(!rec.messages[1].is_user_input);
    }

    #[tokio::test]
    async fn test_resumed_session_without_init_keeps_input_id() {
        let adapter = adapter(ScriptedBackend::new(vec![json!({"type": "result"})]));
        let mut rec = Recorder::default();
        let sid = adapter
            .run(request(Some("R")), &mut rec, &CancelToken::new(), None)
            .await;
        assert_eq!(sid.as_deref(), Some("R"));
        assert_eq!(rec.messages[0].session_id, "R");
        let sent = adapter.backend().requests();
        assert_eq!(sent[0].resume.as_deref(), Some("R"));
    }

    #[tokio::test]
    async fn test_backend_error_reported_then_complete() {
        let adapter = adapter(ScriptedBackend::new(basic_events()).fail_at(1, "network down"));
        let mut rec = Recorder::default();
        let sid = adapter
            .run(request(None), &mut rec, &CancelToken::new(), None)
            .await;
        assert_eq!(sid.as_deref(), Some("A"), "id seen before failure is kept");
        assert_eq!(rec.kinds(), vec!["system"]);
        assert_eq!(rec.errors, vec!["network down".to_string()]);
        assert_eq!(rec.completions, 1);
    }

    #[tokio::test]
    async fn test_open_failure_reported() {
        let adapter = adapter(ScriptedBackend::new(vec![]).fail_open("bad key"));
        let mut rec = Recorder::default();
        let sid = adapter
            .run(request(Some("R")), &mut rec, &CancelToken::new(), None)
            .await;
        assert_eq!(sid.as_deref(), Some("R"));
        assert_eq!(rec.errors.len(), 1);
        assert!(rec.messages.is_empty());
        assert_eq!(rec.completions, 1);
    }

    #[tokio::test]
    async fn test_cancel_mid_stream_discards_rest() {
        let token = CancelToken::new();
        let adapter = adapter(ScriptedBackend::new(basic_events()));
        let mut rec = Recorder {
            cancel_after: Some((1, token.clone())),
            ..Default::default()
        };
        let sid = adapter.run(request(None), &mut rec, &token, None).await;
        assert_eq!(sid.as_deref(), Some("A"));
        assert_eq!(rec.kinds(), vec!["system", "system"]);
        assert!(rec.messages[1].is_cancellation_notice());
        assert!(rec.errors.is_empty(), "cancellation is not an error");
        assert_eq!(rec.completions, 1);
    }

    #[tokio::test]
    async fn test_error_after_cancellation_is_not_surfaced() {
        let token = CancelToken::new();
        let adapter = adapter(ScriptedBackend::new(basic_events()).fail_at(1, "aborted"));
        let mut rec = Recorder {
            cancel_after: Some((1, token.clone())),
            ..Default::default()
        };
        let sid = adapter.run(request(None), &mut rec, &token, None).await;
        assert_eq!(sid.as_deref(), Some("A"));
        assert!(rec.errors.is_empty());
        assert!(rec.messages.last().unwrap().is_cancellation_notice());
        assert_eq!(rec.completions, 1);
    }

    #[tokio::test]
    async fn test_cancel_while_waiting_for_events() {
        let backend = ScriptedBackend::new(basic_events()).hold_after(1);
        let adapter = adapter(backend);
        let token = CancelToken::new();
        let firing = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            firing.cancel();
        });
        let mut rec = Recorder::default();
        let sid = tokio::time::timeout(
            Duration::from_secs(2),
            adapter.run(request(None), &mut rec, &token, None),
        )
        .await
        .expect("cancel must unblock a waiting stream");
        assert_eq!(sid.as_deref(), Some("A"));
        assert_eq!(rec.kinds(), vec!["system", "system"]);
        assert_eq!(rec.completions, 1);
    }

    #[tokio::test]
    async fn test_external_signal_aborts_call() {
        let backend = ScriptedBackend::new(basic_events()).hold_after(2);
        let adapter = adapter(backend);
        let internal = CancelToken::new();
        let external = CancelToken::new();
        let firing = external.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            firing.cancel();
            firing.cancel();
        });
        let mut rec = Recorder::default();
        adapter
            .run(request(None), &mut rec, &internal, Some(&external))
            .await;
        assert_eq!(rec.kinds(), vec!["system", "assistant", "system"]);
        assert!(rec.messages[2].is_cancellation_notice());
        assert!(!internal.is_cancelled());
    }

    #[tokio::test]
    async fn test_already_cancelled_never_opens() {
        let backend = ScriptedBackend::new(basic_events());
        let adapter = adapter(backend);
        let token = CancelToken::new();
        token.cancel();
        let mut rec = Recorder::default();
        let sid = adapter.run(request(None), &mut rec, &token, None).await;
        assert!(sid.is_none());
        assert_eq!(adapter.backend().open_count(), 0);
        match &rec.messages[0].kind {
            ChatMessageKind::System(info) => assert_eq!(info.subtype, SystemSubtype::Success),
            other => panic!("expected system notice, got {other:?}"),
        }
        assert_eq!(rec.completions, 1);
    }
}
