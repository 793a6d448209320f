//! A backend that replays a fixed list of events.
//!
//! Used by tests, the example transcript and the harness `--replay` mode.
//! It can fail to open, fail mid-stream, or pause after a given number of
//! events until released, which makes mid-stream cancellation deterministic.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;

use crate::backend::{AgentBackend, EventStream, QueryRequest};
use crate::error::AgentError;

#[derive(Debug, Default)]
struct Script {
    events: Vec<Value>,
    fail_open: Option<String>,
    fail_at: Option<(usize, String)>,
    hold_after: Option<usize>,
}

/// Replays scripted events for every `open` call.
#[derive(Debug, Clone, Default)]
pub struct ScriptedBackend {
    script: Arc<Mutex<Script>>,
    requests: Arc<Mutex<Vec<QueryRequest>>>,
    release: Arc<Notify>,
}

impl ScriptedBackend {
    pub fn new(events: Vec<Value>) -> Self {
        let backend = Self::default();
        backend.script.lock().events = events;
        backend
    }

    /// Replace the events replayed by later calls.
    pub fn set_events(&self, events: Vec<Value>) {
        self.script.lock().events = events;
    }

    /// Make `open` fail with a backend error.
    pub fn fail_open(self, message: impl Into<String>) -> Self {
        self.script.lock().fail_open = Some(message.into());
        self
    }

    /// Deliver an error after `index` events instead of the rest of the script.
    pub fn fail_at(self, index: usize, message: impl Into<String>) -> Self {
        self.script.lock().fail_at = Some((index, message.into()));
        self
    }

    /// Pause after `count` events until [`release`](Self::release) is called.
    pub fn hold_after(self, count: usize) -> Self {
        self.script.lock().hold_after = Some(count);
        self
    }

    /// Let a held stream continue.
    pub fn release(&self) {
        self.release.notify_one();
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<QueryRequest> {
        self.requests.lock().clone()
    }

    pub fn open_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl AgentBackend for ScriptedBackend {
    fn open(&self, request: QueryRequest) -> Result<EventStream, AgentError> {
        self.requests.lock().push(request);

        let script = self.script.lock();
        if let Some(message) = &script.fail_open {
            return Err(AgentError::backend(message.clone()));
        }

        let mut items: Vec<Result<Value, AgentError>> = Vec::new();
        for (index, event) in script.events.iter().enumerate() {
            if let Some((fail_index, message)) = &script.fail_at
                && *fail_index == index
            {
                items.push(Err(AgentError::backend(message.clone())));
                break;
            }
            items.push(Ok(event.clone()));
        }
        if let Some((fail_index, message)) = &script.fail_at
            && *fail_index >= script.events.len()
        {
            items.push(Err(AgentError::backend(message.clone())));
        }

        let (tx, stream) = EventStream::channel();
        match script.hold_after {
            None => {
                for item in items {
                    let _ = tx.send(item);
                }
                Ok(stream)
            }
            Some(count) => {
                let release = Arc::clone(&self.release);
                let handle = tokio::spawn(async move {
                    let mut items = items.into_iter();
                    for item in items.by_ref().take(count) {
                        let _ = tx.send(item);
                    }
                    release.notified().await;
                    for item in items {
                        let _ = tx.send(item);
                    }
                });
                Ok(stream.with_producer(handle))
            }
        }
    }
}
