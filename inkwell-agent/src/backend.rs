//! The seam between the stream adapter and whatever produces events.

use std::path::PathBuf;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::AgentError;

/// Everything one backend call needs. Credentials travel with the request
/// and are applied to that call only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRequest {
    pub prompt: String,
    /// Working directory handed to the agent (the vault root).
    pub cwd: PathBuf,
    pub model: String,
    /// Resume an existing backend-side conversation.
    pub resume: Option<String>,
    pub api_key: Option<String>,
    /// Appended to the agent's default system prompt.
    pub system_prompt: Option<String>,
}

/// Sender half handed to event producers.
pub type EventSender = mpsc::UnboundedSender<Result<Value, AgentError>>;

/// Pull-based sequence of raw events for one call.
///
/// Dropping the stream aborts the producer task, if any.
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<Result<Value, AgentError>>,
    producer: Option<JoinHandle<()>>,
}

impl EventStream {
    /// Create a connected sender/stream pair with no producer task.
    pub fn channel() -> (EventSender, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx, producer: None })
    }

    /// Tie a producer task to this stream so it is aborted on drop.
    pub fn with_producer(mut self, handle: JoinHandle<()>) -> Self {
        self.producer = Some(handle);
        self
    }

    /// Wait for the next event. `None` means the stream ended.
    pub async fn next(&mut self) -> Option<Result<Value, AgentError>> {
        self.rx.recv().await
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        if let Some(handle) = self.producer.take() {
            handle.abort();
        }
    }
}

/// Something that can run one agent query and stream its events.
pub trait AgentBackend: Send + Sync + 'static {
    /// Start a query. Errors here mean nothing was dispatched.
    fn open(&self, request: QueryRequest) -> Result<EventStream, AgentError>;
}

impl<B: AgentBackend + ?Sized> AgentBackend for std::sync::Arc<B> {
    fn open(&self, request: QueryRequest) -> Result<EventStream, AgentError> {
        (**self).open(request)
    }
}
