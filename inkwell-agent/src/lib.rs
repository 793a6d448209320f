//! inkwell-agent: the streaming session protocol between the chat panel and
//! the Claude agent backend.
//!
//! # Architecture
//!
//! - [`protocol`] - Raw stream events and the normalized [`ChatMessage`] model
//! - [`normalize`] - Event → message mapping
//! - [`backend`] - The [`AgentBackend`] seam and the pull-based [`EventStream`]
//! - [`claude_cli`] - Backend that runs the Claude Code CLI in `stream-json` mode
//! - [`scripted`] - Backend that replays canned events (tests, demo transcript)
//! - [`adapter`] - [`StreamAdapter`]: one round-trip call with cancellation
//! - [`cancel`] - Level-triggered [`CancelToken`]
//! - [`error`] - [`AgentError`]
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use inkwell_agent::{CancelToken, ClaudeCliBackend, QueryRequest, StreamAdapter};
//!
//! let adapter = StreamAdapter::new(Arc::new(ClaudeCliBackend::default()));
//! let cancel = CancelToken::new();
//! let session_id = adapter.run(request, &mut handler, &cancel, None).await;
//! ```

pub mod adapter;
pub mod backend;
pub mod cancel;
pub mod claude_cli;
pub mod error;
pub mod normalize;
pub mod protocol;
pub mod scripted;

// Re-export the main public types at the crate root for convenience
pub use adapter::{StreamAdapter, StreamHandler};
pub use backend::{AgentBackend, EventSender, EventStream, QueryRequest};
pub use cancel::CancelToken;
pub use claude_cli::ClaudeCliBackend;
pub use error::AgentError;
pub use normalize::{is_placeholder_session_id, normalize_event, placeholder_session_id};
pub use protocol::{
    CANCELLED_NOTICE, ChatMessage, ChatMessageKind, ContentBlock, Message, ResultInfo,
    StreamEvent, SystemInfo, SystemSubtype, ToolResultContent, Usage,
};
pub use scripted::ScriptedBackend;
