//! `SessionController`: one conversation, at most one turn in flight.
//!
//! States are Idle and Busy. `submit` moves Idle → Busy and runs the turn to
//! completion; `cancel` moves Busy → Idle immediately without waiting for the
//! adapter. Each turn gets a generation number, and anything a turn reports
//! after it was cancelled or superseded is dropped.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use inkwell_agent::{
    AgentBackend, AgentError, CancelToken, ChatMessage, QueryRequest, StreamAdapter,
    StreamHandler, is_placeholder_session_id, placeholder_session_id,
};
use inkwell_config::Settings;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::context::read_file_context;
use crate::export::{ExportMeta, render_markdown, write_export};

/// Presentation updates pushed by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    MessageAdded(ChatMessage),
    BusyChanged(bool),
    /// The conversation was assigned its session id.
    SessionStarted(String),
    /// Messages and session id were reset.
    Cleared,
}

pub type ControllerEventSender = mpsc::UnboundedSender<ControllerEvent>;

struct Shared {
    messages: Vec<ChatMessage>,
    session_id: Option<String>,
    busy: bool,
    /// Incremented on every submit, cancel and reset.
    generation: u64,
    /// Cancellation handle of the in-flight turn.
    cancel: Option<CancelToken>,
    /// Fired by the host when the panel closes.
    external_cancel: Option<CancelToken>,
    settings: Settings,
    cwd: PathBuf,
    current_document: Option<PathBuf>,
    events: Option<ControllerEventSender>,
}

impl Shared {
    fn emit(&self, event: ControllerEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    fn push(&mut self, message: ChatMessage) {
        self.messages.push(message.clone());
        self.emit(ControllerEvent::MessageAdded(message));
    }

    fn adopt_session_id(&mut self, id: &str) {
        if self.session_id.is_none() {
            log::info!("Conversation session id: {id}");
            self.session_id = Some(id.to_string());
            // Messages pushed before the backend assigned an id join the conversation.
            for message in &mut self.messages {
                if is_placeholder_session_id(&message.session_id) {
                    message.session_id = id.to_string();
                }
            }
            self.emit(ControllerEvent::SessionStarted(id.to_string()));
        }
    }

    fn message_session_id(&self) -> String {
        self.session_id
            .clone()
            .or_else(|| self.messages.last().map(|m| m.session_id.clone()))
            .unwrap_or_else(placeholder_session_id)
    }

    fn set_busy(&mut self, busy: bool) {
        if self.busy != busy {
            self.busy = busy;
            self.emit(ControllerEvent::BusyChanged(busy));
        }
    }
}

/// Owns the message list and session id of one conversation.
///
/// Cloning yields another handle to the same conversation, so `cancel` can be
/// called while a `submit` future is pending elsewhere.
pub struct SessionController<B: AgentBackend> {
    adapter: StreamAdapter<B>,
    shared: Arc<Mutex<Shared>>,
}

impl<B: AgentBackend> Clone for SessionController<B> {
    fn clone(&self) -> Self {
        Self {
            adapter: self.adapter.clone(),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<B: AgentBackend> SessionController<B> {
    pub fn new(backend: Arc<B>, settings: Settings, cwd: impl Into<PathBuf>) -> Self {
        Self {
            adapter: StreamAdapter::new(backend),
            shared: Arc::new(Mutex::new(Shared {
                messages: Vec::new(),
                session_id: None,
                busy: false,
                generation: 0,
                cancel: None,
                external_cancel: None,
                settings,
                cwd: cwd.into(),
                current_document: None,
                events: None,
            })),
        }
    }

    /// Send presentation updates to `tx`.
    pub fn set_event_sender(&self, tx: Option<ControllerEventSender>) {
        self.shared.lock().events = tx;
    }

    pub fn set_external_cancel(&self, token: Option<CancelToken>) {
        self.shared.lock().external_cancel = token;
    }

    pub fn set_settings(&self, settings: Settings) {
        self.shared.lock().settings = settings;
    }

    pub fn settings(&self) -> Settings {
        self.shared.lock().settings.clone()
    }

    /// Toggle whether the current document is appended to prompts.
    pub fn set_file_context(&self, enabled: bool) {
        self.shared.lock().settings.include_file_context = enabled;
    }

    pub fn set_current_document(&self, path: Option<PathBuf>) {
        self.shared.lock().current_document = path;
    }

    pub fn set_cwd(&self, cwd: impl Into<PathBuf>) {
        self.shared.lock().cwd = cwd.into();
    }

    /// Continue an existing backend conversation. Ignored while busy.
    pub fn resume(&self, session_id: impl Into<String>) -> bool {
        let mut shared = self.shared.lock();
        if shared.busy {
            return false;
        }
        shared.session_id = Some(session_id.into());
        true
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.shared.lock().messages.clone()
    }

    pub fn session_id(&self) -> Option<String> {
        self.shared.lock().session_id.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.shared.lock().busy
    }

    /// Submit a prompt and run the turn to completion.
    ///
    /// Returns `false` without doing anything if the prompt is blank or a
    /// turn is already in flight. Failures end up as system messages.
    pub async fn submit(&self, prompt: &str) -> bool {
        let text = prompt.trim();
        if text.is_empty() {
            log::debug!("Ignoring blank prompt");
            return false;
        }

        let (generation, cancel, external, settings, cwd, document, resume) = {
            let mut shared = self.shared.lock();
            if shared.busy {
                log::debug!("Ignoring prompt while a turn is in flight");
                return false;
            }
            let user = ChatMessage::user_input(shared.message_session_id(), text);
            shared.push(user);
            shared.set_busy(true);
            shared.generation += 1;
            let cancel = CancelToken::new();
            shared.cancel = Some(cancel.clone());
            (
                shared.generation,
                cancel,
                shared.external_cancel.clone(),
                shared.settings.clone(),
                shared.cwd.clone(),
                shared.current_document.clone(),
                shared.session_id.clone(),
            )
        };

        let mut outgoing = text.to_string();
        if settings.include_file_context
            && let Some(path) = document.as_deref()
            && let Some(block) = read_file_context(path, settings.max_context_chars).await
        {
            outgoing.push_str(&block);
        }

        let request = QueryRequest {
            prompt: outgoing,
            cwd,
            model: settings.model.clone(),
            resume,
            api_key: settings.api_key().map(String::from),
            system_prompt: settings.system_prompt().map(String::from),
        };
        log::debug!(
            "Starting turn {} (model={}, resume={:?}, api_key={})",
            generation,
            request.model,
            request.resume,
            settings.redacted_api_key()
        );

        let mut handler = TurnHandler {
            shared: Arc::clone(&self.shared),
            generation,
        };
        let session_id = self
            .adapter
            .run(request, &mut handler, &cancel, external.as_ref())
            .await;

        let mut shared = self.shared.lock();
        if shared.generation == generation
            && let Some(id) = session_id
        {
            shared.adopt_session_id(&id);
        }
        true
    }

    /// Cancel the in-flight turn. No-op while idle.
    ///
    /// The controller goes idle and appends the cancellation notice right
    /// away; the adapter's own notice for that turn is dropped.
    pub fn cancel(&self) -> bool {
        let mut shared = self.shared.lock();
        if !shared.busy {
            return false;
        }
        if let Some(token) = shared.cancel.take() {
            token.cancel();
        }
        shared.generation += 1;
        log::info!("Turn cancelled by user");
        let notice = ChatMessage::cancelled(shared.message_session_id());
        shared.push(notice);
        shared.set_busy(false);
        true
    }

    /// Start over: cancel any turn, then forget messages and session id.
    pub fn new_conversation(&self) {
        self.cancel();
        let mut shared = self.shared.lock();
        shared.generation += 1;
        shared.messages.clear();
        shared.session_id = None;
        shared.emit(ControllerEvent::Cleared);
    }

    /// Replace the conversation with `messages` (example transcript). Ignored
    /// while busy.
    pub fn load_transcript(&self, messages: Vec<ChatMessage>) -> bool {
        let mut shared = self.shared.lock();
        if shared.busy {
            return false;
        }
        shared.generation += 1;
        shared.messages.clear();
        shared.session_id = None;
        shared.emit(ControllerEvent::Cleared);
        for message in messages {
            shared.push(message);
        }
        true
    }

    /// Render the conversation as markdown, `None` if there are no messages.
    pub fn export(&self) -> Option<String> {
        let shared = self.shared.lock();
        let meta = ExportMeta {
            exported_at: Local::now(),
            model: shared.settings.model.clone(),
            session_id: shared.session_id.clone(),
        };
        render_markdown(&shared.messages, &meta)
    }

    /// Export into `<vault_root>/<save_path>/`. Returns the written file.
    ///
    /// Nothing is written for an empty conversation; write failures are
    /// logged and yield `None`.
    pub fn save_export(&self, vault_root: &Path) -> Option<PathBuf> {
        let document = self.export()?;
        let dir = vault_root.join(&self.shared.lock().settings.save_path);
        match write_export(&dir, &document, &Local::now()) {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!("Conversation export failed: {e:#}");
                None
            }
        }
    }
}

/// Feeds one turn's adapter callbacks into the shared state.
struct TurnHandler {
    shared: Arc<Mutex<Shared>>,
    generation: u64,
}

impl StreamHandler for TurnHandler {
    fn on_message(&mut self, message: ChatMessage) {
        let mut shared = self.shared.lock();
        if shared.generation != self.generation {
            log::debug!("Dropping {} message from a finished turn", message.kind_name());
            return;
        }
        if let Some(id) = message.init_session_id() {
            shared.adopt_session_id(id);
        }
        shared.push(message);
    }

    fn on_error(&mut self, error: AgentError) {
        let mut shared = self.shared.lock();
        if shared.generation != self.generation {
            return;
        }
        let notice = ChatMessage::error(shared.message_session_id(), format!("Error: {error}"));
        shared.push(notice);
    }

    fn on_complete(&mut self) {
        let mut shared = self.shared.lock();
        if shared.generation != self.generation {
            return;
        }
        shared.cancel = None;
        shared.set_busy(false);
    }
}
