//! The chat panel and the plugin that owns it.
//!
//! The host drives the panel through explicit lifecycle callbacks
//! ([`ChatPanel::on_open`] / [`ChatPanel::on_close`]) and UI actions
//! ([`ChatPanel::dispatch`]). Closing the panel fires the external cancel
//! token of any in-flight turn and resets the conversation.

pub mod demo;
mod plugin;
mod types;

use std::path::PathBuf;
use std::sync::Arc;

use inkwell_agent::{AgentBackend, CancelToken};
use inkwell_config::Settings;

use crate::chat::SessionController;
use crate::commands::CommandRegistry;
use crate::render::{RenderBlock, render_transcript};

pub use plugin::ChatPlugin;
pub use types::{PanelAction, PanelEffect, SendButton, VIEW_TITLE, VIEW_TYPE};

/// One chat panel instance.
pub struct ChatPanel<B: AgentBackend> {
    controller: SessionController<B>,
    registry: CommandRegistry,
    vault_root: PathBuf,
    close_token: CancelToken,
    open: bool,
}

impl<B: AgentBackend> ChatPanel<B> {
    pub fn new(backend: Arc<B>, settings: Settings, vault_root: impl Into<PathBuf>) -> Self {
        let vault_root = vault_root.into();
        Self {
            controller: SessionController::new(backend, settings, vault_root.clone()),
            registry: CommandRegistry::default(),
            vault_root,
            close_token: CancelToken::new(),
            open: false,
        }
    }

    /// A handle to the panel's conversation.
    pub fn controller(&self) -> &SessionController<B> {
        &self.controller
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Host callback: the panel became visible.
    pub fn on_open(&mut self) {
        if self.open {
            return;
        }
        self.close_token = CancelToken::new();
        self.controller
            .set_external_cancel(Some(self.close_token.clone()));
        self.open = true;
        log::info!("Chat panel opened");
    }

    /// Host callback: the panel was closed.
    pub fn on_close(&mut self) {
        if !self.open {
            return;
        }
        self.close_token.cancel();
        self.controller.new_conversation();
        self.controller.set_external_cancel(None);
        self.open = false;
        log::info!("Chat panel closed");
    }

    pub fn send_button(&self) -> SendButton {
        SendButton::for_state(self.controller.is_busy())
    }

    /// The conversation as UI blocks.
    pub fn blocks(&self) -> Vec<RenderBlock> {
        render_transcript(&self.controller.messages())
    }

    pub fn set_active_document(&self, path: Option<PathBuf>) {
        self.controller.set_current_document(path);
    }

    /// Handle a UI action.
    ///
    /// `Send` and `RunQuickPrompt` resolve once the turn is over; use a
    /// [`controller`](Self::controller) handle to cancel meanwhile.
    pub async fn dispatch(&mut self, action: PanelAction) -> PanelEffect {
        match action {
            PanelAction::Send(prompt) => {
                if self.controller.submit(&prompt).await {
                    PanelEffect::Submitted
                } else {
                    PanelEffect::Rejected
                }
            }
            PanelAction::Cancel => {
                if self.controller.cancel() {
                    PanelEffect::Cancelled
                } else {
                    PanelEffect::NothingToCancel
                }
            }
            PanelAction::NewConversation => {
                self.controller.new_conversation();
                PanelEffect::Cleared
            }
            PanelAction::OpenSettings => PanelEffect::OpenSettings,
            PanelAction::LoadExample => {
                let messages = demo::example_transcript().await;
                let count = messages.len();
                if self.controller.load_transcript(messages) {
                    PanelEffect::ExampleLoaded(count)
                } else {
                    PanelEffect::Rejected
                }
            }
            PanelAction::SetFileContext(enabled) => {
                self.controller.set_file_context(enabled);
                PanelEffect::FileContext(enabled)
            }
            PanelAction::Export => PanelEffect::Exported(self.controller.save_export(&self.vault_root)),
            PanelAction::RunQuickPrompt { id, selection } => {
                match self.registry.resolve(&id, selection.as_deref()) {
                    Some(prompt) => {
                        if self.controller.submit(&prompt).await {
                            PanelEffect::Submitted
                        } else {
                            PanelEffect::Rejected
                        }
                    }
                    None => PanelEffect::Rejected,
                }
            }
        }
    }
}
