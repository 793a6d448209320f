//! `ChatPlugin`: settings, commands and the single panel instance.

use std::sync::Arc;

use anyhow::Result;
use inkwell_agent::AgentBackend;
use inkwell_config::Settings;

use super::{ChatPanel, PanelAction, PanelEffect, VIEW_TYPE};
use crate::commands::CommandRegistry;
use crate::debug::{DebugLevel, init_log_bridge};
use crate::host::HostBridge;

pub struct ChatPlugin<B: AgentBackend> {
    backend: Arc<B>,
    settings: Settings,
    registry: CommandRegistry,
    panel: Option<ChatPanel<B>>,
}

impl<B: AgentBackend> ChatPlugin<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            settings: Settings::default(),
            registry: CommandRegistry::default(),
            panel: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn panel(&self) -> Option<&ChatPanel<B>> {
        self.panel.as_ref()
    }

    /// Startup: load settings and register quick-prompt commands.
    ///
    /// Stored fields that fail validation are reset to their defaults; a
    /// record that cannot be parsed is replaced by the defaults in memory.
    /// Nothing is written back until the next change.
    pub fn load(&mut self, host: &mut dyn HostBridge) {
        self.settings = match host.load_data() {
            Ok(Some(data)) => match Settings::from_yaml_str_repaired(&data) {
                Ok((settings, reset)) => {
                    for key in reset {
                        log::warn!("Invalid stored setting `{key}`, using its default");
                    }
                    settings
                }
                Err(e) => {
                    log::error!("Invalid stored settings, using defaults: {e:#}");
                    Settings::default()
                }
            },
            Ok(None) => Settings::default(),
            Err(e) => {
                log::error!("Failed to load settings, using defaults: {e:#}");
                Settings::default()
            }
        };
        init_log_bridge(DebugLevel::from_debug_flag(self.settings.debug));
        log::info!(
            "Settings loaded (model={}, api_key={})",
            self.settings.model,
            self.settings.redacted_api_key()
        );

        if self.settings.quick_prompts_enabled {
            self.registry.register(host);
        }
    }

    /// Apply a settings change, persist it and push it to the open panel.
    pub fn update_settings(
        &mut self,
        host: &mut dyn HostBridge,
        change: impl FnOnce(&mut Settings),
    ) -> Result<()> {
        let mut updated = self.settings.clone();
        change(&mut updated);
        if updated == self.settings {
            return Ok(());
        }
        updated.validate()?;
        host.save_data(&updated.to_yaml_string()?)?;
        if updated.debug != self.settings.debug {
            init_log_bridge(DebugLevel::from_debug_flag(updated.debug));
        }
        self.settings = updated;
        if let Some(panel) = &self.panel {
            panel.controller().set_settings(self.settings.clone());
        }
        Ok(())
    }

    /// Open the chat panel, or reveal it if it is already open.
    pub fn activate_panel(&mut self, host: &mut dyn HostBridge) -> &mut ChatPanel<B> {
        let panel = match self.panel.take() {
            Some(panel) if panel.is_open() => {
                host.reveal_panel(VIEW_TYPE);
                panel
            }
            _ => {
                host.open_panel(VIEW_TYPE);
                let mut panel = ChatPanel::new(
                    Arc::clone(&self.backend),
                    self.settings.clone(),
                    host.vault_root(),
                );
                panel.on_open();
                panel
            }
        };
        panel.set_active_document(host.active_document());
        self.panel.insert(panel)
    }

    /// The host closed the panel.
    pub fn close_panel(&mut self) {
        if let Some(mut panel) = self.panel.take() {
            panel.on_close();
        }
    }

    /// Run a registered quick-prompt command with the host's selection.
    pub async fn run_command(&mut self, host: &mut dyn HostBridge, id: &str) -> PanelEffect {
        if self.registry.get(id).is_none() {
            log::warn!("Unknown command: {id}");
            return PanelEffect::Rejected;
        }
        let selection = host.selection();
        let panel = self.activate_panel(host);
        panel
            .dispatch(PanelAction::RunQuickPrompt {
                id: id.to_string(),
                selection,
            })
            .await
    }
}
