//! The boundary to the host note-taking application.
//!
//! The chat plugin only needs a few host services: register commands,
//! open/reveal its panel, load/save its settings record, and read the active
//! document, selection and vault root. [`FileHost`] implements these over a
//! plain directory for the harness binary.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// A command the plugin asks the host to expose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub id: String,
    pub name: String,
    /// The host should only offer it while text is selected.
    pub requires_selection: bool,
}

/// Services provided by the host application.
pub trait HostBridge {
    fn register_command(&mut self, command: CommandSpec);

    /// Create a panel of `view_type`.
    fn open_panel(&mut self, view_type: &str);

    /// Bring an existing panel of `view_type` to the front.
    fn reveal_panel(&mut self, view_type: &str);

    /// The stored settings record, `None` if nothing was saved yet.
    fn load_data(&self) -> Result<Option<String>>;

    fn save_data(&mut self, data: &str) -> Result<()>;

    /// Root folder of the open vault; the agent's working directory.
    fn vault_root(&self) -> PathBuf;

    /// File shown in the active editor, if any.
    fn active_document(&self) -> Option<PathBuf>;

    /// Text selected in the active editor, if any.
    fn selection(&self) -> Option<String>;
}

/// A host backed by a vault directory and a settings file.
#[derive(Debug, Clone)]
pub struct FileHost {
    vault_root: PathBuf,
    settings_path: PathBuf,
    pub active_document: Option<PathBuf>,
    pub selection: Option<String>,
    pub commands: Vec<CommandSpec>,
    pub panels_opened: usize,
}

impl FileHost {
    pub fn new(vault_root: impl Into<PathBuf>, settings_path: impl Into<PathBuf>) -> Self {
        Self {
            vault_root: vault_root.into(),
            settings_path: settings_path.into(),
            active_document: None,
            selection: None,
            commands: Vec::new(),
            panels_opened: 0,
        }
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }
}

impl HostBridge for FileHost {
    fn register_command(&mut self, command: CommandSpec) {
        log::debug!("Host command registered: {} ({})", command.name, command.id);
        self.commands.retain(|c| c.id != command.id);
        self.commands.push(command);
    }

    fn open_panel(&mut self, view_type: &str) {
        log::debug!("Host opened panel {view_type}");
        self.panels_opened += 1;
    }

    fn reveal_panel(&mut self, view_type: &str) {
        log::debug!("Host revealed panel {view_type}");
    }

    fn load_data(&self) -> Result<Option<String>> {
        if !self.settings_path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&self.settings_path)
            .with_context(|| format!("Failed to read {:?}", self.settings_path))?;
        Ok(Some(data))
    }

    fn save_data(&mut self, data: &str) -> Result<()> {
        if let Some(parent) = self.settings_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let temp_path = self.settings_path.with_extension("tmp");
        fs::write(&temp_path, data)?;
        fs::rename(&temp_path, &self.settings_path)
            .with_context(|| format!("Failed to write {:?}", self.settings_path))?;
        Ok(())
    }

    fn vault_root(&self) -> PathBuf {
        self.vault_root.clone()
    }

    fn active_document(&self) -> Option<PathBuf> {
        self.active_document.clone()
    }

    fn selection(&self) -> Option<String> {
        self.selection.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_host_data_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = FileHost::new(dir.path(), dir.path().join("cfg").join("data.yaml"));
        assert!(host.load_data().unwrap().is_none());
        host.save_data("model: x\n").unwrap();
        assert_eq!(host.load_data().unwrap().as_deref(), Some("model: x\n"));
    }

    #[test]
    fn test_reregistering_replaces_command() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = FileHost::new(dir.path(), dir.path().join("data.yaml"));
        let spec = CommandSpec {
            id: "a".to_string(),
            name: "A".to_string(),
            requires_selection: false,
        };
        host.register_command(spec.clone());
        host.register_command(spec);
        assert_eq!(host.commands.len(), 1);
    }
}
