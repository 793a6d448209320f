//! The settings record and its persistence.
//!
//! Every field carries a serde default, so a partial stored record is merged
//! over the defaults on load. Saving is atomic (temp file + rename).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";

/// Folder (relative to the vault root) that exported conversations go to.
pub const DEFAULT_SAVE_PATH: &str = "Claude Chats";

/// Default number of characters of the current document sent as context.
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 10_000;

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_save_path() -> String {
    DEFAULT_SAVE_PATH.to_string()
}

fn default_max_context_chars() -> usize {
    DEFAULT_MAX_CONTEXT_CHARS
}

fn default_true() -> bool {
    true
}

/// User settings for the chat companion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Anthropic API key passed to each backend call. Empty means "use the
    /// CLI's own login".
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Verbose logging to the debug log file.
    #[serde(default)]
    pub debug: bool,

    /// Text appended to the agent's system prompt.
    #[serde(default)]
    pub system_prompt: String,

    /// Append the active document to outgoing prompts.
    #[serde(default)]
    pub include_file_context: bool,

    /// Truncation length for the document context, in characters.
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,

    /// Vault-relative folder for exported conversations.
    #[serde(default = "default_save_path")]
    pub save_path: String,

    /// Override for the Claude CLI command line (e.g. `npx @anthropic-ai/claude-code`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cli_command: Option<String>,

    /// Register the quick-prompt commands with the host.
    #[serde(default = "default_true")]
    pub quick_prompts_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            debug: false,
            system_prompt: String::new(),
            include_file_context: false,
            max_context_chars: default_max_context_chars(),
            save_path: default_save_path(),
            cli_command: None,
            quick_prompts_enabled: true,
        }
    }
}

impl Settings {
    /// Merge a stored record over the defaults.
    ///
    /// Missing keys take their default; unknown keys are ignored. An empty or
    /// whitespace-only document yields the defaults.
    pub fn from_yaml_str(data: &str) -> Result<Self> {
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Settings = serde_yaml_ng::from_str(data).map_err(ConfigError::from)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self).map_err(ConfigError::from)?)
    }

    /// Merge a stored record, resetting only the fields that fail validation.
    ///
    /// Returns the settings and the keys that were reset. Parse errors are
    /// still reported since no field can be trusted.
    pub fn from_yaml_str_repaired(data: &str) -> Result<(Self, Vec<&'static str>)> {
        if data.trim().is_empty() {
            return Ok((Self::default(), Vec::new()));
        }
        let mut settings: Settings = serde_yaml_ng::from_str(data).map_err(ConfigError::from)?;
        let reset = settings.reset_invalid_fields();
        Ok((settings, reset))
    }

    /// Replace each invalid field with its default and return the keys reset.
    pub fn reset_invalid_fields(&mut self) -> Vec<&'static str> {
        let defaults = Self::default();
        let mut reset = Vec::new();
        for (key, _) in self.field_errors() {
            match key {
                "model" => self.model = defaults.model.clone(),
                "max_context_chars" => self.max_context_chars = defaults.max_context_chars,
                "save_path" => self.save_path = defaults.save_path.clone(),
                _ => continue,
            }
            reset.push(key);
        }
        reset
    }

    /// Check field values that serde cannot.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        match self.field_errors().into_iter().next() {
            Some((_, message)) => Err(ConfigError::Validation(message)),
            None => Ok(()),
        }
    }

    fn field_errors(&self) -> Vec<(&'static str, String)> {
        let mut errors = Vec::new();
        if self.model.trim().is_empty() {
            errors.push(("model", "model must not be empty".to_string()));
        }
        if self.max_context_chars == 0 {
            errors.push((
                "max_context_chars",
                "max_context_chars must be greater than zero".to_string(),
            ));
        }
        let save_path = Path::new(&self.save_path);
        if save_path.is_absolute()
            || save_path
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            errors.push((
                "save_path",
                format!("save_path must stay inside the vault: {}", self.save_path),
            ));
        }
        errors
    }

    /// Load settings from `path`, creating it with defaults if missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        log::info!("Settings path: {:?}", path);

        if !path.exists() {
            log::info!("Settings file not found, creating default at {:?}", path);
            let settings = Self::default();
            if let Err(e) = settings.save_to(path) {
                log::error!("Failed to save default settings: {}", e);
                return Err(e);
            }
            return Ok(settings);
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Ok(metadata) = fs::metadata(path) {
                let mode = metadata.permissions().mode();
                if mode & 0o044 != 0 && !Self::stored_api_key_is_empty(path) {
                    log::warn!(
                        "Settings file {:?} holds an API key and is readable by group or others \
                         (mode {:04o}). Run: chmod 600 {:?}",
                        path,
                        mode & 0o777,
                        path,
                    );
                }
            }
        }

        let contents = fs::read_to_string(path).map_err(ConfigError::from)?;
        Self::from_yaml_str(&contents)
    }

    fn stored_api_key_is_empty(path: &Path) -> bool {
        fs::read_to_string(path)
            .ok()
            .and_then(|c| serde_yaml_ng::from_str::<Settings>(&c).ok())
            .is_none_or(|s| s.api_key.is_empty())
    }

    /// Save settings to `path` atomically.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(ConfigError::from)?;
        }

        let yaml = self.to_yaml_string()?;

        let temp_path = path.with_extension("yaml.tmp");
        fs::write(&temp_path, &yaml).map_err(ConfigError::from)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) = fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600)) {
                log::warn!("Failed to restrict settings permissions: {e}");
            }
        }
        fs::rename(&temp_path, path).map_err(ConfigError::from)?;
        Ok(())
    }

    /// Load from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Get the settings file path (using XDG convention)
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("settings.yaml")
    }

    /// Get the configuration directory path (using XDG convention)
    pub fn config_dir() -> PathBuf {
        #[cfg(target_os = "windows")]
        {
            if let Some(config_dir) = dirs::config_dir() {
                config_dir.join("inkwell")
            } else {
                PathBuf::from(".")
            }
        }
        #[cfg(not(target_os = "windows"))]
        {
            if let Some(home_dir) = dirs::home_dir() {
                home_dir.join(".config").join("inkwell")
            } else {
                PathBuf::from(".")
            }
        }
    }

    /// The API key, if one is configured.
    pub fn api_key(&self) -> Option<&str> {
        Some(self.api_key.trim()).filter(|k| !k.is_empty())
    }

    /// The API key masked for log output.
    pub fn redacted_api_key(&self) -> String {
        match self.api_key() {
            None => "<unset>".to_string(),
            Some(key) if key.chars().count() <= 8 => "****".to_string(),
            Some(key) => {
                let tail: String = key
                    .chars()
                    .rev()
                    .take(4)
                    .collect::<Vec<_>>()
                    .into_iter()
                    .rev()
                    .collect();
                format!("****{tail}")
            }
        }
    }

    /// The system prompt, if non-blank.
    pub fn system_prompt(&self) -> Option<&str> {
        Some(self.system_prompt.trim()).filter(|p| !p.is_empty())
    }
}
