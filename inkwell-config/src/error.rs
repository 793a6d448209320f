//! Typed error variants for the inkwell-config crate.
//!
//! `Settings::load_from` and `Settings::save_to` return `anyhow::Result`;
//! callers that care about the failure mode can downcast:
//!
//! ```rust,no_run
//! use inkwell_config::ConfigError;
//!
//! fn check_load_err(e: &anyhow::Error) {
//!     if let Some(cfg_err) = e.downcast_ref::<ConfigError>() {
//!         match cfg_err {
//!             ConfigError::Io(io) => eprintln!("I/O error: {io}"),
//!             ConfigError::Parse(p) => eprintln!("YAML parse error: {p}"),
//!             ConfigError::Validation(msg) => eprintln!("Validation: {msg}"),
//!         }
//!     }
//! }
//! ```

use thiserror::Error;

/// Errors that can occur when loading, validating or saving settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An I/O error occurred reading or writing the settings file.
    #[error("I/O error reading settings: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file contained YAML that could not be parsed.
    #[error("YAML parse error in settings: {0}")]
    Parse(#[from] serde_yaml_ng::Error),

    /// A field value failed semantic validation.
    #[error("Settings validation error: {0}")]
    Validation(String),
}
