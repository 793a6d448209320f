//! Settings record for the inkwell chat companion.
//!
//! Provides loading (merged over defaults), validation and atomic saving of
//! the small settings record the host persists for the plugin.

pub mod error;
pub mod settings;

pub use error::ConfigError;
pub use settings::{
    DEFAULT_MAX_CONTEXT_CHARS, DEFAULT_MODEL, DEFAULT_SAVE_PATH, Settings,
};
