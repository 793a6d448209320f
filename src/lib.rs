// Library exports for the inkwell chat companion.
//
// # Mutex Usage Policy
//
// Conversation state is shared between the task running a turn and the UI
// side that may cancel it. It lives behind a `parking_lot::Mutex` that is
// only held for short, non-async critical sections; never hold the guard
// across an `.await`.

/// Application version (root crate version, for use by sub-crates).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod chat;
pub mod commands;
pub mod context;
pub mod debug;
pub mod export;
pub mod host;
pub mod panel;
pub mod render;

pub use chat::{ControllerEvent, SessionController};
pub use panel::{ChatPanel, ChatPlugin, PanelAction, PanelEffect};
