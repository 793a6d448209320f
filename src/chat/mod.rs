//! Conversation state for the chat panel.
//!
//! Sub-modules:
//! - [`controller`] - `SessionController`: submit, cancel, new conversation,
//!   export; `ControllerEvent` presentation updates

mod controller;


pub use controller::{ControllerEvent, ControllerEventSender, SessionController};
