//! Public types for the chat panel.

use std::path::PathBuf;

/// View type the panel is registered under with the host.
pub const VIEW_TYPE: &str = "claude-chat-view";

/// Display name of the panel.
pub const VIEW_TITLE: &str = "Claude Chat";

/// Actions the panel UI sends to [`super::ChatPanel::dispatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum PanelAction {
    /// Submit the given prompt.
    Send(String),
    /// Cancel the in-flight turn.
    Cancel,
    /// Discard the conversation and start a new one.
    NewConversation,
    /// Open the plugin's settings tab.
    OpenSettings,
    /// Replace the conversation with the example transcript.
    LoadExample,
    /// Toggle appending the current document to prompts.
    SetFileContext(bool),
    /// Save the conversation as a note.
    Export,
    /// Run a quick prompt against an optional selection.
    RunQuickPrompt {
        id: String,
        selection: Option<String>,
    },
}

/// What happened as a result of a [`PanelAction`].
#[derive(Debug, Clone, PartialEq)]
pub enum PanelEffect {
    /// A turn ran to completion (or was cancelled/failed).
    Submitted,
    /// The prompt was blank, a turn was in flight, or the quick prompt could
    /// not be resolved.
    Rejected,
    Cancelled,
    /// Cancel while idle.
    NothingToCancel,
    Cleared,
    /// The host should show the settings tab.
    OpenSettings,
    /// The example transcript was loaded with this many messages.
    ExampleLoaded(usize),
    FileContext(bool),
    /// Export result: the written file, or `None` if nothing was written.
    Exported(Option<PathBuf>),
}

/// The send/cancel toggle button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendButton {
    pub label: &'static str,
    pub icon: &'static str,
    /// What pressing the button does.
    pub cancels: bool,
}

impl SendButton {
    pub fn for_state(busy: bool) -> Self {
        if busy {
            Self {
                label: "Cancel",
                icon: "square",
                cancels: true,
            }
        } else {
            Self {
                label: "Send",
                icon: "send",
                cancels: false,
            }
        }
    }
}
