//! Quick-prompt commands.
//!
//! Each quick prompt is a template the host exposes as a named command. When
//! invoked, the template is combined with the current selection (if any) and
//! submitted to the chat panel.

use crate::host::{CommandSpec, HostBridge};

/// Separator placed between a template and the selected text.
pub const SELECTION_SEPARATOR: &str = "\n\nText:\n";

/// A predefined prompt template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickPrompt {
    pub id: &'static str,
    pub title: &'static str,
    pub template: &'static str,
    /// Only meaningful with a text selection.
    pub requires_selection: bool,
}

pub const QUICK_PROMPTS: &[QuickPrompt] = &[
    QuickPrompt {
        id: "summarize",
        title: "Summarize",
        template: "Please summarize the following text concisely:",
        requires_selection: true,
    },
    QuickPrompt {
        id: "explain",
        title: "Explain",
        template: "Please explain the following in simple terms:",
        requires_selection: true,
    },
    QuickPrompt {
        id: "improve-writing",
        title: "Improve writing",
        template: "Please improve the writing of the following text while keeping its meaning:",
        requires_selection: true,
    },
    QuickPrompt {
        id: "fix-grammar",
        title: "Fix grammar",
        template: "Please fix any grammar and spelling mistakes in the following text:",
        requires_selection: true,
    },
    QuickPrompt {
        id: "translate-english",
        title: "Translate to English",
        template: "Please translate the following text to English:",
        requires_selection: true,
    },
    QuickPrompt {
        id: "generate-outline",
        title: "Generate outline",
        template: "Please generate a structured outline for the following:",
        requires_selection: true,
    },
    QuickPrompt {
        id: "continue-writing",
        title: "Continue writing",
        template: "Please continue writing from where the following text leaves off:",
        requires_selection: true,
    },
    QuickPrompt {
        id: "ask-about-note",
        title: "Ask about current note",
        template: "I have a question about my current note.",
        requires_selection: false,
    },
];

/// Combine a template with an optional selection.
///
/// A blank selection is treated as no selection.
pub fn compose_prompt(template: &str, selection: Option<&str>) -> String {
    match selection.map(str::trim).filter(|s| !s.is_empty()) {
        Some(text) => format!("{template}{SELECTION_SEPARATOR}{text}"),
        None => template.to_string(),
    }
}

/// Command id as registered with the host.
pub fn command_id(prompt: &QuickPrompt) -> String {
    format!("quick-prompt-{}", prompt.id)
}

/// The set of quick prompts exposed as host commands.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    prompts: Vec<QuickPrompt>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new(QUICK_PROMPTS.to_vec())
    }
}

impl CommandRegistry {
    pub fn new(prompts: Vec<QuickPrompt>) -> Self {
        Self { prompts }
    }

    pub fn prompts(&self) -> &[QuickPrompt] {
        &self.prompts
    }

    /// Register every prompt with the host. Returns the number registered.
    pub fn register(&self, host: &mut dyn HostBridge) -> usize {
        for prompt in &self.prompts {
            host.register_command(CommandSpec {
                id: command_id(prompt),
                name: format!("Claude: {}", prompt.title),
                requires_selection: prompt.requires_selection,
            });
        }
        log::info!("Registered {} quick-prompt commands", self.prompts.len());
        self.prompts.len()
    }

    /// Look up a prompt by its short id or its host command id.
    pub fn get(&self, id: &str) -> Option<&QuickPrompt> {
        let short = id.strip_prefix("quick-prompt-").unwrap_or(id);
        self.prompts.iter().find(|p| p.id == short)
    }

    /// Turn an invoked command into the prompt to submit.
    ///
    /// Returns `None` for an unknown id, or for a selection-bound command
    /// invoked without a selection.
    pub fn resolve(&self, id: &str, selection: Option<&str>) -> Option<String> {
        let prompt = self.get(id)?;
        let has_selection = selection.is_some_and(|s| !s.trim().is_empty());
        if prompt.requires_selection && !has_selection {
            log::debug!("Quick prompt {} needs a selection, ignoring", prompt.id);
            return None;
        }
        Some(compose_prompt(prompt.template, selection))
    }
}
