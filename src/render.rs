//! Projection of chat messages into UI blocks.
//!
//! The panel draws a flat list of [`RenderBlock`]s. Text is shown verbatim;
//! tool calls and tool results are collapsible and start collapsed.

use inkwell_agent::{ChatMessage, ChatMessageKind, ContentBlock, SystemSubtype};
use serde_json::Value;

use crate::export::format_duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    UserText,
    AssistantText,
    ToolUse,
    ToolResult,
    Result,
    Notice,
    Error,
}

/// One visual block in the chat panel.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderBlock {
    pub kind: BlockKind,
    pub title: Option<String>,
    /// Icon name from the host's icon set.
    pub icon: &'static str,
    pub body: String,
    pub collapsible: bool,
    pub collapsed: bool,
}

impl RenderBlock {
    fn plain(kind: BlockKind, icon: &'static str, body: impl Into<String>) -> Self {
        Self {
            kind,
            title: None,
            icon,
            body: body.into(),
            collapsible: false,
            collapsed: false,
        }
    }

    fn folded(kind: BlockKind, title: String, icon: &'static str, body: String) -> Self {
        Self {
            kind,
            title: Some(title),
            icon,
            body,
            collapsible: true,
            collapsed: true,
        }
    }
}

/// Icon for a tool name.
pub fn tool_icon(name: &str) -> &'static str {
    match name {
        "Read" => "file-text",
        "Write" => "file-plus",
        "Edit" | "MultiEdit" => "edit",
        "Bash" | "BashOutput" | "KillShell" => "terminal",
        "Grep" | "Glob" | "LS" => "search",
        "WebFetch" | "WebSearch" => "globe",
        "TodoWrite" => "list-checks",
        "Task" => "bot",
        _ => "wrench",
    }
}

/// Short summary of a tool call's input for the block title.
fn tool_summary(name: &str, input: &serde_json::Map<String, Value>) -> String {
    let key = ["file_path", "path", "command", "pattern", "url", "query"]
        .into_iter()
        .find_map(|k| input.get(k).and_then(Value::as_str));
    match key {
        Some(arg) => format!("{name}: {arg}"),
        None => name.to_string(),
    }
}

/// Blocks for a single message.
pub fn render_message(msg: &ChatMessage) -> Vec<RenderBlock> {
    match &msg.kind {
        ChatMessageKind::User { message } if msg.is_user_input => {
            vec![RenderBlock::plain(BlockKind::UserText, "user", message.text())]
        }
        ChatMessageKind::User { message } | ChatMessageKind::Assistant { message } => message
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } if text.trim().is_empty() => None,
                ContentBlock::Text { text } => Some(RenderBlock::plain(
                    BlockKind::AssistantText,
                    "bot",
                    text.clone(),
                )),
                ContentBlock::ToolUse { name, input, .. } => Some(RenderBlock::folded(
                    BlockKind::ToolUse,
                    tool_summary(name, input),
                    tool_icon(name),
                    serde_json::to_string_pretty(input).unwrap_or_default(),
                )),
                ContentBlock::ToolResult {
                    content, is_error, ..
                } => {
                    let title = if *is_error { "Tool error" } else { "Tool result" };
                    let icon = if *is_error { "alert-triangle" } else { "check" };
                    Some(RenderBlock::folded(
                        BlockKind::ToolResult,
                        title.to_string(),
                        icon,
                        content.to_display_text(),
                    ))
                }
            })
            .collect(),
        ChatMessageKind::Result(info) => {
            let mut stats = vec![format_duration(info.duration_ms)];
            if info.num_turns > 0 {
                stats.push(format!(
                    "{} turn{}",
                    info.num_turns,
                    if info.num_turns == 1 { "" } else { "s" }
                ));
            }
            if info.total_cost_usd > 0.0 {
                stats.push(format!("${:.4}", info.total_cost_usd));
            }
            let kind = if info.is_error {
                BlockKind::Error
            } else {
                BlockKind::Result
            };
            let icon = if info.is_error { "x-circle" } else { "check-circle" };
            vec![RenderBlock {
                kind,
                title: Some(stats.join(" · ")),
                icon,
                body: info.result.clone().unwrap_or_default(),
                collapsible: false,
                collapsed: false,
            }]
        }
        ChatMessageKind::System(info) => {
            let (kind, icon, body) = match info.subtype {
                SystemSubtype::Init => (BlockKind::Notice, "play", "Session started".to_string()),
                SystemSubtype::Success => (
                    BlockKind::Notice,
                    "info",
                    info.text.clone().unwrap_or_default(),
                ),
                SystemSubtype::Error => (
                    BlockKind::Error,
                    "alert-circle",
                    info.text.clone().unwrap_or_default(),
                ),
            };
            vec![RenderBlock::plain(kind, icon, body)]
        }
    }
}

/// Blocks for a whole conversation, in message order.
pub fn render_transcript(messages: &[ChatMessage]) -> Vec<RenderBlock> {
    messages.iter().flat_map(render_message).collect()
}
