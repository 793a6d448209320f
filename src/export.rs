//! Markdown export of a conversation.
//!
//! The document starts with a frontmatter block (date, time, model, session
//! id), then a title, then one section per exportable message:
//!
//! - typed user input → `## User`
//! - assistant messages → `## Assistant` (text verbatim, tool calls as a
//!   one-line `*Using tool: <name>*` notice)
//! - result messages → `## Result` (result text plus a duration line)
//!
//! System notices and tool results surfaced under the `user` kind are not
//! exported.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use inkwell_agent::{ChatMessage, ChatMessageKind, ContentBlock};

pub const EXPORT_TITLE: &str = "# Claude Conversation";

/// Header data for an export.
#[derive(Debug, Clone)]
pub struct ExportMeta {
    pub exported_at: DateTime<Local>,
    pub model: String,
    pub session_id: Option<String>,
}

/// Format milliseconds as seconds with one decimal, e.g. `1.5s`.
pub fn format_duration(ms: u64) -> String {
    format!("{:.1}s", ms as f64 / 1000.0)
}

/// Render `messages` as a markdown document.
///
/// Returns `None` when there is nothing to export.
pub fn render_markdown(messages: &[ChatMessage], meta: &ExportMeta) -> Option<String> {
    if messages.is_empty() {
        return None;
    }

    let mut out = String::new();
    out.push_str("---\n");
    let _ = writeln!(out, "date: {}", meta.exported_at.format("%Y-%m-%d"));
    let _ = writeln!(out, "time: {}", meta.exported_at.format("%H:%M:%S"));
    let _ = writeln!(out, "model: {}", meta.model);
    if let Some(session_id) = &meta.session_id {
        let _ = writeln!(out, "session_id: {session_id}");
    }
    out.push_str("---\n\n");
    out.push_str(EXPORT_TITLE);
    out.push('\n');

    for msg in messages {
        if let Some(section) = render_section(msg) {
            out.push('\n');
            out.push_str(&section);
        }
    }
    Some(out)
}

fn render_section(msg: &ChatMessage) -> Option<String> {
    match &msg.kind {
        ChatMessageKind::User { message } if msg.is_user_input => {
            let text = message.text();
            Some(format!("## User\n\n{}\n", text.trim_end()))
        }
        ChatMessageKind::User { .. } => None,
        ChatMessageKind::Assistant { message } => {
            let parts: Vec<String> = message
                .content
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } if !text.trim().is_empty() => {
                        Some(text.trim_end().to_string())
                    }
                    ContentBlock::ToolUse { name, .. } => Some(format!("*Using tool: {name}*")),
                    _ => None,
                })
                .collect();
            if parts.is_empty() {
                return None;
            }
            Some(format!("## Assistant\n\n{}\n", parts.join("\n\n")))
        }
        ChatMessageKind::Result(info) => {
            let mut section = String::from("## Result\n\n");
            if let Some(text) = info.result.as_deref().filter(|t| !t.trim().is_empty()) {
                section.push_str(text.trim_end());
                section.push_str("\n\n");
            }
            if info.duration_ms > 0 {
                let _ = writeln!(section, "*Duration: {}*", format_duration(info.duration_ms));
            }
            Some(section)
        }
        ChatMessageKind::System(_) => None,
    }
}

/// File name for an export made at `at`: `Chat-YYYY-MM-DD-HHMMSS.md`.
pub fn export_file_name(at: &DateTime<Local>) -> String {
    format!("Chat-{}.md", at.format("%Y-%m-%d-%H%M%S"))
}

/// Write `document` into `dir`, creating it if needed. Returns the file path.
pub fn write_export(dir: &Path, document: &str, at: &DateTime<Local>) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    let path = dir.join(export_file_name(at));
    fs::write(&path, document).with_context(|| format!("Failed to write {:?}", path))?;
    log::info!("Exported conversation to {:?}", path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 9, 7, 5, 2).unwrap()
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(1500), "1.5s");
        assert_eq!(format_duration(42), "0.0s");
        assert_eq!(format_duration(12_345), "12.3s");
    }

    #[test]
    fn test_file_name() {
        assert_eq!(export_file_name(&at()), "Chat-2025-03-09-070502.md");
    }

    #[test]
    fn test_empty_is_none() {
        let meta = ExportMeta {
            exported_at: at(),
            model: "m".to_string(),
            session_id: None,
        };
        assert!(render_markdown(&[], &meta).is_none());
    }
}
