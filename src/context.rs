//! Current-document context appended to outgoing prompts.
//!
//! Reading is best-effort: an unreadable file is logged and the prompt is
//! sent without context.

use std::path::Path;

/// Appended to content cut at the character limit.
pub const TRUNCATION_MARKER: &str = "\n...[truncated]";

/// Cut `text` to at most `max_chars` Unicode scalar values, marking the cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], TRUNCATION_MARKER),
    }
}

/// Format the context block for a document named `name`.
pub fn format_context(name: &str, content: &str, max_chars: usize) -> String {
    format!(
        "\n\n---\nCurrent file: {}\n\n{}",
        name,
        truncate_chars(content, max_chars)
    )
}

/// Read `path` and build its context block, or `None` if it cannot be read.
pub async fn read_file_context(path: &Path, max_chars: usize) -> Option<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            log::debug!(
                "Attaching file context from {:?} ({} chars)",
                path,
                content.chars().count()
            );
            Some(format_context(&name, &content, max_chars))
        }
        Err(e) => {
            log::warn!("Skipping file context, failed to read {:?}: {}", path, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        let out = truncate_chars("héllo wörld", 4);
        assert_eq!(out, format!("héll{TRUNCATION_MARKER}"));
    }

    #[test]
    fn test_format_context() {
        let block = format_context("Note.md", "body", 100);
        assert_eq!(block, "\n\n---\nCurrent file: Note.md\n\nbody");
    }

    #[tokio::test]
    async fn test_read_file_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Daily.md");
        std::fs::write(&path, "abcdefghij").unwrap();

        let block = read_file_context(&path, 3).await.unwrap();
        assert!(block.contains("Current file: Daily.md"));
        assert!(block.ends_with(&format!("abc{TRUNCATION_MARKER}")));
    }

    #[tokio::test]
    async fn test_missing_file_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_file_context(&dir.path().join("nope.md"), 10).await.is_none());
    }
}
