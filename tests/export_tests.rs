//! Integration tests for conversation export.

use std::sync::Arc;

use chrono::{Local, TimeZone};
use inkwell::SessionController;
use inkwell::export::{EXPORT_TITLE, ExportMeta, render_markdown};
use inkwell_agent::{ChatMessage, ScriptedBackend};
use inkwell_config::Settings;
use serde_json::json;

fn meta(session_id: Option<&str>) -> ExportMeta {
    ExportMeta {
        exported_at: Local.with_ymd_and_hms(2025, 6, 1, 14, 30, 5).unwrap(),
        model: "claude-sonnet-4-5".to_string(),
        session_id: session_id.map(String::from),
    }
}

fn events() -> Vec<serde_json::Value> {
    vec![
        json!({"type": "system", "subtype": "init", "session_id": "sess-42"}),
        json!({"type": "assistant", "session_id": "sess-42", "message": {"role": "assistant", "content": [
            {"type": "text", "text": "Let me check."},
            {"type": "tool_use", "id": "t1", "name": "Read", "input": {"file_path": "a.md"}}
        ]}}),
        json!({"type": "user", "session_id": "sess-42", "message": {"role": "user", "content": [
            {"type": "tool_result", "tool_use_id": "t1", "content": "SECRET FILE BODY"}
        ]}}),
        json!({"type": "assistant", "session_id": "sess-42", "message": {"role": "assistant", "content": [
            {"type": "text", "text": "The note is about bees."}
        ]}}),
        json!({"type": "result", "session_id": "sess-42", "result": "Summarised.", "duration_ms": 3450}),
    ]
}

async fn finished_conversation() -> SessionController<ScriptedBackend> {
    let backend = ScriptedBackend::new(events());
    let ctl = SessionController::new(Arc::new(backend), Settings::default(), "/vault");
    ctl.submit("What is a.md about?").await;
    ctl
}

#[test]
fn test_no_messages_no_document() {
    assert!(render_markdown(&[], &meta(None)).is_none());
}

#[tokio::test]
async fn test_empty_controller_exports_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let ctl = SessionController::new(
        Arc::new(ScriptedBackend::default()),
        Settings::default(),
        dir.path(),
    );
    assert!(ctl.export().is_none());
    assert!(ctl.save_export(dir.path()).is_none());
    assert!(!dir.path().join("Claude Chats").exists());
}

#[tokio::test]
async fn test_document_layout() {
    let ctl = finished_conversation().await;
    let doc = render_markdown(&ctl.messages(), &meta(ctl.session_id().as_deref())).unwrap();

    assert!(doc.starts_with(
        "---\ndate: 2025-06-01\ntime: 14:30:05\nmodel: claude-sonnet-4-5\nsession_id: sess-42\n---\n\n"
    ));
    assert!(doc.contains(EXPORT_TITLE));
    assert!(doc.contains("## User\n\nWhat is a.md about?\n"));
    assert!(doc.contains("Let me check.\n\n*Using tool: Read*"));
    assert!(doc.contains("The note is about bees."));
    assert!(doc.contains("## Result\n\nSummarised.\n\n*Duration: 3.5s*"));

    // Tool results and system messages are not exported.
    assert!(!doc.contains("SECRET FILE BODY"));
    assert!(!doc.contains("init"));

    let user = doc.find("## User").unwrap();
    let assistant = doc.find("## Assistant").unwrap();
    let result = doc.find("## Result").unwrap();
    assert!(user < assistant && assistant < result);
    assert_eq!(doc.matches("## Assistant").count(), 2);
}

#[test]
fn test_session_id_line_omitted_when_unknown() {
    let messages = vec![ChatMessage::user_input("local-1", "hello")];
    let doc = render_markdown(&messages, &meta(None)).unwrap();
    assert!(!doc.contains("session_id:"));
    assert!(doc.contains("## User\n\nhello\n"));
}

#[test]
fn test_result_without_duration() {
    let messages = vec![
        ChatMessage::user_input("s", "q"),
        ChatMessage::new(
            "s",
            inkwell_agent::ChatMessageKind::Result(serde_json::from_value(json!({"result": "ok"})).unwrap()),
        ),
    ];
    let doc = render_markdown(&messages, &meta(Some("s"))).unwrap();
    assert!(doc.contains("## Result\n\nok\n"));
    assert!(!doc.contains("*Duration:"));
    assert!(doc.find("## User").unwrap() < doc.find("## Result").unwrap());
}

#[tokio::test]
async fn test_save_export_writes_into_save_path() {
    let vault = tempfile::tempdir().unwrap();
    let ctl = finished_conversation().await;
    ctl.set_settings(Settings {
        save_path: "Archive/Chats".to_string(),
        ..Default::default()
    });

    let path = ctl.save_export(vault.path()).unwrap();

    assert!(path.starts_with(vault.path().join("Archive").join("Chats")));
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("Chat-") && name.ends_with(".md"));
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("## User"));
    assert!(written.contains("session_id: sess-42"));
}

#[tokio::test]
async fn test_save_export_failure_is_swallowed() {
    let vault = tempfile::tempdir().unwrap();
    // A file where the export folder should be.
    std::fs::write(vault.path().join("Claude Chats"), "not a dir").unwrap();
    let ctl = finished_conversation().await;

    assert!(ctl.save_export(vault.path()).is_none());
    assert_eq!(ctl.messages().len(), 6);
}
