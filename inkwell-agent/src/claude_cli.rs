//! Backend that runs the Claude Code CLI in headless `stream-json` mode.
//!
//! One child process per query. Stdout lines are parsed as JSON and forwarded
//! in arrival order; stderr is logged. The child is spawned with
//! `kill_on_drop`, so dropping the [`EventStream`] (which aborts the reader
//! task that owns the child) terminates the process.

use std::collections::VecDeque;
use std::process::Stdio;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::backend::{AgentBackend, EventSender, EventStream, QueryRequest};
use crate::error::AgentError;

/// Default executable name searched on `PATH`.
pub const DEFAULT_CLI: &str = "claude";

/// Number of stderr lines kept to explain a failed exit.
const STDERR_TAIL_LINES: usize = 8;

/// Runs `claude -p <prompt> --output-format stream-json --verbose ...`.
#[derive(Debug, Clone)]
pub struct ClaudeCliBackend {
    program: String,
    base_args: Vec<String>,
}

impl Default for ClaudeCliBackend {
    fn default() -> Self {
        Self {
            program: DEFAULT_CLI.to_string(),
            base_args: Vec::new(),
        }
    }
}

impl ClaudeCliBackend {
    /// Build from an optional command-line override such as
    /// `"npx @anthropic-ai/claude-code"`. The override is split with shell
    /// quoting rules and spawned directly, without a shell.
    pub fn from_command(command: Option<&str>) -> Result<Self, AgentError> {
        let Some(command) = command.map(str::trim).filter(|c| !c.is_empty()) else {
            return Ok(Self::default());
        };
        let mut words = shell_words::split(command)
            .map_err(|e| AgentError::Config(format!("cannot parse CLI command: {e}")))?;
        if words.is_empty() {
            return Err(AgentError::Config("CLI command is empty".to_string()));
        }
        let program = words.remove(0);
        Ok(Self {
            program,
            base_args: words,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Full argument list for one request (excluding the program).
    pub fn build_args(&self, request: &QueryRequest) -> Vec<String> {
        let mut args = self.base_args.clone();
        args.extend([
            "-p".to_string(),
            request.prompt.clone(),
            "--output-format".to_string(),
            "stream-json".to_string(),
            "--verbose".to_string(),
        ]);
        if !request.model.trim().is_empty() {
            args.push("--model".to_string());
            args.push(request.model.clone());
        }
        if let Some(session_id) = request.resume.as_deref().filter(|s| !s.is_empty()) {
            args.push("--resume".to_string());
            args.push(session_id.to_string());
        }
        if let Some(prompt) = request
            .system_prompt
            .as_deref()
            .filter(|s| !s.trim().is_empty())
        {
            args.push("--append-system-prompt".to_string());
            args.push(prompt.to_string());
        }
        args
    }
}

impl AgentBackend for ClaudeCliBackend {
    fn open(&self, request: QueryRequest) -> Result<EventStream, AgentError> {
        let args = self.build_args(&request);
        log::info!(
            "spawning {} (model={}, resume={:?}) in cwd={}",
            self.program,
            request.model,
            request.resume,
            request.cwd.display()
        );

        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if !request.cwd.as_os_str().is_empty() {
            command.current_dir(&request.cwd);
        }
        if let Some(key) = request.api_key.as_deref().filter(|k| !k.is_empty()) {
            command.env("ANTHROPIC_API_KEY", key);
        }

        let mut child = command.spawn().map_err(|source| AgentError::Spawn {
            command: self.program.clone(),
            source,
        })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AgentError::backend("failed to capture CLI stdout"))?;
        let stderr = child.stderr.take();

        let (tx, stream) = EventStream::channel();
        let program = self.program.clone();
        let handle = tokio::spawn(async move {
            let stderr_task = stderr.map(|stderr| tokio::spawn(collect_stderr(stderr, program)));

            let saw_result = forward_stdout(stdout, &tx).await;

            let status = child.wait().await;
            let stderr_tail = match stderr_task {
                Some(task) => task.await.unwrap_or_default(),
                None => Vec::new(),
            };
            match status {
                Ok(status) if status.success() => {
                    log::debug!("claude CLI exited cleanly");
                }
                Ok(status) if !saw_result => {
                    let detail = if stderr_tail.is_empty() {
                        format!("Claude CLI exited with {status}")
                    } else {
                        format!("Claude CLI exited with {status}: {}", stderr_tail.join("\n"))
                    };
                    let _ = tx.send(Err(AgentError::backend(detail)));
                }
                Ok(status) => {
                    log::warn!("claude CLI exited with {status} after its result event");
                }
                Err(e) => {
                    let _ = tx.send(Err(AgentError::Io(e)));
                }
            }
        });

        Ok(stream.with_producer(handle))
    }
}

/// Forward stdout lines as JSON events. Returns whether a `result` event was
/// seen.
async fn forward_stdout(stdout: tokio::process::ChildStdout, tx: &EventSender) -> bool {
    let mut lines = BufReader::new(stdout).lines();
    let mut saw_result = false;
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<Value>(line) {
                    Ok(value) => {
                        if value.get("type").and_then(Value::as_str) == Some("result") {
                            saw_result = true;
                        }
                        if tx.send(Ok(value)).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        log::warn!("{}", AgentError::Protocol(format!("{e}: {line}")));
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                let _ = tx.send(Err(AgentError::Io(e)));
                break;
            }
        }
    }
    saw_result
}

/// Log stderr and keep the last few lines for error reporting.
async fn collect_stderr(stderr: tokio::process::ChildStderr, program: String) -> Vec<String> {
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        log::warn!("{program} stderr: {trimmed}");
        if tail.len() == STDERR_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(trimmed.to_string());
    }
    tail.into_iter().collect()
}
