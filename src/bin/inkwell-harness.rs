use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use inkwell::chat::ControllerEvent;
use inkwell::host::FileHost;
use inkwell::panel::{ChatPlugin, PanelAction, PanelEffect, demo};
use inkwell::render::{BlockKind, render_message};
use inkwell_agent::{AgentBackend, ClaudeCliBackend, ScriptedBackend};
use inkwell_config::Settings;
use tokio::sync::mpsc;

#[derive(Debug, Parser)]
#[command(
    name = "inkwell-harness",
    about = "Send one prompt through inkwell's real session pipeline and print the chat blocks"
)]
struct Args {
    /// Prompt to send
    #[arg(long, default_value = "Say hello and tell me which directory you are working in.")]
    prompt: String,

    /// Run a quick-prompt command (e.g. `summarize`) with --selection instead of --prompt
    #[arg(long)]
    command: Option<String>,

    /// Selected text passed to --command
    #[arg(long)]
    selection: Option<String>,

    /// Vault root / agent working directory (defaults to current directory)
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// Document treated as the active note
    #[arg(long)]
    file: Option<PathBuf>,

    /// Append the active note to the prompt
    #[arg(long)]
    file_context: bool,

    /// Model override for this run (settings are not modified)
    #[arg(long)]
    model: Option<String>,

    /// Resume an existing session id
    #[arg(long)]
    resume: Option<String>,

    /// Settings file (defaults to ~/.config/inkwell/settings.yaml)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Export the conversation into the vault after the turn
    #[arg(long)]
    export: bool,

    /// Replay the example transcript instead of calling the Claude CLI
    #[arg(long)]
    replay: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings_path = args.settings.clone().unwrap_or_else(Settings::config_path);
    // Creates the file with defaults on first run.
    let settings = Settings::load_from(&settings_path)
        .with_context(|| format!("Failed to load settings from {:?}", settings_path))?;

    if args.replay {
        run(args, settings_path, Arc::new(ScriptedBackend::new(demo::example_events()))).await
    } else {
        let backend = ClaudeCliBackend::from_command(settings.cli_command.as_deref())?;
        run(args, settings_path, Arc::new(backend)).await
    }
}

async fn run<B: AgentBackend>(args: Args, settings_path: PathBuf, backend: Arc<B>) -> Result<()> {
    let cwd = match &args.cwd {
        Some(cwd) => cwd.clone(),
        None => std::env::current_dir()?,
    };
    let mut host = FileHost::new(&cwd, settings_path);
    host.active_document = args.file.clone();
    host.selection = args.selection.clone();

    let mut plugin = ChatPlugin::new(backend);
    plugin.load(&mut host);

    let controller = plugin.activate_panel(&mut host).controller().clone();
    let mut settings = plugin.settings().clone();
    if let Some(model) = &args.model {
        settings.model = model.clone();
    }
    settings.include_file_context |= args.file_context;
    controller.set_settings(settings);
    if let Some(session_id) = &args.resume {
        controller.resume(session_id.clone());
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    controller.set_event_sender(Some(tx));
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                ControllerEvent::MessageAdded(message) => {
                    for block in render_message(&message) {
                        let marker = match block.kind {
                            BlockKind::UserText => ">",
                            BlockKind::AssistantText => "<",
                            BlockKind::ToolUse | BlockKind::ToolResult => "~",
                            BlockKind::Result => "=",
                            BlockKind::Notice => "*",
                            BlockKind::Error => "!",
                        };
                        match &block.title {
                            Some(title) => println!("{marker} [{}] {title}", block.icon),
                            None => println!("{marker} [{}]", block.icon),
                        }
                        if !block.body.is_empty() && !block.collapsed {
                            println!("{}", block.body);
                        }
                    }
                }
                ControllerEvent::SessionStarted(id) => println!("[session] {id}"),
                ControllerEvent::BusyChanged(_) | ControllerEvent::Cleared => {}
            }
        }
    });

    let canceller = {
        let controller = controller.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("[cancel] ctrl-c");
                controller.cancel();
            }
        })
    };

    let effect = match &args.command {
        Some(command) => plugin.run_command(&mut host, command).await,
        None => {
            plugin
                .activate_panel(&mut host)
                .dispatch(PanelAction::Send(args.prompt.clone()))
                .await
        }
    };
    if effect == PanelEffect::Rejected {
        eprintln!("[harness] prompt was rejected");
    }

    if args.export {
        match plugin.activate_panel(&mut host).dispatch(PanelAction::Export).await {
            PanelEffect::Exported(Some(path)) => println!("[export] {}", path.display()),
            _ => eprintln!("[export] nothing written"),
        }
    }

    if let Some(session_id) = controller.session_id() {
        println!("[done] session {session_id} (resume with --resume {session_id})");
    }

    canceller.abort();
    controller.set_event_sender(None);
    plugin.close_panel();
    let _ = printer.await;
    Ok(())
}
