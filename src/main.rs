mod action;
mod cli;
mod command;
mod config;
mod error;
mod filter;
mod input;
mod model;
mod session;
mod ui;
mod view;

use action::{ActionCanceler, ActionExecutor, ExecError, SystemClock};
use anyhow::{Context, Result, anyhow};
use clap::Parser;
use cli::CliArgs;
use config::RuntimeConfig;
use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use futures::StreamExt;
use input::{Action, InputMode};
use model::{Catalog, ResourceKind};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use session::{Reply, Session, SessionOptions};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Stdout};
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;

// Default collaborators for a session without a live platform behind it:
// every action is acknowledged and logged.
struct TracingExecutor;

impl ActionExecutor for TracingExecutor {
    fn execute(
        &mut self,
        kind: ResourceKind,
        action: &str,
        targets: &[String],
    ) -> Result<(), ExecError> {
        info!(kind = kind.canonical(), action, ?targets, "executing action");
        Ok(())
    }
}

struct TracingCanceler;

impl ActionCanceler for TracingCanceler {
    fn cancel(
        &mut self,
        kind: ResourceKind,
        action: &str,
        targets: &[String],
    ) -> Result<(), ExecError> {
        info!(kind = kind.canonical(), action, ?targets, "cancelling action");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(&args.log_filter)?;

    let config = config::load(args.config.as_deref())?;
    let catalog = load_inventory(&args.inventory)?;
    let kind = ResourceKind::from_token(&args.resource)
        .ok_or_else(|| anyhow!("unknown resource kind '{}'", args.resource))?;

    let mut catalogs = HashMap::new();
    catalogs.insert(args.context.clone(), catalog);
    let session = Session::new(
        catalogs,
        SessionOptions {
            context: args.context.clone(),
            kind,
            read_only: args.read_only,
            actor: args.actor.clone(),
            tuning: config.tuning.clone(),
        },
        Box::new(TracingExecutor),
        Some(Box::new(TracingCanceler)),
        Box::new(SystemClock),
    )
    .map_err(|err| anyhow!(err))?;

    run(session, config).await
}

fn init_tracing(level_filter: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to initialize tracing filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

fn load_inventory(path: &Path) -> Result<Catalog> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read inventory file {}", path.display()))?;
    serde_yaml::from_str(&raw)
        .with_context(|| format!("failed to parse inventory file {}", path.display()))
}

async fn run(mut session: Session, config: RuntimeConfig) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut session, &config, &mut terminal).await;
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<TuiTerminal> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut TuiTerminal) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

struct Shell {
    mode: InputMode,
    input: String,
    status: String,
    pending_g: bool,
}

async fn event_loop(
    session: &mut Session,
    config: &RuntimeConfig,
    terminal: &mut TuiTerminal,
) -> Result<()> {
    let mut events = EventStream::new();
    let mut shell = Shell {
        mode: InputMode::Normal,
        input: String::new(),
        status: "Ready".to_string(),
        pending_g: false,
    };

    loop {
        terminal.draw(|frame| {
            ui::render(
                frame,
                session,
                &shell.input,
                &shell.status,
                shell.mode == InputMode::Prompt,
            )
        })?;

        let Some(event) = events.next().await else {
            return Ok(());
        };
        let Event::Key(key) = event.context("terminal event stream failed")? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(());
        }

        let Some(action) = input::map_key(shell.mode, key) else {
            continue;
        };
        if !matches!(action, Action::GPrefix) {
            shell.pending_g = false;
        }
        let line = match action {
            Action::GPrefix => {
                if shell.pending_g {
                    shell.pending_g = false;
                    Some("gg".to_string())
                } else {
                    shell.pending_g = true;
                    None
                }
            }
            Action::Submit(line) => Some(line),
            Action::StartPrompt(prefix) => {
                shell.mode = InputMode::Prompt;
                shell.input = prefix.to_string();
                None
            }
            Action::InputChar(c) => {
                shell.input.push(c);
                None
            }
            Action::Backspace => {
                shell.input.pop();
                if shell.input.is_empty() {
                    shell.mode = InputMode::Normal;
                }
                None
            }
            Action::CancelPrompt => {
                shell.mode = InputMode::Normal;
                shell.input.clear();
                None
            }
            Action::SubmitPrompt => {
                shell.mode = InputMode::Normal;
                Some(std::mem::take(&mut shell.input))
            }
            Action::HistoryUp => Some(":history up".to_string()),
            Action::HistoryDown => Some(":history down".to_string()),
        };
        let Some(line) = line else {
            continue;
        };

        let line = config.resolve_alias(&line);
        match session.handle(&line) {
            Ok(Reply::Quit) => return Ok(()),
            Ok(Reply::Message(message)) => shell.status = message,
            Ok(Reply::Recall(recalled)) => {
                shell.input = recalled;
                shell.mode = InputMode::Prompt;
            }
            Ok(Reply::None) => shell.status.clear(),
            Err(err) => {
                warn!(%err, line, "command failed");
                shell.status = err.to_string();
            }
        }
    }
}
