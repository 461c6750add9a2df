use crate::error::ExplorerError;
use crate::model::ResourceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOnlyMode {
    On,
    Off,
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Noop,
    Quit,
    Help,
    ReadOnly(ReadOnlyMode),
    LastView,
    Filter(String),
    View(ResourceKind),
    Action(String),
    History(HistoryDirection),
    Suggest(String),
    Context(Option<String>),
    Hotkey(String),
}

pub fn parse(line: &str) -> Result<Command, ExplorerError> {
    if line == " " {
        return Ok(Command::Hotkey("SPACE".to_string()));
    }
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(Command::Noop);
    }

    if trimmed == "?" {
        return Ok(Command::Help);
    }
    if let Some(rest) = trimmed.strip_prefix(':') {
        return parse_colon(trimmed, rest);
    }
    if let Some(rest) = trimmed.strip_prefix('/') {
        return Ok(Command::Filter(rest.to_string()));
    }
    if let Some(rest) = trimmed.strip_prefix('!') {
        let action = rest.trim().to_ascii_lowercase();
        if action.is_empty() {
            return Err(ExplorerError::InvalidAction("empty action".to_string()));
        }
        return Ok(Command::Action(action));
    }

    Ok(Command::Hotkey(trimmed.to_ascii_uppercase()))
}

fn parse_colon(full: &str, rest: &str) -> Result<Command, ExplorerError> {
    if rest.is_empty() {
        return Err(ExplorerError::MissingPrefix(full.to_string()));
    }
    if rest == "-" {
        return Ok(Command::LastView);
    }

    let mut tokens = rest.split_whitespace();
    let word = tokens.next().unwrap_or_default().to_ascii_lowercase();
    let args: Vec<&str> = tokens.collect();

    match word.as_str() {
        "q" | "quit" => Ok(Command::Quit),
        "h" | "help" => Ok(Command::Help),
        "ro" | "readonly" => match args.as_slice() {
            [] => Ok(Command::ReadOnly(ReadOnlyMode::Toggle)),
            ["on"] => Ok(Command::ReadOnly(ReadOnlyMode::On)),
            ["off"] => Ok(Command::ReadOnly(ReadOnlyMode::Off)),
            ["toggle"] => Ok(Command::ReadOnly(ReadOnlyMode::Toggle)),
            [other, ..] => Err(ExplorerError::InvalidCommand(format!(
                "readonly takes on|off|toggle, got '{other}'"
            ))),
        },
        "history" => match args.as_slice() {
            ["up"] => Ok(Command::History(HistoryDirection::Up)),
            ["down"] => Ok(Command::History(HistoryDirection::Down)),
            _ => Err(ExplorerError::InvalidCommand(
                "history takes up|down".to_string(),
            )),
        },
        "suggest" => Ok(Command::Suggest(args.join(" ").to_ascii_lowercase())),
        "ctx" => match args.as_slice() {
            [] => Ok(Command::Context(None)),
            [name] => Ok(Command::Context(Some(name.to_string()))),
            _ => Err(ExplorerError::InvalidCommand(
                "ctx takes at most one name".to_string(),
            )),
        },
        // Trailing arguments after a resource alias are accepted and ignored.
        _ => match ResourceKind::from_token(&word) {
            Some(kind) => Ok(Command::View(kind)),
            None => Err(ExplorerError::UnknownResource(word)),
        },
    }
}
