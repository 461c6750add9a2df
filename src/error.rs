use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExplorerError {
    #[error("missing command prefix in '{0}'")]
    MissingPrefix(String),
    #[error("unknown resource kind '{0}'")]
    UnknownResource(String),
    #[error("unsupported hotkey '{0}'")]
    UnsupportedHotkey(String),
    #[error("invalid command: {0}")]
    InvalidCommand(String),
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
    #[error("invalid action: {0}")]
    InvalidAction(String),
    #[error("no previous view")]
    NoPreviousView,
    #[error("session is read-only")]
    ReadOnly,
    #[error("invalid column selection: {0}")]
    InvalidColumns(String),
    #[error("unknown context '{0}'")]
    UnknownContext(String),
    #[error("'{action}' timed out after {elapsed_ms}ms (limit {limit_ms}ms)")]
    ActionTimeout {
        action: String,
        elapsed_ms: i64,
        limit_ms: i64,
    },
    #[error("'{action}' on {targets} target(s) is destructive, repeat to confirm")]
    ConfirmationRequired { action: String, targets: usize },
    #[error("action failed: {0}")]
    ActionFailed(String),
    #[error("no previous action to cancel")]
    NothingToCancel,
    #[error("no cancel support configured")]
    CancelUnsupported,
}
