//! Error taxonomy for the command desk
//!
//! [`CommandError`] is what a command fails *with*: it is stored in the
//! dispatcher's `Failed` state and therefore `Clone`.
//! [`DispatchError`] is what a caller gets for driving the state machine
//! out of order; it never changes state.

use ops_desk_types::{CommandResult, MalformedPayload};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    /// Request never reached the server or never came back (offline, DNS, timeout)
    #[error("network error: {message}")]
    Network { message: String, timed_out: bool },

    /// Non-2xx HTTP response
    #[error("server error: HTTP {status}")]
    Server { status: u16, body: String },

    /// 2xx response that is neither a result nor a clarification
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Server re-asked a field this command already resolved
    #[error("resolution loop: `{field}` was already resolved")]
    ResolutionLoop { field: String },

    /// Clarification arrived with nothing to choose from
    #[error("clarification for `{field}` has no options")]
    EmptyOptions { field: String },

    /// Agent answered with `success: false`
    #[error("command rejected: {}", .0.message)]
    Rejected(CommandResult),
}

impl CommandError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            timed_out: false,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            timed_out: true,
        }
    }

    /// Short machine-readable kind, used in logs and UI banners
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network_error",
            Self::Server { .. } => "server_error",
            Self::MalformedResponse(_) => "malformed_response",
            Self::ResolutionLoop { .. } => "resolution_loop",
            Self::EmptyOptions { .. } => "empty_options",
            Self::Rejected(_) => "rejected",
        }
    }

    /// Whether a fresh submit of the same text has a reasonable chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Server { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<MalformedPayload> for CommandError {
    fn from(err: MalformedPayload) -> Self {
        Self::MalformedResponse(err.0)
    }
}

impl From<reqwest::Error> for CommandError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(err.to_string())
        } else if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Server {
                status: status.as_u16(),
                body: String::new(),
            }
        } else {
            Self::network(err.to_string())
        }
    }
}

/// Caller drove the dispatcher out of order
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("a command is already in progress")]
    Busy,

    #[error("command text is empty")]
    EmptyCommand,

    #[error("no clarification is pending")]
    NotAwaitingClarification,

    #[error("no command is in progress")]
    NoActiveCommand,

    #[error("option `{0}` is not offered by the pending clarification")]
    UnknownOption(String),

    #[error("quick action `{0}` is not available")]
    UnknownQuickAction(String),

    #[error("the current command has not finished")]
    NotTerminal,
}
