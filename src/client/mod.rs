//! Command Service Client
//!
//! `CommandService` is the only boundary between the desk and the
//! command-interpretation service. The dispatcher and both panels depend on
//! the trait; `HttpCommandService` talks to the real backend and
//! `ScriptedCommandService` replays canned outcomes.

mod http;
mod stub;

pub use http::HttpCommandService;
pub use stub::ScriptedCommandService;

use async_trait::async_trait;
use ops_desk_types::{HistoryEntry, HistoryQuery, InterpretRequest, InterpretResponse, QuickAction};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::CommandError;

pub type Result<T> = std::result::Result<T, CommandError>;

#[async_trait]
pub trait CommandService: Send + Sync {
    /// Interpret a command, carrying any clarification answers gathered so far.
    ///
    /// `correlation_id` identifies the command on the wire; it is not part
    /// of the request body.
    async fn interpret(
        &self,
        correlation_id: Uuid,
        request: &InterpretRequest,
    ) -> Result<InterpretResponse>;

    /// Quick-action templates. Implementations may cache after the first
    /// successful fetch; failures are never cached or retried.
    async fn list_quick_actions(&self) -> Result<Arc<[QuickAction]>>;

    /// Past executions, newest first, filtered server-side.
    async fn get_history(&self, query: &HistoryQuery) -> Result<Vec<HistoryEntry>>;
}
