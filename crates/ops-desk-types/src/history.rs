//! Execution history (`GET /commands/history`)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::agent::{AgentKind, RecordId};
use crate::command::{CommandResult, ResultData};

/// Page size used when the caller does not pick one
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Persisted outcome of a past command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryStatus {
    Success,
    Failed,
    Pending,
}

impl HistoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryStatus::Success => "success",
            HistoryStatus::Failed => "failed",
            HistoryStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for HistoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-owned record of a past execution. Read-only on the client.
///
/// `result` is stored as the server sent it. Older agents persisted a bare
/// message or a row list instead of a structured result, so it is only
/// normalised on demand via [`HistoryEntry::command_result`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: RecordId,
    pub original_text: String,
    pub agent: AgentKind,
    pub status: HistoryStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl HistoryEntry {
    /// Stored result as a `CommandResult`, whatever shape it was saved in.
    ///
    /// `success` falls back to the entry status when the payload has none.
    pub fn command_result(&self) -> Option<CommandResult> {
        let success = self.status != HistoryStatus::Failed;
        match self.result.as_ref()? {
            Value::Null => None,
            Value::Object(object) => Some(CommandResult {
                success: object
                    .get("success")
                    .and_then(Value::as_bool)
                    .unwrap_or(success),
                message: object
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                data: object
                    .get("data")
                    .filter(|data| !data.is_null())
                    .cloned()
                    .map(ResultData::from),
            }),
            Value::String(message) => Some(CommandResult {
                success,
                message: message.clone(),
                data: None,
            }),
            rows @ Value::Array(_) => Some(CommandResult {
                success,
                message: String::new(),
                data: Some(ResultData::from(rows.clone())),
            }),
            other => Some(CommandResult {
                success,
                message: other.to_string(),
                data: None,
            }),
        }
    }
}

/// Server-side history filters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub agent: Option<AgentKind>,
    pub status: Option<HistoryStatus>,
    pub limit: usize,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            agent: None,
            status: None,
            limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl HistoryQuery {
    /// Query-string pairs; absent filters are omitted, `limit` is always sent.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(3);
        if let Some(agent) = self.agent {
            pairs.push(("agent", agent.as_str().to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        pairs.push(("limit", self.limit.to_string()));
        pairs
    }
}
