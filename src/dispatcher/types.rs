//! Core types for the dispatcher state machine

use chrono::{DateTime, Utc};
use ops_desk_types::{ClarificationRequest, CommandResult, InterpretRequest, ResolvedFields};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::CommandError;

// ============================================================================
// Command
// ============================================================================

/// Lifecycle status of a single command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    /// First interpret request in flight
    Submitted,
    AwaitingClarification,
    /// Resubmitted with clarification answers, request in flight
    Executing,
    Succeeded,
    Failed,
    Cancelled,
}

impl CommandStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CommandStatus::Succeeded | CommandStatus::Failed | CommandStatus::Cancelled
        )
    }
}

/// A user-issued command and the context accumulated while resolving it.
///
/// `raw_text` is fixed at creation. `resolved_fields` only ever gains keys:
/// a field, once resolved, is never overwritten or removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    id: Uuid,
    raw_text: String,
    resolved_fields: ResolvedFields,
    status: CommandStatus,
    /// Number of interpret requests issued for this command
    round: u32,
    submitted_at: DateTime<Utc>,
}

impl Command {
    pub(crate) fn new(raw_text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            raw_text: raw_text.into(),
            resolved_fields: ResolvedFields::new(),
            status: CommandStatus::Submitted,
            round: 1,
            submitted_at: Utc::now(),
        }
    }

    /// Correlation id
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn resolved_fields(&self) -> &ResolvedFields {
        &self.resolved_fields
    }

    pub fn status(&self) -> CommandStatus {
        self.status
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn is_resolved(&self, field: &str) -> bool {
        self.resolved_fields.contains_key(field)
    }

    pub(crate) fn set_status(&mut self, status: CommandStatus) {
        self.status = status;
    }

    /// Record an answer and move to the next round.
    pub(crate) fn resolve(&mut self, field: &str, value: Value) {
        self.resolved_fields
            .entry(field.to_string())
            .or_insert(value);
        self.round += 1;
        self.status = CommandStatus::Executing;
    }

    pub(crate) fn ticket(&self) -> InterpretTicket {
        InterpretTicket {
            command_id: self.id,
            round: self.round,
            request: InterpretRequest::new(self.raw_text.clone())
                .with_context(self.resolved_fields.clone()),
        }
    }
}

// ============================================================================
// State Machine
// ============================================================================

/// Dispatcher state
///
/// ```text
/// IDLE ── submit ──► SUBMITTING ──► result ─────────────► SUCCEEDED / FAILED
///   ▲                 │  │  ▲
///   │                 │  │  └── select ──┐
///   │                 │  └── clarify ──► AWAITING_CLARIFICATION ── cancel ──► CANCELLED
///   │                 │                                                        ▲   │
///   │                 └──────────────────────── cancel ────────────────────────┘   │
///   │                                                                              │
///   └────────────────────────────── reset (from any terminal state) ◄──────────────┘
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DispatchState {
    /// No active command
    #[default]
    Idle,

    /// Interpret request in flight
    Submitting { command: Command },

    /// Server asked which value an ambiguous field should take
    AwaitingClarification {
        command: Command,
        clarification: ClarificationRequest,
    },

    Succeeded {
        command: Command,
        result: CommandResult,
    },

    Failed {
        command: Command,
        error: CommandError,
    },

    Cancelled { command: Command },
}

impl DispatchState {
    /// Check if we're idle (can accept a new command)
    pub fn is_idle(&self) -> bool {
        matches!(self, DispatchState::Idle)
    }

    /// A command is in flight or waiting on the user
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            DispatchState::Submitting { .. } | DispatchState::AwaitingClarification { .. }
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DispatchState::Succeeded { .. }
                | DispatchState::Failed { .. }
                | DispatchState::Cancelled { .. }
        )
    }

    pub fn command(&self) -> Option<&Command> {
        match self {
            DispatchState::Idle => None,
            DispatchState::Submitting { command }
            | DispatchState::AwaitingClarification { command, .. }
            | DispatchState::Succeeded { command, .. }
            | DispatchState::Failed { command, .. }
            | DispatchState::Cancelled { command } => Some(command),
        }
    }

    pub fn clarification(&self) -> Option<&ClarificationRequest> {
        match self {
            DispatchState::AwaitingClarification { clarification, .. } => Some(clarification),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&CommandResult> {
        match self {
            DispatchState::Succeeded { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&CommandError> {
        match self {
            DispatchState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            DispatchState::Idle => "idle",
            DispatchState::Submitting { .. } => "submitting",
            DispatchState::AwaitingClarification { .. } => "awaiting_clarification",
            DispatchState::Succeeded { .. } => "succeeded",
            DispatchState::Failed { .. } => "failed",
            DispatchState::Cancelled { .. } => "cancelled",
        }
    }
}

// ============================================================================
// Tickets, completions, events
// ============================================================================

/// One interpret round to run against the service.
///
/// `command_id` + `round` is the correlation key: only the round the
/// dispatcher is currently waiting on may apply its outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpretTicket {
    pub command_id: Uuid,
    pub round: u32,
    pub request: InterpretRequest,
}

/// What happened to an interpret outcome handed to the dispatcher
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Outcome applied; carries the new state
    Applied(DispatchState),
    /// Outcome belonged to a superseded, cancelled or finished round
    Discarded,
}

/// Broadcast when a command leaves the active states
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandEvent {
    Succeeded { command_id: Uuid },
    Failed { command_id: Uuid, error_kind: &'static str },
    Cancelled { command_id: Uuid },
}

impl CommandEvent {
    pub fn command_id(&self) -> Uuid {
        match self {
            CommandEvent::Succeeded { command_id }
            | CommandEvent::Failed { command_id, .. }
            | CommandEvent::Cancelled { command_id } => *command_id,
        }
    }

    /// Succeeded and failed commands leave a server-side history entry.
    pub fn invalidates_history(&self) -> bool {
        matches!(
            self,
            CommandEvent::Succeeded { .. } | CommandEvent::Failed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolve_never_overwrites() {
        let mut command = Command::new("assign laptop");
        command.resolve("staff", json!({"id": 1}));
        command.resolve("staff", json!({"id": 2}));
        assert_eq!(command.resolved_fields()["staff"], json!({"id": 1}));
        assert_eq!(command.round(), 3);
    }

    #[test]
    fn ticket_carries_text_and_context() {
        let mut command = Command::new("assign laptop");
        command.resolve("staff", json!({"id": 1, "label": "Alice"}));
        let ticket = command.ticket();
        assert_eq!(ticket.command_id, command.id());
        assert_eq!(ticket.round, 2);
        assert_eq!(ticket.request.text, "assign laptop");
        assert_eq!(ticket.request.context.len(), 1);
    }

    #[test]
    fn terminal_statuses() {
        assert!(CommandStatus::Cancelled.is_terminal());
        assert!(!CommandStatus::Executing.is_terminal());
        assert!(!CommandStatus::AwaitingClarification.is_terminal());
    }

    #[test]
    fn only_finished_commands_invalidate_history() {
        let id = Uuid::new_v4();
        assert!(CommandEvent::Succeeded { command_id: id }.invalidates_history());
        assert!(CommandEvent::Failed {
            command_id: id,
            error_kind: "network_error"
        }
        .invalidates_history());
        assert!(!CommandEvent::Cancelled { command_id: id }.invalidates_history());
    }
}
