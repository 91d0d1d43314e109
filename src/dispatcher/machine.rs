//! Command dispatcher: the clarification state machine
//!
//! # State Machine Dispatch
//!
//! | Current State          | Operation      | Next State                                   |
//! |------------------------|----------------|----------------------------------------------|
//! | Idle                   | submit         | Submitting                                   |
//! | Submitting             | (result)       | Succeeded, or Failed if `success: false`     |
//! | Submitting             | (clarify)      | AwaitingClarification, or Failed (loop/empty)|
//! | Submitting             | (error)        | Failed                                       |
//! | Submitting             | cancel         | Cancelled (in-flight reply is dropped)       |
//! | AwaitingClarification  | select         | Submitting (full resubmit with context)      |
//! | AwaitingClarification  | cancel         | Cancelled                                    |
//! | Succeeded/Failed/Canc. | reset          | Idle                                         |
//!
//! Anything else is refused with a [`DispatchError`] and leaves state alone.
//! The state lock is never held across a network await.

use ops_desk_types::{ClarificationOption, InterpretResponse};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use super::types::{
    Command, CommandEvent, CommandStatus, Completion, DispatchState, InterpretTicket,
};
use crate::client::CommandService;
use crate::error::{CommandError, DispatchError};
use crate::render::clarification::{parse_reply, ClarificationReply};

const EVENT_CAPACITY: usize = 64;

/// Drives one command at a time from submission to a terminal state.
pub struct CommandDispatcher {
    service: Arc<dyn CommandService>,
    state: RwLock<DispatchState>,
    events: broadcast::Sender<CommandEvent>,
}

impl CommandDispatcher {
    pub fn new(service: Arc<dyn CommandService>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            service,
            state: RwLock::new(DispatchState::Idle),
            events,
        }
    }

    /// Snapshot of the current state
    pub async fn state(&self) -> DispatchState {
        self.state.read().await.clone()
    }

    /// Completion events (succeeded, failed, cancelled)
    pub fn subscribe(&self) -> broadcast::Receiver<CommandEvent> {
        self.events.subscribe()
    }

    // ------------------------------------------------------------------
    // Sequential API
    // ------------------------------------------------------------------

    /// Submit a new command and run its first interpret round.
    pub async fn submit(&self, raw_text: &str) -> Result<DispatchState, DispatchError> {
        let ticket = self.begin_submit(raw_text).await?;
        Ok(self.dispatch(ticket).await)
    }

    /// Answer the pending clarification and resubmit.
    pub async fn select(&self, option: &ClarificationOption) -> Result<DispatchState, DispatchError> {
        let ticket = self.begin_select(option).await?;
        Ok(self.dispatch(ticket).await)
    }

    /// Answer the pending clarification from free text ("B", "2", "Alice").
    ///
    /// The cancel word abandons the command instead.
    pub async fn select_reply(&self, reply: &str) -> Result<DispatchState, DispatchError> {
        let option = {
            let state = self.state.read().await;
            let clarification = state
                .clarification()
                .ok_or(DispatchError::NotAwaitingClarification)?;
            match parse_reply(clarification, reply) {
                Some(ClarificationReply::Select(option)) => Some(option.clone()),
                Some(ClarificationReply::Cancel) => None,
                None => return Err(DispatchError::UnknownOption(reply.trim().to_string())),
            }
        };
        match option {
            Some(option) => self.select(&option).await,
            None => self.cancel().await,
        }
    }

    /// Run a ticket against the service and apply the outcome.
    ///
    /// Returns the state after the round; if the outcome was stale the
    /// current (unchanged) state is returned.
    pub async fn dispatch(&self, ticket: InterpretTicket) -> DispatchState {
        let outcome = self
            .service
            .interpret(ticket.command_id, &ticket.request)
            .await;
        match self.complete(&ticket, outcome).await {
            Completion::Applied(state) => state,
            Completion::Discarded => self.state().await,
        }
    }

    // ------------------------------------------------------------------
    // Event-loop API
    // ------------------------------------------------------------------

    /// Create a command and move to `Submitting`. Does not touch the network.
    pub async fn begin_submit(&self, raw_text: &str) -> Result<InterpretTicket, DispatchError> {
        if raw_text.trim().is_empty() {
            return Err(DispatchError::EmptyCommand);
        }

        let mut state = self.state.write().await;
        if !state.is_idle() {
            tracing::debug!(state = state.name(), "submit refused while busy");
            return Err(DispatchError::Busy);
        }

        let command = Command::new(raw_text);
        let ticket = command.ticket();
        tracing::info!(command_id = %command.id(), "command submitted");
        *state = DispatchState::Submitting { command };
        Ok(ticket)
    }

    /// Merge the chosen option into the command context and move to
    /// `Submitting` for the next round.
    pub async fn begin_select(
        &self,
        option: &ClarificationOption,
    ) -> Result<InterpretTicket, DispatchError> {
        let mut state = self.state.write().await;
        let DispatchState::AwaitingClarification {
            command,
            clarification,
        } = &*state
        else {
            return Err(DispatchError::NotAwaitingClarification);
        };

        // Use the option as the server offered it, not as the caller rebuilt it.
        let offered = clarification
            .option(&option.id)
            .ok_or_else(|| DispatchError::UnknownOption(option.id.to_string()))?;

        let mut command = command.clone();
        command.resolve(&clarification.field, offered.to_context_value());
        tracing::info!(
            command_id = %command.id(),
            field = %clarification.field,
            option = %offered.id,
            round = command.round(),
            "clarification resolved"
        );

        let ticket = command.ticket();
        *state = DispatchState::Submitting { command };
        Ok(ticket)
    }

    /// Apply an interpret outcome.
    ///
    /// Outcomes for any round other than the one currently in flight are
    /// dropped without touching state.
    pub async fn complete(
        &self,
        ticket: &InterpretTicket,
        outcome: Result<InterpretResponse, CommandError>,
    ) -> Completion {
        let mut state = self.state.write().await;
        let command = match &*state {
            DispatchState::Submitting { command }
                if command.id() == ticket.command_id && command.round() == ticket.round =>
            {
                command.clone()
            }
            other => {
                tracing::debug!(
                    command_id = %ticket.command_id,
                    round = ticket.round,
                    state = other.name(),
                    "stale interpret response discarded"
                );
                return Completion::Discarded;
            }
        };

        let (next, event) = transition(command, outcome);
        *state = next.clone();
        drop(state);

        if let Some(event) = event {
            // No receivers is fine.
            let _ = self.events.send(event);
        }
        Completion::Applied(next)
    }

    /// Abandon the active command.
    pub async fn cancel(&self) -> Result<DispatchState, DispatchError> {
        let mut state = self.state.write().await;
        let mut command = match &*state {
            DispatchState::Submitting { command }
            | DispatchState::AwaitingClarification { command, .. } => command.clone(),
            _ => return Err(DispatchError::NoActiveCommand),
        };

        command.set_status(CommandStatus::Cancelled);
        let command_id = command.id();
        tracing::info!(%command_id, "command cancelled");
        *state = DispatchState::Cancelled { command };
        let next = state.clone();
        drop(state);

        let _ = self.events.send(CommandEvent::Cancelled { command_id });
        Ok(next)
    }

    /// Return to `Idle` after a terminal state. A no-op when already idle.
    pub async fn reset(&self) -> Result<(), DispatchError> {
        let mut state = self.state.write().await;
        if state.is_active() {
            return Err(DispatchError::NotTerminal);
        }
        *state = DispatchState::Idle;
        Ok(())
    }
}

/// Pure transition out of `Submitting`.
fn transition(
    mut command: Command,
    outcome: Result<InterpretResponse, CommandError>,
) -> (DispatchState, Option<CommandEvent>) {
    match outcome {
        Ok(InterpretResponse::Result(result)) if result.success => {
            command.set_status(CommandStatus::Succeeded);
            tracing::info!(
                command_id = %command.id(),
                rounds = command.round(),
                "command succeeded"
            );
            let event = CommandEvent::Succeeded {
                command_id: command.id(),
            };
            (DispatchState::Succeeded { command, result }, Some(event))
        }
        Ok(InterpretResponse::Result(result)) => fail(command, CommandError::Rejected(result)),
        Ok(InterpretResponse::Clarification(clarification)) => {
            if command.is_resolved(&clarification.field) {
                let field = clarification.field;
                fail(command, CommandError::ResolutionLoop { field })
            } else if clarification.options.is_empty() {
                let field = clarification.field;
                fail(command, CommandError::EmptyOptions { field })
            } else {
                command.set_status(CommandStatus::AwaitingClarification);
                tracing::info!(
                    command_id = %command.id(),
                    field = %clarification.field,
                    options = clarification.options.len(),
                    "clarification requested"
                );
                (
                    DispatchState::AwaitingClarification {
                        command,
                        clarification,
                    },
                    None,
                )
            }
        }
        Err(error) => fail(command, error),
    }
}

fn fail(mut command: Command, error: CommandError) -> (DispatchState, Option<CommandEvent>) {
    command.set_status(CommandStatus::Failed);
    tracing::warn!(
        command_id = %command.id(),
        error_kind = error.kind(),
        error = %error,
        "command failed"
    );
    let event = CommandEvent::Failed {
        command_id: command.id(),
        error_kind: error.kind(),
    };
    (DispatchState::Failed { command, error }, Some(event))
}
