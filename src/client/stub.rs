//! In-memory command service that replays scripted outcomes.
//!
//! Interpret outcomes are consumed in order; history is filtered and sorted
//! the way the backend does it, so panels can be exercised without a server.

use async_trait::async_trait;
use ops_desk_types::{HistoryEntry, HistoryQuery, InterpretRequest, InterpretResponse, QuickAction};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use super::{CommandService, Result};
use crate::error::CommandError;

#[derive(Default)]
pub struct ScriptedCommandService {
    interpret_outcomes: Mutex<VecDeque<Result<InterpretResponse>>>,
    interpret_calls: Mutex<Vec<(Uuid, InterpretRequest)>>,
    quick_actions: Mutex<Vec<QuickAction>>,
    quick_action_failures: Mutex<VecDeque<CommandError>>,
    quick_action_calls: Mutex<usize>,
    history: Mutex<Vec<HistoryEntry>>,
    history_failures: Mutex<VecDeque<CommandError>>,
    history_calls: Mutex<Vec<HistoryQuery>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedCommandService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next interpret outcome
    pub fn push_interpret(&self, outcome: Result<InterpretResponse>) -> &Self {
        lock(&self.interpret_outcomes).push_back(outcome);
        self
    }

    pub fn with_quick_actions(self, actions: Vec<QuickAction>) -> Self {
        *lock(&self.quick_actions) = actions;
        self
    }

    /// Fail the next quick-action fetch
    pub fn fail_next_quick_actions(&self, error: CommandError) {
        lock(&self.quick_action_failures).push_back(error);
    }

    /// Replace the server-side history
    pub fn set_history(&self, entries: Vec<HistoryEntry>) {
        *lock(&self.history) = entries;
    }

    /// Fail the next history fetch
    pub fn fail_next_history(&self, error: CommandError) {
        lock(&self.history_failures).push_back(error);
    }

    /// Every interpret request seen, in order
    pub fn interpret_calls(&self) -> Vec<(Uuid, InterpretRequest)> {
        lock(&self.interpret_calls).clone()
    }

    pub fn quick_action_calls(&self) -> usize {
        *lock(&self.quick_action_calls)
    }

    /// Every history query seen, in order
    pub fn history_calls(&self) -> Vec<HistoryQuery> {
        lock(&self.history_calls).clone()
    }
}

#[async_trait]
impl CommandService for ScriptedCommandService {
    async fn interpret(
        &self,
        correlation_id: Uuid,
        request: &InterpretRequest,
    ) -> Result<InterpretResponse> {
        lock(&self.interpret_calls).push((correlation_id, request.clone()));
        lock(&self.interpret_outcomes)
            .pop_front()
            .unwrap_or_else(|| Err(CommandError::network("no scripted response left")))
    }

    async fn list_quick_actions(&self) -> Result<Arc<[QuickAction]>> {
        *lock(&self.quick_action_calls) += 1;
        if let Some(error) = lock(&self.quick_action_failures).pop_front() {
            return Err(error);
        }
        Ok(lock(&self.quick_actions).clone().into())
    }

    async fn get_history(&self, query: &HistoryQuery) -> Result<Vec<HistoryEntry>> {
        lock(&self.history_calls).push(query.clone());
        if let Some(error) = lock(&self.history_failures).pop_front() {
            return Err(error);
        }

        let mut entries: Vec<HistoryEntry> = lock(&self.history)
            .iter()
            .filter(|e| query.agent.map_or(true, |agent| e.agent == agent))
            .filter(|e| query.status.map_or(true, |status| e.status == status))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(query.limit);
        Ok(entries)
    }
}
