//! Quick Actions Panel
//!
//! Templates grouped by agent behind a synthetic "All" group. Activating a
//! template either runs it straight away (no required parameters) or stages
//! its text in the input surface for the user to complete.

use ops_desk_types::{AgentKind, QuickAction, RecordId};
use std::sync::Arc;

use super::PanelStatus;
use crate::agents::{agent_info, all_agents};
use crate::client::CommandService;
use crate::dispatcher::{CommandDispatcher, DispatchState};
use crate::error::DispatchError;

/// Group selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupKey {
    #[default]
    All,
    Agent(AgentKind),
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuickActionGroup {
    pub key: GroupKey,
    pub label: String,
    pub actions: Vec<QuickAction>,
}

/// What activating a quick action did
#[derive(Debug, Clone, PartialEq)]
pub enum QuickActionOutcome {
    /// Template was submitted; carries the dispatcher state after the round
    Executed(DispatchState),
    /// Template needs parameters; put this text in the input surface
    Staged { text: String, required_params: Vec<String> },
}

pub struct QuickActionsPanel {
    service: Arc<dyn CommandService>,
    actions: Arc<[QuickAction]>,
    selected: GroupKey,
    status: PanelStatus,
}

impl QuickActionsPanel {
    pub fn new(service: Arc<dyn CommandService>) -> Self {
        Self {
            service,
            actions: Arc::from(Vec::new()),
            selected: GroupKey::All,
            status: PanelStatus::Unloaded,
        }
    }

    /// Load templates. Failures stay on the panel; the previous list is kept.
    pub async fn refresh(&mut self) {
        match self.service.list_quick_actions().await {
            Ok(actions) => {
                self.actions = actions;
                self.status = PanelStatus::Ready;
            }
            Err(error) => {
                tracing::warn!(error = %error, "quick actions unavailable");
                self.status = PanelStatus::Error(error);
            }
        }
    }

    pub fn status(&self) -> &PanelStatus {
        &self.status
    }

    pub fn actions(&self) -> &[QuickAction] {
        &self.actions
    }

    /// "All" first, then one group per agent that has templates, in registry order.
    pub fn groups(&self) -> Vec<QuickActionGroup> {
        let mut groups = vec![QuickActionGroup {
            key: GroupKey::All,
            label: "All".to_string(),
            actions: self.actions.to_vec(),
        }];

        let mut agents: Vec<AgentKind> = all_agents().iter().map(|a| a.kind).collect();
        agents.push(AgentKind::Other);

        for kind in agents {
            let actions: Vec<QuickAction> = self
                .actions
                .iter()
                .filter(|a| a.agent == kind)
                .cloned()
                .collect();
            if !actions.is_empty() {
                groups.push(QuickActionGroup {
                    key: GroupKey::Agent(kind),
                    label: agent_info(kind).display_name.to_string(),
                    actions,
                });
            }
        }

        groups
    }

    pub fn select_group(&mut self, key: GroupKey) {
        self.selected = key;
    }

    pub fn selected_group(&self) -> GroupKey {
        self.selected
    }

    /// Templates in the selected group
    pub fn visible_actions(&self) -> Vec<&QuickAction> {
        self.actions
            .iter()
            .filter(|a| match self.selected {
                GroupKey::All => true,
                GroupKey::Agent(kind) => a.agent == kind,
            })
            .collect()
    }

    /// Run or stage a template.
    ///
    /// Auto-execution goes through the dispatcher so it obeys the same
    /// single-flight rule as typed commands.
    pub async fn activate(
        &self,
        action_id: &RecordId,
        dispatcher: &CommandDispatcher,
    ) -> Result<QuickActionOutcome, DispatchError> {
        let action = self
            .actions
            .iter()
            .find(|a| &a.id == action_id)
            .ok_or_else(|| DispatchError::UnknownQuickAction(action_id.to_string()))?;

        if action.auto_executes() {
            tracing::info!(action = %action.id, agent = %action.agent, "quick action executed");
            let state = dispatcher.submit(&action.command_template).await?;
            Ok(QuickActionOutcome::Executed(state))
        } else {
            tracing::debug!(action = %action.id, "quick action staged");
            Ok(QuickActionOutcome::Staged {
                text: action.command_template.clone(),
                required_params: action.required_params.clone(),
            })
        }
    }
}
