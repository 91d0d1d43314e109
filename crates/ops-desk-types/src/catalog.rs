//! Quick-action templates (`GET /commands/quick-actions`)

use serde::{Deserialize, Serialize};

use crate::agent::{AgentKind, RecordId};

/// Pre-authored command template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickAction {
    pub id: RecordId,
    pub agent: AgentKind,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    pub command_template: String,
    /// Placeholders in `command_template` the user must fill before submitting
    #[serde(default)]
    pub required_params: Vec<String>,
}

impl QuickAction {
    /// Templates with no required parameters run as-is.
    pub fn auto_executes(&self) -> bool {
        self.required_params.is_empty()
    }
}
