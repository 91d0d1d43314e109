//! Read-side panels around the dispatcher
//!
//! Each panel loads independently and keeps its own error for an inline
//! retry control; a failing panel never blocks the dispatcher or the other
//! panel.

pub mod history;
pub mod quick_actions;

pub use history::{spawn_refresh_on_completion, HistoryPanel, HistoryRow};
pub use quick_actions::{GroupKey, QuickActionGroup, QuickActionOutcome, QuickActionsPanel};

use crate::error::CommandError;

/// Load status shown by a panel
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PanelStatus {
    /// Never loaded
    #[default]
    Unloaded,
    Ready,
    /// Last load failed; the panel offers a retry
    Error(CommandError),
}

impl PanelStatus {
    pub fn error(&self) -> Option<&CommandError> {
        match self {
            PanelStatus::Error(e) => Some(e),
            _ => None,
        }
    }
}
