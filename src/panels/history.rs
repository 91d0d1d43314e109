//! Command History Panel
//!
//! Read-only view over `GET /commands/history`. Filters are applied by the
//! server: changing one triggers a new fetch, never a local re-slice. One
//! entry at a time may be expanded to show its rendered result.

use ops_desk_types::{AgentKind, HistoryEntry, HistoryQuery, HistoryStatus, RecordId};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::PanelStatus;
use crate::agents::{agent_info, AgentInfo};
use crate::client::CommandService;
use crate::dispatcher::CommandEvent;
use crate::render::{render, DisplayModel};

/// One line of the history list
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    pub entry: HistoryEntry,
    pub agent: &'static AgentInfo,
    pub expanded: bool,
    /// Rendered result, only for the expanded entry and only if it has one
    pub detail: Option<DisplayModel>,
}

pub struct HistoryPanel {
    service: Arc<dyn CommandService>,
    query: HistoryQuery,
    /// Replaced wholesale on every successful fetch
    entries: Arc<[HistoryEntry]>,
    expanded: Option<RecordId>,
    status: PanelStatus,
    stale: bool,
}

impl HistoryPanel {
    pub fn new(service: Arc<dyn CommandService>, limit: usize) -> Self {
        Self {
            service,
            query: HistoryQuery {
                limit,
                ..HistoryQuery::default()
            },
            entries: Arc::from(Vec::new()),
            expanded: None,
            status: PanelStatus::Unloaded,
            stale: true,
        }
    }

    /// First load
    pub async fn mount(&mut self) {
        self.refresh().await;
    }

    /// Refetch with the current filters. On failure the previous entries stay
    /// visible alongside the error.
    pub async fn refresh(&mut self) {
        match self.service.get_history(&self.query).await {
            Ok(entries) => {
                self.entries = entries.into();
                self.status = PanelStatus::Ready;
                self.stale = false;
                if let Some(id) = &self.expanded {
                    if !self.entries.iter().any(|e| &e.id == id) {
                        self.expanded = None;
                    }
                }
            }
            Err(error) => {
                tracing::warn!(error = %error, "history unavailable");
                self.status = PanelStatus::Error(error);
            }
        }
    }

    /// Inline retry control
    pub async fn retry(&mut self) {
        self.refresh().await;
    }

    /// Returns true if the filter changed (and a fetch was made).
    pub async fn set_agent_filter(&mut self, agent: Option<AgentKind>) -> bool {
        if self.query.agent == agent {
            return false;
        }
        self.query.agent = agent;
        self.refresh().await;
        true
    }

    /// Returns true if the filter changed (and a fetch was made).
    pub async fn set_status_filter(&mut self, status: Option<HistoryStatus>) -> bool {
        if self.query.status == status {
            return false;
        }
        self.query.status = status;
        self.refresh().await;
        true
    }

    pub async fn set_limit(&mut self, limit: usize) -> bool {
        if limit == 0 || self.query.limit == limit {
            return false;
        }
        self.query.limit = limit;
        self.refresh().await;
        true
    }

    pub fn query(&self) -> &HistoryQuery {
        &self.query
    }

    pub fn status(&self) -> &PanelStatus {
        &self.status
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Accordion toggle: expanding one entry collapses any other.
    pub fn toggle_expanded(&mut self, id: &RecordId) {
        if self.expanded.as_ref() == Some(id) {
            self.expanded = None;
        } else if self.entries.iter().any(|e| &e.id == id) {
            self.expanded = Some(id.clone());
        }
    }

    pub fn expanded(&self) -> Option<&RecordId> {
        self.expanded.as_ref()
    }

    pub fn rows(&self) -> Vec<HistoryRow> {
        self.entries
            .iter()
            .map(|entry| {
                let expanded = self.expanded.as_ref() == Some(&entry.id);
                HistoryRow {
                    entry: entry.clone(),
                    agent: agent_info(entry.agent),
                    expanded,
                    detail: if expanded {
                        entry.command_result().as_ref().map(render)
                    } else {
                        None
                    },
                }
            })
            .collect()
    }

    /// Mark stale when a command finished; returns whether a refetch is due.
    pub fn handle_event(&mut self, event: &CommandEvent) -> bool {
        if event.invalidates_history() {
            self.stale = true;
        }
        self.stale
    }

    pub async fn refresh_if_stale(&mut self) -> bool {
        if !self.stale {
            return false;
        }
        self.refresh().await;
        true
    }
}

/// Refetch the panel whenever a command succeeds or fails.
///
/// Ends when the dispatcher (the sending side) is dropped.
pub fn spawn_refresh_on_completion(
    panel: Arc<Mutex<HistoryPanel>>,
    mut events: broadcast::Receiver<CommandEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let mut panel = panel.lock().await;
                    if panel.handle_event(&event) {
                        tracing::debug!(command_id = %event.command_id(), "history invalidated");
                        panel.refresh().await;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "history listener lagged; refreshing");
                    panel.lock().await.refresh().await;
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
