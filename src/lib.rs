//! Staff Command Desk
//!
//! Client core for the school-operations natural-language command box.
//! Staff type a request ("assign laptop to new teacher"); the
//! interpretation service routes it to an agent (Fee, Inventory, HR/Task,
//! Broadcast) and either answers or asks which value an ambiguous parameter
//! should take. This crate carries one command through those clarification
//! rounds and presents the results.
//!
//! ```text
//! input ─► CommandDispatcher ─► CommandService ─► result ──────────► render()
//!               ▲                     │                                  │
//!               └── select(option) ◄──┴── clarification                  ▼
//!                                                      HistoryPanel (refetch on event)
//! ```
//!
//! Wire types live in `ops_desk_types` and are re-exported here.

pub mod agents;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod panels;
pub mod render;
pub mod session;

pub use ops_desk_types as types;

pub use agents::{agent_info, all_agents, AgentInfo};
pub use client::{CommandService, HttpCommandService, ScriptedCommandService};
pub use config::DeskConfig;
pub use dispatcher::{
    Command, CommandDispatcher, CommandEvent, CommandStatus, Completion, DispatchState,
    InterpretTicket,
};
pub use error::{CommandError, DispatchError};
pub use panels::{HistoryPanel, PanelStatus, QuickActionsPanel};
pub use render::{render, DisplayModel};
pub use session::SessionContext;
