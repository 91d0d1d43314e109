//! Shared API Types for the Staff Command Desk
//!
//! This crate is the SINGLE SOURCE OF TRUTH for all types crossing the
//! command-interpretation service boundary.
//!
//! ## Boundary
//!
//! ```text
//! ┌──────────────────┐         ┌────────────────────────┐
//! │  Command desk    │  JSON   │  Interpretation        │
//! │  (ops-desk)      │ ◄─────► │  service (agents, NLU) │
//! └──────────────────┘         └────────────────────────┘
//! ```
//!
//! ## Rules
//!
//! 1. All wire types live here - no inline struct definitions in the client
//! 2. The interpret response is decoded into an explicit two-variant enum at
//!    the boundary; anything that is neither variant is rejected
//! 3. Record ids accept either JSON numbers or strings

pub mod agent;
pub mod catalog;
pub mod command;
pub mod history;

pub use agent::{AgentKind, RecordId};
pub use catalog::QuickAction;
pub use command::{
    ClarificationOption, ClarificationRequest, CommandResult, InterpretRequest,
    InterpretResponse, MalformedPayload, Metric, ResolvedFields, ResultData, StatusCount,
};
pub use history::{HistoryEntry, HistoryQuery, HistoryStatus, DEFAULT_HISTORY_LIMIT};

pub(crate) fn default_true() -> bool {
    true
}
