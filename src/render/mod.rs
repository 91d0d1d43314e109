//! Deterministic rendering
//!
//! Turns service payloads into display models using ONLY the fields present
//! in the payload. Nothing here mutates its input or depends on anything
//! but its arguments.

pub mod clarification;
mod result;

pub use clarification::{
    parse_reply, render_clarification, resolve_reply, ClarificationChoice, ClarificationReply,
    ClarificationView, CANCEL_REPLY,
};
pub use result::{render, DisplayModel, SummaryTile, TableView, MAX_TABLE_COLUMNS, MAX_TABLE_ROWS};
