//! Command dispatch with conversational clarification
//!
//! One `CommandDispatcher` backs one input surface. It owns at most one
//! active [`Command`], carries it through any number of clarification
//! rounds, and publishes a [`CommandEvent`] when the command finishes.
//!
//! Two ways to drive it:
//! - **Sequential**: `submit` / `select` / `select_reply` await the network
//!   and return the resulting state.
//! - **Event loop**: `begin_submit` / `begin_select` return an
//!   [`InterpretTicket`]; the host runs it whenever it likes and hands the
//!   outcome to `complete`, which drops it if the ticket is stale.

mod machine;
mod types;

pub use machine::CommandDispatcher;
pub use types::{
    Command, CommandEvent, CommandStatus, Completion, DispatchState, InterpretTicket,
};
