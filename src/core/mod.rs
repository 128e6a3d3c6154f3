//! Core state types.
//!
//! This module contains the pieces every machine is built from:
//! - The `State` trait implemented by host-defined states
//! - Identity handles binding a state to its machine
//! - Bounded history of stack transitions

mod history;
mod id;
mod state;

pub use history::{StateHistory, TransitionKind, TransitionRecord, DEFAULT_HISTORY_LIMIT};
pub use id::{MachineId, StateId, StateInfo};
pub use state::{AsAny, State};

pub(crate) use state::short_type_name;
