//! Errors raised when a caller breaks the machine's usage contract.

use crate::core::{MachineId, StateId};
use thiserror::Error;

/// Errors that can occur when handing a state to a machine.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FsmError {
    #[error("State {state} belongs to another machine (this machine is {machine})")]
    ForeignState { state: StateId, machine: MachineId },

    #[error("State {state} is not tracked by this machine")]
    UnknownState { state: StateId },
}
