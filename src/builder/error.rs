//! Build errors for the state machine builder.

use thiserror::Error;

/// Errors that can occur when building a state machine.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BuildError {
    #[error("State '{name}' registered more than once. Each state type may be registered once")]
    DuplicateState { name: &'static str },

    #[error("Initial state '{name}' is not registered. Call .state::<{name}>() before .build()")]
    InitialStateNotRegistered { name: &'static str },
}
