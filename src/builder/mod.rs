//! Builder API for ergonomic state machine construction.
//!
//! The builder registers every reachable state up front and optionally
//! pushes an initial one, which is the usual way a host sets up its machine.

pub mod error;
pub mod machine;

pub use error::BuildError;
pub use machine::StateMachineBuilder;
