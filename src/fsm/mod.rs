//! The stack machine engine.
//!
//! # Key Concepts
//!
//! - **Tracked states**: every state a machine creates, owned by the machine
//! - **Stack**: the active states; only the topmost one is updated
//! - **Context**: what a state sees of its owner and machine during a hook
//! - **Locking**: suppresses push, pop and clear while leaving the rest alone
//!
//! Transitions requested from inside a hook are queued and applied once the
//! hook returns, so hooks never run re-entrantly on the same state.

mod context;
mod error;
mod lock;
mod machine;
mod transition;

pub use context::Context;
pub use error::FsmError;
pub use lock::LockGuard;
pub use machine::StateMachine;
pub use transition::Hooks;
