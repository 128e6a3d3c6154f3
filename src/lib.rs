//! Stackfsm: a stack-based state machine embedded in a host object
//!
//! A `StateMachine` owns a set of states and keeps a stack of active ones.
//! Only the topmost state is updated. Pushing a state suspends the one below
//! it, popping resumes it, and every transition runs the entry, exit and
//! "where did I come from" hooks of the states involved.
//!
//! The machine is designed to sit inside the object it drives. It never
//! stores that owner: each call that can run hooks borrows it, and states
//! reach it through the [`Context`] handed to every hook.
//!
//! # Core Concepts
//!
//! - **State**: behaviour for one mode of the owner, via the `State` trait
//! - **Stack**: pushdown of active states; the top one receives updates
//! - **Locking**: freezes the stack while updates keep flowing
//! - **History**: bounded record of every applied push, pop and clear
//!
//! # Example
//!
//! ```rust
//! use stackfsm::{Context, State, StateMachineBuilder};
//!
//! #[derive(Default)]
//! struct Game {
//!     paused: bool,
//!     ticks: u32,
//! }
//!
//! #[derive(Default)]
//! struct Playing;
//!
//! #[derive(Default)]
//! struct Paused;
//!
//! impl State<Game> for Playing {
//!     fn on_update(&mut self, ctx: &mut Context<'_, Game>) {
//!         ctx.owner_mut().ticks += 1;
//!         if ctx.owner().ticks == 2 {
//!             if let Some(paused) = ctx.tracked_state::<Paused>() {
//!                 ctx.push_state(paused);
//!             }
//!         }
//!     }
//! }
//!
//! impl State<Game> for Paused {
//!     fn on_entry(&mut self, ctx: &mut Context<'_, Game>) {
//!         ctx.owner_mut().paused = true;
//!     }
//!
//!     fn on_update(&mut self, _ctx: &mut Context<'_, Game>) {}
//!
//!     fn on_exit(&mut self, ctx: &mut Context<'_, Game>) {
//!         ctx.owner_mut().paused = false;
//!     }
//! }
//!
//! let mut game = Game::default();
//! let mut machine = StateMachineBuilder::new()
//!     .state::<Playing>()
//!     .state::<Paused>()
//!     .initial::<Playing>()
//!     .build(&mut game)
//!     .unwrap();
//!
//! machine.update(&mut game);
//! machine.update(&mut game);
//! assert!(game.paused);
//! assert_eq!(machine.stack_len(), 2);
//!
//! machine.pop_state(&mut game);
//! assert!(!game.paused);
//! assert_eq!(machine.history().get_path(), vec!["Playing", "Paused", "Playing"]);
//! ```

pub mod builder;
pub mod core;
pub mod fsm;
pub mod snapshot;

// Re-export commonly used types
pub use builder::{BuildError, StateMachineBuilder};
pub use core::{
    AsAny, MachineId, State, StateHistory, StateId, StateInfo, TransitionKind, TransitionRecord,
    DEFAULT_HISTORY_LIMIT,
};
pub use fsm::{Context, FsmError, Hooks, LockGuard, StateMachine};
pub use snapshot::{MachineSnapshot, SnapshotError};
