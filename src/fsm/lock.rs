//! Scoped locking of a machine's stack.

use std::ops::{Deref, DerefMut};

use crate::fsm::machine::StateMachine;

/// Keeps a machine locked while alive.
///
/// Created by [`StateMachine::lock`]. Dereferences to the machine, so
/// creation, queries and updates remain available while push, pop and clear
/// are ignored. Dropping the guard restores the lock flag it found.
///
/// # Example
///
/// ```rust
/// use stackfsm::{Context, State, StateMachine};
///
/// #[derive(Default)]
/// struct Idle;
///
/// impl State<()> for Idle {
///     fn on_update(&mut self, _ctx: &mut Context<'_, ()>) {}
/// }
///
/// let mut machine: StateMachine<()> = StateMachine::new();
/// let idle = machine.create_state::<Idle>();
///
/// {
///     let mut locked = machine.lock();
///     locked.push_state(&mut (), idle);
///     assert_eq!(locked.stack_len(), 0);
/// }
///
/// assert!(!machine.is_locked());
/// machine.push_state(&mut (), idle);
/// assert_eq!(machine.stack_len(), 1);
/// ```
pub struct LockGuard<'m, O: 'static> {
    machine: &'m mut StateMachine<O>,
    previous: bool,
}

impl<'m, O: 'static> LockGuard<'m, O> {
    pub(crate) fn new(machine: &'m mut StateMachine<O>) -> Self {
        let previous = machine.is_locked();
        machine.set_locked(true);
        Self { machine, previous }
    }
}

impl<O: 'static> Deref for LockGuard<'_, O> {
    type Target = StateMachine<O>;

    fn deref(&self) -> &Self::Target {
        self.machine
    }
}

impl<O: 'static> DerefMut for LockGuard<'_, O> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.machine
    }
}

impl<O: 'static> Drop for LockGuard<'_, O> {
    fn drop(&mut self) {
        self.machine.set_locked(self.previous);
    }
}
