//! The handle a state receives while one of its hooks runs.

use std::any::Any;
use std::collections::VecDeque;
use tracing::{debug, trace};

use crate::core::{MachineId, State, StateId, StateInfo};
use crate::fsm::error::FsmError;
use crate::fsm::machine::{check_binding, Entry};
use crate::fsm::transition::{Command, Hooks};

/// Access to the owner and the machine from inside a hook.
///
/// The context is the state's only way outward: it lends the owner for the
/// duration of the hook and exposes the machine's transition API.
///
/// Transitions requested here are queued and applied, in request order, as
/// soon as the current hook returns. Queries therefore describe the stack as
/// it was when the hook started. The lock is checked when a transition is
/// requested, so a request made while the machine is locked is discarded.
///
/// Other tracked states can be read and adjusted with
/// [`state`](Context::state) and [`state_mut`](Context::state_mut). The
/// state whose hook is running is lent to that hook and is not reachable
/// here.
pub struct Context<'a, O> {
    pub(crate) owner: &'a mut O,
    pub(crate) this: StateInfo,
    pub(crate) machine: MachineId,
    pub(crate) tracked: &'a mut [Entry<O>],
    pub(crate) stack: &'a [StateId],
    pub(crate) enabled: &'a mut bool,
    pub(crate) locked: &'a mut bool,
    pub(crate) pending: &'a mut VecDeque<Command>,
}

impl<'a, O> Context<'a, O> {
    pub fn owner(&self) -> &O {
        &*self.owner
    }

    pub fn owner_mut(&mut self) -> &mut O {
        &mut *self.owner
    }

    /// The state whose hook is running.
    pub fn this(&self) -> StateInfo {
        self.this
    }

    pub fn machine_id(&self) -> MachineId {
        self.machine
    }

    /// Request a push of `id` with every hook enabled.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not tracked by this machine.
    pub fn push_state(&mut self, id: StateId) {
        self.push_state_with(id, Hooks::default());
    }

    /// Request a push of `id` running only the given hooks.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not tracked by this machine.
    pub fn push_state_with(&mut self, id: StateId, hooks: Hooks) {
        if let Err(err) = self.try_push_state_with(id, hooks) {
            panic!("push_state: {err}");
        }
    }

    pub fn try_push_state(&mut self, id: StateId) -> Result<(), FsmError> {
        self.try_push_state_with(id, Hooks::default())
    }

    pub fn try_push_state_with(&mut self, id: StateId, hooks: Hooks) -> Result<(), FsmError> {
        check_binding(self.machine, self.tracked.len(), id)?;
        self.request(Command::Push { id, hooks });
        Ok(())
    }

    /// Request a pop of the topmost state with every hook enabled.
    pub fn pop_state(&mut self) {
        self.pop_state_with(Hooks::default());
    }

    pub fn pop_state_with(&mut self, hooks: Hooks) {
        self.request(Command::Pop { hooks });
    }

    /// Request the stack be emptied without running any hooks.
    pub fn clear_state_stack(&mut self) {
        self.request(Command::Clear);
    }

    /// Lock or unlock the machine. Takes effect immediately.
    pub fn set_locked(&mut self, locked: bool) {
        *self.locked = locked;
    }

    pub fn is_locked(&self) -> bool {
        *self.locked
    }

    /// Enable or disable update dispatch. Takes effect immediately.
    pub fn set_enabled(&mut self, enabled: bool) {
        *self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        *self.enabled
    }

    pub fn current_state(&self) -> Option<StateInfo> {
        self.stack.last().and_then(|id| self.info(*id))
    }

    /// First stacked state of type `S`, bottom to top.
    pub fn get_state<S: Any>(&self) -> Option<StateInfo> {
        self.stack
            .iter()
            .filter_map(|id| self.info(*id))
            .find(|info| info.is::<S>())
    }

    pub fn state_by_index(&self, index: usize) -> Option<StateInfo> {
        self.stack.get(index).and_then(|id| self.info(*id))
    }

    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    /// Id of the tracked `S`, whether or not it is on the stack.
    pub fn tracked_state<S: Any>(&self) -> Option<StateId> {
        self.tracked
            .iter()
            .find(|entry| entry.info.is::<S>())
            .map(|entry| entry.info.id())
    }

    fn info(&self, id: StateId) -> Option<StateInfo> {
        self.tracked.get(id.index()).map(|entry| entry.info)
    }

    fn request(&mut self, command: Command) {
        if *self.locked {
            debug!(
                machine = %self.machine,
                state = self.this.name(),
                ?command,
                "machine locked, discarding transition request"
            );
            return;
        }
        trace!(machine = %self.machine, state = self.this.name(), ?command, "transition queued");
        self.pending.push_back(command);
    }
}

impl<'a, O: 'static> Context<'a, O> {
    /// Typed access to another tracked state by id.
    pub fn state<S: State<O>>(&self, id: StateId) -> Option<&S> {
        if id.machine() != self.machine {
            return None;
        }
        self.tracked.get(id.index())?.state()?.downcast_ref::<S>()
    }

    pub fn state_mut<S: State<O>>(&mut self, id: StateId) -> Option<&mut S> {
        if id.machine() != self.machine {
            return None;
        }
        self.tracked.get_mut(id.index())?.state_mut()?.downcast_mut::<S>()
    }
}
