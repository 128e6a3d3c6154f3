//! Stack machine that owns, stacks and dispatches to states.

use std::any::{Any, TypeId};
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, trace, warn};

use crate::core::{
    MachineId, State, StateHistory, StateId, StateInfo, TransitionKind, TransitionRecord,
};
use crate::fsm::context::Context;
use crate::fsm::error::FsmError;
use crate::fsm::lock::LockGuard;
use crate::fsm::transition::{Command, Hooks};

/// A tracked state and its binding.
///
/// The state itself is taken out of its slot while one of its hooks runs
/// and put back as soon as the hook returns.
pub(crate) struct Entry<O> {
    pub(crate) info: StateInfo,
    state: Option<Box<dyn State<O>>>,
}

impl<O: 'static> Entry<O> {
    /// The state, unless one of its hooks is running.
    pub(crate) fn state(&self) -> Option<&dyn State<O>> {
        self.state.as_deref()
    }

    pub(crate) fn state_mut(&mut self) -> Option<&mut dyn State<O>> {
        let state: &mut dyn State<O> = self.state.as_deref_mut()?;
        Some(state)
    }
}

#[derive(Clone, Copy, Debug)]
enum Hook {
    Entry,
    Update,
    Exit,
    IfFrom(StateInfo, TransitionKind),
}

/// Check that `id` was created by `machine` and is within its registry.
pub(crate) fn check_binding(
    machine: MachineId,
    tracked: usize,
    id: StateId,
) -> Result<(), FsmError> {
    if id.machine() != machine {
        return Err(FsmError::ForeignState { state: id, machine });
    }
    if id.index() >= tracked {
        return Err(FsmError::UnknownState { state: id });
    }
    Ok(())
}

/// Stack-based state machine driving states on behalf of an owner `O`.
///
/// The machine keeps two collections:
/// - every state it has ever created (the tracked states), which it owns and
///   drops together with itself;
/// - a stack of active states, whose topmost entry receives
///   [`update`](StateMachine::update).
///
/// The owner is not stored. Every operation that can run hooks borrows it
/// for the duration of the call, which lets the machine live inside the
/// owner's own struct next to the data the states act on.
///
/// # Example
///
/// ```rust
/// use stackfsm::{Context, State, StateMachine};
///
/// #[derive(Default)]
/// struct Player {
///     log: Vec<&'static str>,
/// }
///
/// #[derive(Default)]
/// struct Walking;
///
/// #[derive(Default)]
/// struct Jumping;
///
/// impl State<Player> for Walking {
///     fn on_entry(&mut self, ctx: &mut Context<'_, Player>) {
///         ctx.owner_mut().log.push("walk");
///     }
///
///     fn on_update(&mut self, ctx: &mut Context<'_, Player>) {
///         if let Some(jump) = ctx.tracked_state::<Jumping>() {
///             ctx.push_state(jump);
///         }
///     }
/// }
///
/// impl State<Player> for Jumping {
///     fn on_entry(&mut self, ctx: &mut Context<'_, Player>) {
///         ctx.owner_mut().log.push("jump");
///     }
///
///     fn on_update(&mut self, ctx: &mut Context<'_, Player>) {
///         ctx.pop_state();
///     }
/// }
///
/// let mut player = Player::default();
/// let mut machine: StateMachine<Player> = StateMachine::new();
/// let walking = machine.create_state::<Walking>();
/// machine.create_state::<Jumping>();
///
/// machine.push_state(&mut player, walking);
/// machine.update(&mut player); // walking pushes jumping
/// machine.update(&mut player); // jumping pops back to walking
///
/// assert_eq!(player.log, vec!["walk", "jump", "walk"]);
/// assert!(machine.get_state::<Walking>().is_some());
/// assert_eq!(machine.stack_len(), 1);
/// ```
pub struct StateMachine<O> {
    id: MachineId,
    tracked: Vec<Entry<O>>,
    stack: Vec<StateId>,
    enabled: bool,
    locked: bool,
    pending: VecDeque<Command>,
    history: StateHistory,
}

impl<O: 'static> Default for StateMachine<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: 'static> StateMachine<O> {
    /// Create an enabled, unlocked machine with an empty stack.
    pub fn new() -> Self {
        Self::with_history(StateHistory::new())
    }

    pub(crate) fn with_history(history: StateHistory) -> Self {
        Self {
            id: MachineId::new(),
            tracked: Vec::new(),
            stack: Vec::new(),
            enabled: true,
            locked: false,
            pending: VecDeque::new(),
            history,
        }
    }

    pub fn id(&self) -> MachineId {
        self.id
    }

    /// Create (or find) the machine's `S` using `S::default()`.
    ///
    /// See [`create_state_with`](StateMachine::create_state_with).
    pub fn create_state<S>(&mut self) -> StateId
    where
        S: State<O> + Default,
    {
        self.create_state_with(S::default)
    }

    /// Create the machine's `S`, or return the one it already tracks.
    ///
    /// The machine holds at most one instance per concrete state type. If an
    /// `S` is already tracked (on the stack or not) its id is returned and
    /// `make` is not called. Otherwise the state built by `make` is bound to
    /// this machine and appended to the tracked states. The stack is never
    /// touched.
    pub fn create_state_with<S, F>(&mut self, make: F) -> StateId
    where
        S: State<O>,
        F: FnOnce() -> S,
    {
        if let Some(id) = self.tracked_state::<S>() {
            return id;
        }

        let state = make();
        let id = StateId::new(self.id, self.tracked.len());
        let info = StateInfo::new(id, state.name(), TypeId::of::<S>());
        debug!(machine = %self.id, state = info.name(), index = id.index(), "state created");
        self.tracked.push(Entry {
            info,
            state: Some(Box::new(state)),
        });
        id
    }

    /// Push `id` onto the stack with every hook enabled.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not created by this machine.
    pub fn push_state(&mut self, owner: &mut O, id: StateId) {
        self.push_state_with(owner, id, Hooks::default());
    }

    /// Push `id` onto the stack running only the given hooks.
    ///
    /// Does nothing while the machine is locked. Otherwise, `on_exit` runs on
    /// the current topmost state (if any), `id` is pushed, then `on_entry` and
    /// `if_from` run on it. Transitions requested by those hooks are applied
    /// before this call returns.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not created by this machine.
    pub fn push_state_with(&mut self, owner: &mut O, id: StateId, hooks: Hooks) {
        if let Err(err) = self.try_push_state_with(owner, id, hooks) {
            panic!("push_state: {err}");
        }
    }

    pub fn try_push_state(&mut self, owner: &mut O, id: StateId) -> Result<(), FsmError> {
        self.try_push_state_with(owner, id, Hooks::default())
    }

    pub fn try_push_state_with(
        &mut self,
        owner: &mut O,
        id: StateId,
        hooks: Hooks,
    ) -> Result<(), FsmError> {
        check_binding(self.id, self.tracked.len(), id)?;
        self.submit(owner, Command::Push { id, hooks });
        Ok(())
    }

    /// Pop the topmost state with every hook enabled.
    pub fn pop_state(&mut self, owner: &mut O) {
        self.pop_state_with(owner, Hooks::default());
    }

    /// Pop the topmost state running only the given hooks.
    ///
    /// Does nothing while the machine is locked or when the stack is empty.
    /// Otherwise `on_exit` runs on the topmost state, it is removed, and, if
    /// a state is exposed underneath, `on_entry` and `if_from` run on it.
    pub fn pop_state_with(&mut self, owner: &mut O, hooks: Hooks) {
        self.submit(owner, Command::Pop { hooks });
    }

    /// Empty the stack without running any hooks.
    ///
    /// States stay tracked and can be pushed again. Does nothing while the
    /// machine is locked.
    pub fn clear_state_stack(&mut self) {
        if self.locked {
            debug!(machine = %self.id, "machine locked, ignoring clear");
            return;
        }
        self.apply_clear();
    }

    /// Run `on_update` on the topmost state.
    ///
    /// Does nothing while the machine is disabled or idle. Transitions the
    /// hook requests, and any requested by the hooks those transitions run,
    /// are applied before this call returns.
    pub fn update(&mut self, owner: &mut O) {
        if !self.enabled {
            trace!(machine = %self.id, "machine disabled, skipping update");
            return;
        }
        let Some(&top) = self.stack.last() else {
            return;
        };
        self.dispatch(owner, top, Hook::Update);
        self.drain(owner);
    }

    pub fn current_state(&self) -> Option<&dyn State<O>> {
        self.stack.last().and_then(|id| self.slot(*id))
    }

    pub fn current_state_mut(&mut self) -> Option<&mut dyn State<O>> {
        let id = *self.stack.last()?;
        self.slot_mut(id)
    }

    pub fn current_state_info(&self) -> Option<StateInfo> {
        self.stack.last().map(|id| self.info(*id))
    }

    /// First state of type `S` on the stack, bottom to top.
    ///
    /// Only the stack is searched; a tracked state that is not currently
    /// stacked is not returned. Use [`tracked_state`](Self::tracked_state)
    /// to find it regardless of stack membership.
    pub fn get_state<S: State<O>>(&self) -> Option<&S> {
        let id = self.stacked_id::<S>()?;
        self.state(id)
    }

    pub fn get_state_mut<S: State<O>>(&mut self) -> Option<&mut S> {
        let id = self.stacked_id::<S>()?;
        self.state_mut(id)
    }

    /// Every stack entry of type `S`, bottom to top.
    pub fn states_by_type<S: State<O>>(&self) -> Vec<&S> {
        self.stack
            .iter()
            .filter_map(|id| self.state::<S>(*id))
            .collect()
    }

    /// State at `index` on the stack, counting from the bottom.
    pub fn state_by_index(&self, index: usize) -> Option<&dyn State<O>> {
        self.stack.get(index).and_then(|id| self.slot(*id))
    }

    /// Typed access to a tracked state by id.
    pub fn state<S: State<O>>(&self, id: StateId) -> Option<&S> {
        if id.machine() != self.id {
            return None;
        }
        self.slot(id)?.downcast_ref::<S>()
    }

    pub fn state_mut<S: State<O>>(&mut self, id: StateId) -> Option<&mut S> {
        if id.machine() != self.id {
            return None;
        }
        self.slot_mut(id)?.downcast_mut::<S>()
    }

    /// Id of the tracked `S`, whether or not it is on the stack.
    pub fn tracked_state<S: Any>(&self) -> Option<StateId> {
        self.tracked
            .iter()
            .find(|entry| entry.info.is::<S>())
            .map(|entry| entry.info.id())
    }

    pub fn state_info(&self, id: StateId) -> Option<StateInfo> {
        if id.machine() != self.id {
            return None;
        }
        self.tracked.get(id.index()).map(|entry| entry.info)
    }

    /// Tracked states in creation order.
    pub fn tracked_states(&self) -> Vec<StateInfo> {
        self.tracked.iter().map(|entry| entry.info).collect()
    }

    /// Stacked states, bottom to top.
    pub fn stack(&self) -> Vec<StateInfo> {
        self.stack.iter().map(|id| self.info(*id)).collect()
    }

    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    pub fn tracked_len(&self) -> usize {
        self.tracked.len()
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Lock the machine until the returned guard is dropped.
    ///
    /// The guard restores the lock flag it found, so nested sections unlock
    /// only when the outermost one ends.
    pub fn lock(&mut self) -> LockGuard<'_, O> {
        LockGuard::new(self)
    }

    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    fn submit(&mut self, owner: &mut O, command: Command) {
        if self.locked {
            debug!(machine = %self.id, ?command, "machine locked, discarding transition request");
            return;
        }
        self.pending.push_back(command);
        self.drain(owner);
    }

    fn drain(&mut self, owner: &mut O) {
        while let Some(command) = self.pending.pop_front() {
            // A hook earlier in the cascade may have locked the machine.
            if self.locked {
                debug!(
                    machine = %self.id,
                    ?command,
                    remaining = self.pending.len(),
                    "machine locked, discarding queued transitions"
                );
                self.pending.clear();
                return;
            }
            match command {
                Command::Push { id, hooks } => self.apply_push(owner, id, hooks),
                Command::Pop { hooks } => self.apply_pop(owner, hooks),
                Command::Clear => self.apply_clear(),
            }
        }
    }

    fn apply_push(&mut self, owner: &mut O, id: StateId, hooks: Hooks) {
        let previous = self.stack.last().copied();
        if let Some(previous) = previous.filter(|_| hooks.exit) {
            self.dispatch(owner, previous, Hook::Exit);
        }

        self.stack.push(id);
        let from = previous.map(|p| self.info(p));
        let to = self.info(id);
        debug!(
            machine = %self.id,
            from = from.map(|f| f.name()),
            to = to.name(),
            depth = self.stack.len(),
            "state pushed"
        );
        self.history.record(TransitionRecord::new(
            TransitionKind::Push,
            from,
            Some(to),
            self.stack.len(),
        ));

        if hooks.entry {
            self.dispatch(owner, id, Hook::Entry);
        }
        if let Some(from) = from.filter(|_| hooks.notify) {
            self.dispatch(owner, id, Hook::IfFrom(from, TransitionKind::Push));
        }
    }

    fn apply_pop(&mut self, owner: &mut O, hooks: Hooks) {
        let Some(&top) = self.stack.last() else {
            trace!(machine = %self.id, "stack empty, nothing to pop");
            return;
        };
        if hooks.exit {
            self.dispatch(owner, top, Hook::Exit);
        }

        self.stack.pop();
        let from = self.info(top);
        let exposed = self.stack.last().copied();
        let to = exposed.map(|e| self.info(e));
        debug!(
            machine = %self.id,
            from = from.name(),
            to = to.map(|t| t.name()),
            depth = self.stack.len(),
            "state popped"
        );
        self.history.record(TransitionRecord::new(
            TransitionKind::Pop,
            Some(from),
            to,
            self.stack.len(),
        ));

        let Some(exposed) = exposed else {
            return;
        };
        if hooks.entry {
            self.dispatch(owner, exposed, Hook::Entry);
        }
        if hooks.notify {
            self.dispatch(owner, exposed, Hook::IfFrom(from, TransitionKind::Pop));
        }
    }

    fn apply_clear(&mut self) {
        let Some(&top) = self.stack.last() else {
            return;
        };
        let from = self.info(top);
        let cleared = self.stack.len();
        self.stack.clear();
        debug!(machine = %self.id, from = from.name(), cleared, "state stack cleared");
        self.history
            .record(TransitionRecord::new(TransitionKind::Clear, Some(from), None, 0));
    }

    /// Run one hook on the tracked state `id`.
    fn dispatch(&mut self, owner: &mut O, id: StateId, hook: Hook) {
        let Some(entry) = self.tracked.get_mut(id.index()) else {
            warn!(machine = %self.id, state = %id, ?hook, "hook targets an untracked state");
            return;
        };
        let this = entry.info;
        let Some(mut state) = entry.state.take() else {
            warn!(machine = %self.id, state = this.name(), ?hook, "state busy, hook skipped");
            return;
        };
        trace!(machine = %self.id, state = this.name(), ?hook, "dispatching hook");

        let mut ctx = Context {
            owner,
            this,
            machine: self.id,
            tracked: &mut self.tracked,
            stack: &self.stack,
            enabled: &mut self.enabled,
            locked: &mut self.locked,
            pending: &mut self.pending,
        };
        match hook {
            Hook::Entry => state.on_entry(&mut ctx),
            Hook::Update => state.on_update(&mut ctx),
            Hook::Exit => state.on_exit(&mut ctx),
            Hook::IfFrom(previous, kind) => state.if_from(&mut ctx, previous, kind),
        }

        if let Some(entry) = self.tracked.get_mut(id.index()) {
            entry.state = Some(state);
        }
    }

    fn stacked_id<S: Any>(&self) -> Option<StateId> {
        self.stack
            .iter()
            .copied()
            .find(|id| self.info(*id).is::<S>())
    }

    /// Binding of a state known to be tracked (stack entries always are).
    fn info(&self, id: StateId) -> StateInfo {
        self.tracked[id.index()].info
    }

    fn slot(&self, id: StateId) -> Option<&dyn State<O>> {
        self.tracked.get(id.index())?.state()
    }

    fn slot_mut(&mut self, id: StateId) -> Option<&mut dyn State<O>> {
        self.tracked.get_mut(id.index())?.state_mut()
    }
}

impl<O: 'static> fmt::Debug for StateMachine<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("id", &self.id)
            .field("enabled", &self.enabled)
            .field("locked", &self.locked)
            .field("tracked", &self.tracked_states())
            .field("stack", &self.stack())
            .finish()
    }
}

impl<O> Drop for StateMachine<O> {
    fn drop(&mut self) {
        trace!(machine = %self.id, tracked = self.tracked.len(), "dropping tracked states");
    }
}
