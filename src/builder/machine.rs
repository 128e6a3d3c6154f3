//! Builder for constructing state machines.

use crate::builder::error::BuildError;
use crate::core::{short_type_name, State, StateHistory, StateId, DEFAULT_HISTORY_LIMIT};
use crate::fsm::StateMachine;
use std::any::{type_name, TypeId};

type Factory<O> = Box<dyn FnOnce(&mut StateMachine<O>) -> StateId>;

struct Registration<O> {
    type_id: TypeId,
    name: &'static str,
    create: Factory<O>,
}

/// Builder for constructing state machines with a fluent API.
///
/// States are created in registration order. When an initial state is set,
/// [`build`](StateMachineBuilder::build) pushes it with every hook enabled
/// before applying the configured flags, so a machine built locked still
/// starts in its initial state.
///
/// # Example
///
/// ```rust
/// use stackfsm::{Context, State, StateMachineBuilder};
///
/// #[derive(Default)]
/// struct Lamp {
///     lit: bool,
/// }
///
/// #[derive(Default)]
/// struct On;
///
/// #[derive(Default)]
/// struct Off;
///
/// impl State<Lamp> for On {
///     fn on_entry(&mut self, ctx: &mut Context<'_, Lamp>) {
///         ctx.owner_mut().lit = true;
///     }
///
///     fn on_update(&mut self, _ctx: &mut Context<'_, Lamp>) {}
/// }
///
/// impl State<Lamp> for Off {
///     fn on_update(&mut self, _ctx: &mut Context<'_, Lamp>) {}
/// }
///
/// let mut lamp = Lamp::default();
/// let machine = StateMachineBuilder::new()
///     .state::<Off>()
///     .state::<On>()
///     .initial::<On>()
///     .build(&mut lamp)
///     .unwrap();
///
/// assert!(lamp.lit);
/// assert_eq!(machine.tracked_len(), 2);
/// assert!(machine.get_state::<On>().is_some());
/// ```
pub struct StateMachineBuilder<O> {
    enabled: bool,
    locked: bool,
    history_limit: usize,
    registrations: Vec<Registration<O>>,
    initial: Option<(TypeId, &'static str)>,
}

impl<O: 'static> StateMachineBuilder<O> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            enabled: true,
            locked: false,
            history_limit: DEFAULT_HISTORY_LIMIT,
            registrations: Vec::new(),
            initial: None,
        }
    }

    /// Register a state created with `S::default()`.
    pub fn state<S>(self) -> Self
    where
        S: State<O> + Default,
    {
        self.state_with(S::default)
    }

    /// Register a state created by `make`.
    pub fn state_with<S, F>(mut self, make: F) -> Self
    where
        S: State<O>,
        F: FnOnce() -> S + 'static,
    {
        self.registrations.push(Registration {
            type_id: TypeId::of::<S>(),
            name: short_type_name(type_name::<S>()),
            create: Box::new(move |machine: &mut StateMachine<O>| machine.create_state_with(make)),
        });
        self
    }

    /// Set the state pushed once the machine is built (optional).
    pub fn initial<S: State<O>>(mut self) -> Self {
        self.initial = Some((TypeId::of::<S>(), short_type_name(type_name::<S>())));
        self
    }

    /// Whether `update` dispatches (default `true`).
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Whether push, pop and clear are ignored (default `false`).
    pub fn locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    /// Number of transition records kept; zero disables history.
    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Build the state machine, pushing the initial state if one was set.
    ///
    /// Returns an error if a state type was registered twice or the initial
    /// state was never registered. Duplicates are reported under the name
    /// the state gives itself; an unregistered initial state, never having
    /// been created, is reported under its type name. No hook runs unless
    /// the build succeeds.
    pub fn build(self, owner: &mut O) -> Result<StateMachine<O>, BuildError> {
        let mut machine = StateMachine::with_history(StateHistory::with_limit(self.history_limit));
        let mut initial = None;
        for registration in self.registrations {
            let tracked = machine.tracked_len();
            let id = (registration.create)(&mut machine);
            if machine.tracked_len() == tracked {
                let name = machine
                    .state_info(id)
                    .map_or(registration.name, |info| info.name());
                return Err(BuildError::DuplicateState { name });
            }
            if self.initial.is_some_and(|(type_id, _)| type_id == registration.type_id) {
                initial = Some(id);
            }
        }

        match (self.initial, initial) {
            (Some((_, name)), None) => return Err(BuildError::InitialStateNotRegistered { name }),
            (_, Some(id)) => machine.push_state(owner, id),
            (None, None) => {}
        }
        machine.set_enabled(self.enabled);
        machine.set_locked(self.locked);

        Ok(machine)
    }
}

impl<O: 'static> Default for StateMachineBuilder<O> {
    fn default() -> Self {
        Self::new()
    }
}
