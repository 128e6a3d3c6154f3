//! Core State trait for stack machine states.
//!
//! A state is a unit of behaviour bound to one owner type and one machine.
//! The machine calls the hooks below as the state moves on and off the top
//! of its stack.

use std::any::{type_name, Any};

use super::history::TransitionKind;
use super::id::StateInfo;
use crate::fsm::Context;

/// Object-safe access to [`Any`] for every `'static` type.
///
/// Used by the machine to hand back concrete state types from its
/// `dyn State<O>` registry.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Trait for states driven by a [`StateMachine`](crate::fsm::StateMachine).
///
/// `O` is the owner: the host object the state acts upon. The owner is lent
/// to every hook through the [`Context`], together with the machine's
/// transition API, so a state can read and mutate its owner and request
/// pushes or pops without holding a reference to either.
///
/// Only [`on_update`](State::on_update) is required.
///
/// # Example
///
/// ```rust
/// use stackfsm::{Context, State};
///
/// struct Door {
///     open: bool,
/// }
///
/// #[derive(Default)]
/// struct Opening;
///
/// impl State<Door> for Opening {
///     fn on_entry(&mut self, ctx: &mut Context<'_, Door>) {
///         ctx.owner_mut().open = true;
///     }
///
///     fn on_update(&mut self, ctx: &mut Context<'_, Door>) {
///         ctx.pop_state();
///     }
/// }
///
/// assert_eq!(State::<Door>::name(&Opening), "Opening");
/// ```
pub trait State<O>: AsAny {
    /// Called when the state becomes the topmost state.
    ///
    /// Default implementation does nothing.
    fn on_entry(&mut self, _ctx: &mut Context<'_, O>) {}

    /// Called once per machine update while the state is topmost.
    fn on_update(&mut self, ctx: &mut Context<'_, O>);

    /// Called when the state stops being topmost, either because it was
    /// popped or because another state was pushed above it.
    ///
    /// Default implementation does nothing.
    fn on_exit(&mut self, _ctx: &mut Context<'_, O>) {}

    /// Called on the state taking over as topmost, after
    /// [`on_entry`](State::on_entry), with the state that was topmost before.
    ///
    /// `kind` is [`TransitionKind::Push`] when this state was just pushed and
    /// [`TransitionKind::Pop`] when it was exposed by popping `previous`.
    ///
    /// Default implementation does nothing.
    fn if_from(&mut self, _ctx: &mut Context<'_, O>, _previous: StateInfo, _kind: TransitionKind) {}

    /// Name used in logs, history records and snapshots.
    ///
    /// Defaults to the unqualified type name.
    fn name(&self) -> &'static str {
        short_type_name(type_name::<Self>())
    }
}

impl<'a, O: 'static> dyn State<O> + 'a {
    /// Check whether this state is a `S`.
    pub fn is<S: State<O>>(&self) -> bool {
        self.as_any().is::<S>()
    }

    pub fn downcast_ref<S: State<O>>(&self) -> Option<&S> {
        self.as_any().downcast_ref::<S>()
    }

    pub fn downcast_mut<S: State<O>>(&mut self) -> Option<&mut S> {
        self.as_any_mut().downcast_mut::<S>()
    }
}

/// Strip the module path from a type name, keeping generic arguments.
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    match base.rfind("::") {
        Some(pos) => &full[pos + 2..],
        None => full,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::marker::PhantomData;

    struct Owner;

    #[derive(Default)]
    struct Idle;

    impl State<Owner> for Idle {
        fn on_update(&mut self, _ctx: &mut Context<'_, Owner>) {}
    }

    struct Named;

    impl State<Owner> for Named {
        fn on_update(&mut self, _ctx: &mut Context<'_, Owner>) {}

        fn name(&self) -> &'static str {
            "custom"
        }
    }

    struct Generic<T>(PhantomData<T>);

    impl<T: 'static> State<Owner> for Generic<T> {
        fn on_update(&mut self, _ctx: &mut Context<'_, Owner>) {}
    }

    #[test]
    fn default_name_is_unqualified_type_name() {
        assert_eq!(State::<Owner>::name(&Idle), "Idle");
    }

    #[test]
    fn name_can_be_overridden() {
        let state: Box<dyn State<Owner>> = Box::new(Named);
        assert_eq!(state.name(), "custom");
    }

    #[test]
    fn generic_names_keep_their_arguments() {
        let state = Generic::<u32>(PhantomData);
        assert_eq!(State::<Owner>::name(&state), "Generic<u32>");
    }

    #[test]
    fn short_type_name_handles_plain_names() {
        assert_eq!(short_type_name("Idle"), "Idle");
        assert_eq!(short_type_name("a::b::Idle"), "Idle");
        assert_eq!(short_type_name("a::Wrap<b::Inner>"), "Wrap<b::Inner>");
    }

    #[test]
    fn dyn_state_downcasts_to_concrete_type() {
        let mut state: Box<dyn State<Owner>> = Box::new(Idle);

        assert!(state.is::<Idle>());
        assert!(!state.is::<Named>());
        assert!(state.downcast_ref::<Idle>().is_some());
        assert!(state.downcast_mut::<Named>().is_none());
    }
}
