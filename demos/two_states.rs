//! Two states bouncing on one machine.
//!
//! `StateOne` pushes `StateTwo` on every update. `StateTwo` flips a flag on
//! each update and pops itself on every second one, handing control back.
//!
//! Run with `RUST_LOG=debug cargo run --example two_states` to also see the
//! machine's own transition logs.

use stackfsm::{
    BuildError, Context, State, StateInfo, StateMachine, StateMachineBuilder, TransitionKind,
};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Data the states act upon.
#[derive(Debug, Default)]
struct Counters {
    pushes: u32,
    pops: u32,
}

/// Host object embedding its own machine.
struct ExampleObject {
    counters: Counters,
    machine: StateMachine<Counters>,
}

impl ExampleObject {
    fn create() -> Result<Self, BuildError> {
        let mut counters = Counters::default();
        info!("starting machine in StateOne");
        let machine = StateMachineBuilder::new()
            .state::<StateOne>()
            .state::<StateTwo>()
            .initial::<StateOne>()
            .build(&mut counters)?;
        Ok(Self { counters, machine })
    }

    fn update(&mut self) {
        self.machine.update(&mut self.counters);
    }
}

fn describe(this: &str, previous: StateInfo, kind: TransitionKind) {
    let event = if kind.is_push() { "push" } else { "pop" };
    info!(state = this, previous = previous.name(), "entered during {event} event");
}

#[derive(Default)]
struct StateOne;

impl State<Counters> for StateOne {
    fn on_entry(&mut self, _ctx: &mut Context<'_, Counters>) {
        info!("StateOne entry");
    }

    fn on_update(&mut self, ctx: &mut Context<'_, Counters>) {
        info!("StateOne update, pushing StateTwo");
        if let Some(two) = ctx.tracked_state::<StateTwo>() {
            ctx.owner_mut().pushes += 1;
            ctx.push_state(two);
        }
    }

    fn on_exit(&mut self, _ctx: &mut Context<'_, Counters>) {
        info!("StateOne exit");
    }

    fn if_from(
        &mut self,
        _ctx: &mut Context<'_, Counters>,
        previous: StateInfo,
        kind: TransitionKind,
    ) {
        describe("StateOne", previous, kind);
    }
}

#[derive(Default)]
struct StateTwo {
    flag: bool,
}

impl State<Counters> for StateTwo {
    fn on_entry(&mut self, _ctx: &mut Context<'_, Counters>) {
        info!("StateTwo entry");
    }

    fn on_update(&mut self, ctx: &mut Context<'_, Counters>) {
        info!(flag = self.flag, "StateTwo update");
        if self.flag {
            self.flag = false;
            info!("popping StateTwo");
            ctx.owner_mut().pops += 1;
            ctx.pop_state();
        } else {
            self.flag = true;
        }
    }

    fn on_exit(&mut self, _ctx: &mut Context<'_, Counters>) {
        info!(flag = self.flag, "StateTwo exit");
    }

    fn if_from(
        &mut self,
        _ctx: &mut Context<'_, Counters>,
        previous: StateInfo,
        kind: TransitionKind,
    ) {
        describe("StateTwo", previous, kind);
    }
}

fn main() -> Result<(), BuildError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut object = ExampleObject::create()?;
    for tick in 1..=6 {
        info!(tick, "update");
        object.update();
    }

    info!(
        pushes = object.counters.pushes,
        pops = object.counters.pops,
        path = ?object.machine.history().get_path(),
        "done"
    );
    Ok(())
}
