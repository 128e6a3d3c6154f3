//! Property-based tests for the stack machine.
//!
//! These tests drive machines with random operation sequences and compare
//! the result against a plain `Vec` model of the stack.

use proptest::prelude::*;
use stackfsm::{Context, State, StateId, StateMachine, StateMachineBuilder, TransitionKind};

#[derive(Debug, Default, PartialEq)]
struct Tally {
    entries: usize,
    exits: usize,
    updates: usize,
}

macro_rules! counting_state {
    ($name:ident) => {
        #[derive(Default)]
        struct $name;

        impl State<Tally> for $name {
            fn on_entry(&mut self, ctx: &mut Context<'_, Tally>) {
                ctx.owner_mut().entries += 1;
            }

            fn on_update(&mut self, ctx: &mut Context<'_, Tally>) {
                ctx.owner_mut().updates += 1;
            }

            fn on_exit(&mut self, ctx: &mut Context<'_, Tally>) {
                ctx.owner_mut().exits += 1;
            }
        }
    };
}

counting_state!(Red);
counting_state!(Green);
counting_state!(Blue);

#[derive(Clone, Debug)]
enum Op {
    Push(usize),
    Pop,
    Clear,
    Lock(bool),
    Enable(bool),
    Update,
}

prop_compose! {
    fn arbitrary_op()(variant in 0..10u8, target in 0..3usize, flag in any::<bool>()) -> Op {
        match variant {
            0..=2 => Op::Push(target),
            3 | 4 => Op::Pop,
            5 => Op::Clear,
            6 => Op::Lock(flag),
            7 => Op::Enable(flag),
            _ => Op::Update,
        }
    }
}

/// Reference model of the machine's observable behaviour.
#[derive(Default)]
struct Model {
    stack: Vec<usize>,
    locked: bool,
    disabled: bool,
    tally: Tally,
}

impl Model {
    fn apply(&mut self, op: &Op) {
        match *op {
            Op::Push(target) if !self.locked => {
                if !self.stack.is_empty() {
                    self.tally.exits += 1;
                }
                self.stack.push(target);
                self.tally.entries += 1;
            }
            Op::Pop if !self.locked => {
                if self.stack.pop().is_some() {
                    self.tally.exits += 1;
                    if !self.stack.is_empty() {
                        self.tally.entries += 1;
                    }
                }
            }
            Op::Clear if !self.locked => self.stack.clear(),
            Op::Lock(locked) => self.locked = locked,
            Op::Enable(enabled) => self.disabled = !enabled,
            Op::Update if !self.disabled && !self.stack.is_empty() => self.tally.updates += 1,
            _ => {}
        }
    }
}

fn setup() -> (StateMachine<Tally>, [StateId; 3]) {
    let mut machine: StateMachine<Tally> = StateMachine::new();
    let ids = [
        machine.create_state::<Red>(),
        machine.create_state::<Green>(),
        machine.create_state::<Blue>(),
    ];
    (machine, ids)
}

fn run(machine: &mut StateMachine<Tally>, ids: &[StateId; 3], owner: &mut Tally, op: &Op) {
    match *op {
        Op::Push(target) => machine.push_state(owner, ids[target]),
        Op::Pop => machine.pop_state(owner),
        Op::Clear => machine.clear_state_stack(),
        Op::Lock(locked) => machine.set_locked(locked),
        Op::Enable(enabled) => machine.set_enabled(enabled),
        Op::Update => machine.update(owner),
    }
}

fn stacked_indices(machine: &StateMachine<Tally>) -> Vec<usize> {
    machine.stack().iter().map(|info| info.id().index()).collect()
}

proptest! {
    #[test]
    fn machine_matches_stack_model(ops in prop::collection::vec(arbitrary_op(), 0..64)) {
        let (mut machine, ids) = setup();
        let mut owner = Tally::default();
        let mut model = Model::default();

        for op in &ops {
            run(&mut machine, &ids, &mut owner, op);
            model.apply(op);

            prop_assert_eq!(stacked_indices(&machine), model.stack.clone());
            prop_assert_eq!(machine.is_locked(), model.locked);
        }

        prop_assert_eq!(owner, model.tally);
    }

    #[test]
    fn tracked_states_never_change(ops in prop::collection::vec(arbitrary_op(), 0..64)) {
        let (mut machine, ids) = setup();
        let mut owner = Tally::default();

        for op in &ops {
            run(&mut machine, &ids, &mut owner, op);
            prop_assert_eq!(machine.tracked_len(), 3);
        }

        let names: Vec<_> = machine.tracked_states().iter().map(|i| i.name()).collect();
        prop_assert_eq!(names, vec!["Red", "Green", "Blue"]);
    }

    #[test]
    fn locked_machine_keeps_its_stack(
        prefix in prop::collection::vec(arbitrary_op(), 0..16),
        locked_ops in prop::collection::vec(arbitrary_op(), 0..32),
    ) {
        let (mut machine, ids) = setup();
        let mut owner = Tally::default();
        for op in &prefix {
            run(&mut machine, &ids, &mut owner, op);
        }

        let mut guard = machine.lock();
        let before = stacked_indices(&guard);
        let history_len = guard.history().len();
        for op in locked_ops.iter().filter(|op| !matches!(op, Op::Lock(_))) {
            run(&mut guard, &ids, &mut owner, op);
        }

        prop_assert_eq!(stacked_indices(&guard), before);
        prop_assert_eq!(guard.history().len(), history_len);
    }

    #[test]
    fn top_is_always_last_pushed_state(targets in prop::collection::vec(0..3usize, 1..16)) {
        let (mut machine, ids) = setup();
        let mut owner = Tally::default();

        for &target in &targets {
            machine.push_state(&mut owner, ids[target]);
            prop_assert_eq!(machine.current_state_info().map(|i| i.id()), Some(ids[target]));
            prop_assert_eq!(machine.history().last().map(|r| r.depth), Some(machine.stack_len()));
        }

        prop_assert_eq!(machine.stack_len(), targets.len());
    }

    #[test]
    fn history_respects_its_limit(
        limit in 0..8usize,
        ops in prop::collection::vec(arbitrary_op(), 0..64),
    ) {
        let mut owner = Tally::default();
        let mut machine = StateMachineBuilder::new()
            .state::<Red>()
            .state::<Green>()
            .state::<Blue>()
            .history_limit(limit)
            .build(&mut owner)
            .unwrap();
        let ids = [
            machine.tracked_state::<Red>().unwrap(),
            machine.tracked_state::<Green>().unwrap(),
            machine.tracked_state::<Blue>().unwrap(),
        ];

        for op in &ops {
            run(&mut machine, &ids, &mut owner, op);
            prop_assert!(machine.history().len() <= limit);
        }
    }

    #[test]
    fn clear_records_depth_zero(targets in prop::collection::vec(0..3usize, 1..8)) {
        let (mut machine, ids) = setup();
        let mut owner = Tally::default();
        for &target in &targets {
            machine.push_state(&mut owner, ids[target]);
        }
        let entries = owner.entries;

        machine.clear_state_stack();

        let last = machine.history().last().unwrap();
        prop_assert_eq!(last.kind, TransitionKind::Clear);
        prop_assert_eq!(last.depth, 0);
        prop_assert_eq!(owner.entries, entries);
        prop_assert!(machine.current_state().is_none());
    }
}
