//! Identity types binding states to the machine that created them.

use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::fmt;
use uuid::Uuid;

/// Unique identity of a [`StateMachine`](crate::fsm::StateMachine).
///
/// Every machine draws a fresh v4 identifier on construction, so a
/// [`StateId`] handed out by one machine can never be mistaken for a state
/// tracked by another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MachineId(Uuid);

impl MachineId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying uuid.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a tracked state.
///
/// A `StateId` is produced once, when the machine creates the state, and
/// stays valid for the lifetime of that machine. It records which machine
/// the state is bound to along with its position in the machine's registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateId {
    machine: MachineId,
    index: usize,
}

impl StateId {
    pub(crate) fn new(machine: MachineId, index: usize) -> Self {
        Self { machine, index }
    }

    /// Machine this state is bound to.
    pub fn machine(&self) -> MachineId {
        self.machine
    }

    /// Position of the state in its machine's registry (creation order).
    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "state#{}@{}", self.index, self.machine)
    }
}

/// Cheap, copyable description of a tracked state.
///
/// Hooks receive `StateInfo` values instead of references to other states,
/// which lets a state ask "where did I come from?" without borrowing the
/// rest of the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StateInfo {
    id: StateId,
    name: &'static str,
    #[serde(skip)]
    type_id: TypeId,
}

impl StateInfo {
    pub(crate) fn new(id: StateId, name: &'static str, type_id: TypeId) -> Self {
        Self { id, name, type_id }
    }

    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state_type(&self) -> TypeId {
        self.type_id
    }

    /// Check whether the described state is a `S`.
    pub fn is<S: Any>(&self) -> bool {
        self.type_id == TypeId::of::<S>()
    }
}

impl fmt::Display for StateInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn machine_ids_are_unique() {
        assert_ne!(MachineId::new(), MachineId::new());
    }

    #[test]
    fn state_id_reports_binding() {
        let machine = MachineId::new();
        let id = StateId::new(machine, 3);

        assert_eq!(id.machine(), machine);
        assert_eq!(id.index(), 3);
        assert!(id.to_string().starts_with("state#3@"));
    }

    #[test]
    fn state_id_round_trips_through_json() {
        let id = StateId::new(MachineId::new(), 1);
        let json = serde_json::to_string(&id).unwrap();
        let back: StateId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn state_info_serializes_without_type_id() {
        let info = StateInfo::new(StateId::new(MachineId::new(), 0), "Idle", TypeId::of::<u8>());
        let value = serde_json::to_value(info).unwrap();

        assert_eq!(value["name"], "Idle");
        assert_eq!(value["id"]["index"], 0);
        assert!(value.get("type_id").is_none());
    }
}
