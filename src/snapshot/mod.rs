//! Read-only snapshots of a machine for diagnostics.
//!
//! A snapshot captures a machine's flags, tracked states, stack and
//! transition history at one point in time, and can be exported as JSON for
//! logs or debugging tools. Snapshots describe a machine; they cannot be
//! used to rebuild one.

use crate::core::{MachineId, StateInfo, TransitionRecord};
use crate::fsm::StateMachine;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub mod error;

pub use error::SnapshotError;

/// Version identifier for the snapshot format
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable picture of a machine.
#[derive(Clone, Debug, Serialize)]
pub struct MachineSnapshot {
    /// Snapshot format version
    pub version: u32,

    pub machine: MachineId,

    /// When the snapshot was taken
    pub taken_at: DateTime<Utc>,

    pub enabled: bool,

    pub locked: bool,

    /// Tracked states in creation order
    pub tracked: Vec<StateInfo>,

    /// Stacked states, bottom to top
    pub stack: Vec<StateInfo>,

    /// Retained transition records, oldest first
    pub history: Vec<TransitionRecord>,
}

impl MachineSnapshot {
    /// Serialize to a compact JSON string.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    /// Serialize to an indented JSON string.
    pub fn to_json_pretty(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }
}

impl<O: 'static> StateMachine<O> {
    /// Capture the machine's current configuration.
    pub fn snapshot(&self) -> MachineSnapshot {
        MachineSnapshot {
            version: SNAPSHOT_VERSION,
            machine: self.id(),
            taken_at: Utc::now(),
            enabled: self.is_enabled(),
            locked: self.is_locked(),
            tracked: self.tracked_states(),
            stack: self.stack(),
            history: self.history().records().cloned().collect(),
        }
    }
}
