//! Stack transition history tracking.
//!
//! Every stack mutation the machine applies is recorded as a
//! [`TransitionRecord`]. The history is bounded: once full, the oldest
//! record is evicted to make room for the newest.

use super::id::StateInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Default number of records kept by a machine's history.
pub const DEFAULT_HISTORY_LIMIT: usize = 64;

/// Kind of stack mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionKind {
    /// A state was pushed on top of the stack.
    Push,
    /// The topmost state was removed from the stack.
    Pop,
    /// The whole stack was emptied without running any hooks.
    Clear,
}

impl TransitionKind {
    pub fn is_push(&self) -> bool {
        matches!(self, Self::Push)
    }

    pub fn is_pop(&self) -> bool {
        matches!(self, Self::Pop)
    }
}

/// Record of a single applied stack mutation.
///
/// `from` is the topmost state before the mutation and `to` the topmost state
/// after it; either is `None` when the stack was empty at that point.
#[derive(Clone, Debug, Serialize)]
pub struct TransitionRecord {
    pub kind: TransitionKind,
    pub from: Option<StateInfo>,
    pub to: Option<StateInfo>,
    /// Stack depth after the mutation
    pub depth: usize,
    pub timestamp: DateTime<Utc>,
}

impl TransitionRecord {
    pub fn new(
        kind: TransitionKind,
        from: Option<StateInfo>,
        to: Option<StateInfo>,
        depth: usize,
    ) -> Self {
        Self {
            kind,
            from,
            to,
            depth,
            timestamp: Utc::now(),
        }
    }
}

/// Bounded, ordered history of stack transitions.
///
/// # Example
///
/// ```rust
/// use stackfsm::StateHistory;
///
/// let history = StateHistory::with_limit(8);
/// assert!(history.is_empty());
/// assert_eq!(history.limit(), 8);
/// assert!(history.get_path().is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct StateHistory {
    records: VecDeque<TransitionRecord>,
    limit: usize,
}

impl Default for StateHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl StateHistory {
    /// Create an empty history keeping [`DEFAULT_HISTORY_LIMIT`] records.
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }

    /// Create an empty history keeping at most `limit` records.
    ///
    /// A limit of zero disables recording.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(limit.min(DEFAULT_HISTORY_LIMIT)),
            limit,
        }
    }

    /// Append a record, evicting the oldest one when the history is full.
    pub fn record(&mut self, record: TransitionRecord) {
        if self.limit == 0 {
            return;
        }
        if self.records.len() == self.limit {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Records in the order they were applied, oldest first.
    pub fn records(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&TransitionRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Names of the states that were topmost, in order.
    ///
    /// Starts with the topmost state before the first retained record (if
    /// any), followed by the topmost state after each record. Records that
    /// left the stack empty contribute nothing.
    pub fn get_path(&self) -> Vec<&'static str> {
        let mut path = Vec::new();
        if let Some(from) = self.records.front().and_then(|r| r.from) {
            path.push(from.name());
        }
        for record in &self.records {
            if let Some(to) = record.to {
                path.push(to.name());
            }
        }
        path
    }

    /// Time elapsed between the first and last retained records.
    ///
    /// Returns `None` if the history is empty.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.records.front(), self.records.back()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::id::{MachineId, StateId};
    use std::any::TypeId;

    fn info(index: usize, name: &'static str) -> StateInfo {
        StateInfo::new(StateId::new(MachineId::new(), index), name, TypeId::of::<()>())
    }

    #[test]
    fn new_history_is_empty() {
        let history = StateHistory::new();
        assert!(history.is_empty());
        assert_eq!(history.limit(), DEFAULT_HISTORY_LIMIT);
        assert!(history.get_path().is_empty());
        assert!(history.duration().is_none());
    }

    #[test]
    fn record_appends_in_order() {
        let mut history = StateHistory::new();
        history.record(TransitionRecord::new(
            TransitionKind::Push,
            None,
            Some(info(0, "Menu")),
            1,
        ));
        history.record(TransitionRecord::new(
            TransitionKind::Push,
            Some(info(0, "Menu")),
            Some(info(1, "Game")),
            2,
        ));

        assert_eq!(history.len(), 2);
        let kinds: Vec<_> = history.records().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![TransitionKind::Push, TransitionKind::Push]);
        assert_eq!(history.last().map(|r| r.depth), Some(2));
    }

    #[test]
    fn full_history_evicts_oldest() {
        let mut history = StateHistory::with_limit(2);
        for depth in 1..=3 {
            history.record(TransitionRecord::new(
                TransitionKind::Push,
                None,
                Some(info(depth, "S")),
                depth,
            ));
        }

        assert_eq!(history.len(), 2);
        let depths: Vec<_> = history.records().map(|r| r.depth).collect();
        assert_eq!(depths, vec![2, 3]);
    }

    #[test]
    fn zero_limit_disables_recording() {
        let mut history = StateHistory::with_limit(0);
        history.record(TransitionRecord::new(TransitionKind::Clear, None, None, 0));
        assert!(history.is_empty());
    }

    #[test]
    fn get_path_follows_topmost_state() {
        let mut history = StateHistory::new();
        let menu = info(0, "Menu");
        let game = info(1, "Game");

        history.record(TransitionRecord::new(TransitionKind::Push, None, Some(menu), 1));
        history.record(TransitionRecord::new(
            TransitionKind::Push,
            Some(menu),
            Some(game),
            2,
        ));
        history.record(TransitionRecord::new(
            TransitionKind::Pop,
            Some(game),
            Some(menu),
            1,
        ));
        history.record(TransitionRecord::new(TransitionKind::Clear, Some(menu), None, 0));

        assert_eq!(history.get_path(), vec!["Menu", "Game", "Menu"]);
    }

    #[test]
    fn get_path_starts_from_evicted_predecessor() {
        let mut history = StateHistory::with_limit(1);
        let menu = info(0, "Menu");
        let game = info(1, "Game");

        history.record(TransitionRecord::new(TransitionKind::Push, None, Some(menu), 1));
        history.record(TransitionRecord::new(
            TransitionKind::Push,
            Some(menu),
            Some(game),
            2,
        ));

        assert_eq!(history.get_path(), vec!["Menu", "Game"]);
    }

    #[test]
    fn single_record_has_zero_duration() {
        let mut history = StateHistory::new();
        history.record(TransitionRecord::new(TransitionKind::Push, None, Some(info(0, "A")), 1));
        assert_eq!(history.duration(), Some(Duration::from_secs(0)));
    }

    #[test]
    fn record_serializes_with_names() {
        let record = TransitionRecord::new(TransitionKind::Pop, Some(info(1, "Game")), None, 0);
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["kind"], "Pop");
        assert_eq!(value["from"]["name"], "Game");
        assert!(value["to"].is_null());
    }
}
