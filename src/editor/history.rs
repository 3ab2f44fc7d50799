// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! History system for undo/redo functionality.
//!
//! History is a linear list of full bubble snapshots plus a cursor. Undo
//! never walks past the first entry. Once the list is full the oldest entry,
//! the starting state included, is dropped.

use crate::models::store::Snapshot;

/// Default number of snapshots kept before the oldest is dropped.
pub const DEFAULT_MAX_HISTORY: usize = 100;

/// Linear undo/redo stack of snapshots.
pub struct History {
    /// Every recorded state, oldest first
    snapshots: Vec<Snapshot>,
    /// Index of the snapshot the store currently reflects
    index: usize,
    /// Maximum number of snapshots kept
    max_size: usize,
}

impl History {
    pub fn new(initial: Snapshot, max_size: usize) -> Self {
        Self {
            snapshots: vec![initial],
            index: 0,
            max_size: max_size.max(2),
        }
    }

    /// Record a new state. Anything that could have been redone is discarded.
    pub fn commit(&mut self, snapshot: Snapshot) {
        self.snapshots.truncate(self.index + 1);
        self.snapshots.push(snapshot);
        // Limit history size
        if self.snapshots.len() > self.max_size {
            self.snapshots.remove(0);
        }
        self.index = self.snapshots.len() - 1;
    }

    /// Step back one state and return it. No-op at the oldest state.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        self.snapshots.get(self.index)
    }

    /// Step forward one state and return it. No-op at the newest state.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        if self.index + 1 >= self.snapshots.len() {
            return None;
        }
        self.index += 1;
        self.snapshots.get(self.index)
    }

    /// The snapshot the store is expected to match.
    pub fn current(&self) -> &Snapshot {
        &self.snapshots[self.index]
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.snapshots.len()
    }

    pub fn undo_count(&self) -> usize {
        self.index
    }

    pub fn redo_count(&self) -> usize {
        self.snapshots.len() - self.index - 1
    }

    /// Forget all history and start again from `initial`.
    pub fn reset(&mut self, initial: Snapshot) {
        self.snapshots.clear();
        self.snapshots.push(initial);
        self.index = 0;
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(Snapshot::default(), DEFAULT_MAX_HISTORY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bubble::{BoundingBox, Bubble};
    use crate::models::store::BubbleStore;

    /// Snapshots holding 0..n bubbles, each distinct from the others.
    fn snapshots(n: usize) -> Vec<Snapshot> {
        let mut store = BubbleStore::new();
        let mut out = vec![store.snapshot()];
        for i in 0..n {
            let id = store.allocate_id();
            store.insert(Bubble::new(id, format!("{i}"), BoundingBox::new(0.0, 0.0, 10.0, 10.0)));
            out.push(store.snapshot());
        }
        out
    }

    #[test]
    fn test_undo_redo_at_bounds_are_noops() {
        let states = snapshots(1);
        let mut history = History::new(states[0].clone(), 10);
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());

        history.commit(states[1].clone());
        assert!(history.redo().is_none());
        assert_eq!(history.undo(), Some(&states[0]));
        assert!(history.undo().is_none());
    }

    #[test]
    fn test_commit_after_undo_discards_redo_branch() {
        let states = snapshots(6);
        for n in 1..=5 {
            for k in 0..=n {
                let mut history = History::new(states[0].clone(), 50);
                for state in &states[1..=n] {
                    history.commit(state.clone());
                }
                for _ in 0..k {
                    history.undo();
                }
                history.commit(states[6].clone());
                assert!(!history.can_redo(), "n={n} k={k}");
                assert!(history.redo().is_none());
                assert_eq!(history.current(), &states[6]);
            }
        }
    }

    #[test]
    fn test_undo_then_redo_restores_same_snapshot() {
        let states = snapshots(4);
        let mut history = History::new(states[0].clone(), 50);
        for state in &states[1..] {
            history.commit(state.clone());
        }
        for _ in 0..4 {
            let before = history.current().clone();
            history.undo();
            assert_eq!(history.redo(), Some(&before));
            history.undo();
        }
        assert!(!history.can_undo());
        assert_eq!(history.redo_count(), 4);
    }

    #[test]
    fn test_history_max_size() {
        let states = snapshots(8);
        let mut history = History::new(states[0].clone(), 5);
        for state in &states[1..] {
            history.commit(state.clone());
        }
        assert_eq!(history.undo_count(), 4);
        assert_eq!(history.current(), &states[8]);
        for _ in 0..4 {
            history.undo();
        }
        assert_eq!(history.current(), &states[4]);
        assert!(!history.can_undo());
        assert!(history.undo().is_none());
        assert_eq!(history.redo_count(), 4);
    }
}
