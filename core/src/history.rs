//! Linear undo/redo history of snapshots.
//!
//! The cursor is `None` exactly when the sequence is empty; otherwise it is a
//! valid index. Committing after stepping back drops the redoable tail, so
//! there is only ever one branch.

use retouch_protocol::Snapshot;

#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    snapshots: Vec<Snapshot>,
    cursor: Option<usize>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything with a single snapshot and point at it.
    pub fn seed(&mut self, snapshot: Snapshot) {
        self.snapshots.clear();
        self.snapshots.push(snapshot);
        self.cursor = Some(0);
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.cursor.and_then(|i| self.snapshots.get(i))
    }

    /// Move one entry back. Returns whether the cursor moved.
    pub fn step_back(&mut self) -> bool {
        match self.cursor {
            Some(i) if i > 0 => {
                self.cursor = Some(i - 1);
                true
            }
            _ => false,
        }
    }

    /// Move one entry forward. Returns whether the cursor moved.
    pub fn step_forward(&mut self) -> bool {
        match self.cursor {
            Some(i) if i + 1 < self.snapshots.len() => {
                self.cursor = Some(i + 1);
                true
            }
            _ => false,
        }
    }

    /// Point directly at `index`. Out-of-range indexes and the current index
    /// are no-ops; returns whether the cursor moved.
    pub fn jump_to(&mut self, index: usize) -> bool {
        if index >= self.snapshots.len() || self.cursor == Some(index) {
            return false;
        }
        self.cursor = Some(index);
        true
    }

    /// Drop everything after the cursor, append `snapshot`, and point at it.
    pub fn commit(&mut self, snapshot: Snapshot) {
        let keep = self.cursor.map_or(0, |i| i + 1);
        self.snapshots.truncate(keep);
        self.snapshots.push(snapshot);
        self.cursor = Some(self.snapshots.len() - 1);
    }

    pub fn reset(&mut self) {
        self.snapshots.clear();
        self.cursor = None;
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Cursor as a signed position, `-1` when empty.
    pub fn position(&self) -> isize {
        self.cursor
            .and_then(|i| isize::try_from(i).ok())
            .unwrap_or(-1)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|i| i > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.is_some_and(|i| i + 1 < self.snapshots.len())
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }
}
