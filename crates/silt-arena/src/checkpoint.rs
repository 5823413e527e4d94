//! Checkpoint bookkeeping for arena rollback.
//!
//! A checkpoint snapshots an arena's bump offset so everything allocated
//! after it can be discarded in one step. Checkpoints stack in creation
//! order; rolling one back also discards every checkpoint created after
//! it, whatever the nesting shape of their creation was.
//!
//! The stack lives beside the arena, not inside the memory it governs,
//! and handles carry a per-arena generation that is never reused — two
//! checkpoints taken at the same offset are still distinct, and a handle
//! that has been rolled over is detectably stale.

use std::fmt;

/// Opaque handle to one outstanding checkpoint.
///
/// Handles stay valid until their checkpoint — or any earlier one on the
/// same arena — is rolled back; after that every operation on them
/// reports [`AllocError::StaleCheckpoint`](crate::AllocError::StaleCheckpoint).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct CheckpointHandle {
    generation: u64,
}

impl CheckpointHandle {
    /// The generation identifying this checkpoint on its arena.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl fmt::Display for CheckpointHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CheckpointHandle(gen={})", self.generation)
    }
}

#[derive(Clone, Copy, Debug)]
struct Checkpoint {
    saved_offset: usize,
    generation: u64,
}

/// Stack of outstanding checkpoints, ordered by creation.
///
/// Generations are strictly increasing down the stack and never reused,
/// including across [`clear`](Self::clear).
#[derive(Debug, Default)]
pub(crate) struct CheckpointStack {
    entries: Vec<Checkpoint>,
    next_generation: u64,
}

impl CheckpointStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drop every checkpoint without restoring any offset.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Record a checkpoint at `saved_offset` and hand back its handle.
    pub(crate) fn push(&mut self, saved_offset: usize) -> CheckpointHandle {
        let generation = self.next_generation;
        self.next_generation += 1;
        self.entries.push(Checkpoint {
            saved_offset,
            generation,
        });
        CheckpointHandle { generation }
    }

    /// Position of the live checkpoint matching `handle`, if any.
    pub(crate) fn position(&self, handle: CheckpointHandle) -> Option<usize> {
        self.entries
            .iter()
            .position(|c| c.generation == handle.generation)
    }

    /// Roll back to `handle`: drop it and every later checkpoint,
    /// returning the offset to restore. `None` if the handle is stale.
    pub(crate) fn rollback(&mut self, handle: CheckpointHandle) -> Option<usize> {
        let pos = self.position(handle)?;
        let saved = self.entries[pos].saved_offset;
        self.entries.truncate(pos);
        Some(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_rollback_restores_saved_offset() {
        let mut stack = CheckpointStack::new();
        let a = stack.push(100);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.rollback(a), Some(100));
        assert!(stack.is_empty());
    }

    #[test]
    fn rollback_drops_every_later_checkpoint() {
        let mut stack = CheckpointStack::new();
        let a = stack.push(10);
        let b = stack.push(20);
        let c = stack.push(30);

        assert_eq!(stack.rollback(b), Some(20));
        // b and c are gone, a survives.
        assert_eq!(stack.rollback(c), None);
        assert_eq!(stack.position(a), Some(0));
        assert_eq!(stack.rollback(a), Some(10));
    }

    #[test]
    fn rollback_of_earliest_empties_the_stack() {
        let mut stack = CheckpointStack::new();
        let a = stack.push(0);
        let _b = stack.push(16);
        let _c = stack.push(32);
        assert_eq!(stack.rollback(a), Some(0));
        assert!(stack.is_empty());
    }

    #[test]
    fn same_offset_checkpoints_are_distinct() {
        let mut stack = CheckpointStack::new();
        let a = stack.push(64);
        let b = stack.push(64);
        assert_ne!(a, b);
        // Rolling back the later one leaves the earlier one live.
        assert_eq!(stack.rollback(b), Some(64));
        assert_eq!(stack.position(a), Some(0));
    }

    #[test]
    fn generations_survive_clear() {
        let mut stack = CheckpointStack::new();
        let a = stack.push(8);
        stack.clear();
        let b = stack.push(8);
        assert_ne!(a, b);
        assert_eq!(stack.rollback(a), None);
        assert_eq!(stack.rollback(b), Some(8));
    }

    #[test]
    fn stale_handle_is_rejected() {
        let mut stack = CheckpointStack::new();
        let a = stack.push(0);
        assert_eq!(stack.rollback(a), Some(0));
        assert_eq!(stack.rollback(a), None);
        assert_eq!(stack.position(a), None);
    }
}
