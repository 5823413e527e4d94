//! Bump-pointer arena over a reserved virtual memory region.
//!
//! An [`Arena`] advances a single byte offset through its
//! [`VmRegion`](crate::VmRegion), committing pages on demand as the
//! offset crosses the committed prefix. Individual allocations are never
//! freed; the arena is reset ([`clear`](Arena::clear)), rolled back to a
//! checkpoint, or dropped as a whole.
//!
//! # Checkpoint gating
//!
//! Persistent allocation and checkpointed allocation consume the same
//! offset, so they are mutually exclusive in time: while any checkpoint
//! is outstanding the arena is *locked* and [`Arena::alloc`] refuses,
//! because a later rollback would silently reclaim the "persistent"
//! bytes. Checkpoint allocations go through
//! [`Arena::checkpoint_alloc`], which is exempt — reclamation on
//! rollback is exactly what it signs up for.

use std::ptr::NonNull;

use crate::checkpoint::{CheckpointHandle, CheckpointStack};
use crate::config::ArenaConfig;
use crate::error::{AllocError, GrowError};
use crate::vmem::{fatal, VmRegion};

/// Round `value` up to the next multiple of `alignment`.
///
/// # Panics
///
/// Panics if `alignment` is not a power of two.
pub fn align_up(value: usize, alignment: usize) -> usize {
    assert!(
        alignment.is_power_of_two(),
        "alignment must be a power of two, got {alignment}"
    );
    (value + alignment - 1) & !(alignment - 1)
}

/// A thread-confined bump allocator backed by reserved virtual memory.
///
/// # Invariants
///
/// - `used() ≤ committed_capacity()` at all times.
/// - The checkpoint stack is non-empty exactly when persistent
///   allocation is refused.
///
/// The arena must stay on the thread that created it for its whole
/// lifetime; nothing here synchronizes access to the memory it hands
/// out.
pub struct Arena {
    region: VmRegion,
    offset: usize,
    alignment: usize,
    checkpoints: CheckpointStack,
}

impl Arena {
    /// Create an arena with the default configuration, reserving its
    /// entire virtual memory region up front.
    ///
    /// Terminates the process if the reservation is denied.
    pub fn new() -> Self {
        Self::with_config(ArenaConfig::new())
    }

    /// Create an arena with an explicit configuration.
    pub fn with_config(config: ArenaConfig) -> Self {
        Self {
            region: VmRegion::reserve(),
            offset: 0,
            alignment: config.alignment,
            checkpoints: CheckpointStack::new(),
        }
    }

    /// Allocate `size` zeroed bytes, aligned to the arena's alignment.
    ///
    /// Refused with [`AllocError::CheckpointsActive`] while any
    /// checkpoint is outstanding. Returns
    /// [`AllocError::CommitFailed`] if the OS refuses to commit the
    /// pages the allocation needs; the arena is unchanged in both cases.
    /// Growing past the reservation ceiling terminates the process.
    pub fn alloc(&mut self, size: usize) -> Result<NonNull<u8>, AllocError> {
        if !self.checkpoints.is_empty() {
            return Err(AllocError::CheckpointsActive);
        }
        self.alloc_unchecked(size)
    }

    /// Allocation without the checkpoint gate; shared by persistent and
    /// checkpoint allocation.
    fn alloc_unchecked(&mut self, size: usize) -> Result<NonNull<u8>, AllocError> {
        let aligned = align_up(self.offset, self.alignment);
        let end = match aligned.checked_add(size) {
            Some(end) => end,
            None => fatal("allocation size overflows the address space"),
        };

        if end > self.region.committed_capacity() {
            let pages = end.div_ceil(self.region.page_size());
            match self.region.grow_to(pages) {
                Ok(()) => {}
                Err(err @ GrowError::OutOfReservation { .. }) => fatal(&err.to_string()),
                Err(GrowError::CommitFailed { errno }) => {
                    return Err(AllocError::CommitFailed { errno });
                }
            }
        }

        // Pages may hold stale data from before a clear or rollback.
        self.region.zero(aligned, size);
        self.offset = end;
        Ok(self.region.ptr_at(aligned))
    }

    /// Reset the bump offset to zero and drop all checkpoints.
    ///
    /// No memory is released or zeroed; committed pages are reused by
    /// subsequent allocations.
    pub fn clear(&mut self) {
        self.offset = 0;
        self.checkpoints.clear();
    }

    /// Snapshot the current offset as a new checkpoint.
    ///
    /// The arena is locked against persistent allocation until this (or
    /// an earlier) checkpoint is rolled back.
    pub fn checkpoint(&mut self) -> CheckpointHandle {
        self.checkpoints.push(self.offset)
    }

    /// Create a checkpoint nested under `parent`, on the same arena.
    ///
    /// Fails with [`AllocError::StaleCheckpoint`] if `parent` has
    /// already been rolled back.
    pub fn checkpoint_from(
        &mut self,
        parent: CheckpointHandle,
    ) -> Result<CheckpointHandle, AllocError> {
        if self.checkpoints.position(parent).is_none() {
            return Err(AllocError::StaleCheckpoint {
                generation: parent.generation(),
            });
        }
        Ok(self.checkpoint())
    }

    /// Allocate `size` zeroed bytes under an outstanding checkpoint.
    ///
    /// The allocation is reclaimed when `handle` (or any earlier
    /// checkpoint) is rolled back.
    pub fn checkpoint_alloc(
        &mut self,
        handle: CheckpointHandle,
        size: usize,
    ) -> Result<NonNull<u8>, AllocError> {
        if self.checkpoints.position(handle).is_none() {
            return Err(AllocError::StaleCheckpoint {
                generation: handle.generation(),
            });
        }
        self.alloc_unchecked(size)
    }

    /// Roll back to `handle`: restore its saved offset, discarding every
    /// allocation and every checkpoint made after it.
    ///
    /// Rolling back the earliest checkpoint unlocks persistent
    /// allocation again.
    pub fn rollback_to(&mut self, handle: CheckpointHandle) -> Result<(), AllocError> {
        match self.checkpoints.rollback(handle) {
            Some(saved_offset) => {
                self.offset = saved_offset;
                Ok(())
            }
            None => Err(AllocError::StaleCheckpoint {
                generation: handle.generation(),
            }),
        }
    }

    /// Bytes consumed so far (the bump offset).
    pub fn used(&self) -> usize {
        self.offset
    }

    /// Alignment applied to every allocation.
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// OS page size of the backing region.
    pub fn page_size(&self) -> usize {
        self.region.page_size()
    }

    /// Bytes currently committed read/write.
    pub fn committed_capacity(&self) -> usize {
        self.region.committed_capacity()
    }

    /// Hard ceiling on this arena's growth.
    pub fn reserved_capacity(&self) -> usize {
        self.region.reserved_capacity()
    }

    /// Whether any checkpoint is outstanding (the arena is locked).
    pub fn has_checkpoints(&self) -> bool {
        !self.checkpoints.is_empty()
    }

    /// Number of outstanding checkpoints.
    pub fn checkpoint_count(&self) -> usize {
        self.checkpoints.len()
    }
}
