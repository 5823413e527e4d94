//! Per-thread allocation surface.
//!
//! Free functions operating on the calling thread's arena, which is
//! created (reserving its whole virtual memory region) on the first call
//! that needs it. Pointers returned here are valid until the arena is
//! cleared, rolled back past them, or deleted — there is no per-pointer
//! free.
//!
//! Everything in this module is confined to the calling thread: handing
//! a returned pointer or a [`CheckpointHandle`] to another thread is
//! outside the contract.

use std::ptr::NonNull;

use crate::checkpoint::CheckpointHandle;
use crate::error::AllocError;
use crate::registry;

/// Allocate `size` zeroed bytes from the calling thread's arena,
/// creating the arena on first use.
///
/// See [`Arena::alloc`](crate::Arena::alloc) for the failure modes.
pub fn alloc(size: usize) -> Result<NonNull<u8>, AllocError> {
    let mut arena = registry::resolve_or_create();
    // SAFETY: the registry hands out this arena only to the thread that
    // owns it, and the backing Box outlives this call.
    unsafe { arena.as_mut() }.alloc(size)
}

/// Reset the calling thread's arena, discarding every allocation and
/// checkpoint while keeping its committed memory for reuse.
///
/// Does nothing if the thread has no arena.
pub fn clear() {
    if let Some(mut arena) = registry::lookup() {
        // SAFETY: thread-confined arena, Box-stable address.
        unsafe { arena.as_mut() }.clear();
    }
}

/// Destroy the calling thread's arena, releasing its entire reserved
/// range, and remove it from the registry.
///
/// Does nothing if the thread has no arena. The next [`alloc`] or
/// [`checkpoint_new`] on this thread starts a fresh arena.
pub fn delete_arena() {
    drop(registry::remove_current());
}

/// Whether the calling thread currently owns an arena.
pub fn has_arena() -> bool {
    registry::lookup().is_some()
}

/// Snapshot the calling thread's arena (created on first use) as a new
/// checkpoint, locking it against persistent allocation.
pub fn checkpoint_new() -> CheckpointHandle {
    let mut arena = registry::resolve_or_create();
    // SAFETY: thread-confined arena, Box-stable address.
    unsafe { arena.as_mut() }.checkpoint()
}

/// Create a checkpoint nested under `parent` on the calling thread's
/// arena.
pub fn checkpoint_from(parent: CheckpointHandle) -> Result<CheckpointHandle, AllocError> {
    let mut arena = registry::resolve_or_create();
    // SAFETY: thread-confined arena, Box-stable address.
    unsafe { arena.as_mut() }.checkpoint_from(parent)
}

/// Allocate `size` zeroed bytes under an outstanding checkpoint on the
/// calling thread's arena.
pub fn checkpoint_alloc(handle: CheckpointHandle, size: usize) -> Result<NonNull<u8>, AllocError> {
    let mut arena = registry::resolve_or_create();
    // SAFETY: thread-confined arena, Box-stable address.
    unsafe { arena.as_mut() }.checkpoint_alloc(handle, size)
}

/// Roll the calling thread's arena back to `handle`, discarding it,
/// every later checkpoint, and everything allocated since.
pub fn checkpoint_delete(handle: CheckpointHandle) -> Result<(), AllocError> {
    match registry::lookup() {
        // SAFETY: thread-confined arena, Box-stable address.
        Some(mut arena) => unsafe { arena.as_mut() }.rollback_to(handle),
        None => Err(AllocError::StaleCheckpoint {
            generation: handle.generation(),
        }),
    }
}

/// Release a single allocation: intentionally a no-op.
///
/// Arena memory is reclaimed wholesale by [`clear`], checkpoint
/// rollback, or [`delete_arena`]. This exists so the arena can stand in
/// for allocators that do free individual pointers (see
/// [`Alloc`](crate::Alloc)).
pub fn free(_ptr: NonNull<u8>) {}

#[cfg(test)]
mod tests {
    use super::*;

    // The registry is process-global and pthread ids can be recycled, so
    // each test runs on its own thread and deletes the arena on both
    // ends.
    fn on_fresh_arena_thread<F: FnOnce() + Send + 'static>(f: F) {
        std::thread::spawn(move || {
            delete_arena();
            f();
            delete_arena();
        })
        .join()
        .expect("arena test thread panicked");
    }

    #[test]
    fn alloc_creates_the_arena_on_first_use() {
        on_fresh_arena_thread(|| {
            assert!(!has_arena());
            let ptr = alloc(32).unwrap();
            assert!(has_arena());
            // SAFETY: 32 bytes just allocated on this thread's arena.
            let bytes = unsafe { std::slice::from_raw_parts(ptr.as_ptr(), 32) };
            assert!(bytes.iter().all(|&b| b == 0));
        });
    }

    #[test]
    fn delete_arena_forgets_the_thread_entry() {
        on_fresh_arena_thread(|| {
            alloc(8).unwrap();
            assert!(has_arena());
            delete_arena();
            assert!(!has_arena());
            // Deleting twice is fine.
            delete_arena();
        });
    }

    #[test]
    fn clear_without_an_arena_is_a_no_op() {
        on_fresh_arena_thread(|| {
            clear();
            assert!(!has_arena());
        });
    }

    #[test]
    fn checkpoint_gates_persistent_alloc() {
        on_fresh_arena_thread(|| {
            alloc(16).unwrap();
            let cp = checkpoint_new();
            assert_eq!(alloc(1), Err(AllocError::CheckpointsActive));
            assert!(checkpoint_alloc(cp, 64).is_ok());
            checkpoint_delete(cp).unwrap();
            assert!(alloc(1).is_ok());
        });
    }

    #[test]
    fn checkpoint_delete_without_an_arena_reports_stale() {
        on_fresh_arena_thread(|| {
            let cp = checkpoint_new();
            delete_arena();
            assert_eq!(
                checkpoint_delete(cp),
                Err(AllocError::StaleCheckpoint {
                    generation: cp.generation()
                })
            );
        });
    }

    #[test]
    fn free_is_a_no_op() {
        on_fresh_arena_thread(|| {
            let ptr = alloc(4).unwrap();
            free(ptr);
            // The allocation is still there and still writable.
            // SAFETY: 4 bytes allocated above on this thread's arena.
            unsafe { *ptr.as_ptr() = 0xff };
        });
    }
}
