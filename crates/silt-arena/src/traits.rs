//! Allocator capability trait.
//!
//! [`Alloc`] is the seam through which code can take "something that
//! allocates" without caring whether individual release is meaningful
//! for it. Arena-backed implementations reclaim memory wholesale, so
//! their `release` legitimately does nothing; a free-list allocator
//! substituted behind the same trait would actually free.

use std::ptr::NonNull;

use crate::arena::Arena;
use crate::error::AllocError;
use crate::thread;

/// Minimal allocator capability: allocate and release.
pub trait Alloc {
    /// Allocate `size` zeroed bytes.
    fn allocate(&mut self, size: usize) -> Result<NonNull<u8>, AllocError>;

    /// Release one allocation.
    ///
    /// Implementations that only reclaim wholesale treat this as a
    /// no-op; callers may not assume the memory is reusable afterwards.
    fn release(&mut self, ptr: NonNull<u8>);
}

impl Alloc for Arena {
    fn allocate(&mut self, size: usize) -> Result<NonNull<u8>, AllocError> {
        self.alloc(size)
    }

    fn release(&mut self, _ptr: NonNull<u8>) {}
}

/// The calling thread's arena as an [`Alloc`] capability.
///
/// Zero-sized; each call resolves the thread's arena through the
/// registry, creating it on first use.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadArena;

impl Alloc for ThreadArena {
    fn allocate(&mut self, size: usize) -> Result<NonNull<u8>, AllocError> {
        thread::alloc(size)
    }

    fn release(&mut self, ptr: NonNull<u8>) {
        thread::free(ptr);
    }
}
