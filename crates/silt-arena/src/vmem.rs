//! Reserved-then-committed virtual memory regions.
//!
//! A [`VmRegion`] claims a large fixed range of address space up front
//! with no access rights (`PROT_NONE`, `MAP_NORESERVE` — no physical
//! memory is consumed) and grants read/write access one page range at a
//! time with `mprotect` as the arena grows into it. All pointer
//! arithmetic over the mapping stays inside this module; the arena layer
//! above works purely in offsets and lengths.

use std::ptr::NonNull;

use crate::error::GrowError;

#[cfg(not(unix))]
compile_error!("silt-arena relies on mmap/mprotect and supports only Unix targets");

/// Fixed size of every reservation: 32 GiB on 64-bit targets.
///
/// This is a hard ceiling on how much one arena can ever hold; growth
/// past it fails with [`GrowError::OutOfReservation`].
#[cfg(target_pointer_width = "64")]
pub const RESERVATION_CEILING: usize = 32 << 30;

/// Fixed size of every reservation: 1 GiB on 32-bit targets.
#[cfg(target_pointer_width = "32")]
pub const RESERVATION_CEILING: usize = 1 << 30;

#[cfg(not(any(target_pointer_width = "64", target_pointer_width = "32")))]
compile_error!("unsupported pointer width");

/// Emit a diagnostic and terminate the process.
///
/// Reserved for conditions under which no further allocator state can
/// exist: reservation failure, first-page commit failure, growth past
/// the reservation ceiling, double arena registration.
pub(crate) fn fatal(message: &str) -> ! {
    eprintln!("silt-arena: fatal: {message}");
    std::process::exit(1);
}

fn last_errno() -> i32 {
    std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

/// A reserved address range with a committed read/write prefix.
///
/// # Invariants
///
/// - `committed_capacity() = page_size × committed_pages ≤ reserved_capacity()`.
/// - The committed prefix only grows; the whole reservation is released
///   in one `munmap` on drop.
pub struct VmRegion {
    base: NonNull<u8>,
    reserved: usize,
    page_size: usize,
    committed_pages: usize,
}

// The region is a plain block of memory with a unique owner; the owner
// may move between threads (the registry hands arenas back under its
// mutex). `NonNull` alone is what blocks the auto impl.
unsafe impl Send for VmRegion {}

impl VmRegion {
    /// Reserve [`RESERVATION_CEILING`] bytes of address space, rounded
    /// down to whole pages, and commit the first page.
    ///
    /// Terminates the process if the OS denies the reservation or the
    /// first-page commit; there is no recoverable path without either.
    pub fn reserve() -> Self {
        let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if page_size <= 0 {
            fatal(&format!("sysconf(_SC_PAGESIZE) failed (errno {})", last_errno()));
        }
        let page_size = page_size as usize;
        let reserved = (RESERVATION_CEILING / page_size) * page_size;

        // SAFETY: anonymous private mapping, no existing memory involved.
        let base = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                reserved,
                libc::PROT_NONE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS | libc::MAP_NORESERVE,
                -1,
                0,
            )
        };
        if base == libc::MAP_FAILED {
            fatal(&format!(
                "failed to reserve {reserved} bytes of address space (errno {})",
                last_errno()
            ));
        }
        let base = match NonNull::new(base.cast::<u8>()) {
            Some(base) => base,
            None => fatal("mmap returned the null page"),
        };

        let mut region = Self {
            base,
            reserved,
            page_size,
            committed_pages: 0,
        };
        // The first page carries the first allocations; nothing works
        // without it.
        if let Err(err) = region.grow_to(1) {
            fatal(&format!("failed to commit the first page: {err}"));
        }
        region
    }

    /// OS page size this region was reserved with.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages currently committed read/write.
    pub fn committed_pages(&self) -> usize {
        self.committed_pages
    }

    /// Bytes currently accessible, always a whole number of pages.
    pub fn committed_capacity(&self) -> usize {
        self.page_size * self.committed_pages
    }

    /// Total bytes of reserved address space (the growth ceiling).
    pub fn reserved_capacity(&self) -> usize {
        self.reserved
    }

    /// Commit pages so that at least `pages` are read/write accessible.
    ///
    /// A no-op if that many pages are already committed. Fails with
    /// [`GrowError::OutOfReservation`] before touching the OS if the
    /// target exceeds the reservation, and [`GrowError::CommitFailed`]
    /// if the commit call itself is refused; the region is unchanged in
    /// both cases.
    pub fn grow_to(&mut self, pages: usize) -> Result<(), GrowError> {
        if pages <= self.committed_pages {
            return Ok(());
        }
        let reserved_pages = self.reserved / self.page_size;
        if pages > reserved_pages {
            return Err(GrowError::OutOfReservation {
                requested_pages: pages,
                reserved_pages,
            });
        }

        let start = self.committed_capacity();
        let len = (pages - self.committed_pages) * self.page_size;
        // SAFETY: `[base + start, base + start + len)` lies within our own
        // reservation and is page-aligned.
        let rc = unsafe {
            libc::mprotect(
                self.base.as_ptr().add(start).cast::<libc::c_void>(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
            )
        };
        if rc != 0 {
            return Err(GrowError::CommitFailed { errno: last_errno() });
        }
        self.committed_pages = pages;
        Ok(())
    }

    /// Pointer to the byte at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is beyond the committed capacity.
    pub(crate) fn ptr_at(&self, offset: usize) -> NonNull<u8> {
        assert!(offset <= self.committed_capacity());
        // SAFETY: in-bounds offset into a live mapping; base is non-null.
        unsafe { NonNull::new_unchecked(self.base.as_ptr().add(offset)) }
    }

    /// Zero-fill `len` bytes starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the span is not fully within the committed capacity.
    pub(crate) fn zero(&mut self, offset: usize, len: usize) {
        let end = offset.checked_add(len);
        assert!(end.is_some_and(|end| end <= self.committed_capacity()));
        // SAFETY: the span is committed read/write and uniquely owned.
        unsafe { std::ptr::write_bytes(self.base.as_ptr().add(offset), 0, len) };
    }
}

impl Drop for VmRegion {
    fn drop(&mut self) {
        // Releases committed and uncommitted pages alike.
        // SAFETY: unmapping exactly the range we mapped in `reserve`.
        unsafe {
            libc::munmap(self.base.as_ptr().cast::<libc::c_void>(), self.reserved);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_commits_exactly_one_page() {
        let region = VmRegion::reserve();
        assert!(region.page_size() > 0);
        assert_eq!(region.committed_pages(), 1);
        assert_eq!(region.committed_capacity(), region.page_size());
        assert_eq!(region.reserved_capacity(), RESERVATION_CEILING);
    }

    #[test]
    fn grow_extends_the_committed_prefix() {
        let mut region = VmRegion::reserve();
        region.grow_to(3).unwrap();
        assert_eq!(region.committed_pages(), 3);
        assert_eq!(region.committed_capacity(), 3 * region.page_size());
    }

    #[test]
    fn grow_below_current_is_a_no_op() {
        let mut region = VmRegion::reserve();
        region.grow_to(4).unwrap();
        region.grow_to(2).unwrap();
        assert_eq!(region.committed_pages(), 4);
    }

    #[test]
    fn grow_past_reservation_fails_before_any_commit() {
        let mut region = VmRegion::reserve();
        let reserved_pages = region.reserved_capacity() / region.page_size();
        let err = region.grow_to(reserved_pages + 1).unwrap_err();
        assert_eq!(
            err,
            GrowError::OutOfReservation {
                requested_pages: reserved_pages + 1,
                reserved_pages,
            }
        );
        // Nothing changed.
        assert_eq!(region.committed_pages(), 1);
    }

    #[test]
    fn committed_pages_are_readable_and_writable() {
        let mut region = VmRegion::reserve();
        region.grow_to(2).unwrap();
        let len = region.committed_capacity();
        region.zero(0, len);
        // SAFETY: whole committed range is zeroed and owned by `region`.
        let bytes = unsafe { std::slice::from_raw_parts(region.ptr_at(0).as_ptr(), len) };
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    #[should_panic]
    fn zero_beyond_committed_capacity_panics() {
        let mut region = VmRegion::reserve();
        let page = region.page_size();
        region.zero(0, page + 1);
    }
}
