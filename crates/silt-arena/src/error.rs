//! Allocator error types.
//!
//! Only recoverable conditions are represented here. Unrecoverable ones
//! (reservation failure, exceeding the reservation ceiling, double arena
//! registration) terminate the process from the site that detects them —
//! the allocator cannot run without its own bookkeeping memory.

use std::error::Error;
use std::fmt;

/// Errors surfaced by arena allocation and checkpoint operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// Persistent allocation was refused because the arena has at least
    /// one outstanding checkpoint. A contract violation by the caller,
    /// not an allocator fault: delete the checkpoints first.
    CheckpointsActive,
    /// The OS refused to commit the next page(s). The arena is left
    /// unchanged; the caller may retry later or abandon the allocation.
    CommitFailed {
        /// `errno` reported by the failed commit call.
        errno: i32,
    },
    /// The checkpoint handle refers to a checkpoint that has already been
    /// rolled back (directly, or by rolling back an earlier one).
    StaleCheckpoint {
        /// The generation encoded in the stale handle.
        generation: u64,
    },
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CheckpointsActive => {
                write!(f, "persistent allocation refused: checkpoints are outstanding")
            }
            Self::CommitFailed { errno } => {
                write!(f, "page commit failed (errno {errno})")
            }
            Self::StaleCheckpoint { generation } => {
                write!(f, "stale checkpoint handle: generation {generation}")
            }
        }
    }
}

impl Error for AllocError {}

/// Errors from growing a [`VmRegion`](crate::VmRegion).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GrowError {
    /// The requested committed size exceeds the fixed reservation. No
    /// larger range was ever reserved, so the caller cannot continue.
    OutOfReservation {
        /// Number of pages the caller asked to have committed.
        requested_pages: usize,
        /// Number of pages in the whole reservation.
        reserved_pages: usize,
    },
    /// The OS page-commit call itself failed. Recoverable: nothing about
    /// the region changed.
    CommitFailed {
        /// `errno` reported by the failed commit call.
        errno: i32,
    },
}

impl fmt::Display for GrowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfReservation {
                requested_pages,
                reserved_pages,
            } => {
                write!(
                    f,
                    "out of reserved address space: requested {requested_pages} pages, reserved {reserved_pages}"
                )
            }
            Self::CommitFailed { errno } => {
                write!(f, "page commit failed (errno {errno})")
            }
        }
    }
}

impl Error for GrowError {}
