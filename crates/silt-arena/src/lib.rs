//! Thread-confined bump arenas over lazily committed virtual memory.
//!
//! Each thread gets at most one [`Arena`]. An arena reserves a large
//! fixed range of address space up front (32 GiB on 64-bit targets, no
//! physical memory consumed) and commits pages read/write on demand as
//! allocation advances through it. Allocations are bump-pointer, zeroed,
//! and never individually freed: memory comes back through
//! [`thread::clear`], checkpoint rollback, or [`thread::delete_arena`].
//!
//! # Architecture
//!
//! ```text
//! thread (per-thread entry points)
//! └── registry (global mutex, thread id → Arena, via silt-map)
//!     └── Arena (bump offset + checkpoint stack)
//!         └── VmRegion (reserve once, commit page by page)
//! ```
//!
//! # Checkpoints
//!
//! A checkpoint snapshots the arena's offset; rolling back restores it,
//! discarding everything allocated since — including any checkpoints
//! created later. While checkpoints are outstanding the arena refuses
//! persistent allocation, so nothing permanent can land in a span a
//! rollback would reclaim; [`thread::checkpoint_alloc`] is the exempt
//! path for allocations that are *meant* to be reclaimed.
//!
//! # Confinement
//!
//! Arenas, the pointers they return, and checkpoint handles must stay on
//! the thread that created them. Only the registry is synchronized, and
//! its mutex is never held across a page-commit syscall.
//!
//! This crate contains the workspace's `unsafe` code (the mmap layer and
//! the registry's unlocked arena hand-out); `silt-map` carries none.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod arena;
pub mod checkpoint;
pub mod config;
pub mod error;
mod registry;
pub mod thread;
pub mod traits;
pub mod vmem;

// Public re-exports for the primary API surface.
pub use arena::{align_up, Arena};
pub use checkpoint::CheckpointHandle;
pub use config::ArenaConfig;
pub use error::{AllocError, GrowError};
pub use traits::{Alloc, ThreadArena};
pub use vmem::{VmRegion, RESERVATION_CEILING};
