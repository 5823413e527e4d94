//! Process-wide registry mapping threads to their arenas.
//!
//! One arena per thread, keyed by the OS thread identity, stored in a
//! [`silt_map::Table`] behind a single global mutex. The registry is
//! created lazily on first use and torn down once the last arena is
//! removed.
//!
//! The mutex guards only map lookup and mutation. Resolution hands the
//! caller a raw arena pointer so the allocation itself — including any
//! page-commit syscall — runs unlocked. That is sound only because
//! arenas are thread-confined: the entry for a key is dereferenced and
//! removed exclusively by the thread the key names, and the `Box` keeps
//! the arena's address stable while the pointer is in use.

use std::ptr::NonNull;
use std::sync::{Mutex, MutexGuard, PoisonError};

use silt_map::Table;

use crate::arena::Arena;
use crate::vmem::fatal;

static REGISTRY: Mutex<Option<Table<Box<Arena>>>> = Mutex::new(None);

fn lock() -> MutexGuard<'static, Option<Table<Box<Arena>>>> {
    REGISTRY.lock().unwrap_or_else(PoisonError::into_inner)
}

fn current_thread_key() -> u64 {
    // pthread_t is opaque but unique per live thread, which is all the
    // key needs to be.
    unsafe { libc::pthread_self() as u64 }
}

/// The calling thread's arena, if it has one.
pub(crate) fn lookup() -> Option<NonNull<Arena>> {
    let mut guard = lock();
    let table = guard.as_mut()?;
    table
        .get_mut(current_thread_key())
        .map(|arena| NonNull::from(arena.as_mut()))
}

/// The calling thread's arena, created (and registered) on first use.
pub(crate) fn resolve_or_create() -> NonNull<Arena> {
    if let Some(arena) = lookup() {
        return arena;
    }

    // Reserve outside the lock; only this thread can insert this key, so
    // the gap between lookup and insert is race-free.
    let mut arena = Box::new(Arena::new());
    let ptr = NonNull::from(arena.as_mut());

    let mut guard = lock();
    let table = guard.get_or_insert_with(Table::new);
    if table.insert(current_thread_key(), arena).is_some() {
        fatal("thread already owns an arena");
    }
    ptr
}

/// Detach and return the calling thread's arena, if any.
///
/// Tears down the registry's own storage once it holds no entries; it
/// is recreated lazily on the next use from any thread.
pub(crate) fn remove_current() -> Option<Box<Arena>> {
    let mut guard = lock();
    let table = guard.as_mut()?;
    let arena = table.remove(current_thread_key());
    if table.is_empty() {
        *guard = None;
    }
    arena
}
