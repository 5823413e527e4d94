//! Per-thread arena lifecycle and cross-thread isolation.

use silt_arena::{thread, ArenaConfig};

fn scenario<F: FnOnce() + Send + 'static>(f: F) {
    std::thread::spawn(move || {
        thread::delete_arena();
        f();
        thread::delete_arena();
    })
    .join()
    .expect("scenario thread panicked");
}

#[test]
fn allocations_are_aligned_zeroed_and_disjoint() {
    scenario(|| {
        let a = thread::alloc(4).unwrap();
        let b = thread::alloc(1).unwrap();
        let c = thread::alloc(24).unwrap();

        let alignment = ArenaConfig::DEFAULT_ALIGNMENT;
        assert_eq!(b.as_ptr() as usize % alignment, 0);
        assert_eq!(c.as_ptr() as usize % alignment, 0);

        assert!((a.as_ptr() as usize) + 4 <= b.as_ptr() as usize);
        assert!((b.as_ptr() as usize) + 1 <= c.as_ptr() as usize);

        // SAFETY: 24 bytes just allocated on this thread's arena.
        let bytes = unsafe { std::slice::from_raw_parts(c.as_ptr(), 24) };
        assert!(bytes.iter().all(|&b| b == 0));
    });
}

#[test]
fn one_large_allocation_commits_pages_on_demand() {
    scenario(|| {
        // 8M of i64 — far past the initially committed single page.
        let len = 8_000_000 * std::mem::size_of::<i64>();
        let ptr = thread::alloc(len).unwrap();
        // SAFETY: `len` bytes just allocated on this thread's arena.
        unsafe {
            *ptr.as_ptr() = 0x11;
            *ptr.as_ptr().add(len / 2) = 0x22;
            *ptr.as_ptr().add(len - 1) = 0x33;
        }
        thread::clear();
    });
}

#[test]
fn clear_reuses_the_arena_without_reallocating() {
    scenario(|| {
        let first = thread::alloc(100).unwrap();
        thread::clear();
        let second = thread::alloc(100).unwrap();
        // Same arena, same starting offset.
        assert_eq!(first.as_ptr(), second.as_ptr());
    });
}

#[test]
fn delete_then_alloc_starts_a_fresh_arena() {
    scenario(|| {
        thread::alloc(64).unwrap();
        thread::delete_arena();
        assert!(!thread::has_arena());

        // Next allocation transparently builds a new arena.
        let ptr = thread::alloc(64).unwrap();
        assert!(thread::has_arena());
        // SAFETY: 64 bytes just allocated on this thread's arena.
        unsafe { *ptr.as_ptr() = 1 };
    });
}

#[test]
fn sibling_threads_allocate_from_disjoint_arenas() {
    // All four arenas are held alive across the barrier so their
    // address ranges must be pairwise distinct.
    let barrier = std::sync::Arc::new(std::sync::Barrier::new(4));
    let workers: Vec<_> = (0..4u8)
        .map(|fill| {
            let barrier = std::sync::Arc::clone(&barrier);
            std::thread::spawn(move || {
                thread::delete_arena();
                let ptr = thread::alloc(4096).unwrap();
                // SAFETY: 4096 bytes just allocated on this worker's arena.
                let ok = unsafe {
                    std::ptr::write_bytes(ptr.as_ptr(), fill, 4096);
                    std::slice::from_raw_parts(ptr.as_ptr(), 4096)
                        .iter()
                        .all(|&b| b == fill)
                };
                barrier.wait();
                thread::delete_arena();
                (ptr.as_ptr() as usize, ok)
            })
        })
        .collect();

    let mut bases: Vec<usize> = Vec::new();
    for worker in workers {
        let (base, ok) = worker.join().expect("worker panicked");
        assert!(ok, "another thread scribbled over this arena");
        bases.push(base);
    }
    bases.sort_unstable();
    bases.dedup();
    assert_eq!(bases.len(), 4, "arenas shared a base address");
}
