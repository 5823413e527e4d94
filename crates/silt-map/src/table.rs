//! Open-hashing table with bucket chaining and doubling growth.
//!
//! [`Table`] maps `u64` keys to owned values. Each bucket is a small
//! vector of key/value entries; collisions chain within the bucket and
//! lookups linearly scan exactly one bucket. The bucket array doubles
//! (never shrinks) when the load factor would pass 3/4 on insert, and
//! every entry is redistributed under the table's seed.

use smallvec::SmallVec;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::hash::murmur3_32;

/// Bucket-count floor: the first growth jumps straight to this size.
const MIN_BUCKETS: usize = 4;

/// Entries stored inline per bucket before the bucket spills to the heap.
const BUCKET_INLINE: usize = 4;

/// Maximum load factor, as `MAX_LOAD_NUM / MAX_LOAD_DEN` (3/4).
///
/// Growth runs when `(len + 1) / bucket_count` would exceed this ratio.
const MAX_LOAD_NUM: usize = 3;
const MAX_LOAD_DEN: usize = 4;

struct Entry<V> {
    key: u64,
    value: V,
}

type Bucket<V> = SmallVec<[Entry<V>; BUCKET_INLINE]>;

#[inline]
fn bucket_index(seed: u32, key: u64, bucket_count: usize) -> usize {
    murmur3_32(&key.to_ne_bytes(), seed) as usize % bucket_count
}

/// Map from `u64` keys to owned values, hashed with murmur3-32.
///
/// # Invariants
///
/// - A key is present in at most one (bucket, position) at a time;
///   inserting a duplicate key replaces the value in place.
/// - Bucket-array length and per-bucket capacities only ever grow.
pub struct Table<V> {
    seed: u32,
    buckets: Vec<Bucket<V>>,
    len: usize,
}

impl<V> Table<V> {
    /// Create an empty table with a time-derived seed.
    ///
    /// No buckets are allocated until the first insert.
    pub fn new() -> Self {
        Self::with_seed(time_seed())
    }

    /// Create an empty table with an explicit seed.
    ///
    /// Fixing the seed makes bucket placement deterministic, which tests
    /// rely on.
    pub fn with_seed(seed: u32) -> Self {
        Self {
            seed,
            buckets: Vec::new(),
            len: 0,
        }
    }

    /// The seed this table hashes with.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Number of entries stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current length of the bucket array.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Insert `value` under `key`, returning the displaced value if the
    /// key was already present.
    ///
    /// A replacing insert never grows the table; a fresh insert grows
    /// first when the post-insert load factor would exceed 3/4.
    pub fn insert(&mut self, key: u64, value: V) -> Option<V> {
        if !self.buckets.is_empty() {
            let idx = bucket_index(self.seed, key, self.buckets.len());
            if let Some(entry) = self.buckets[idx].iter_mut().find(|e| e.key == key) {
                return Some(std::mem::replace(&mut entry.value, value));
            }
        }

        if (self.len + 1) * MAX_LOAD_DEN > self.buckets.len() * MAX_LOAD_NUM {
            self.grow();
        }

        let idx = bucket_index(self.seed, key, self.buckets.len());
        self.buckets[idx].push(Entry { key, value });
        self.len += 1;
        None
    }

    /// Look up the value stored under `key`.
    pub fn get(&self, key: u64) -> Option<&V> {
        if self.buckets.is_empty() {
            return None;
        }
        let idx = bucket_index(self.seed, key, self.buckets.len());
        self.buckets[idx]
            .iter()
            .find(|e| e.key == key)
            .map(|e| &e.value)
    }

    /// Look up the value stored under `key`, mutably.
    pub fn get_mut(&mut self, key: u64) -> Option<&mut V> {
        if self.buckets.is_empty() {
            return None;
        }
        let idx = bucket_index(self.seed, key, self.buckets.len());
        self.buckets[idx]
            .iter_mut()
            .find(|e| e.key == key)
            .map(|e| &mut e.value)
    }

    /// Detach and return the value stored under `key`.
    ///
    /// The bucket is compacted in place; its capacity is retained.
    pub fn remove(&mut self, key: u64) -> Option<V> {
        if self.buckets.is_empty() {
            return None;
        }
        let idx = bucket_index(self.seed, key, self.buckets.len());
        let bucket = &mut self.buckets[idx];
        let pos = bucket.iter().position(|e| e.key == key)?;
        let entry = bucket.remove(pos);
        self.len -= 1;
        Some(entry.value)
    }

    /// Tear the table down, handing every stored value to `finalizer`.
    ///
    /// Entry order is unspecified. Dropping the table instead finalizes
    /// values through their own `Drop` impls.
    pub fn finish_with<F>(mut self, mut finalizer: F)
    where
        F: FnMut(V),
    {
        for bucket in self.buckets.drain(..) {
            for entry in bucket {
                finalizer(entry.value);
            }
        }
        self.len = 0;
    }

    /// Double the bucket array (floor [`MIN_BUCKETS`]) and redistribute
    /// every entry under the table's seed.
    fn grow(&mut self) {
        let new_count = (self.buckets.len() * 2).max(MIN_BUCKETS);
        let mut new_buckets: Vec<Bucket<V>> = Vec::new();
        new_buckets.resize_with(new_count, SmallVec::new);

        let seed = self.seed;
        for bucket in self.buckets.drain(..) {
            for entry in bucket {
                let idx = bucket_index(seed, entry.key, new_count);
                new_buckets[idx].push(entry);
            }
        }
        self.buckets = new_buckets;
    }
}

impl<V> Default for Table<V> {
    fn default() -> Self {
        Self::new()
    }
}

fn time_seed() -> u32 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs() as u32 ^ elapsed.subsec_nanos(),
        Err(_) => 0,
    }
}
