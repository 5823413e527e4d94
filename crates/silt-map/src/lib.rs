//! Seeded open-hashing table backing the silt arena registry.
//!
//! Provides [`Table`], a minimal map from `u64` keys to owned values with
//! bucket chaining, murmur3-32 hashing, and doubling growth. The arena
//! registry in `silt-arena` is its primary consumer, but nothing here is
//! allocator-specific.
//!
//! The hash seed is per-instance and time-derived by default. This is a
//! non-adversarial table: the seed decorrelates bucket distributions
//! between instances, it does not harden against crafted key sets.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod hash;
pub mod table;

pub use hash::murmur3_32;
pub use table::Table;
