//! Benchmark-only crate; see `benches/` for the criterion harnesses.
//!
//! Not published. Kept as a separate workspace member so the allocator
//! crates do not carry criterion in their own dev-dependency graphs.
