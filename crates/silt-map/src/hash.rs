//! Murmur3 32-bit hash.
//!
//! The standard public-domain algorithm: 4-byte little-endian chunks
//! through the scramble, a byte-folded tail, and the avalanche finalizer.
//! Little-endian reads are fixed (rather than native) so the function
//! hashes identically on every target.

const C1: u32 = 0xcc9e_2d51;
const C2: u32 = 0x1b87_3593;

#[inline]
fn scramble(k: u32) -> u32 {
    k.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2)
}

/// Hash `key` with murmur3-32 under the given seed.
///
/// Not cryptographic. Used by [`Table`](crate::Table) to pick buckets.
pub fn murmur3_32(key: &[u8], seed: u32) -> u32 {
    let mut h = seed;

    let mut chunks = key.chunks_exact(4);
    for chunk in &mut chunks {
        let k = u32::from_le_bytes(chunk.try_into().expect("chunks_exact yields 4-byte chunks"));
        h ^= scramble(k);
        h = h.rotate_left(13);
        h = h.wrapping_mul(5).wrapping_add(0xe654_6b64);
    }

    // Fold the 0..=3 trailing bytes high-to-low; scramble(0) == 0, so an
    // empty tail leaves h untouched.
    let mut k = 0u32;
    for &byte in chunks.remainder().iter().rev() {
        k = (k << 8) | u32::from(byte);
    }
    h ^= scramble(k);

    h ^= key.len() as u32;
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^ (h >> 16)
}
