//! Arena configuration parameters.

/// Configuration for an [`Arena`](crate::Arena).
///
/// Immutable after construction. The only tunable is the allocation
/// alignment; the reservation ceiling and page size are fixed by the
/// target and the OS respectively.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Alignment applied to every allocation, in bytes.
    ///
    /// Must be a power of two. Default: two pointer widths (16 bytes on
    /// 64-bit targets), large enough for any primitive type.
    pub alignment: usize,
}

impl ArenaConfig {
    /// Default allocation alignment: two pointer widths.
    pub const DEFAULT_ALIGNMENT: usize = 2 * std::mem::size_of::<*const u8>();

    /// Create a config with the default alignment.
    pub fn new() -> Self {
        Self {
            alignment: Self::DEFAULT_ALIGNMENT,
        }
    }

    /// Create a config with an explicit alignment.
    ///
    /// # Panics
    ///
    /// Panics if `alignment` is not a power of two.
    pub fn with_alignment(alignment: usize) -> Self {
        assert!(
            alignment.is_power_of_two(),
            "alignment must be a power of two, got {alignment}"
        );
        Self { alignment }
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new()
    }
}
