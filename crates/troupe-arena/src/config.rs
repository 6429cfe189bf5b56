//! Arena configuration parameters.

/// Configuration for the arena allocator.
///
/// Validated at construction; the capacity is immutable for the arena's
/// lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Size of the backing buffer in bytes.
    ///
    /// Default: 1 MiB. Must be non-zero and a multiple of the 16-byte
    /// grain.
    pub capacity_bytes: u32,
}

impl ArenaConfig {
    /// Default backing capacity: 1 MiB.
    pub const DEFAULT_CAPACITY_BYTES: u32 = 1 << 20;

    /// Create a config with the given capacity.
    pub fn new(capacity_bytes: u32) -> Self {
        Self { capacity_bytes }
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY_BYTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capacity_is_one_mebibyte() {
        assert_eq!(ArenaConfig::default().capacity_bytes, 1024 * 1024);
    }

    #[test]
    fn new_preserves_capacity() {
        assert_eq!(ArenaConfig::new(4096).capacity_bytes, 4096);
    }
}
