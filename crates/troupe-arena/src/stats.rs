//! Observational accounting snapshot for the arena.

/// Point-in-time accounting for an arena.
///
/// Returned by [`Arena::stats`](crate::Arena::stats). The books always
/// balance: `total_allocated + total_free == capacity` after every
/// operation, and `total_allocated` equals the sum of live block sizes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Capacity of the backing buffer in bytes.
    pub capacity: u32,
    /// Bytes held by live blocks (all sizes grain-rounded).
    pub total_allocated: u32,
    /// Bytes not held by any live block: the cursor gap plus every
    /// interior free range.
    pub total_free: u32,
    /// Largest single allocation that could succeed right now — the
    /// cursor gap or the biggest interior free range, whichever is
    /// larger (interior ranges are handed out on exact size match only).
    pub max_free_block: u32,
    /// Number of interior free ranges across both directions.
    pub free_ranges: u32,
    /// Number of live blocks.
    pub live_blocks: u32,
    /// Forward cursor position.
    pub front: u32,
    /// Backward cursor position.
    pub back: u32,
}

impl ArenaStats {
    /// Fraction of the buffer held by live blocks, in `[0.0, 1.0]`.
    pub fn utilisation(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        f64::from(self.total_allocated) / f64::from(self.capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utilisation_of_empty_stats_is_zero() {
        assert_eq!(ArenaStats::default().utilisation(), 0.0);
    }

    #[test]
    fn utilisation_is_allocated_over_capacity() {
        let stats = ArenaStats {
            capacity: 1024,
            total_allocated: 256,
            total_free: 768,
            ..ArenaStats::default()
        };
        assert!((stats.utilisation() - 0.25).abs() < 1e-12);
    }
}
