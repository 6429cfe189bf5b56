//! Block handles and allocation directions.
//!
//! A [`BlockHandle`] names one arena block by slot index plus the
//! generation stamped when the block was allocated. Generations are
//! monotonic for the arena's whole lifetime (they survive `reset`), so a
//! handle whose block has been freed — or whose slot has been reused — can
//! never revalidate. Staleness checks are O(1): compare the handle's
//! generation against the slot's.

use std::fmt;

/// Which end of the buffer an allocation grows from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// From the low end, cursor moving up. Instance state and pooled
    /// modules live here.
    Forward,
    /// From the high end, cursor moving down. Persistent and shared-slot
    /// modules live here.
    Backward,
}

/// Handle to one live arena block.
///
/// Cheap to copy and safe to hold across frees: resolution returns `None`
/// once the block is gone. Handles never cross a `reset` — the generation
/// counter keeps counting, so pre-reset handles are permanently stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct BlockHandle {
    pub(crate) slot: u32,
    pub(crate) generation: u32,
}

impl BlockHandle {
    pub(crate) fn new(slot: u32, generation: u32) -> Self {
        Self { slot, generation }
    }

    /// Index of the metadata slot this handle refers to.
    pub fn slot(&self) -> u32 {
        self.slot
    }

    /// Generation stamped at allocation time.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for BlockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHandle(slot={}, gen={})", self.slot, self.generation)
    }
}
