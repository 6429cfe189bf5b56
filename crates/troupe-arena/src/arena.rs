//! The dual-direction arena allocator.
//!
//! One fixed buffer, two bump cursors: `front` grows up for
//! [`Direction::Forward`] blocks, `back` grows down for
//! [`Direction::Backward`] blocks, and the gap between them is the
//! remaining headroom. Freeing a block at a cursor frontier retreats the
//! cursor (cascading through any free ranges it uncovers); freeing an
//! interior block parks its range on a per-direction free list for
//! exact-size reuse. There is no compaction — blocks never move while
//! live, which is what lets the loader write arena-absolute offsets into
//! module images.

use crate::config::ArenaConfig;
use crate::error::{ArenaError, IntegrityFault};
use crate::handle::{BlockHandle, Direction};
use crate::stats::ArenaStats;

/// Alignment and rounding unit for every block and for the capacity.
pub const GRAIN: u32 = 16;

const TAG_LIVE: u32 = 0xA110_CA7E;
const TAG_FREE: u32 = 0xDEAD_B10C;

/// Round a request up to the grain. Zero-byte requests occupy one minimum
/// block. `None` when rounding overflows `u32`.
fn align_up(size: u32) -> Option<u32> {
    if size == 0 {
        return Some(GRAIN);
    }
    size.checked_add(GRAIN - 1).map(|s| s & !(GRAIN - 1))
}

/// An interior range freed out of cursor order, awaiting exact-size reuse.
#[derive(Clone, Copy, Debug)]
struct FreeRange {
    offset: u32,
    size: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SlotState {
    Live,
    Retired,
}

/// Metadata for one block, live or retired.
#[derive(Clone, Debug)]
struct BlockSlot {
    offset: u32,
    size: u32,
    direction: Direction,
    state: SlotState,
    generation: u32,
    tag: u32,
}

/// Bounded dual-direction arena allocator.
///
/// All sizes are rounded up to [`GRAIN`]; returned blocks are zero-filled
/// and never overlap. `front <= back` holds after every operation, and
/// the accounting in [`stats`](Self::stats) always balances against the
/// capacity.
#[derive(Debug)]
pub struct Arena {
    buf: Vec<u8>,
    front: u32,
    back: u32,
    slots: Vec<BlockSlot>,
    free_slots: Vec<u32>,
    free_front: Vec<FreeRange>,
    free_back: Vec<FreeRange>,
    next_generation: u32,
    live_blocks: u32,
}

impl Arena {
    /// Build an arena with a zeroed backing buffer.
    ///
    /// Rejects a zero capacity or one off the 16-byte grain with
    /// [`ArenaError::AlignmentViolation`].
    pub fn new(config: ArenaConfig) -> Result<Self, ArenaError> {
        let capacity = config.capacity_bytes;
        if capacity == 0 || capacity % GRAIN != 0 {
            return Err(ArenaError::AlignmentViolation { value: capacity });
        }
        Ok(Self {
            buf: vec![0u8; capacity as usize],
            front: 0,
            back: capacity,
            slots: Vec::new(),
            free_slots: Vec::new(),
            free_front: Vec::new(),
            free_back: Vec::new(),
            next_generation: 1,
            live_blocks: 0,
        })
    }

    /// Capacity of the backing buffer in bytes.
    pub fn capacity(&self) -> u32 {
        self.buf.len() as u32
    }

    /// Contiguous bytes remaining between the cursors.
    pub fn remaining_gap(&self) -> u32 {
        self.back - self.front
    }

    /// Heap bytes held by the backing buffer.
    pub fn memory_bytes(&self) -> usize {
        self.buf.capacity()
    }

    /// Allocate a zero-filled block.
    ///
    /// Interior free ranges of the direction are searched first (exact
    /// rounded size only); otherwise the direction's cursor is bumped.
    /// Fails with [`ArenaError::OutOfMemory`] when the cursors would
    /// cross.
    pub fn allocate(&mut self, size: u32, direction: Direction) -> Result<BlockHandle, ArenaError> {
        let rounded = align_up(size).ok_or(ArenaError::AlignmentViolation { value: size })?;

        // 1. Exact-size reuse from the direction's free list.
        let reused = {
            let free_list = self.free_list_mut(direction);
            free_list
                .iter()
                .position(|r| r.size == rounded)
                .map(|pos| free_list.swap_remove(pos).offset)
        };

        // 2. Otherwise bump the cursor.
        let offset = match reused {
            Some(offset) => offset,
            None => {
                let gap = self.back - self.front;
                if rounded > gap {
                    return Err(ArenaError::OutOfMemory {
                        requested: rounded,
                        available: gap,
                        front: self.front,
                        back: self.back,
                    });
                }
                match direction {
                    Direction::Forward => {
                        let offset = self.front;
                        self.front += rounded;
                        offset
                    }
                    Direction::Backward => {
                        self.back -= rounded;
                        self.back
                    }
                }
            }
        };

        // 3. Zero the block and record its slot.
        self.buf[offset as usize..(offset + rounded) as usize].fill(0);
        let generation = self.next_generation;
        self.next_generation += 1;
        let slot = BlockSlot {
            offset,
            size: rounded,
            direction,
            state: SlotState::Live,
            generation,
            tag: TAG_LIVE,
        };
        let slot_idx = if let Some(idx) = self.free_slots.pop() {
            self.slots[idx as usize] = slot;
            idx
        } else {
            let idx = self.slots.len() as u32;
            self.slots.push(slot);
            idx
        };
        self.live_blocks += 1;
        Ok(BlockHandle::new(slot_idx, generation))
    }

    /// Free a block.
    ///
    /// A block ending at `front` (or starting at `back`) retreats the
    /// cursor and cascades through any free ranges it uncovers; an
    /// interior block's range joins the direction's free list.
    ///
    /// An invalid handle — double free, reused slot, foreign slot index —
    /// panics in debug builds with the diagnosed [`IntegrityFault`] and is
    /// a silent no-op in release builds.
    pub fn free(&mut self, handle: BlockHandle) {
        match self.check_live(handle) {
            Ok(idx) => self.release_slot(idx),
            Err(fault) => {
                if cfg!(debug_assertions) {
                    panic!("invalid free: {fault}");
                }
            }
        }
    }

    /// Resize a block, preserving its leading bytes.
    ///
    /// Growth is in place when trailing space is available: the cursor
    /// frontier for the frontmost `Forward` block, or an adjacent free
    /// range (either direction). Otherwise the block is relocated — new
    /// allocation, copy, free — and a fresh handle is returned; `Backward`
    /// blocks at the frontier always relocate, since extending them
    /// downward would shift their contents. Shrinking is always in place.
    /// New bytes are zero-filled either way.
    ///
    /// A stale handle is [`ArenaError::StaleHandle`] in release builds and
    /// a fatal panic in debug builds.
    pub fn realloc(&mut self, handle: BlockHandle, new_size: u32) -> Result<BlockHandle, ArenaError> {
        let idx = match self.check_live(handle) {
            Ok(idx) => idx,
            Err(fault) => {
                if cfg!(debug_assertions) {
                    panic!("invalid realloc: {fault}");
                }
                let slot_generation = self
                    .slots
                    .get(handle.slot as usize)
                    .map(|s| s.generation)
                    .unwrap_or(0);
                return Err(ArenaError::StaleHandle {
                    handle_generation: handle.generation,
                    slot_generation,
                });
            }
        };
        let rounded = align_up(new_size).ok_or(ArenaError::AlignmentViolation { value: new_size })?;
        let (offset, size, direction) = {
            let slot = &self.slots[idx];
            (slot.offset, slot.size, slot.direction)
        };

        if rounded == size {
            return Ok(handle);
        }

        if rounded < size {
            // Shrink in place; the tail retreats the cursor or joins the
            // free list.
            self.slots[idx].size = rounded;
            self.reclaim_range(offset + rounded, size - rounded, direction);
            return Ok(handle);
        }

        let extension = rounded - size;

        // Grow in place off the cursor frontier.
        if direction == Direction::Forward
            && offset + size == self.front
            && extension <= self.back - self.front
        {
            self.front += extension;
            self.buf[(offset + size) as usize..(offset + rounded) as usize].fill(0);
            self.slots[idx].size = rounded;
            return Ok(handle);
        }

        // Grow in place into an adjacent trailing free range.
        let grew_adjacent = {
            let free_list = self.free_list_mut(direction);
            match free_list
                .iter()
                .position(|r| r.offset == offset + size && r.size >= extension)
            {
                Some(pos) => {
                    free_list[pos].offset += extension;
                    free_list[pos].size -= extension;
                    if free_list[pos].size == 0 {
                        free_list.swap_remove(pos);
                    }
                    true
                }
                None => false,
            }
        };
        if grew_adjacent {
            self.buf[(offset + size) as usize..(offset + rounded) as usize].fill(0);
            self.slots[idx].size = rounded;
            return Ok(handle);
        }

        // Relocate.
        let new_handle = self.allocate(new_size, direction)?;
        let new_offset = self.slots[new_handle.slot as usize].offset;
        self.buf
            .copy_within(offset as usize..(offset + size) as usize, new_offset as usize);
        self.release_slot(idx);
        Ok(new_handle)
    }

    /// Resolve a handle to its bytes. `None` if stale.
    pub fn get(&self, handle: BlockHandle) -> Option<&[u8]> {
        let idx = self.live_index(handle)?;
        let slot = &self.slots[idx];
        Some(&self.buf[slot.offset as usize..(slot.offset + slot.size) as usize])
    }

    /// Resolve a handle to its bytes, mutably. `None` if stale.
    pub fn get_mut(&mut self, handle: BlockHandle) -> Option<&mut [u8]> {
        let idx = self.live_index(handle)?;
        let slot = &self.slots[idx];
        let range = slot.offset as usize..(slot.offset + slot.size) as usize;
        Some(&mut self.buf[range])
    }

    /// Rounded size of a live block. `None` if stale.
    pub fn size_of(&self, handle: BlockHandle) -> Option<u32> {
        self.live_index(handle).map(|idx| self.slots[idx].size)
    }

    /// Buffer offset of a live block. `None` if stale.
    ///
    /// Blocks never move while live, so the offset is stable for the
    /// block's whole lifetime — the loader relies on this when writing
    /// arena-absolute offsets into module images.
    pub fn offset_of(&self, handle: BlockHandle) -> Option<u32> {
        self.live_index(handle).map(|idx| self.slots[idx].offset)
    }

    /// Whether a handle currently resolves.
    pub fn contains(&self, handle: BlockHandle) -> bool {
        self.live_index(handle).is_some()
    }

    /// Diagnose a handle without side effects.
    ///
    /// `Ok` for a live handle; otherwise the same fault classification
    /// `free` and `realloc` would act on.
    pub fn validate_handle(&self, handle: BlockHandle) -> Result<(), IntegrityFault> {
        self.check_live(handle).map(|_| ())
    }

    /// Point-in-time accounting snapshot.
    pub fn stats(&self) -> ArenaStats {
        let gap = self.back - self.front;
        let interior: u32 = self
            .free_front
            .iter()
            .chain(self.free_back.iter())
            .map(|r| r.size)
            .sum();
        let max_range = self
            .free_front
            .iter()
            .chain(self.free_back.iter())
            .map(|r| r.size)
            .max()
            .unwrap_or(0);
        let total_free = gap + interior;
        ArenaStats {
            capacity: self.capacity(),
            total_allocated: self.capacity() - total_free,
            total_free,
            max_free_block: gap.max(max_range),
            free_ranges: (self.free_front.len() + self.free_back.len()) as u32,
            live_blocks: self.live_blocks,
            front: self.front,
            back: self.back,
        }
    }

    /// Return the arena to its freshly-built state.
    ///
    /// Every block is discarded; the generation counter keeps counting so
    /// handles issued before the reset never revalidate.
    pub fn reset(&mut self) {
        self.front = 0;
        self.back = self.capacity();
        self.slots.clear();
        self.free_slots.clear();
        self.free_front.clear();
        self.free_back.clear();
        self.live_blocks = 0;
    }

    // ── Internal ───────────────────────────────────────────────────────

    fn free_list_mut(&mut self, direction: Direction) -> &mut Vec<FreeRange> {
        match direction {
            Direction::Forward => &mut self.free_front,
            Direction::Backward => &mut self.free_back,
        }
    }

    fn live_index(&self, handle: BlockHandle) -> Option<usize> {
        let slot = self.slots.get(handle.slot as usize)?;
        (slot.generation == handle.generation && slot.state == SlotState::Live)
            .then_some(handle.slot as usize)
    }

    fn check_live(&self, handle: BlockHandle) -> Result<usize, IntegrityFault> {
        let idx = handle.slot as usize;
        let Some(slot) = self.slots.get(idx) else {
            return Err(IntegrityFault::BadSlot {
                slot: handle.slot,
                slot_count: self.slots.len() as u32,
            });
        };
        if slot.generation != handle.generation {
            return Err(IntegrityFault::UseAfterFree {
                slot: handle.slot,
                handle_generation: handle.generation,
                slot_generation: slot.generation,
            });
        }
        if slot.state == SlotState::Retired || slot.tag != TAG_LIVE {
            return Err(IntegrityFault::DoubleFree {
                slot: handle.slot,
                offset: slot.offset,
                size: slot.size,
            });
        }
        Ok(idx)
    }

    fn release_slot(&mut self, idx: usize) {
        let (offset, size, direction) = {
            let slot = &mut self.slots[idx];
            slot.state = SlotState::Retired;
            slot.tag = TAG_FREE;
            (slot.offset, slot.size, slot.direction)
        };
        self.free_slots.push(idx as u32);
        self.live_blocks -= 1;
        self.reclaim_range(offset, size, direction);
    }

    fn reclaim_range(&mut self, offset: u32, size: u32, direction: Direction) {
        match direction {
            Direction::Forward => {
                if offset + size == self.front {
                    self.front = offset;
                    // Cascade through ranges now touching the frontier.
                    while let Some(pos) = self
                        .free_front
                        .iter()
                        .position(|r| r.offset + r.size == self.front)
                    {
                        self.front = self.free_front.swap_remove(pos).offset;
                    }
                } else {
                    self.free_front.push(FreeRange { offset, size });
                }
            }
            Direction::Backward => {
                if offset == self.back {
                    self.back = offset + size;
                    while let Some(pos) =
                        self.free_back.iter().position(|r| r.offset == self.back)
                    {
                        let range = self.free_back.swap_remove(pos);
                        self.back = range.offset + range.size;
                    }
                } else {
                    self.free_back.push(FreeRange { offset, size });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_arena(capacity: u32) -> Arena {
        Arena::new(ArenaConfig::new(capacity)).unwrap()
    }

    /// Sum of live block sizes, computed independently of `stats()`.
    fn live_sum(arena: &Arena, handles: &[BlockHandle]) -> u32 {
        handles.iter().filter_map(|&h| arena.size_of(h)).sum()
    }

    #[test]
    fn new_rejects_zero_capacity() {
        match Arena::new(ArenaConfig::new(0)) {
            Err(ArenaError::AlignmentViolation { value }) => assert_eq!(value, 0),
            other => panic!("expected AlignmentViolation, got {other:?}"),
        }
    }

    #[test]
    fn new_rejects_capacity_off_grain() {
        assert!(matches!(
            Arena::new(ArenaConfig::new(100)),
            Err(ArenaError::AlignmentViolation { value: 100 })
        ));
    }

    #[test]
    fn allocate_rounds_to_grain() {
        let mut arena = make_arena(256);
        let h = arena.allocate(1, Direction::Forward).unwrap();
        assert_eq!(arena.size_of(h), Some(GRAIN));
        let h2 = arena.allocate(17, Direction::Forward).unwrap();
        assert_eq!(arena.size_of(h2), Some(32));
        assert_eq!(arena.offset_of(h2), Some(GRAIN));
    }

    #[test]
    fn zero_byte_request_gets_minimum_block() {
        let mut arena = make_arena(64);
        let h = arena.allocate(0, Direction::Forward).unwrap();
        assert_eq!(arena.size_of(h), Some(GRAIN));
    }

    #[test]
    fn oversized_request_reports_alignment_overflow() {
        let mut arena = make_arena(64);
        assert!(matches!(
            arena.allocate(u32::MAX - 3, Direction::Forward),
            Err(ArenaError::AlignmentViolation { .. })
        ));
    }

    #[test]
    fn directions_grow_toward_each_other() {
        let mut arena = make_arena(128);
        let fwd = arena.allocate(16, Direction::Forward).unwrap();
        let bwd = arena.allocate(32, Direction::Backward).unwrap();
        assert_eq!(arena.offset_of(fwd), Some(0));
        assert_eq!(arena.offset_of(bwd), Some(96));
        assert_eq!(arena.remaining_gap(), 80);
    }

    #[test]
    fn out_of_memory_when_cursors_would_cross() {
        let mut arena = make_arena(64);
        arena.allocate(32, Direction::Forward).unwrap();
        arena.allocate(16, Direction::Backward).unwrap();
        match arena.allocate(32, Direction::Forward) {
            Err(ArenaError::OutOfMemory {
                requested,
                available,
                front,
                back,
            }) => {
                assert_eq!(requested, 32);
                assert_eq!(available, 16);
                assert_eq!(front, 32);
                assert_eq!(back, 48);
            }
            other => panic!("expected OutOfMemory, got {other:?}"),
        }
    }

    #[test]
    fn blocks_are_zero_filled_on_reuse() {
        let mut arena = make_arena(128);
        let h = arena.allocate(32, Direction::Forward).unwrap();
        arena.get_mut(h).unwrap().fill(0xAB);
        arena.allocate(16, Direction::Forward).unwrap(); // pin the frontier
        arena.free(h);
        let h2 = arena.allocate(32, Direction::Forward).unwrap();
        assert_eq!(arena.offset_of(h2), Some(0), "interior range reused");
        assert!(arena.get(h2).unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn free_at_frontier_retreats_front_cursor() {
        let mut arena = make_arena(128);
        let a = arena.allocate(16, Direction::Forward).unwrap();
        let b = arena.allocate(32, Direction::Forward).unwrap();
        assert_eq!(arena.stats().front, 48);
        arena.free(b);
        assert_eq!(arena.stats().front, 16);
        arena.free(a);
        assert_eq!(arena.stats().front, 0);
        assert_eq!(arena.stats().free_ranges, 0);
    }

    #[test]
    fn frontier_free_cascades_through_interior_ranges() {
        let mut arena = make_arena(128);
        let a = arena.allocate(16, Direction::Forward).unwrap();
        let b = arena.allocate(16, Direction::Forward).unwrap();
        let c = arena.allocate(16, Direction::Forward).unwrap();
        arena.free(b); // interior: becomes a free range
        assert_eq!(arena.stats().free_ranges, 1);
        arena.free(c); // frontier: retreat uncovers b's range
        let stats = arena.stats();
        assert_eq!(stats.front, 16);
        assert_eq!(stats.free_ranges, 0);
        arena.free(a);
        assert_eq!(arena.stats().front, 0);
    }

    #[test]
    fn backward_frontier_free_mirrors_forward() {
        let mut arena = make_arena(128);
        let a = arena.allocate(16, Direction::Backward).unwrap(); // 112..128
        let b = arena.allocate(16, Direction::Backward).unwrap(); // 96..112
        let c = arena.allocate(16, Direction::Backward).unwrap(); // 80..96
        arena.free(b);
        assert_eq!(arena.stats().free_ranges, 1);
        arena.free(c); // back frontier: retreat cascades through b
        let stats = arena.stats();
        assert_eq!(stats.back, 112);
        assert_eq!(stats.free_ranges, 0);
        arena.free(a);
        assert_eq!(arena.stats().back, 128);
    }

    #[test]
    fn interior_range_only_reused_on_exact_size() {
        let mut arena = make_arena(256);
        let a = arena.allocate(32, Direction::Forward).unwrap();
        arena.allocate(16, Direction::Forward).unwrap(); // pin
        arena.free(a);
        // A 16-byte request must not take the 32-byte range.
        let small = arena.allocate(16, Direction::Forward).unwrap();
        assert_eq!(arena.offset_of(small), Some(48));
        assert_eq!(arena.stats().free_ranges, 1);
        // An exact 32-byte request takes it.
        let exact = arena.allocate(32, Direction::Forward).unwrap();
        assert_eq!(arena.offset_of(exact), Some(0));
        assert_eq!(arena.stats().free_ranges, 0);
    }

    #[test]
    fn accounting_balances_after_mixed_operations() {
        let mut arena = make_arena(512);
        let mut live = Vec::new();
        live.push(arena.allocate(48, Direction::Forward).unwrap());
        live.push(arena.allocate(96, Direction::Backward).unwrap());
        live.push(arena.allocate(32, Direction::Forward).unwrap());
        let victim = live.remove(0);
        arena.free(victim);
        live.push(arena.allocate(16, Direction::Backward).unwrap());

        let stats = arena.stats();
        assert_eq!(stats.total_allocated + stats.total_free, stats.capacity);
        assert_eq!(stats.total_allocated, live_sum(&arena, &live));
        assert_eq!(stats.live_blocks, live.len() as u32);
        assert!(stats.front <= stats.back);
    }

    #[test]
    fn free_restores_max_free_block() {
        let mut arena = make_arena(256);
        let before = arena.stats();
        let h = arena.allocate(64, Direction::Forward).unwrap();
        assert!(arena.stats().max_free_block < before.max_free_block);
        arena.free(h);
        assert_eq!(arena.stats().max_free_block, before.max_free_block);
        assert_eq!(arena.stats(), before);
    }

    #[test]
    fn stale_handle_resolves_to_none() {
        let mut arena = make_arena(64);
        let h = arena.allocate(16, Direction::Forward).unwrap();
        assert!(arena.contains(h));
        arena.free(h);
        assert!(!arena.contains(h));
        assert!(arena.get(h).is_none());
        assert!(arena.size_of(h).is_none());
    }

    #[test]
    fn validate_handle_classifies_faults() {
        let mut arena = make_arena(128);
        let h = arena.allocate(16, Direction::Forward).unwrap();
        assert!(arena.validate_handle(h).is_ok());

        arena.free(h);
        assert!(matches!(
            arena.validate_handle(h),
            Err(IntegrityFault::DoubleFree { .. })
        ));

        // Slot reuse flips the diagnosis to use-after-free.
        let h2 = arena.allocate(16, Direction::Forward).unwrap();
        assert_eq!(h2.slot(), h.slot(), "slot reused");
        assert!(matches!(
            arena.validate_handle(h),
            Err(IntegrityFault::UseAfterFree { .. })
        ));

        let forged = BlockHandle::new(999, 1);
        assert!(matches!(
            arena.validate_handle(forged),
            Err(IntegrityFault::BadSlot { .. })
        ));
    }

    #[test]
    #[should_panic(expected = "invalid free")]
    fn double_free_panics_in_debug() {
        let mut arena = make_arena(64);
        let h = arena.allocate(16, Direction::Forward).unwrap();
        arena.free(h);
        arena.free(h);
    }

    #[test]
    fn realloc_same_rounded_size_keeps_handle() {
        let mut arena = make_arena(128);
        let h = arena.allocate(17, Direction::Forward).unwrap();
        let h2 = arena.realloc(h, 30).unwrap(); // both round to 32
        assert_eq!(h, h2);
        assert_eq!(arena.size_of(h), Some(32));
    }

    #[test]
    fn realloc_grows_in_place_at_frontier() {
        let mut arena = make_arena(128);
        let h = arena.allocate(16, Direction::Forward).unwrap();
        arena.get_mut(h).unwrap().fill(0xCD);
        let h2 = arena.realloc(h, 48).unwrap();
        assert_eq!(h, h2, "frontier growth keeps the handle");
        assert_eq!(arena.offset_of(h2), Some(0));
        let bytes = arena.get(h2).unwrap();
        assert!(bytes[..16].iter().all(|&b| b == 0xCD));
        assert!(bytes[16..].iter().all(|&b| b == 0), "extension zeroed");
        assert_eq!(arena.stats().front, 48);
    }

    #[test]
    fn realloc_grows_into_adjacent_free_range() {
        let mut arena = make_arena(256);
        let a = arena.allocate(16, Direction::Forward).unwrap();
        let b = arena.allocate(32, Direction::Forward).unwrap();
        arena.allocate(16, Direction::Forward).unwrap(); // pin the frontier
        arena.free(b);
        arena.get_mut(a).unwrap().fill(0xEE);
        let a2 = arena.realloc(a, 32).unwrap();
        assert_eq!(a, a2, "adjacent-range growth keeps the handle");
        assert_eq!(arena.offset_of(a2), Some(0));
        // 16 bytes of b's 32-byte range consumed; the rest stays free.
        let stats = arena.stats();
        assert_eq!(stats.free_ranges, 1);
        let bytes = arena.get(a2).unwrap();
        assert!(bytes[..16].iter().all(|&b| b == 0xEE));
        assert!(bytes[16..].iter().all(|&b| b == 0));
    }

    #[test]
    fn realloc_relocates_when_blocked() {
        let mut arena = make_arena(256);
        let a = arena.allocate(32, Direction::Forward).unwrap();
        arena.allocate(16, Direction::Forward).unwrap(); // block in-place growth
        arena.get_mut(a).unwrap().fill(0x5A);
        let a2 = arena.realloc(a, 64).unwrap();
        assert_ne!(a, a2);
        assert!(!arena.contains(a), "old block freed");
        let bytes = arena.get(a2).unwrap();
        assert_eq!(bytes.len(), 64);
        assert!(bytes[..32].iter().all(|&b| b == 0x5A), "contents copied");
        assert!(bytes[32..].iter().all(|&b| b == 0));
    }

    #[test]
    fn realloc_shrink_retreats_frontier() {
        let mut arena = make_arena(128);
        let h = arena.allocate(64, Direction::Forward).unwrap();
        assert_eq!(arena.stats().front, 64);
        let h2 = arena.realloc(h, 16).unwrap();
        assert_eq!(h, h2);
        assert_eq!(arena.size_of(h), Some(16));
        assert_eq!(arena.stats().front, 16);
    }

    #[test]
    fn realloc_shrink_interior_creates_free_range() {
        let mut arena = make_arena(256);
        let a = arena.allocate(64, Direction::Forward).unwrap();
        arena.allocate(16, Direction::Forward).unwrap(); // pin
        arena.realloc(a, 16).unwrap();
        let stats = arena.stats();
        assert_eq!(stats.free_ranges, 1);
        assert_eq!(stats.total_allocated, 32);
    }

    #[test]
    fn realloc_backward_block_relocates_on_growth_at_frontier() {
        let mut arena = make_arena(256);
        let h = arena.allocate(32, Direction::Backward).unwrap();
        arena.get_mut(h).unwrap().fill(0x77);
        let h2 = arena.realloc(h, 64).unwrap();
        assert_ne!(h, h2, "backward frontier growth must relocate");
        let bytes = arena.get(h2).unwrap();
        assert!(bytes[..32].iter().all(|&b| b == 0x77));
    }

    #[test]
    fn reset_discards_blocks_and_keeps_generations_monotonic() {
        let mut arena = make_arena(128);
        let h = arena.allocate(32, Direction::Forward).unwrap();
        let old_generation = h.generation();
        arena.reset();
        assert!(arena.get(h).is_none());
        let stats = arena.stats();
        assert_eq!(stats.front, 0);
        assert_eq!(stats.back, 128);
        assert_eq!(stats.live_blocks, 0);
        let h2 = arena.allocate(32, Direction::Forward).unwrap();
        assert!(h2.generation() > old_generation);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Random allocate/free interleavings keep the cursor
            /// ordering, balance the books against independently-computed
            /// live sizes, and never hand out overlapping blocks.
            #[test]
            fn invariants_hold_under_churn(
                ops in proptest::collection::vec((0u8..4, 1u32..200), 1..80),
            ) {
                let mut arena = make_arena(4096);
                let mut live: Vec<BlockHandle> = Vec::new();
                for (op, size) in ops {
                    match op {
                        0 => {
                            if let Ok(h) = arena.allocate(size, Direction::Forward) {
                                live.push(h);
                            }
                        }
                        1 => {
                            if let Ok(h) = arena.allocate(size, Direction::Backward) {
                                live.push(h);
                            }
                        }
                        2 => {
                            if !live.is_empty() {
                                let h = live.remove(size as usize % live.len());
                                arena.free(h);
                            }
                        }
                        _ => {
                            if !live.is_empty() {
                                let pos = size as usize % live.len();
                                if let Ok(h) = arena.realloc(live[pos], size) {
                                    live[pos] = h;
                                }
                            }
                        }
                    }

                    let stats = arena.stats();
                    prop_assert!(stats.front <= stats.back);
                    prop_assert_eq!(
                        stats.total_allocated + stats.total_free,
                        stats.capacity
                    );
                    prop_assert_eq!(stats.total_allocated, live_sum(&arena, &live));
                    prop_assert_eq!(stats.live_blocks as usize, live.len());

                    // Pairwise disjointness of live blocks.
                    let ranges: Vec<(u32, u32)> = live
                        .iter()
                        .map(|&h| {
                            (arena.offset_of(h).unwrap(), arena.size_of(h).unwrap())
                        })
                        .collect();
                    for (i, &(off_a, len_a)) in ranges.iter().enumerate() {
                        prop_assert_eq!(off_a % GRAIN, 0);
                        for &(off_b, len_b) in &ranges[i + 1..] {
                            prop_assert!(
                                off_a + len_a <= off_b || off_b + len_b <= off_a,
                                "blocks overlap: {}+{} vs {}+{}",
                                off_a, len_a, off_b, len_b
                            );
                        }
                    }
                }
            }

            /// Allocating then freeing in LIFO order always returns the
            /// arena to its starting accounting.
            #[test]
            fn lifo_churn_restores_pristine_state(
                sizes in proptest::collection::vec(1u32..200, 1..20),
            ) {
                let mut arena = make_arena(8192);
                let before = arena.stats();
                let mut handles = Vec::new();
                for (i, &size) in sizes.iter().enumerate() {
                    let direction = if i % 2 == 0 {
                        Direction::Forward
                    } else {
                        Direction::Backward
                    };
                    handles.push(arena.allocate(size, direction).unwrap());
                }
                for h in handles.into_iter().rev() {
                    arena.free(h);
                }
                prop_assert_eq!(arena.stats(), before);
            }
        }
    }
}
