//! Arena-specific error types.

use std::error::Error;
use std::fmt;

/// Recoverable errors from arena operations.
///
/// These surface as values to the immediate caller; the arena stays
/// consistent and usable after every one of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The request does not fit between the cursors.
    OutOfMemory {
        /// Bytes requested, after rounding to the grain.
        requested: u32,
        /// Contiguous bytes remaining between the cursors.
        available: u32,
        /// Forward cursor position at the time of the failure.
        front: u32,
        /// Backward cursor position at the time of the failure.
        back: u32,
    },
    /// A size or capacity that cannot be placed on the 16-byte grain
    /// (a capacity off the grain, or a request whose rounding overflows).
    AlignmentViolation {
        /// The offending value.
        value: u32,
    },
    /// A handle whose block has been freed or whose slot was reused.
    ///
    /// Resolution paths return `None` for stale handles; `realloc` returns
    /// this error in release builds (debug builds treat it as an
    /// [`IntegrityFault`] and abort).
    StaleHandle {
        /// The generation encoded in the handle.
        handle_generation: u32,
        /// The generation currently recorded in the slot.
        slot_generation: u32,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory {
                requested,
                available,
                front,
                back,
            } => {
                write!(
                    f,
                    "out of memory: requested {requested} bytes, {available} available between cursors {front}..{back}"
                )
            }
            Self::AlignmentViolation { value } => {
                write!(f, "value {value} cannot be placed on the 16-byte grain")
            }
            Self::StaleHandle {
                handle_generation,
                slot_generation,
            } => {
                write!(
                    f,
                    "stale handle: generation {handle_generation}, slot now at generation {slot_generation}"
                )
            }
        }
    }
}

impl Error for ArenaError {}

/// Integrity faults detected while validating a handle against its slot.
///
/// In debug builds these are fatal: `free` and `realloc` panic with the
/// fault's message, since continuing with a corrupted block table has no
/// meaningful recovery. In release builds the checks still run but `free`
/// degrades to a silent no-op — the tradeoff inherited from the
/// constrained target this allocator is modeled on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntegrityFault {
    /// The handle's slot index is outside the slot table.
    BadSlot {
        /// Slot index from the handle.
        slot: u32,
        /// Number of slots in the table.
        slot_count: u32,
    },
    /// The block was already freed and its slot has not been reused.
    DoubleFree {
        /// Slot index from the handle.
        slot: u32,
        /// Offset of the retired block.
        offset: u32,
        /// Size of the retired block.
        size: u32,
    },
    /// The slot now belongs to a different allocation.
    UseAfterFree {
        /// Slot index from the handle.
        slot: u32,
        /// Generation encoded in the handle.
        handle_generation: u32,
        /// Generation of the slot's current occupant.
        slot_generation: u32,
    },
}

impl fmt::Display for IntegrityFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadSlot { slot, slot_count } => {
                write!(f, "slot {slot} out of range ({slot_count} slots)")
            }
            Self::DoubleFree { slot, offset, size } => {
                write!(f, "double free of slot {slot} (offset {offset}, {size} bytes)")
            }
            Self::UseAfterFree {
                slot,
                handle_generation,
                slot_generation,
            } => {
                write!(
                    f,
                    "use after free: slot {slot} reused at generation {slot_generation}, handle has {handle_generation}"
                )
            }
        }
    }
}

impl Error for IntegrityFault {}
