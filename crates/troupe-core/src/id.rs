//! Strongly-typed identifiers shared across the runtime.

use std::fmt;

/// Identifies a module in the catalog.
///
/// Modules are declared at runtime creation and assigned sequential IDs.
/// `ModuleId(n)` corresponds to the n-th descriptor in the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub u16);

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for ModuleId {
    fn from(v: u16) -> Self {
        Self(v)
    }
}

/// Identifies an actor type.
///
/// Actor types are declared at runtime creation; `ActorTypeId(n)` is the
/// n-th entry in the actor type table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorTypeId(pub u16);

impl fmt::Display for ActorTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for ActorTypeId {
    fn from(v: u16) -> Self {
        Self(v)
    }
}

/// A processing-order partition of actor instances.
///
/// The scheduler visits categories in ascending ID order each frame, so
/// lower categories observe the frame before higher ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryId(pub u8);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for CategoryId {
    fn from(v: u8) -> Self {
        Self(v)
    }
}

/// Unique identifier of a spawned actor instance.
///
/// Allocated from a monotonic per-runtime counter; never reused within a
/// runtime's lifetime, so two instances always have distinct IDs even when
/// they occupy the same directory slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ActorId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Monotonically increasing frame counter.
///
/// Incremented once per scheduler pass; returns to zero on runtime reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u64);

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for FrameId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
