//! Actor handles and the diagnostic actor view.

use std::fmt;

use troupe_core::{ActorId, ActorTypeId, CategoryId, ModuleId};

/// Generation-checked reference to a directory slot.
///
/// Slots are reused after deletion; the generation makes a handle to a
/// dead actor resolve to `None` (or a no-op) everywhere instead of
/// aliasing the slot's next occupant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ActorHandle {
    pub(crate) slot: u32,
    pub(crate) generation: u32,
}

impl ActorHandle {
    /// Directory slot index.
    pub fn slot(&self) -> u32 {
        self.slot
    }

    /// Generation the slot had when this handle was issued.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ActorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorHandle(slot={}, gen={})", self.slot, self.generation)
    }
}

/// Read-only snapshot of one live actor, for diagnostics.
#[derive(Clone, Debug, PartialEq)]
pub struct ActorView {
    /// Handle resolving to this actor.
    pub handle: ActorHandle,
    /// Unique instance id.
    pub id: ActorId,
    /// The actor's type.
    pub type_id: ActorTypeId,
    /// The type's name, for log lines.
    pub type_name: String,
    /// Processing category.
    pub category: CategoryId,
    /// Module the instance depends on.
    pub module: ModuleId,
    /// World position.
    pub position: [f32; 3],
    /// World rotation.
    pub rotation: [f32; 3],
    /// Spawn parameter word.
    pub params: i32,
    /// Transient event bits raised since the actor's last visit.
    pub events: u32,
    /// Waiting for its module before `init` can run.
    pub pending_init: bool,
    /// Update capability (cleared by a kill).
    pub update_enabled: bool,
    /// Draw capability (cleared by a kill).
    pub draw_enabled: bool,
    /// Whether external collaborators may target this instance.
    pub targetable: bool,
    /// Drawn in the most recent draw pass.
    pub is_drawn: bool,
    /// Updates even when the category is frozen.
    pub freeze_exempt: bool,
}
