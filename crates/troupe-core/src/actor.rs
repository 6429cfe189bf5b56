//! Actor type definitions and spawn requests.

use std::fmt;

use crate::behavior::Behavior;
use crate::id::{ActorTypeId, CategoryId, ModuleId};

/// Definition of an actor type registered with the runtime.
///
/// Types are registered at runtime creation; `ActorTypeId(n)` is the index
/// into the type table. The behavior value is shared by every instance of
/// the type.
pub struct ActorType {
    /// Human-readable name for diagnostics.
    pub name: String,
    /// Processing category of every instance of this type.
    pub category: CategoryId,
    /// Size in bytes of one instance's state block, zero-filled at spawn.
    pub state_size: u32,
    /// Module that must be resident before instances initialise.
    pub module: ModuleId,
    /// Lifecycle callbacks shared by all instances.
    pub behavior: Box<dyn Behavior>,
}

impl fmt::Debug for ActorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorType")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("state_size", &self.state_size)
            .field("module", &self.module)
            .field("behavior", &self.behavior.name())
            .finish()
    }
}

/// Parameters for spawning one actor instance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnRequest {
    /// The type to instantiate.
    pub type_id: ActorTypeId,
    /// Initial position.
    pub position: [f32; 3],
    /// Initial rotation.
    pub rotation: [f32; 3],
    /// Opaque parameter word handed to callbacks unchanged.
    pub params: i32,
}

impl SpawnRequest {
    /// A request at the origin with zeroed rotation and params.
    pub fn new(type_id: ActorTypeId) -> Self {
        Self {
            type_id,
            position: [0.0; 3],
            rotation: [0.0; 3],
            params: 0,
        }
    }

    /// Set the initial position.
    pub fn at(mut self, position: [f32; 3]) -> Self {
        self.position = position;
        self
    }

    /// Set the spawn parameter word.
    pub fn with_params(mut self, params: i32) -> Self {
        self.params = params;
        self
    }
}
