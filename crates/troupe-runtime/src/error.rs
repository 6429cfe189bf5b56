//! Spawn-path error types.
//!
//! `tick`, `kill`, `draw`, and the diagnostics never fail; [`SpawnError`]
//! is the runtime's only recoverable error surface beyond construction
//! (see [`ConfigError`](crate::ConfigError)). A failed spawn leaves the
//! directory exactly as it was.

use std::error::Error;
use std::fmt;

use troupe_arena::ArenaError;
use troupe_core::ActorTypeId;
use troupe_loader::LoadError;

/// Errors returned from [`Runtime::spawn`](crate::Runtime::spawn).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpawnError {
    /// The directory is at its configured instance cap. Checked before
    /// any allocation, so nothing needs rolling back.
    InstanceCapExceeded {
        /// The configured cap.
        cap: u32,
    },
    /// The request named a type id outside the configured catalog.
    UnknownActorType {
        /// The unresolvable type id.
        type_id: ActorTypeId,
    },
    /// The type's module could not be loaded.
    Load(LoadError),
    /// The instance state block could not be allocated. The module
    /// reference acquired for this spawn has already been released.
    Arena(ArenaError),
}

impl fmt::Display for SpawnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InstanceCapExceeded { cap } => {
                write!(f, "instance cap of {cap} reached")
            }
            Self::UnknownActorType { type_id } => {
                write!(f, "unknown actor type {type_id}")
            }
            Self::Load(e) => write!(f, "module load: {e}"),
            Self::Arena(e) => write!(f, "state allocation: {e}"),
        }
    }
}

impl Error for SpawnError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Load(e) => Some(e),
            Self::Arena(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LoadError> for SpawnError {
    fn from(e: LoadError) -> Self {
        Self::Load(e)
    }
}

impl From<ArenaError> for SpawnError {
    fn from(e: ArenaError) -> Self {
        Self::Arena(e)
    }
}
