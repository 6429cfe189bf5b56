//! Loader-specific error types.

use std::error::Error;
use std::fmt;

use troupe_arena::ArenaError;
use troupe_core::ModuleId;

/// Errors from [`ModuleLoader::load`](crate::ModuleLoader::load).
///
/// A failed load has no side effects: nothing is allocated, no entry is
/// recorded, and refcounts are untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadError {
    /// The id has no descriptor in the catalog.
    ModuleResolutionFailed {
        /// The unresolved id.
        module: ModuleId,
    },
    /// The arena could not back the module (out of memory, or the image
    /// exceeds the shared slot).
    Arena(ArenaError),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModuleResolutionFailed { module } => {
                write!(f, "module {module} is not in the catalog")
            }
            Self::Arena(e) => write!(f, "arena: {e}"),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Arena(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArenaError> for LoadError {
    fn from(e: ArenaError) -> Self {
        Self::Arena(e)
    }
}
