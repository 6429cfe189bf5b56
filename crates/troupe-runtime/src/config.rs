//! Runtime configuration, validation, and error types.
//!
//! [`RuntimeConfig`] is the builder-input for constructing a
//! [`Runtime`](crate::Runtime). [`validate()`](RuntimeConfig::validate)
//! checks every structural invariant up front so the frame loop never
//! has to: category and type ids in range, module references resolvable,
//! shared-slot sizing, non-zero cap and copy budget.

use std::error::Error;
use std::fmt;

use troupe_arena::{ArenaConfig, ArenaError};
use troupe_core::{ActorType, CatalogError, CategoryId, LoadStrategy, ModuleCatalog, ModuleId};
use troupe_loader::{CopyMode, LoaderConfig};

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`RuntimeConfig::validate()`] or construction.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// The module catalog failed validation.
    Catalog(CatalogError),
    /// The arena configuration is invalid.
    Arena(ArenaError),
    /// No categories configured.
    NoCategories,
    /// More categories than `CategoryId` can address.
    TooManyCategories {
        /// The configured count.
        count: usize,
    },
    /// No actor types configured.
    NoActorTypes,
    /// More actor types than `ActorTypeId` can address.
    TooManyActorTypes {
        /// The configured count.
        count: usize,
    },
    /// An actor type names a category outside the freeze-mask table.
    CategoryOutOfRange {
        /// The offending actor type's name.
        actor: String,
        /// The out-of-range category.
        category: CategoryId,
        /// Number of configured categories.
        category_count: usize,
    },
    /// An actor type references a module the catalog does not define.
    ModuleUnresolved {
        /// The offending actor type's name.
        actor: String,
        /// The unresolvable module id.
        module: ModuleId,
    },
    /// A shared-slot module's loaded image exceeds the configured slot.
    SharedModuleTooLarge {
        /// The offending module's name.
        module: String,
        /// The module's loaded size in bytes.
        loaded_size: u32,
        /// The configured slot size in bytes.
        slot_bytes: u32,
    },
    /// The instance cap is zero; no actor could ever spawn.
    ZeroActorCap,
    /// Staged copy mode with a zero per-frame budget would never finish.
    ZeroStagedBudget,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Catalog(e) => write!(f, "catalog: {e}"),
            Self::Arena(e) => write!(f, "arena: {e}"),
            Self::NoCategories => write!(f, "no categories configured"),
            Self::TooManyCategories { count } => {
                write!(f, "{count} categories exceed the CategoryId range of 256")
            }
            Self::NoActorTypes => write!(f, "no actor types configured"),
            Self::TooManyActorTypes { count } => {
                write!(f, "{count} actor types exceed the ActorTypeId range of 65536")
            }
            Self::CategoryOutOfRange {
                actor,
                category,
                category_count,
            } => write!(
                f,
                "actor type '{actor}' uses category {category} but only \
                 {category_count} categories are configured"
            ),
            Self::ModuleUnresolved { actor, module } => {
                write!(f, "actor type '{actor}' references undefined module {module}")
            }
            Self::SharedModuleTooLarge {
                module,
                loaded_size,
                slot_bytes,
            } => write!(
                f,
                "shared module '{module}' needs {loaded_size} bytes but the \
                 shared slot holds {slot_bytes}"
            ),
            Self::ZeroActorCap => write!(f, "actor cap must be at least 1"),
            Self::ZeroStagedBudget => {
                write!(f, "staged copy budget must be at least 1 byte per frame")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Catalog(e) => Some(e),
            Self::Arena(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CatalogError> for ConfigError {
    fn from(e: CatalogError) -> Self {
        Self::Catalog(e)
    }
}

impl From<ArenaError> for ConfigError {
    fn from(e: ArenaError) -> Self {
        Self::Arena(e)
    }
}

// ── RuntimeConfig ──────────────────────────────────────────────────

/// Complete configuration for constructing a [`Runtime`](crate::Runtime).
///
/// Consumed by the constructor; the catalogs are read-only afterwards.
pub struct RuntimeConfig {
    /// Validated module catalog. Consumed by the loader.
    pub modules: ModuleCatalog,
    /// Actor type catalog. `ActorTypeId(n)` corresponds to `actors[n]`.
    pub actors: Vec<ActorType>,
    /// One freeze mask per category; the table length fixes the number of
    /// categories. A category is frozen for a frame when
    /// `mask & world_mask != 0`.
    pub freeze_masks: Vec<u32>,
    /// Hard cap on concurrently live actors.
    pub actor_cap: u32,
    /// Arena sizing.
    pub arena: ArenaConfig,
    /// Shared-slot sizing and copy mode for the module loader.
    pub loader: LoaderConfig,
}

impl RuntimeConfig {
    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. Category partition: at least one, ids must fit CategoryId.
        if self.freeze_masks.is_empty() {
            return Err(ConfigError::NoCategories);
        }
        if self.freeze_masks.len() > 256 {
            return Err(ConfigError::TooManyCategories {
                count: self.freeze_masks.len(),
            });
        }
        // 2. Actor catalog: at least one, ids must fit ActorTypeId.
        if self.actors.is_empty() {
            return Err(ConfigError::NoActorTypes);
        }
        if self.actors.len() > usize::from(u16::MAX) + 1 {
            return Err(ConfigError::TooManyActorTypes {
                count: self.actors.len(),
            });
        }
        // 3. Every type's category must exist and its module resolve.
        for ty in &self.actors {
            if usize::from(ty.category.0) >= self.freeze_masks.len() {
                return Err(ConfigError::CategoryOutOfRange {
                    actor: ty.name.clone(),
                    category: ty.category,
                    category_count: self.freeze_masks.len(),
                });
            }
            if self.modules.get(ty.module).is_none() {
                return Err(ConfigError::ModuleUnresolved {
                    actor: ty.name.clone(),
                    module: ty.module,
                });
            }
        }
        // 4. Every shared-slot image must fit the slot, or the load is
        //    doomed at runtime.
        for (_, desc) in self.modules.iter() {
            if desc.strategy == LoadStrategy::SharedAbsolute
                && desc.loaded_size > self.loader.shared_slot_bytes
            {
                return Err(ConfigError::SharedModuleTooLarge {
                    module: desc.name.clone(),
                    loaded_size: desc.loaded_size,
                    slot_bytes: self.loader.shared_slot_bytes,
                });
            }
        }
        // 5. A zero cap or zero copy budget deadlocks the world.
        if self.actor_cap == 0 {
            return Err(ConfigError::ZeroActorCap);
        }
        if let CopyMode::Staged { bytes_per_frame } = self.loader.copy_mode {
            if bytes_per_frame == 0 {
                return Err(ConfigError::ZeroStagedBudget);
            }
        }
        Ok(())
    }
}

impl fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("modules", &self.modules.len())
            .field("actors", &self.actors.len())
            .field("categories", &self.freeze_masks.len())
            .field("actor_cap", &self.actor_cap)
            .field("arena", &self.arena)
            .field("loader", &self.loader)
            .finish()
    }
}
