//! Troupe: a bounded-memory actor runtime.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all troupe sub-crates. For most users, adding `troupe` as a single
//! dependency is sufficient.
//!
//! The runtime is built from three layers: a dual-direction arena
//! allocator that serves every byte from one fixed buffer, a
//! reference-counted module loader that places relocatable code/data
//! images in that arena, and a category-ordered frame scheduler that
//! drives actor lifecycles against both. Everything is single-threaded
//! and deterministic; there are no globals, no garbage collection, and no
//! allocation outside the configured arena once the world is running.
//!
//! # Quick start
//!
//! ```rust
//! use troupe::prelude::*;
//!
//! // A minimal behavior: drift along +x every frame.
//! struct Drifter;
//! impl Behavior for Drifter {
//!     fn name(&self) -> &str { "drifter" }
//!     fn update(&self, ctx: &mut ActorContext<'_>) {
//!         ctx.position_mut()[0] += 1.0;
//!     }
//! }
//!
//! // One pooled 32-byte module; `ModuleId(0)` is the first descriptor.
//! let modules = ModuleCatalog::new(
//!     vec![0u8; 32],
//!     vec![ModuleDescriptor {
//!         name: "drifter_code".into(),
//!         source: 0..32,
//!         loaded_size: 32,
//!         strategy: LoadStrategy::Pooled,
//!         relocations: RelocationTable::new(),
//!     }],
//! )
//! .unwrap();
//!
//! let config = RuntimeConfig {
//!     modules,
//!     actors: vec![ActorType {
//!         name: "drifter".into(),
//!         category: CategoryId(0),
//!         state_size: 16,
//!         module: ModuleId(0),
//!         behavior: Box::new(Drifter),
//!     }],
//!     freeze_masks: vec![0],
//!     actor_cap: 64,
//!     arena: ArenaConfig::new(4096),
//!     loader: LoaderConfig::default(),
//! };
//! let mut world = Runtime::new(config).unwrap();
//!
//! let actor = world.spawn(SpawnRequest::new(ActorTypeId(0))).unwrap();
//! let metrics = world.tick(0);
//! assert_eq!(metrics.updates_run, 1);
//! assert_eq!(world.actor(actor).unwrap().position, [1.0, 0.0, 0.0]);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the
//! prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `troupe-core` | IDs, module catalog, actor types, the `Behavior` trait |
//! | [`arena`] | `troupe-arena` | Dual-direction arena, block handles, stats |
//! | [`loader`] | `troupe-loader` | Refcounted module residency and staged copies |
//! | [`runtime`] | `troupe-runtime` | The actor directory and frame scheduler |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and IDs (`troupe-core`).
///
/// Contains the strongly-typed identifiers, the [`types::ModuleCatalog`]
/// with its load strategies and relocation tables, actor type
/// definitions, and the [`types::Behavior`] lifecycle trait.
pub use troupe_core as types;

/// Dual-direction arena allocation (`troupe-arena`).
///
/// One fixed buffer, bump-allocated from both ends; blocks are addressed
/// through generation-checked [`arena::BlockHandle`]s.
pub use troupe_arena as arena;

/// Reference-counted module loading (`troupe-loader`).
///
/// [`loader::ModuleLoader`] places module images in the arena by
/// strategy, rewrites relocation cells, and tracks residency by
/// refcount through [`loader::ModuleRef`] move-tokens.
pub use troupe_loader as loader;

/// The actor directory and frame scheduler (`troupe-runtime`).
///
/// [`runtime::Runtime`] is the main entry point; see the quick-start
/// above.
pub use troupe_runtime as runtime;

/// Common imports for typical troupe usage.
///
/// ```rust
/// use troupe::prelude::*;
/// ```
///
/// This imports the most frequently used types: the runtime and its
/// configuration, the behavior trait and context, catalogs, identifiers,
/// and the error types every embedder matches on.
pub mod prelude {
    // Identifiers
    pub use troupe_core::{ActorId, ActorTypeId, CategoryId, FrameId, ModuleId};

    // Catalogs and the behavior seam
    pub use troupe_core::{
        ActorContext, ActorMeta, ActorType, Behavior, LoadStrategy, ModuleCatalog,
        ModuleDescriptor, RelocationTable, SpawnRequest,
    };

    // Arena
    pub use troupe_arena::{ArenaConfig, ArenaStats, Direction};

    // Loader
    pub use troupe_loader::{CopyMode, LoaderConfig, LoaderStats, Residency, ResidentModule};

    // Runtime
    pub use troupe_runtime::{
        ActorHandle, ActorView, FrameMetrics, Runtime, RuntimeConfig,
    };

    // Errors
    pub use troupe_core::CatalogError;
    pub use troupe_arena::ArenaError;
    pub use troupe_loader::LoadError;
    pub use troupe_runtime::{ConfigError, SpawnError};
}
