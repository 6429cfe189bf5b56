//! Core types and traits for the troupe actor runtime.
//!
//! This crate defines the vocabulary shared by the arena, the module
//! loader, and the scheduler: strongly-typed identifiers, the module
//! catalog with its load strategies and relocation tables, actor type
//! definitions, and the [`Behavior`] lifecycle trait with its per-callback
//! [`ActorContext`].
//!
//! It is a leaf crate: no allocator, no scheduler, no I/O.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod actor;
pub mod behavior;
pub mod id;
pub mod module;

pub use actor::{ActorType, SpawnRequest};
pub use behavior::{ActorContext, ActorMeta, Behavior};
pub use id::{ActorId, ActorTypeId, CategoryId, FrameId, ModuleId};
pub use module::{
    CatalogError, LoadStrategy, ModuleCatalog, ModuleDescriptor, RelocationTable,
};
