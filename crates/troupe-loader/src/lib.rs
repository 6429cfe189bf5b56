//! Reference-counted module residency over a dual-direction arena.
//!
//! A [`ModuleLoader`] serves load requests from a validated
//! [`troupe_core::ModuleCatalog`]: it places each module's bytes in an
//! arena block chosen by the module's [`troupe_core::LoadStrategy`],
//! zero-fills the data section past the copied source, rewrites
//! relocation cells to arena-absolute offsets, and tracks residency by
//! reference count. Copies run synchronously or spread across frames
//! under a byte budget ([`CopyMode`]).
//!
//! Loads and releases are paired through a move-token, [`ModuleRef`]:
//! minted by `load`, consumed by `release`. The token is deliberately
//! not copyable, so the refcount can only change through those two
//! calls.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod error;
mod loader;

pub use error::LoadError;
pub use loader::{
    CopyMode, LoaderConfig, LoaderStats, ModuleLoader, ModuleRef, Residency, ResidentModule,
};
