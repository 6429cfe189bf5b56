//! Bounded dual-direction arena allocation for the troupe runtime.
//!
//! One fixed buffer, allocated from both ends toward the middle:
//! [`Direction::Forward`] blocks (instance state, pooled modules) bump the
//! front cursor up, [`Direction::Backward`] blocks (persistent and
//! shared-slot modules) bump the back cursor down. Blocks are addressed
//! through generation-checked [`BlockHandle`]s, freed ranges retreat the
//! cursors or park on exact-size free lists, and the books in
//! [`ArenaStats`] balance after every operation. Invalid frees are
//! diagnosed as [`IntegrityFault`]s: fatal in debug builds, a silent
//! no-op in release builds.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod arena;
pub mod config;
pub mod error;
pub mod handle;
pub mod stats;

pub use arena::{Arena, GRAIN};
pub use config::ArenaConfig;
pub use error::{ArenaError, IntegrityFault};
pub use handle::{BlockHandle, Direction};
pub use stats::ArenaStats;
