//! Actor directory and frame scheduler for the troupe runtime.
//!
//! [`Runtime`] is the top of the stack: it owns the arena and the module
//! loader, resolves spawn requests against the actor-type catalog, keeps
//! category-ordered actor lists, and drives the per-frame lifecycle —
//! deferred init, freeze masking, update dispatch, soft-kill reclamation
//! with a one-frame draw grace, and FIFO draining of callback-queued
//! spawns.
//!
//! Construction goes through [`RuntimeConfig`], which validates every
//! structural invariant up front; after that, [`Runtime::spawn`] is the
//! only fallible entry point, and a failed spawn leaves the world exactly
//! as it was.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod actor;
pub mod config;
pub mod error;
pub mod metrics;
pub mod runtime;

pub use actor::{ActorHandle, ActorView};
pub use config::{ConfigError, RuntimeConfig};
pub use error::SpawnError;
pub use metrics::FrameMetrics;
pub use runtime::Runtime;
