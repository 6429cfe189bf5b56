//! Reusable scripted behaviors for directory and scheduler testing.
//!
//! Five standard behaviors:
//!
//! - [`NullBehavior`] — does nothing; the minimal valid actor type.
//! - [`CountingBehavior`] — records every lifecycle call in a shared
//!   [`CallLog`] the test keeps a handle to.
//! - [`SelfKillBehavior`] — requests its own removal after N updates,
//!   tracking the count in its state bytes.
//! - [`SpawningBehavior`] — queues a child spawn every update.
//! - [`StateStampBehavior`] — stamps its state bytes so tests can verify
//!   zero-fill and persistence.
//!
//! A `Behavior` value is shared by all instances of its type, so anything
//! per-instance lives in the context's state bytes; anything the test
//! observes goes through an `Arc`-shared atomic log.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use troupe_core::{ActorContext, ActorTypeId, Behavior, SpawnRequest};

/// Shared lifecycle call counters.
///
/// Counts are cumulative across every instance of the owning type. Uses
/// `AtomicUsize` so logs can be cloned out of the behavior before it is
/// boxed into a type catalog.
#[derive(Debug, Default)]
pub struct CallLog {
    inits: AtomicUsize,
    updates: AtomicUsize,
    draws: AtomicUsize,
    destroys: AtomicUsize,
}

impl CallLog {
    pub fn inits(&self) -> usize {
        self.inits.load(Ordering::Relaxed)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::Relaxed)
    }

    pub fn draws(&self) -> usize {
        self.draws.load(Ordering::Relaxed)
    }

    pub fn destroys(&self) -> usize {
        self.destroys.load(Ordering::Relaxed)
    }
}

/// Does nothing in every callback.
pub struct NullBehavior {
    pub name: String,
}

impl NullBehavior {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Behavior for NullBehavior {
    fn name(&self) -> &str {
        &self.name
    }

    fn update(&self, _ctx: &mut ActorContext<'_>) {}
}

/// Counts every lifecycle call in a [`CallLog`].
///
/// Clone the log out with [`log()`](CountingBehavior::log) before boxing
/// the behavior into an actor type.
pub struct CountingBehavior {
    pub name: String,
    log: Arc<CallLog>,
}

impl CountingBehavior {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            log: Arc::new(CallLog::default()),
        }
    }

    /// A handle to the shared call log.
    pub fn log(&self) -> Arc<CallLog> {
        Arc::clone(&self.log)
    }
}

impl Behavior for CountingBehavior {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&self, _ctx: &mut ActorContext<'_>) {
        self.log.inits.fetch_add(1, Ordering::Relaxed);
    }

    fn update(&self, _ctx: &mut ActorContext<'_>) {
        self.log.updates.fetch_add(1, Ordering::Relaxed);
    }

    fn draw(&self, _ctx: &mut ActorContext<'_>) {
        self.log.draws.fetch_add(1, Ordering::Relaxed);
    }

    fn destroy(&self, _ctx: &mut ActorContext<'_>) {
        self.log.destroys.fetch_add(1, Ordering::Relaxed);
    }
}

/// Requests its own removal after a fixed number of updates.
///
/// The per-instance update count lives in the first four state bytes
/// (little-endian), so the owning type needs `state_size >= 4`.
pub struct SelfKillBehavior {
    pub name: String,
    pub after: u32,
}

impl SelfKillBehavior {
    /// Create a behavior whose instances kill themselves on their
    /// `after`-th update. `after == 1` kills on the first update.
    pub fn new(name: impl Into<String>, after: u32) -> Self {
        Self {
            name: name.into(),
            after,
        }
    }
}

impl Behavior for SelfKillBehavior {
    fn name(&self) -> &str {
        &self.name
    }

    fn update(&self, ctx: &mut ActorContext<'_>) {
        let count = u32::from_le_bytes(ctx.state()[0..4].try_into().unwrap()) + 1;
        ctx.state_mut()[0..4].copy_from_slice(&count.to_le_bytes());
        if count >= self.after {
            ctx.kill();
        }
    }
}

/// Queues one child spawn per update.
pub struct SpawningBehavior {
    pub name: String,
    pub child: ActorTypeId,
    pub child_params: i32,
}

impl SpawningBehavior {
    pub fn new(name: impl Into<String>, child: ActorTypeId) -> Self {
        Self {
            name: name.into(),
            child,
            child_params: 0,
        }
    }
}

impl Behavior for SpawningBehavior {
    fn name(&self) -> &str {
        &self.name
    }

    fn update(&self, ctx: &mut ActorContext<'_>) {
        let request = SpawnRequest::new(self.child).with_params(self.child_params);
        ctx.request_spawn(request);
    }
}

/// Fills its state bytes with a stamp on init and counts updates in the
/// first byte (wrapping).
///
/// Tests read the state back to verify zero-fill at spawn, persistence
/// across frames, and that `init` ran exactly once.
pub struct StateStampBehavior {
    pub name: String,
    pub stamp: u8,
}

impl StateStampBehavior {
    pub fn new(name: impl Into<String>, stamp: u8) -> Self {
        Self {
            name: name.into(),
            stamp,
        }
    }
}

impl Behavior for StateStampBehavior {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&self, ctx: &mut ActorContext<'_>) {
        let stamp = self.stamp;
        ctx.state_mut().fill(stamp);
        ctx.state_mut()[0] = 0;
    }

    fn update(&self, ctx: &mut ActorContext<'_>) {
        ctx.state_mut()[0] = ctx.state()[0].wrapping_add(1);
    }
}
