//! The [`Behavior`] lifecycle trait and the per-callback [`ActorContext`].
//!
//! One `Behavior` value is shared by every instance of its actor type, so
//! callbacks take `&self`; all per-instance state lives in the context's
//! state bytes and transform fields. Callbacks are infallible — a frame
//! pass never fails — and an instance that wants to leave the world calls
//! [`ActorContext::kill`], which the scheduler honors after the callback
//! returns.

use crate::actor::SpawnRequest;
use crate::id::{ActorId, CategoryId, FrameId};

/// Lifecycle callbacks for one actor type.
///
/// `update` is the only required hook; types that never draw, never need
/// setup, or never need teardown leave the defaults in place.
pub trait Behavior {
    /// Short name for diagnostics.
    fn name(&self) -> &str;

    /// Runs once, after the instance's module is fully resident and its
    /// state bytes have been zeroed.
    fn init(&self, ctx: &mut ActorContext<'_>) {
        let _ = ctx;
    }

    /// Runs once per frame while the instance is live and not frozen.
    fn update(&self, ctx: &mut ActorContext<'_>);

    /// Runs once per draw pass while the instance's draw capability is set.
    fn draw(&self, ctx: &mut ActorContext<'_>) {
        let _ = ctx;
    }

    /// Runs exactly once before the instance's memory is reclaimed.
    fn destroy(&self, ctx: &mut ActorContext<'_>) {
        let _ = ctx;
    }
}

/// Immutable per-callback metadata, grouped to keep the context
/// constructor narrow.
#[derive(Clone, Copy, Debug)]
pub struct ActorMeta {
    /// Current frame.
    pub frame: FrameId,
    /// The instance being dispatched.
    pub actor: ActorId,
    /// The instance's category.
    pub category: CategoryId,
    /// World-state mask passed to this frame's pass.
    pub world_mask: u32,
    /// Spawn parameter word recorded at spawn time.
    pub params: i32,
}

/// Split-borrow view handed to every [`Behavior`] callback.
///
/// Borrows the instance's transform, state bytes, and transient event bits
/// directly from the directory, plus the runtime's deferred spawn queue.
/// Nothing here can touch the arena or other actors — callbacks observe
/// only their own instance.
pub struct ActorContext<'a> {
    meta: ActorMeta,
    position: &'a mut [f32; 3],
    rotation: &'a mut [f32; 3],
    state: &'a mut [u8],
    events: &'a mut u32,
    spawn_queue: &'a mut Vec<SpawnRequest>,
    kill_requested: bool,
}

impl<'a> ActorContext<'a> {
    /// Assemble a context for one callback dispatch.
    pub fn new(
        meta: ActorMeta,
        position: &'a mut [f32; 3],
        rotation: &'a mut [f32; 3],
        state: &'a mut [u8],
        events: &'a mut u32,
        spawn_queue: &'a mut Vec<SpawnRequest>,
    ) -> Self {
        Self {
            meta,
            position,
            rotation,
            state,
            events,
            spawn_queue,
            kill_requested: false,
        }
    }

    /// Current frame.
    pub fn frame(&self) -> FrameId {
        self.meta.frame
    }

    /// The instance being dispatched.
    pub fn actor(&self) -> ActorId {
        self.meta.actor
    }

    /// The instance's category.
    pub fn category(&self) -> CategoryId {
        self.meta.category
    }

    /// World-state mask for this frame.
    pub fn world_mask(&self) -> u32 {
        self.meta.world_mask
    }

    /// Spawn parameter word recorded at spawn time.
    pub fn params(&self) -> i32 {
        self.meta.params
    }

    /// The instance's position.
    pub fn position(&self) -> [f32; 3] {
        *self.position
    }

    /// Mutable access to the instance's position.
    pub fn position_mut(&mut self) -> &mut [f32; 3] {
        self.position
    }

    /// The instance's rotation.
    pub fn rotation(&self) -> [f32; 3] {
        *self.rotation
    }

    /// Mutable access to the instance's rotation.
    pub fn rotation_mut(&mut self) -> &mut [f32; 3] {
        self.rotation
    }

    /// The instance's state bytes (zeroed at spawn).
    pub fn state(&self) -> &[u8] {
        self.state
    }

    /// Mutable access to the instance's state bytes.
    pub fn state_mut(&mut self) -> &mut [u8] {
        self.state
    }

    /// Transient event bits raised this frame.
    pub fn events(&self) -> u32 {
        *self.events
    }

    /// Raise transient event bits. Cleared by the scheduler at the top of
    /// the instance's next visit, frozen or not.
    pub fn raise_events(&mut self, bits: u32) {
        *self.events |= bits;
    }

    /// Request removal of this instance. Takes effect after the callback
    /// returns; memory is reclaimed by the scheduler on a later visit,
    /// never inside the callback.
    pub fn kill(&mut self) {
        self.kill_requested = true;
    }

    /// Whether [`kill`](Self::kill) was called during this dispatch.
    pub fn kill_requested(&self) -> bool {
        self.kill_requested
    }

    /// Queue a spawn to run after this frame's pass completes. A request
    /// that fails (cap, memory, resolution) is dropped, not retried.
    pub fn request_spawn(&mut self, request: SpawnRequest) {
        self.spawn_queue.push(request);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ActorTypeId;

    fn meta() -> ActorMeta {
        ActorMeta {
            frame: FrameId(7),
            actor: ActorId(3),
            category: CategoryId(2),
            world_mask: 0b100,
            params: -5,
        }
    }

    #[test]
    fn context_exposes_meta_and_borrows() {
        let mut position = [1.0, 2.0, 3.0];
        let mut rotation = [0.0; 3];
        let mut state = vec![0u8; 16];
        let mut events = 0u32;
        let mut queue = Vec::new();
        let mut ctx = ActorContext::new(
            meta(),
            &mut position,
            &mut rotation,
            &mut state,
            &mut events,
            &mut queue,
        );
        assert_eq!(ctx.frame(), FrameId(7));
        assert_eq!(ctx.actor(), ActorId(3));
        assert_eq!(ctx.category(), CategoryId(2));
        assert_eq!(ctx.world_mask(), 0b100);
        assert_eq!(ctx.params(), -5);
        ctx.position_mut()[0] = 9.0;
        ctx.state_mut()[0] = 0xAB;
        ctx.raise_events(0b11);
        assert_eq!(ctx.events(), 0b11);
        assert!(!ctx.kill_requested());
        ctx.kill();
        assert!(ctx.kill_requested());
        drop(ctx);
        assert_eq!(position[0], 9.0);
        assert_eq!(state[0], 0xAB);
        assert_eq!(events, 0b11);
    }

    #[test]
    fn request_spawn_queues_in_order() {
        let mut position = [0.0; 3];
        let mut rotation = [0.0; 3];
        let mut state = vec![0u8; 4];
        let mut events = 0u32;
        let mut queue = Vec::new();
        let mut ctx = ActorContext::new(
            meta(),
            &mut position,
            &mut rotation,
            &mut state,
            &mut events,
            &mut queue,
        );
        ctx.request_spawn(SpawnRequest::new(ActorTypeId(1)));
        ctx.request_spawn(SpawnRequest::new(ActorTypeId(0)));
        drop(ctx);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue[0].type_id, ActorTypeId(1));
        assert_eq!(queue[1].type_id, ActorTypeId(0));
    }
}
