//! The actor directory and frame scheduler.
//!
//! [`Runtime`] owns the arena, the module loader, and the actor
//! directory, and drives them through the per-frame passes. One value,
//! no globals; every entry point threads through `&mut Runtime`.
//!
//! # Frame shape
//!
//! `tick` advances staged module copies, then visits every live actor in
//! ascending category order (insertion order within a category), then
//! drains callback-queued spawns FIFO. `draw` is a separate pass the
//! embedder calls when it renders; the scheduler only maintains the
//! `is_drawn` flag that gives deleted-while-visible actors their
//! one-frame grace.

use std::time::Instant;

use troupe_arena::{Arena, ArenaStats, BlockHandle, Direction};
use troupe_core::{
    ActorContext, ActorId, ActorMeta, ActorType, ActorTypeId, CategoryId, FrameId, ModuleId,
    SpawnRequest,
};
use troupe_loader::{LoaderStats, ModuleLoader, ModuleRef, Residency, ResidentModule};

use crate::actor::{ActorHandle, ActorView};
use crate::config::{ConfigError, RuntimeConfig};
use crate::error::SpawnError;
use crate::metrics::FrameMetrics;

// ── ActorSlot ──────────────────────────────────────────────────────

/// One directory slot. Slots are reused; the generation stales old
/// handles.
struct ActorSlot {
    id: ActorId,
    generation: u32,
    type_id: ActorTypeId,
    category: CategoryId,
    module: ModuleId,
    /// Held for the actor's whole life; surrendered at delete.
    module_ref: Option<ModuleRef>,
    state_block: BlockHandle,
    position: [f32; 3],
    rotation: [f32; 3],
    params: i32,
    events: u32,
    pending_init: bool,
    destroyed: bool,
    is_drawn: bool,
    update_enabled: bool,
    draw_enabled: bool,
    targetable: bool,
    freeze_exempt: bool,
    alive: bool,
}

enum Phase {
    Init,
    Update,
    Draw,
    Destroy,
}

// ── Runtime ────────────────────────────────────────────────────────

/// Actor directory and frame scheduler over one arena.
pub struct Runtime {
    arena: Arena,
    loader: ModuleLoader,
    types: Vec<ActorType>,
    freeze_masks: Vec<u32>,
    slots: Vec<ActorSlot>,
    free_slots: Vec<u32>,
    /// Slot indices per category, insertion-ordered. Every listed index
    /// is a live slot; delete unlinks before clearing `alive`.
    categories: Vec<Vec<u32>>,
    live: u32,
    actor_cap: u32,
    frame: FrameId,
    /// World-state mask of the current (most recent) tick; callbacks
    /// dispatched outside a tick see the last one.
    world_mask: u32,
    next_actor_id: u32,
    next_generation: u32,
    pending_spawns: Vec<SpawnRequest>,
    last_metrics: FrameMetrics,
}

impl Runtime {
    /// Construct a runtime from a validated configuration.
    ///
    /// Consumes the config; the module and actor-type catalogs are
    /// read-only from here on.
    pub fn new(config: RuntimeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let arena = Arena::new(config.arena)?;
        let loader = ModuleLoader::new(config.modules, config.loader);
        let categories = vec![Vec::new(); config.freeze_masks.len()];
        Ok(Self {
            arena,
            loader,
            types: config.actors,
            freeze_masks: config.freeze_masks,
            slots: Vec::new(),
            free_slots: Vec::new(),
            categories,
            live: 0,
            actor_cap: config.actor_cap,
            frame: FrameId(0),
            world_mask: 0,
            next_actor_id: 0,
            next_generation: 1,
            pending_spawns: Vec::new(),
            last_metrics: FrameMetrics::default(),
        })
    }

    // ── Mutation entry points ──────────────────────────────────────

    /// Spawn one actor.
    ///
    /// Strong guarantee: on any failure the directory, loader, and arena
    /// are exactly as they were before the call. When the type's module
    /// is already resident, `init` runs inside this call; when the module
    /// is still staging, the actor waits in `pending_init` and `init`
    /// runs from the tick that finds the module resident.
    pub fn spawn(&mut self, request: SpawnRequest) -> Result<ActorHandle, SpawnError> {
        // 1. Cap before any allocation.
        if self.live >= self.actor_cap {
            return Err(SpawnError::InstanceCapExceeded {
                cap: self.actor_cap,
            });
        }
        // 2. Resolve the type.
        let Some(ty) = self.types.get(usize::from(request.type_id.0)) else {
            return Err(SpawnError::UnknownActorType {
                type_id: request.type_id,
            });
        };
        let (category, state_size, module) = (ty.category, ty.state_size, ty.module);
        // 3. Module reference first, instance state second.
        let module_ref = self.loader.load(module, &mut self.arena)?;
        // 4. State bytes; roll the module reference back if this fails.
        let state_block = match self.arena.allocate(state_size, Direction::Forward) {
            Ok(block) => block,
            Err(e) => {
                self.loader.release(module_ref, &mut self.arena);
                return Err(SpawnError::Arena(e));
            }
        };
        // 5. Fill a slot. State bytes were zeroed by the arena.
        let id = ActorId(self.next_actor_id);
        self.next_actor_id += 1;
        let generation = self.next_generation;
        self.next_generation += 1;
        let pending_init = !self.loader.is_resident(module);
        let slot = ActorSlot {
            id,
            generation,
            type_id: request.type_id,
            category,
            module,
            module_ref: Some(module_ref),
            state_block,
            position: request.position,
            rotation: request.rotation,
            params: request.params,
            events: 0,
            pending_init,
            destroyed: false,
            is_drawn: false,
            update_enabled: true,
            draw_enabled: true,
            targetable: true,
            freeze_exempt: false,
            alive: true,
        };
        let index = match self.free_slots.pop() {
            Some(i) => {
                self.slots[i as usize] = slot;
                i
            }
            None => {
                self.slots.push(slot);
                (self.slots.len() - 1) as u32
            }
        };
        self.live += 1;
        // 6. Category tail, then init if nothing to wait for.
        self.categories[usize::from(category.0)].push(index);
        if !pending_init && self.dispatch(index, Phase::Init) {
            self.kill_index(index);
        }
        Ok(ActorHandle {
            slot: index,
            generation,
        })
    }

    /// Soft-kill an actor: clears its update and draw capabilities and
    /// the targetable flag. Memory is untouched; reclamation follows the
    /// scheduler's grace rules on later ticks. Idempotent; stale handles
    /// are ignored.
    pub fn kill(&mut self, handle: ActorHandle) {
        if let Some(index) = self.live_index(handle) {
            self.kill_index(index);
        }
    }

    /// Raise transient event bits on an actor from outside a callback.
    ///
    /// The bits stay set until the actor's next visit clears them (the
    /// visit's `update` sees them via the context). Stale handles are
    /// ignored.
    pub fn raise_events(&mut self, handle: ActorHandle, bits: u32) {
        if let Some(index) = self.live_index(handle) {
            self.slots[index as usize].events |= bits;
        }
    }

    /// Exempt an actor from (or re-subject it to) category freezing.
    pub fn set_freeze_exempt(&mut self, handle: ActorHandle, exempt: bool) {
        if let Some(index) = self.live_index(handle) {
            self.slots[index as usize].freeze_exempt = exempt;
        }
    }

    /// Run one frame.
    ///
    /// Never fails: per-actor problems are soft-kills and counters, and
    /// failed deferred spawns are dropped. Categories run in ascending id
    /// order; the roster of each category is snapshotted before any
    /// callback, so same-pass deletions cannot skip or revisit actors.
    pub fn tick(&mut self, world_mask: u32) -> FrameMetrics {
        let tick_start = Instant::now();
        self.frame = FrameId(self.frame.0 + 1);
        self.world_mask = world_mask;
        let mut metrics = FrameMetrics {
            frame: self.frame,
            ..FrameMetrics::default()
        };

        // 1. Advance staged module copies so waiting actors can init
        //    this frame.
        metrics.staged_bytes_copied = self.loader.poll(&mut self.arena);

        // 2. Category passes.
        for cat in 0..self.categories.len() {
            let frozen = self.freeze_masks[cat] & world_mask != 0;
            let roster = self.categories[cat].clone();
            for index in roster {
                self.visit(index, frozen, &mut metrics);
            }
        }

        // 3. Drain callback-queued spawns FIFO. Failures are counted and
        //    dropped, never retried.
        let requests = std::mem::take(&mut self.pending_spawns);
        for request in requests {
            metrics.spawn_requests_drained += 1;
            if self.spawn(request).is_err() {
                metrics.spawn_failures += 1;
            }
        }

        // 4. End-of-frame gauges.
        let stats = self.arena.stats();
        metrics.live_actors = self.live;
        metrics.resident_modules = self.loader.tracked() as u32;
        metrics.arena_allocated = stats.total_allocated;
        metrics.arena_max_free_block = stats.max_free_block;
        metrics.total_us = tick_start.elapsed().as_micros() as u64;
        self.last_metrics = metrics;
        metrics
    }

    /// Run one draw pass.
    ///
    /// Dispatches the `draw` capability in category order for actors that
    /// are initialized and not soft-killed, marking them drawn; everyone
    /// else is marked not drawn. Returns the drawn count. What the
    /// callbacks do with the dispatch is the rendering backend's
    /// business, not the scheduler's.
    pub fn draw(&mut self) -> u32 {
        let mut drawn = 0;
        for cat in 0..self.categories.len() {
            let roster = self.categories[cat].clone();
            for index in roster {
                let i = index as usize;
                if !self.slots[i].alive {
                    continue;
                }
                if self.slots[i].pending_init || !self.slots[i].draw_enabled {
                    self.slots[i].is_drawn = false;
                    continue;
                }
                if self.dispatch(index, Phase::Draw) {
                    self.kill_index(index);
                }
                self.slots[i].is_drawn = true;
                drawn += 1;
            }
        }
        drawn
    }

    /// Scene boundary: tear everything down.
    ///
    /// Runs `destroy` once for every live, initialized, not-yet-destroyed
    /// actor in category order, then clears the directory, the loader's
    /// tracking, and the arena. The frame counter returns to zero; the
    /// generation counter does not, so pre-reset handles stay stale
    /// forever.
    pub fn reset(&mut self) {
        for cat in 0..self.categories.len() {
            let roster = self.categories[cat].clone();
            for index in roster {
                let i = index as usize;
                if !self.slots[i].alive {
                    continue;
                }
                if !self.slots[i].destroyed && !self.slots[i].pending_init {
                    self.slots[i].destroyed = true;
                    self.dispatch(index, Phase::Destroy);
                }
            }
        }
        self.slots.clear();
        self.free_slots.clear();
        for list in &mut self.categories {
            list.clear();
        }
        self.pending_spawns.clear();
        self.live = 0;
        self.loader.reset();
        self.arena.reset();
        self.frame = FrameId(0);
        self.world_mask = 0;
        self.last_metrics = FrameMetrics::default();
    }

    // ── Diagnostics ────────────────────────────────────────────────

    /// Current frame.
    pub fn frame(&self) -> FrameId {
        self.frame
    }

    /// Number of live actors (including soft-killed ones awaiting
    /// reclamation).
    pub fn live_actors(&self) -> u32 {
        self.live
    }

    /// Live actor count per category, ascending.
    pub fn live_by_category(&self) -> Vec<u32> {
        self.categories.iter().map(|l| l.len() as u32).collect()
    }

    /// Whether a handle still resolves.
    pub fn is_alive(&self, handle: ActorHandle) -> bool {
        self.live_index(handle).is_some()
    }

    /// Snapshot one actor for diagnostics; `None` for stale handles.
    pub fn actor(&self, handle: ActorHandle) -> Option<ActorView> {
        let index = self.live_index(handle)?;
        let slot = &self.slots[index as usize];
        let ty = &self.types[usize::from(slot.type_id.0)];
        Some(ActorView {
            handle,
            id: slot.id,
            type_id: slot.type_id,
            type_name: ty.name.clone(),
            category: slot.category,
            module: slot.module,
            position: slot.position,
            rotation: slot.rotation,
            params: slot.params,
            events: slot.events,
            pending_init: slot.pending_init,
            update_enabled: slot.update_enabled,
            draw_enabled: slot.draw_enabled,
            targetable: slot.targetable,
            is_drawn: slot.is_drawn,
            freeze_exempt: slot.freeze_exempt,
        })
    }

    /// An actor's raw state bytes; `None` for stale handles.
    pub fn actor_state(&self, handle: ActorHandle) -> Option<&[u8]> {
        let index = self.live_index(handle)?;
        self.arena.get(self.slots[index as usize].state_block)
    }

    /// Arena accounting.
    pub fn arena_stats(&self) -> ArenaStats {
        self.arena.stats()
    }

    /// Cumulative loader counters.
    pub fn loader_stats(&self) -> LoaderStats {
        self.loader.stats()
    }

    /// Tracked modules in load order.
    pub fn resident_modules(&self) -> Vec<ResidentModule> {
        self.loader.resident_modules()
    }

    /// Metrics from the most recent tick.
    pub fn last_metrics(&self) -> &FrameMetrics {
        &self.last_metrics
    }

    // ── Internal ───────────────────────────────────────────────────

    fn live_index(&self, handle: ActorHandle) -> Option<u32> {
        let slot = self.slots.get(handle.slot as usize)?;
        (slot.alive && slot.generation == handle.generation).then_some(handle.slot)
    }

    fn kill_index(&mut self, index: u32) {
        let slot = &mut self.slots[index as usize];
        slot.update_enabled = false;
        slot.draw_enabled = false;
        slot.targetable = false;
    }

    /// One actor's visit in a tick pass. The rule order is load-bearing:
    /// deferred init, then the module-dependency check, then freezing,
    /// then soft-kill reclamation, then the ordinary update.
    fn visit(&mut self, index: u32, frozen: bool, metrics: &mut FrameMetrics) {
        let i = index as usize;
        // Deleted earlier in this same pass; the roster snapshot still
        // carried it.
        if !self.slots[i].alive {
            return;
        }

        // 1. Deferred init: run it the first frame the module is fully
        //    resident; keep waiting while it stages; soft-kill if the
        //    dependency vanished before the actor ever ran.
        if self.slots[i].pending_init {
            match self.loader.residency(self.slots[i].module) {
                Some(Residency::Resident) => {
                    self.slots[i].pending_init = false;
                    metrics.inits_run += 1;
                    if self.dispatch(index, Phase::Init) {
                        self.kill_index(index);
                    }
                }
                Some(Residency::Staging { .. }) => {}
                None => {
                    metrics.dependency_kills += 1;
                    self.kill_index(index);
                }
            }
            return;
        }

        // 2. An initialized actor whose module is no longer resident
        //    (shared-slot eviction) is soft-killed; reclamation follows
        //    on later visits.
        if !self.loader.is_resident(self.slots[i].module) {
            if self.slots[i].update_enabled {
                metrics.dependency_kills += 1;
                self.kill_index(index);
                return;
            }
            // Already dying; fall through to reclamation.
        }

        // 3. Frozen categories skip update but still clear one-shot
        //    event bits, so stale events never leak into the thaw frame.
        if frozen && !self.slots[i].freeze_exempt {
            self.slots[i].events = 0;
            metrics.frozen_skipped += 1;
            return;
        }

        // 4. Soft-killed: an actor drawn last pass gets one frame of
        //    grace (destroy now, unlink next tick); an undrawn one is
        //    reclaimed immediately.
        if !self.slots[i].update_enabled {
            if self.slots[i].is_drawn {
                if !self.slots[i].destroyed {
                    self.slots[i].destroyed = true;
                    metrics.destroys_run += 1;
                    self.dispatch(index, Phase::Destroy);
                }
                self.slots[i].is_drawn = false;
            } else {
                self.delete(index, metrics);
            }
            return;
        }

        // 5. The ordinary frame: clear one-shot events, run update, honor
        //    a self-kill after the callback returns.
        self.slots[i].events = 0;
        metrics.updates_run += 1;
        if self.dispatch(index, Phase::Update) {
            self.kill_index(index);
        }
    }

    /// Physically reclaim one actor: destroy (if not already run),
    /// unlink, surrender the module reference, free the state block.
    fn delete(&mut self, index: u32, metrics: &mut FrameMetrics) {
        let i = index as usize;
        if !self.slots[i].destroyed {
            self.slots[i].destroyed = true;
            metrics.destroys_run += 1;
            self.dispatch(index, Phase::Destroy);
        }
        let cat = usize::from(self.slots[i].category.0);
        self.categories[cat].retain(|&x| x != index);
        let token = self.slots[i]
            .module_ref
            .take()
            .expect("live actor holds a module reference");
        self.loader.release(token, &mut self.arena);
        self.arena.free(self.slots[i].state_block);
        self.slots[i].alive = false;
        self.free_slots.push(index);
        self.live -= 1;
        metrics.deleted += 1;
    }

    /// Dispatch one lifecycle callback with a split-borrow context.
    /// Returns whether the callback requested its own removal.
    fn dispatch(&mut self, index: u32, phase: Phase) -> bool {
        let Self {
            types,
            slots,
            arena,
            pending_spawns,
            frame,
            world_mask,
            ..
        } = self;
        let slot = &mut slots[index as usize];
        let ty = &types[usize::from(slot.type_id.0)];
        let meta = ActorMeta {
            frame: *frame,
            actor: slot.id,
            category: slot.category,
            world_mask: *world_mask,
            params: slot.params,
        };
        let state = arena
            .get_mut(slot.state_block)
            .expect("actor state block outlives its actor");
        let mut ctx = ActorContext::new(
            meta,
            &mut slot.position,
            &mut slot.rotation,
            state,
            &mut slot.events,
            pending_spawns,
        );
        match phase {
            Phase::Init => ty.behavior.init(&mut ctx),
            Phase::Update => ty.behavior.update(&mut ctx),
            Phase::Draw => ty.behavior.draw(&mut ctx),
            Phase::Destroy => ty.behavior.destroy(&mut ctx),
        }
        ctx.kill_requested()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use troupe_arena::ArenaConfig;
    use troupe_core::{Behavior, LoadStrategy};
    use troupe_loader::{CopyMode, LoaderConfig};
    use troupe_test_utils::{
        body, CatalogBuilder, CountingBehavior, NullBehavior, SelfKillBehavior, SpawningBehavior,
        StateStampBehavior,
    };

    fn catalog() -> troupe_core::ModuleCatalog {
        CatalogBuilder::new()
            .module("crew", &body(32, 0x11), LoadStrategy::Pooled)
            .module("base", &body(16, 0x22), LoadStrategy::Persistent)
            .module("hud_a", &body(24, 0x33), LoadStrategy::SharedAbsolute)
            .module("hud_b", &body(16, 0x44), LoadStrategy::SharedAbsolute)
            .build()
            .unwrap()
    }

    fn actor_type(name: &str, category: u8, module: u16, behavior: Box<dyn Behavior>) -> ActorType {
        ActorType {
            name: name.to_string(),
            category: CategoryId(category),
            state_size: 16,
            module: ModuleId(module),
            behavior,
        }
    }

    fn config_with(actors: Vec<ActorType>) -> RuntimeConfig {
        RuntimeConfig {
            modules: catalog(),
            actors,
            freeze_masks: vec![0, 0b01, 0b10],
            actor_cap: 32,
            arena: ArenaConfig::new(4096),
            loader: LoaderConfig {
                shared_slot_bytes: 32,
                copy_mode: CopyMode::Immediate,
            },
        }
    }

    fn runtime_with(actors: Vec<ActorType>) -> Runtime {
        Runtime::new(config_with(actors)).unwrap()
    }

    #[test]
    fn spawn_runs_init_immediately_when_module_resident() {
        let counting = CountingBehavior::new("crew");
        let log = counting.log();
        let mut rt = runtime_with(vec![actor_type("walker", 0, 0, Box::new(counting))]);

        let handle = rt.spawn(SpawnRequest::new(ActorTypeId(0))).unwrap();
        assert_eq!(log.inits(), 1);
        assert_eq!(rt.live_actors(), 1);
        let view = rt.actor(handle).unwrap();
        assert!(!view.pending_init);
        assert!(view.update_enabled && view.draw_enabled && view.targetable);
        assert_eq!(view.type_name, "walker");
    }

    #[test]
    fn spawn_unknown_type_fails_without_side_effects() {
        let mut rt = runtime_with(vec![actor_type(
            "walker",
            0,
            0,
            Box::new(NullBehavior::new("walker")),
        )]);
        let before = rt.arena_stats();
        match rt.spawn(SpawnRequest::new(ActorTypeId(7))) {
            Err(SpawnError::UnknownActorType { type_id }) => {
                assert_eq!(type_id, ActorTypeId(7));
            }
            other => panic!("expected UnknownActorType, got {other:?}"),
        }
        assert_eq!(rt.arena_stats(), before);
        assert_eq!(rt.live_actors(), 0);
    }

    #[test]
    fn spawn_at_cap_fails_before_allocating() {
        let mut config = config_with(vec![actor_type(
            "walker",
            0,
            0,
            Box::new(NullBehavior::new("walker")),
        )]);
        config.actor_cap = 1;
        let mut rt = Runtime::new(config).unwrap();

        rt.spawn(SpawnRequest::new(ActorTypeId(0))).unwrap();
        let before = rt.arena_stats();
        match rt.spawn(SpawnRequest::new(ActorTypeId(0))) {
            Err(SpawnError::InstanceCapExceeded { cap: 1 }) => {}
            other => panic!("expected InstanceCapExceeded, got {other:?}"),
        }
        assert_eq!(rt.arena_stats(), before, "cap check precedes allocation");
        assert_eq!(rt.live_by_category(), vec![1, 0, 0]);
    }

    #[test]
    fn spawn_rolls_back_module_on_state_allocation_failure() {
        // 64-byte arena: the crew module (32 bytes) fits, the 64-byte
        // state block that follows cannot.
        let mut config = config_with(vec![ActorType {
            name: "hog".to_string(),
            category: CategoryId(0),
            state_size: 64,
            module: ModuleId(0),
            behavior: Box::new(NullBehavior::new("hog")),
        }]);
        config.arena = ArenaConfig::new(64);
        let mut rt = Runtime::new(config).unwrap();

        let pristine = rt.arena_stats();
        match rt.spawn(SpawnRequest::new(ActorTypeId(0))) {
            Err(SpawnError::Arena(troupe_arena::ArenaError::OutOfMemory { .. })) => {}
            other => panic!("expected Arena(OutOfMemory), got {other:?}"),
        }
        assert_eq!(rt.arena_stats(), pristine, "module reference rolled back");
        assert_eq!(rt.loader_stats().releases, 1);
        assert_eq!(rt.resident_modules().len(), 0);
        assert_eq!(rt.live_actors(), 0);
    }

    #[test]
    fn state_bytes_start_zeroed_and_persist_across_frames() {
        let mut rt = runtime_with(vec![
            actor_type("blank", 0, 0, Box::new(NullBehavior::new("blank"))),
            actor_type("stamp", 0, 0, Box::new(StateStampBehavior::new("stamp", 0xA5))),
        ]);

        let blank = rt.spawn(SpawnRequest::new(ActorTypeId(0))).unwrap();
        assert!(rt.actor_state(blank).unwrap().iter().all(|&b| b == 0));

        let stamped = rt.spawn(SpawnRequest::new(ActorTypeId(1))).unwrap();
        for _ in 0..3 {
            rt.tick(0);
        }
        let state = rt.actor_state(stamped).unwrap();
        assert_eq!(state[0], 3, "update count persists in state bytes");
        assert!(state[1..].iter().all(|&b| b == 0xA5), "init stamp persists");
    }

    #[test]
    fn spawn_transform_and_params_reach_the_actor() {
        let mut rt = runtime_with(vec![actor_type(
            "walker",
            0,
            0,
            Box::new(NullBehavior::new("walker")),
        )]);
        let handle = rt
            .spawn(
                SpawnRequest::new(ActorTypeId(0))
                    .at([1.0, 2.0, 3.0])
                    .with_params(-7),
            )
            .unwrap();
        let view = rt.actor(handle).unwrap();
        assert_eq!(view.position, [1.0, 2.0, 3.0]);
        assert_eq!(view.params, -7);
    }

    #[test]
    fn kill_clears_capabilities_but_not_memory() {
        let counting = CountingBehavior::new("crew");
        let log = counting.log();
        let mut rt = runtime_with(vec![actor_type("walker", 0, 0, Box::new(counting))]);
        let handle = rt.spawn(SpawnRequest::new(ActorTypeId(0))).unwrap();
        let allocated = rt.arena_stats().total_allocated;

        rt.kill(handle);
        rt.kill(handle); // idempotent
        let view = rt.actor(handle).unwrap();
        assert!(!view.update_enabled && !view.draw_enabled && !view.targetable);
        assert!(rt.is_alive(handle), "kill reclaims nothing by itself");
        assert_eq!(rt.arena_stats().total_allocated, allocated);
        assert_eq!(log.destroys(), 0);
    }

    #[test]
    fn killed_undrawn_actor_reclaimed_on_next_visit() {
        let counting = CountingBehavior::new("crew");
        let log = counting.log();
        let mut rt = runtime_with(vec![actor_type("walker", 0, 0, Box::new(counting))]);
        let pristine = rt.arena_stats();
        let handle = rt.spawn(SpawnRequest::new(ActorTypeId(0))).unwrap();

        rt.kill(handle);
        let metrics = rt.tick(0);
        assert_eq!(log.destroys(), 1);
        assert_eq!(metrics.deleted, 1);
        assert!(!rt.is_alive(handle));
        assert_eq!(rt.live_actors(), 0);
        assert_eq!(rt.arena_stats(), pristine, "state and module both freed");
    }

    #[test]
    fn killed_drawn_actor_gets_one_frame_grace() {
        let counting = CountingBehavior::new("crew");
        let log = counting.log();
        let mut rt = runtime_with(vec![actor_type("walker", 0, 0, Box::new(counting))]);
        let handle = rt.spawn(SpawnRequest::new(ActorTypeId(0))).unwrap();

        rt.tick(0);
        assert_eq!(rt.draw(), 1);
        assert!(rt.actor(handle).unwrap().is_drawn);

        rt.kill(handle);
        let metrics = rt.tick(0);
        assert_eq!(log.destroys(), 1, "destroy runs at the start of the grace");
        assert_eq!(metrics.deleted, 0, "unlink deferred one tick");
        assert!(rt.is_alive(handle));
        assert!(!rt.actor(handle).unwrap().is_drawn);

        let metrics = rt.tick(0);
        assert_eq!(metrics.deleted, 1);
        assert_eq!(log.destroys(), 1, "destroy ran exactly once");
        assert!(!rt.is_alive(handle));
    }

    #[test]
    fn self_kill_applies_after_the_callback_returns() {
        let mut rt = runtime_with(vec![actor_type(
            "brief",
            0,
            0,
            Box::new(SelfKillBehavior::new("brief", 2)),
        )]);
        let handle = rt.spawn(SpawnRequest::new(ActorTypeId(0))).unwrap();

        let m1 = rt.tick(0);
        assert_eq!(m1.updates_run, 1);
        assert!(rt.actor(handle).unwrap().update_enabled, "first update survives");

        let m2 = rt.tick(0);
        assert_eq!(m2.updates_run, 1);
        assert!(!rt.actor(handle).unwrap().update_enabled, "second update kills");

        let m3 = rt.tick(0);
        assert_eq!(m3.updates_run, 0);
        assert_eq!(m3.deleted, 1);
    }

    #[test]
    fn stale_handles_resolve_to_none_everywhere() {
        let mut rt = runtime_with(vec![actor_type(
            "walker",
            0,
            0,
            Box::new(NullBehavior::new("walker")),
        )]);
        let handle = rt.spawn(SpawnRequest::new(ActorTypeId(0))).unwrap();
        rt.kill(handle);
        rt.tick(0);

        assert!(rt.actor(handle).is_none());
        assert!(rt.actor_state(handle).is_none());
        rt.kill(handle); // no-op, no panic
        rt.raise_events(handle, 0b1);
        rt.set_freeze_exempt(handle, true);

        // The slot is reused; the old handle must not alias the newcomer.
        let replacement = rt.spawn(SpawnRequest::new(ActorTypeId(0))).unwrap();
        assert_eq!(replacement.slot(), handle.slot());
        assert_ne!(replacement.generation(), handle.generation());
        assert!(rt.actor(handle).is_none());
    }

    #[test]
    fn tick_visits_categories_in_ascending_order() {
        struct OrderProbe {
            name: String,
            order: Arc<Mutex<Vec<u32>>>,
        }
        impl Behavior for OrderProbe {
            fn name(&self) -> &str {
                &self.name
            }
            fn update(&self, ctx: &mut ActorContext<'_>) {
                self.order.lock().unwrap().push(ctx.actor().0);
            }
        }

        let order = Arc::new(Mutex::new(Vec::new()));
        let probe = |name: &str, cat: u8| {
            actor_type(
                name,
                cat,
                0,
                Box::new(OrderProbe {
                    name: name.to_string(),
                    order: Arc::clone(&order),
                }),
            )
        };
        let mut rt = runtime_with(vec![probe("early", 0), probe("late", 2)]);

        // Interleave spawns across categories; within a category the
        // visit order is spawn order.
        let a = rt.spawn(SpawnRequest::new(ActorTypeId(1))).unwrap(); // cat 2
        let b = rt.spawn(SpawnRequest::new(ActorTypeId(0))).unwrap(); // cat 0
        let c = rt.spawn(SpawnRequest::new(ActorTypeId(1))).unwrap(); // cat 2
        let d = rt.spawn(SpawnRequest::new(ActorTypeId(0))).unwrap(); // cat 0

        rt.tick(0);
        let ids: Vec<u32> = order.lock().unwrap().clone();
        let expected: Vec<u32> = [b, d, a, c]
            .iter()
            .map(|h| rt.actor(*h).unwrap().id.0)
            .collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn frozen_category_skips_update_but_clears_events() {
        let counting = CountingBehavior::new("crew");
        let log = counting.log();
        // Category 1 freezes under mask bit 0.
        let mut rt = runtime_with(vec![actor_type("frosty", 1, 0, Box::new(counting))]);
        let handle = rt.spawn(SpawnRequest::new(ActorTypeId(0))).unwrap();

        rt.raise_events(handle, 0b1010);
        assert_eq!(rt.actor(handle).unwrap().events, 0b1010);

        let metrics = rt.tick(0b01);
        assert_eq!(log.updates(), 0);
        assert_eq!(metrics.frozen_skipped, 1);
        assert_eq!(rt.actor(handle).unwrap().events, 0, "events cleared while frozen");

        let metrics = rt.tick(0b10);
        assert_eq!(log.updates(), 1, "a non-matching mask thaws the category");
        assert_eq!(metrics.frozen_skipped, 0);
    }

    #[test]
    fn freeze_exempt_actor_keeps_updating() {
        let exempt_counting = CountingBehavior::new("exempt");
        let exempt_log = exempt_counting.log();
        let frozen_counting = CountingBehavior::new("frozen");
        let frozen_log = frozen_counting.log();
        let mut rt = runtime_with(vec![
            actor_type("scout", 1, 0, Box::new(exempt_counting)),
            actor_type("guard", 1, 0, Box::new(frozen_counting)),
        ]);
        let scout = rt.spawn(SpawnRequest::new(ActorTypeId(0))).unwrap();
        let _guard = rt.spawn(SpawnRequest::new(ActorTypeId(1))).unwrap();

        rt.set_freeze_exempt(scout, true);
        let metrics = rt.tick(0b01);
        assert_eq!(exempt_log.updates(), 1);
        assert_eq!(frozen_log.updates(), 0);
        assert_eq!(metrics.frozen_skipped, 1);
        assert_eq!(metrics.updates_run, 1);
    }

    #[test]
    fn events_cleared_at_the_top_of_each_visit() {
        struct Raiser {
            name: String,
        }
        impl Behavior for Raiser {
            fn name(&self) -> &str {
                &self.name
            }
            fn update(&self, ctx: &mut ActorContext<'_>) {
                ctx.raise_events(0b1);
            }
        }
        let mut rt = runtime_with(vec![actor_type(
            "beacon",
            0,
            0,
            Box::new(Raiser {
                name: "beacon".to_string(),
            }),
        )]);
        let handle = rt.spawn(SpawnRequest::new(ActorTypeId(0))).unwrap();

        rt.raise_events(handle, 0b100);
        rt.tick(0);
        // The externally raised bit was cleared before update; only the
        // update's own bit remains.
        assert_eq!(rt.actor(handle).unwrap().events, 0b1);
    }

    #[test]
    fn callback_spawns_drain_fifo_after_the_pass() {
        let child_counting = CountingBehavior::new("child");
        let child_log = child_counting.log();
        let mut rt = runtime_with(vec![
            actor_type(
                "parent",
                0,
                0,
                Box::new(SpawningBehavior::new("parent", ActorTypeId(1))),
            ),
            actor_type("child", 0, 0, Box::new(child_counting)),
        ]);
        rt.spawn(SpawnRequest::new(ActorTypeId(0))).unwrap();

        let metrics = rt.tick(0);
        assert_eq!(metrics.updates_run, 1, "child spawns after the pass");
        assert_eq!(metrics.spawn_requests_drained, 1);
        assert_eq!(metrics.spawn_failures, 0);
        assert_eq!(rt.live_actors(), 2);
        assert_eq!(child_log.inits(), 1, "drained spawn ran init");
        assert_eq!(child_log.updates(), 0);

        let metrics = rt.tick(0);
        assert_eq!(metrics.updates_run, 2);
        assert_eq!(child_log.updates(), 1);
    }

    #[test]
    fn failed_deferred_spawns_are_counted_and_dropped() {
        let mut config = config_with(vec![
            actor_type(
                "parent",
                0,
                0,
                Box::new(SpawningBehavior::new("parent", ActorTypeId(1))),
            ),
            actor_type("child", 0, 0, Box::new(NullBehavior::new("child"))),
        ]);
        config.actor_cap = 1;
        let mut rt = Runtime::new(config).unwrap();
        rt.spawn(SpawnRequest::new(ActorTypeId(0))).unwrap();

        let metrics = rt.tick(0);
        assert_eq!(metrics.spawn_requests_drained, 1);
        assert_eq!(metrics.spawn_failures, 1, "cap rejects the child");
        assert_eq!(rt.live_actors(), 1);

        // The dropped request is not retried on the next frame beyond the
        // one the parent queues anew.
        let metrics = rt.tick(0);
        assert_eq!(metrics.spawn_requests_drained, 1);
    }

    #[test]
    fn draw_skips_disabled_and_marks_the_rest() {
        let mut rt = runtime_with(vec![actor_type(
            "walker",
            0,
            0,
            Box::new(NullBehavior::new("walker")),
        )]);
        let shown = rt.spawn(SpawnRequest::new(ActorTypeId(0))).unwrap();
        let hidden = rt.spawn(SpawnRequest::new(ActorTypeId(0))).unwrap();
        rt.kill(hidden);

        assert_eq!(rt.draw(), 1);
        assert!(rt.actor(shown).unwrap().is_drawn);
        assert!(!rt.actor(hidden).unwrap().is_drawn);
    }

    #[test]
    fn tick_metrics_carry_frame_and_gauges() {
        let mut rt = runtime_with(vec![actor_type(
            "walker",
            0,
            0,
            Box::new(NullBehavior::new("walker")),
        )]);
        rt.spawn(SpawnRequest::new(ActorTypeId(0))).unwrap();

        let metrics = rt.tick(0);
        assert_eq!(metrics.frame, FrameId(1));
        assert_eq!(metrics.updates_run, 1);
        assert_eq!(metrics.live_actors, 1);
        assert_eq!(metrics.resident_modules, 1);
        assert!(metrics.arena_allocated > 0);
        assert_eq!(rt.last_metrics().frame, FrameId(1));
        assert_eq!(rt.frame(), FrameId(1));
    }

    #[test]
    fn reset_destroys_live_actors_and_restores_pristine_state() {
        let counting = CountingBehavior::new("crew");
        let log = counting.log();
        let mut rt = runtime_with(vec![actor_type("walker", 0, 0, Box::new(counting))]);
        let pristine = rt.arena_stats();
        let h1 = rt.spawn(SpawnRequest::new(ActorTypeId(0))).unwrap();
        let h2 = rt.spawn(SpawnRequest::new(ActorTypeId(0))).unwrap();
        rt.tick(0);

        rt.reset();
        assert_eq!(log.destroys(), 2);
        assert_eq!(rt.live_actors(), 0);
        assert_eq!(rt.frame(), FrameId(0));
        assert_eq!(rt.arena_stats(), pristine);
        assert!(rt.resident_modules().is_empty());
        assert!(!rt.is_alive(h1) && !rt.is_alive(h2));

        // The directory works again afterwards, and old handles stay dead.
        let h3 = rt.spawn(SpawnRequest::new(ActorTypeId(0))).unwrap();
        assert!(rt.is_alive(h3));
        assert!(rt.actor(h1).is_none());
    }
}
