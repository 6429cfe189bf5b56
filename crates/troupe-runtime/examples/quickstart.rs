//! Troupe quickstart — a complete, minimal actor world from scratch.
//!
//! Demonstrates:
//!   1. Building a module catalog (one persistent base, one pooled unit)
//!   2. Implementing a `Behavior` (a patroller that walks and expires)
//!   3. Building a `RuntimeConfig` and a `Runtime`
//!   4. Spawning, ticking, drawing, freezing a category, and resetting
//!
//! Run with:
//!   cargo run --example quickstart

use troupe_arena::ArenaConfig;
use troupe_core::{
    ActorContext, ActorType, ActorTypeId, Behavior, CategoryId, LoadStrategy, ModuleCatalog,
    ModuleDescriptor, ModuleId, RelocationTable, SpawnRequest,
};
use troupe_loader::LoaderConfig;
use troupe_runtime::{Runtime, RuntimeConfig};

// ─── Categories ─────────────────────────────────────────────────

const CAT_WORLD: u8 = 0;
const CAT_UNITS: u8 = 1;

// World-state bit that freezes the units category (a pause menu, say).
const PAUSED: u32 = 0b1;

// ─── Behavior: a patroller that walks +x and expires ────────────
//
// Per-instance state lives in the zeroed state bytes: the first four
// bytes count frames walked. After `lifetime` frames the patroller
// requests its own removal; the scheduler honors that after the
// callback returns and reclaims the memory on a later pass.

struct Patroller {
    lifetime: u32,
}

impl Behavior for Patroller {
    fn name(&self) -> &str {
        "patroller"
    }

    fn update(&self, ctx: &mut ActorContext<'_>) {
        let state = ctx.state_mut();
        let mut walked = u32::from_le_bytes([state[0], state[1], state[2], state[3]]);
        walked += 1;
        state[0..4].copy_from_slice(&walked.to_le_bytes());

        ctx.position_mut()[0] += 0.5;
        if walked >= self.lifetime {
            ctx.kill();
        }
    }
}

// The world anchor never moves and never dies on its own.
struct Anchor;

impl Behavior for Anchor {
    fn name(&self) -> &str {
        "anchor"
    }

    fn update(&self, _ctx: &mut ActorContext<'_>) {}
}

// ─── Catalog ────────────────────────────────────────────────────

fn catalog() -> ModuleCatalog {
    // A real embedder loads this image from a pack file; here two
    // placeholder module bodies are concatenated inline.
    let mut image = vec![0xAAu8; 64]; // base: resident for the whole scene
    image.extend([0xBBu8; 32]); // patrol: pooled, lives with its users
    ModuleCatalog::new(
        image,
        vec![
            ModuleDescriptor {
                name: "base".into(),
                source: 0..64,
                loaded_size: 64,
                strategy: LoadStrategy::Persistent,
                relocations: RelocationTable::new(),
            },
            ModuleDescriptor {
                name: "patrol".into(),
                source: 64..96,
                loaded_size: 32,
                strategy: LoadStrategy::Pooled,
                relocations: RelocationTable::new(),
            },
        ],
    )
    .expect("inline catalog is well-formed")
}

fn main() {
    let config = RuntimeConfig {
        modules: catalog(),
        actors: vec![
            ActorType {
                name: "anchor".into(),
                category: CategoryId(CAT_WORLD),
                state_size: 16,
                module: ModuleId(0),
                behavior: Box::new(Anchor),
            },
            ActorType {
                name: "patroller".into(),
                category: CategoryId(CAT_UNITS),
                state_size: 16,
                module: ModuleId(1),
                behavior: Box::new(Patroller { lifetime: 5 }),
            },
        ],
        // The units category freezes while the world is paused.
        freeze_masks: vec![0, PAUSED],
        actor_cap: 64,
        arena: ArenaConfig::new(8 * 1024),
        loader: LoaderConfig::default(),
    };
    let mut world = Runtime::new(config).expect("config validates");

    world
        .spawn(SpawnRequest::new(ActorTypeId(0)))
        .expect("anchor spawns");
    let patrol = world
        .spawn(SpawnRequest::new(ActorTypeId(1)).at([0.0, 0.0, 0.0]))
        .expect("patroller spawns");

    println!("resident modules after spawn:");
    for m in world.resident_modules() {
        println!("  {:?} '{}' rc={} ({:?})", m.module, m.name, m.refcount, m.strategy);
    }

    // Three ordinary frames, drawing each one.
    for _ in 0..3 {
        let metrics = world.tick(0);
        let drawn = world.draw();
        println!(
            "frame {}: updates={} drawn={} x={:.1}",
            metrics.frame,
            metrics.updates_run,
            drawn,
            world.actor(patrol).expect("still live").position[0],
        );
    }

    // Two paused frames: the patroller's category is frozen, so it
    // neither walks nor ages.
    for _ in 0..2 {
        let metrics = world.tick(PAUSED);
        println!(
            "frame {} (paused): updates={} frozen_skipped={}",
            metrics.frame, metrics.updates_run, metrics.frozen_skipped
        );
    }

    // Resume until the patroller expires and is reclaimed.
    let mut frames = 0;
    while world.is_alive(patrol) {
        world.tick(0);
        frames += 1;
        assert!(frames < 10, "patroller expires within its lifetime");
    }
    println!(
        "patroller reclaimed; live={} pooled module gone={}",
        world.live_actors(),
        world
            .resident_modules()
            .iter()
            .all(|m| m.name != "patrol"),
    );

    // Scene boundary: everything back to pristine.
    world.reset();
    let stats = world.arena_stats();
    println!(
        "after reset: live={} allocated={} of {}",
        world.live_actors(),
        stats.total_allocated,
        stats.capacity
    );
}
