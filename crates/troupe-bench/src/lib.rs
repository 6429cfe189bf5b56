//! Benchmark profiles and utilities for the troupe actor runtime.
//!
//! Provides pre-built [`RuntimeConfig`] profiles for benchmarking:
//!
//! - [`reference_profile`]: 256 KiB arena, 4 pooled modules, cap 256
//! - [`stress_profile`]: 1 MiB arena, 8 pooled modules, cap 2048
//! - [`WanderBehavior`]: deterministic per-frame work with no I/O
//!
//! The profiles share one catalog shape: a persistent base module loaded
//! at startup, two shared-slot overlays that evict each other, and a set
//! of pooled modules the churn scripts load and release through spawns.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use troupe_arena::ArenaConfig;
use troupe_core::{
    ActorContext, ActorType, Behavior, CategoryId, LoadStrategy, ModuleCatalog, ModuleDescriptor,
    ModuleId, RelocationTable,
};
use troupe_loader::{CopyMode, LoaderConfig};
use troupe_runtime::RuntimeConfig;

/// Deterministic busywork behavior for benches.
///
/// Each update advances the position by a params-scaled step and mixes
/// the frame number into the first state word, so the optimizer cannot
/// discard the dispatch.
pub struct WanderBehavior {
    name: String,
}

impl WanderBehavior {
    /// Behavior named for bench output.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Behavior for WanderBehavior {
    fn name(&self) -> &str {
        &self.name
    }

    fn update(&self, ctx: &mut ActorContext<'_>) {
        let step = ctx.params() as f32 * 0.001;
        ctx.position_mut()[0] += step;
        ctx.position_mut()[2] -= step * 0.5;
        let frame = ctx.frame().0 as u32;
        let state = ctx.state_mut();
        let mut word = u32::from_le_bytes([state[0], state[1], state[2], state[3]]);
        word = word.wrapping_mul(1664525).wrapping_add(frame);
        state[0..4].copy_from_slice(&word.to_le_bytes());
    }
}

fn catalog(pooled_modules: usize, pooled_size: u32) -> ModuleCatalog {
    let mut image = Vec::new();
    let mut descriptors = Vec::new();
    let mut push = |image: &mut Vec<u8>, name: &str, size: u32, strategy: LoadStrategy| {
        let start = image.len() as u32;
        image.extend(std::iter::repeat(0xC3u8).take(size as usize));
        descriptors.push(ModuleDescriptor {
            name: name.to_string(),
            source: start..start + size,
            loaded_size: size,
            strategy,
            relocations: RelocationTable::new(),
        });
    };
    push(&mut image, "base", 4096, LoadStrategy::Persistent);
    push(&mut image, "overlay_a", 1024, LoadStrategy::SharedAbsolute);
    push(&mut image, "overlay_b", 1024, LoadStrategy::SharedAbsolute);
    for i in 0..pooled_modules {
        push(
            &mut image,
            &format!("pooled_{i}"),
            pooled_size,
            LoadStrategy::Pooled,
        );
    }
    ModuleCatalog::new(image, descriptors).expect("bench catalog is well-formed")
}

fn actor_types(pooled_modules: usize, state_size: u32) -> Vec<ActorType> {
    // First pooled module is ModuleId(3): base and the two overlays
    // precede the pooled block in the catalog.
    (0..pooled_modules)
        .map(|i| ActorType {
            name: format!("wanderer_{i}"),
            category: CategoryId((i % 3) as u8),
            state_size,
            module: ModuleId((3 + i) as u16),
            behavior: Box::new(WanderBehavior::new(format!("wanderer_{i}"))),
        })
        .collect()
}

/// Build a reference benchmark profile: 256 KiB arena, 4 pooled modules
/// of 2 KiB, 64-byte actor state, instance cap 256, immediate copies.
pub fn reference_profile() -> RuntimeConfig {
    RuntimeConfig {
        modules: catalog(4, 2048),
        actors: actor_types(4, 64),
        freeze_masks: vec![0, 0b01, 0b10],
        actor_cap: 256,
        arena: ArenaConfig::new(256 * 1024),
        loader: LoaderConfig {
            shared_slot_bytes: 1024,
            copy_mode: CopyMode::Immediate,
        },
    }
}

/// Build a stress benchmark profile: 1 MiB arena, 8 pooled modules of
/// 8 KiB, 128-byte actor state, instance cap 2048, staged copies at
/// 4 KiB per frame.
pub fn stress_profile() -> RuntimeConfig {
    RuntimeConfig {
        modules: catalog(8, 8192),
        actors: actor_types(8, 128),
        freeze_masks: vec![0, 0b01, 0b10],
        actor_cap: 2048,
        arena: ArenaConfig::new(1024 * 1024),
        loader: LoaderConfig {
            shared_slot_bytes: 1024,
            copy_mode: CopyMode::Staged {
                bytes_per_frame: 4096,
            },
        },
    }
}
