//! The module loader: strategy-directed placement, reference counting,
//! relocation fix-ups, and budgeted staging.
//!
//! The loader owns no memory of its own — every module body lives in an
//! arena block. `Pooled` modules go forward and are freed when their last
//! reference is released; `Persistent` modules go backward and stay until
//! reset; `SharedAbsolute` modules share one fixed backward slot, where a
//! new load silently evicts the previous occupant without freeing
//! anything. Because arena blocks never move, install-time relocation can
//! rewrite recorded image-relative offsets to arena-absolute ones once
//! and leave them valid for the module's whole residency.

use indexmap::IndexMap;

use troupe_arena::{Arena, ArenaError, BlockHandle, Direction};
use troupe_core::{LoadStrategy, ModuleCatalog, ModuleId};

use crate::error::LoadError;

/// How module bytes are copied into the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CopyMode {
    /// Copy and install synchronously inside `load`.
    Immediate,
    /// Copy at most `bytes_per_frame` bytes per [`ModuleLoader::poll`]
    /// call, shared FIFO across all staging modules. Install (zero-fill
    /// tail is already in place; relocations are applied) happens
    /// synchronously in the `poll` that completes the copy.
    Staged {
        /// Copy budget per poll. Must be non-zero for staging to make
        /// progress.
        bytes_per_frame: u32,
    },
}

/// Residency state of a tracked module.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Residency {
    /// Bytes still being copied under the per-frame budget. Not safe to
    /// execute against; actors referencing it stay pending.
    Staging {
        /// Source bytes copied so far.
        copied: u32,
    },
    /// Fully copied and relocated.
    Resident,
}

/// Move-token for one counted reference to a loaded module.
///
/// Deliberately neither `Clone` nor `Copy`: the only ways to change a
/// refcount are [`ModuleLoader::load`] (which mints a token) and
/// [`ModuleLoader::release`] (which consumes one). Dropping a token
/// without releasing it leaks its count until reset.
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub struct ModuleRef {
    module: ModuleId,
}

impl ModuleRef {
    /// The module this token references.
    pub fn module(&self) -> ModuleId {
        self.module
    }
}

/// Loader configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Size of the single shared backward slot, allocated on the first
    /// `SharedAbsolute` load. Every `SharedAbsolute` image must fit.
    pub shared_slot_bytes: u32,
    /// Copy mode for module bytes.
    pub copy_mode: CopyMode,
}

impl LoaderConfig {
    /// Default shared slot: 64 KiB.
    pub const DEFAULT_SHARED_SLOT_BYTES: u32 = 64 * 1024;
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            shared_slot_bytes: Self::DEFAULT_SHARED_SLOT_BYTES,
            copy_mode: CopyMode::Immediate,
        }
    }
}

/// Cumulative loader counters. Survive `reset`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoaderStats {
    /// Loads that created a new entry.
    pub loads: u64,
    /// Loads satisfied by an existing entry (refcount bump only).
    pub ref_hits: u64,
    /// Tokens released.
    pub releases: u64,
    /// Released tokens whose entry was already gone (evicted or reset).
    pub releases_ignored: u64,
    /// Shared-slot occupants displaced by a competing load.
    pub evictions: u64,
    /// Source bytes copied by staged polls.
    pub staged_bytes_copied: u64,
}

/// One row of [`ModuleLoader::resident_modules`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResidentModule {
    /// The module id.
    pub module: ModuleId,
    /// Descriptor name, for diagnostics.
    pub name: String,
    /// Residency strategy.
    pub strategy: LoadStrategy,
    /// Outstanding reference tokens.
    pub refcount: u32,
    /// Current residency state.
    pub residency: Residency,
    /// Loaded image size in bytes.
    pub loaded_size: u32,
}

#[derive(Debug)]
struct LoadedModule {
    block: BlockHandle,
    strategy: LoadStrategy,
    refcount: u32,
    residency: Residency,
}

/// Reference-counted module residency over one arena.
///
/// Tracked entries are keyed in load order, so diagnostics enumerate
/// deterministically.
pub struct ModuleLoader {
    catalog: ModuleCatalog,
    entries: IndexMap<ModuleId, LoadedModule>,
    shared_block: Option<BlockHandle>,
    shared_occupant: Option<ModuleId>,
    config: LoaderConfig,
    stats: LoaderStats,
}

impl ModuleLoader {
    /// Build a loader over a validated catalog.
    pub fn new(catalog: ModuleCatalog, config: LoaderConfig) -> Self {
        Self {
            catalog,
            entries: IndexMap::new(),
            shared_block: None,
            shared_occupant: None,
            config,
            stats: LoaderStats::default(),
        }
    }

    /// The catalog this loader serves from.
    pub fn catalog(&self) -> &ModuleCatalog {
        &self.catalog
    }

    /// Acquire a reference to a module, loading it if necessary.
    ///
    /// Idempotent: a tracked module (resident or still staging) just has
    /// its refcount bumped. A failed load has no side effects.
    pub fn load(&mut self, module: ModuleId, arena: &mut Arena) -> Result<ModuleRef, LoadError> {
        // 1. Already tracked: mint another token.
        if let Some(entry) = self.entries.get_mut(&module) {
            entry.refcount += 1;
            self.stats.ref_hits += 1;
            return Ok(ModuleRef { module });
        }

        // 2. Resolve the descriptor.
        let (strategy, loaded_size) = match self.catalog.get(module) {
            Some(desc) => (desc.strategy, desc.loaded_size),
            None => return Err(LoadError::ModuleResolutionFailed { module }),
        };

        // 3. Acquire the backing block. Forward for pooled, backward for
        //    the rest; the shared slot is allocated once and reused.
        let block = match strategy {
            LoadStrategy::Pooled => arena.allocate(loaded_size, Direction::Forward)?,
            LoadStrategy::Persistent => arena.allocate(loaded_size, Direction::Backward)?,
            LoadStrategy::SharedAbsolute => self.acquire_shared_slot(module, loaded_size, arena)?,
        };

        // 4. Copy per the configured mode. The block is already zeroed,
        //    so the tail past the source bytes is the module's cleared
        //    data section.
        let residency = match self.config.copy_mode {
            CopyMode::Immediate => {
                Self::copy_chunk(&self.catalog, module, arena, block, 0, u32::MAX);
                Self::install(&self.catalog, module, arena, block);
                Residency::Resident
            }
            CopyMode::Staged { .. } => Residency::Staging { copied: 0 },
        };

        self.entries.insert(
            module,
            LoadedModule {
                block,
                strategy,
                refcount: 1,
                residency,
            },
        );
        self.stats.loads += 1;
        Ok(ModuleRef { module })
    }

    /// Surrender one reference.
    ///
    /// A `Pooled` module (even one still staging) is freed and untracked
    /// when its count reaches zero. `Persistent` and `SharedAbsolute`
    /// releases are bookkeeping only. A token whose entry is already gone
    /// — shared-slot eviction, or a reset since it was minted — is
    /// counted and otherwise ignored.
    pub fn release(&mut self, token: ModuleRef, arena: &mut Arena) {
        let module = token.module;
        self.stats.releases += 1;
        let Some(entry) = self.entries.get_mut(&module) else {
            self.stats.releases_ignored += 1;
            return;
        };
        entry.refcount = entry.refcount.saturating_sub(1);
        if entry.refcount == 0 && entry.strategy == LoadStrategy::Pooled {
            let block = entry.block;
            self.entries.shift_remove(&module);
            arena.free(block);
        }
    }

    /// Advance staged copies by one frame's budget.
    ///
    /// Staging modules are serviced FIFO in load order; a module whose
    /// copy completes is installed (relocations applied) in the same
    /// call. Returns the bytes copied. No-op under immediate mode.
    pub fn poll(&mut self, arena: &mut Arena) -> u32 {
        let budget = match self.config.copy_mode {
            CopyMode::Immediate => return 0,
            CopyMode::Staged { bytes_per_frame } => bytes_per_frame,
        };
        let mut remaining = budget;
        let mut copied_total = 0u32;
        let staging: Vec<ModuleId> = self
            .entries
            .iter()
            .filter(|(_, e)| matches!(e.residency, Residency::Staging { .. }))
            .map(|(&m, _)| m)
            .collect();
        for module in staging {
            if remaining == 0 {
                break;
            }
            let entry = self.entries.get(&module).expect("collected from entries");
            let block = entry.block;
            let Residency::Staging { copied } = entry.residency else {
                continue;
            };
            let n = Self::copy_chunk(&self.catalog, module, arena, block, copied, remaining);
            remaining -= n;
            copied_total += n;
            let source_len = self
                .catalog
                .get(module)
                .expect("descriptor resolved at load")
                .source_len();
            let copied = copied + n;
            let entry = self.entries.get_mut(&module).expect("collected from entries");
            if copied >= source_len {
                entry.residency = Residency::Resident;
                Self::install(&self.catalog, module, arena, block);
            } else {
                entry.residency = Residency::Staging { copied };
            }
        }
        self.stats.staged_bytes_copied += u64::from(copied_total);
        copied_total
    }

    /// Residency of a module, if tracked.
    pub fn residency(&self, module: ModuleId) -> Option<Residency> {
        self.entries.get(&module).map(|e| e.residency)
    }

    /// Whether a module is fully resident (copied and relocated).
    pub fn is_resident(&self, module: ModuleId) -> bool {
        self.residency(module) == Some(Residency::Resident)
    }

    /// Outstanding reference tokens for a module; zero if untracked.
    pub fn refcount(&self, module: ModuleId) -> u32 {
        self.entries.get(&module).map_or(0, |e| e.refcount)
    }

    /// Number of tracked modules (resident or staging).
    pub fn tracked(&self) -> usize {
        self.entries.len()
    }

    /// Current occupant of the shared slot, if any.
    pub fn shared_occupant(&self) -> Option<ModuleId> {
        self.shared_occupant
    }

    /// Arena block backing a tracked module.
    ///
    /// Diagnostic accessor — the block belongs to the loader; freeing or
    /// reallocating it corrupts the residency tracking.
    pub fn resident_block(&self, module: ModuleId) -> Option<BlockHandle> {
        self.entries.get(&module).map(|e| e.block)
    }

    /// Tracked modules in load order.
    pub fn resident_modules(&self) -> Vec<ResidentModule> {
        self.entries
            .iter()
            .map(|(&module, entry)| {
                let desc = self.catalog.get(module).expect("descriptor resolved at load");
                ResidentModule {
                    module,
                    name: desc.name.clone(),
                    strategy: entry.strategy,
                    refcount: entry.refcount,
                    residency: entry.residency,
                    loaded_size: desc.loaded_size,
                }
            })
            .collect()
    }

    /// Cumulative counters.
    pub fn stats(&self) -> LoaderStats {
        self.stats
    }

    /// Forget all residency tracking.
    ///
    /// Called at scene boundaries, paired with an arena reset by the
    /// owner — the loader does not free blocks here. Counters survive.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.shared_block = None;
        self.shared_occupant = None;
    }

    // ── Internal ───────────────────────────────────────────────────────

    fn acquire_shared_slot(
        &mut self,
        module: ModuleId,
        loaded_size: u32,
        arena: &mut Arena,
    ) -> Result<BlockHandle, LoadError> {
        let slot_bytes = self.config.shared_slot_bytes;
        if loaded_size > slot_bytes {
            let stats = arena.stats();
            return Err(LoadError::Arena(ArenaError::OutOfMemory {
                requested: loaded_size,
                available: slot_bytes,
                front: stats.front,
                back: stats.back,
            }));
        }
        let block = match self.shared_block {
            Some(block) => block,
            None => {
                let block = arena.allocate(slot_bytes, Direction::Backward)?;
                self.shared_block = Some(block);
                block
            }
        };
        // Evict the current occupant: its entry vanishes, the block is
        // reassigned without a free. (The occupant cannot be `module`
        // itself — a tracked module never reaches this path.)
        if let Some(previous) = self.shared_occupant.take() {
            self.entries.shift_remove(&previous);
            self.stats.evictions += 1;
        }
        self.shared_occupant = Some(module);
        // Scrub the reused slot so the new module's data section starts
        // cleared regardless of what the previous occupant left behind.
        arena
            .get_mut(block)
            .expect("shared slot lives until reset")
            .fill(0);
        Ok(block)
    }

    /// Copy up to `budget` source bytes starting at `from`. Returns the
    /// bytes copied.
    fn copy_chunk(
        catalog: &ModuleCatalog,
        module: ModuleId,
        arena: &mut Arena,
        block: BlockHandle,
        from: u32,
        budget: u32,
    ) -> u32 {
        let desc = catalog.get(module).expect("descriptor resolved at load");
        let n = budget.min(desc.source_len() - from);
        if n == 0 {
            return 0;
        }
        let src = (desc.source.start + from) as usize;
        let dst = arena.get_mut(block).expect("module block lives while tracked");
        dst[from as usize..(from + n) as usize]
            .copy_from_slice(&catalog.image()[src..src + n as usize]);
        n
    }

    /// Rewrite every recorded relocation cell from its image-relative
    /// value to the arena-absolute offset of the loaded copy.
    fn install(catalog: &ModuleCatalog, module: ModuleId, arena: &mut Arena, block: BlockHandle) {
        let desc = catalog.get(module).expect("descriptor resolved at load");
        let base = arena
            .offset_of(block)
            .expect("module block lives while tracked");
        let bytes = arena.get_mut(block).expect("module block lives while tracked");
        for &cell in &desc.relocations {
            let i = cell as usize;
            let recorded = u32::from_le_bytes(
                bytes[i..i + 4]
                    .try_into()
                    .expect("cell bounds validated by the catalog"),
            );
            bytes[i..i + 4].copy_from_slice(&(base + recorded).to_le_bytes());
        }
    }
}
