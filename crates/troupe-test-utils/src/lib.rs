//! Test utilities and scripted behaviors for troupe development.
//!
//! Provides [`CatalogBuilder`] for assembling module images inline in
//! tests, plus a set of scripted [`Behavior`](troupe_core::Behavior)
//! implementations with observable call logs (see [`fixtures`]).

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod fixtures;

pub use fixtures::{
    CallLog, CountingBehavior, NullBehavior, SelfKillBehavior, SpawningBehavior,
    StateStampBehavior,
};

use troupe_core::{CatalogError, LoadStrategy, ModuleCatalog, ModuleDescriptor, RelocationTable};

/// Assembles a module image and its descriptors in one fluent pass.
///
/// Each `module()` call appends the body bytes to the image and records
/// a descriptor over that range; `ModuleId(n)` is the n-th call. The
/// builder makes no attempt to hide validation errors — `build()`
/// surfaces them so tests on malformed catalogs stay possible.
pub struct CatalogBuilder {
    image: Vec<u8>,
    descriptors: Vec<ModuleDescriptor>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self {
            image: Vec::new(),
            descriptors: Vec::new(),
        }
    }

    /// Append a module whose loaded image is exactly its body.
    pub fn module(self, name: &str, body: &[u8], strategy: LoadStrategy) -> Self {
        let loaded_size = body.len() as u32;
        self.module_sized(name, body, loaded_size, strategy)
    }

    /// Append a module with an explicit loaded size (zero-filled tail).
    pub fn module_sized(
        mut self,
        name: &str,
        body: &[u8],
        loaded_size: u32,
        strategy: LoadStrategy,
    ) -> Self {
        let start = self.image.len() as u32;
        self.image.extend_from_slice(body);
        self.descriptors.push(ModuleDescriptor {
            name: name.to_string(),
            source: start..start + body.len() as u32,
            loaded_size,
            strategy,
            relocations: RelocationTable::new(),
        });
        self
    }

    /// Attach relocation cell offsets to the most recently added module.
    ///
    /// # Panics
    ///
    /// Panics if no module has been added yet.
    pub fn relocations(mut self, cells: &[u32]) -> Self {
        let desc = self
            .descriptors
            .last_mut()
            .expect("relocations() requires a preceding module()");
        desc.relocations.extend_from_slice(cells);
        self
    }

    pub fn build(self) -> Result<ModuleCatalog, CatalogError> {
        ModuleCatalog::new(self.image, self.descriptors)
    }
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A module body of `len` bytes, every byte set to `fill`.
pub fn body(len: usize, fill: u8) -> Vec<u8> {
    vec![fill; len]
}
