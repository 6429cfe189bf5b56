//! Module descriptors, load strategies, and the read-only [`ModuleCatalog`].
//!
//! A *module* is a relocatable unit of code or data that the loader copies
//! out of a single source image into the arena on demand. The catalog is
//! built once at runtime creation and validated up front; the loader never
//! re-checks ranges on the hot path.

use smallvec::SmallVec;
use std::error::Error;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::id::ModuleId;

/// How a module's backing allocation is managed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoadStrategy {
    /// Forward-allocated and reference counted: freed when the last
    /// referencing actor is deleted.
    Pooled,
    /// Backward-allocated and never freed until the arena is reset.
    Persistent,
    /// Loaded into the single shared backward slot. At most one such
    /// module is resident at a time; a competing load reassigns the slot
    /// without freeing it.
    SharedAbsolute,
}

/// Offsets of relocation cells within a module's source bytes.
///
/// Inline capacity of 8 covers typical modules (a handful of internal
/// references); larger tables spill to the heap transparently.
pub type RelocationTable = SmallVec<[u32; 8]>;

/// Immutable description of one loadable module.
///
/// `ModuleId(n)` is the n-th descriptor in the catalog. Relocation cells
/// are 4-byte little-endian words inside the source range; each holds an
/// image-relative offset that the loader rewrites to an arena-absolute
/// offset at install time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleDescriptor {
    /// Human-readable name for diagnostics.
    pub name: String,
    /// Byte range of this module within the catalog's source image.
    pub source: Range<u32>,
    /// Size of the module once loaded. Must be at least the source length;
    /// the excess tail is zero-filled (uninitialised data section).
    pub loaded_size: u32,
    /// Residency strategy.
    pub strategy: LoadStrategy,
    /// Offsets (relative to `source.start`) of relocation cells.
    pub relocations: RelocationTable,
}

impl ModuleDescriptor {
    /// Length of the source byte range.
    pub fn source_len(&self) -> u32 {
        self.source.end.saturating_sub(self.source.start)
    }
}

/// Errors detected while building a [`ModuleCatalog`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogError {
    /// More descriptors than `ModuleId` can index.
    TooManyModules {
        /// Number of descriptors supplied.
        count: usize,
    },
    /// A descriptor's source range is inverted (`start > end`).
    InvertedRange {
        /// The offending module.
        module: ModuleId,
        /// Range start.
        start: u32,
        /// Range end.
        end: u32,
    },
    /// A descriptor's source range extends past the image.
    SourceOutOfRange {
        /// The offending module.
        module: ModuleId,
        /// Range end.
        end: u32,
        /// Length of the source image.
        image_len: u32,
    },
    /// `loaded_size` is smaller than the source range.
    LoadedSizeTooSmall {
        /// The offending module.
        module: ModuleId,
        /// Declared loaded size.
        loaded_size: u32,
        /// Length of the source range.
        source_len: u32,
    },
    /// A relocation cell does not fit within the source range.
    RelocationOutOfRange {
        /// The offending module.
        module: ModuleId,
        /// Cell offset relative to the source start.
        offset: u32,
        /// Length of the source range.
        source_len: u32,
    },
    /// A relocation cell's recorded target lies outside the loaded image.
    RelocationTargetOutOfRange {
        /// The offending module.
        module: ModuleId,
        /// Cell offset relative to the source start.
        offset: u32,
        /// The recorded image-relative target.
        target: u32,
        /// Size of the loaded image.
        loaded_size: u32,
    },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyModules { count } => {
                write!(f, "{count} module descriptors exceed the id range")
            }
            Self::InvertedRange { module, start, end } => {
                write!(f, "module {module}: inverted source range {start}..{end}")
            }
            Self::SourceOutOfRange {
                module,
                end,
                image_len,
            } => {
                write!(
                    f,
                    "module {module}: source range ends at {end}, image is {image_len} bytes"
                )
            }
            Self::LoadedSizeTooSmall {
                module,
                loaded_size,
                source_len,
            } => {
                write!(
                    f,
                    "module {module}: loaded_size {loaded_size} is smaller than source length {source_len}"
                )
            }
            Self::RelocationOutOfRange {
                module,
                offset,
                source_len,
            } => {
                write!(
                    f,
                    "module {module}: relocation cell at {offset} does not fit in {source_len} source bytes"
                )
            }
            Self::RelocationTargetOutOfRange {
                module,
                offset,
                target,
                loaded_size,
            } => {
                write!(
                    f,
                    "module {module}: relocation cell at {offset} targets {target}, loaded image is {loaded_size} bytes"
                )
            }
        }
    }
}

impl Error for CatalogError {}

/// Read-only registry of loadable modules over one source image.
///
/// Construction validates every descriptor; the loader trusts the catalog
/// afterwards. The image is shared (`Arc`) so catalogs clone cheaply.
#[derive(Clone)]
pub struct ModuleCatalog {
    image: Arc<[u8]>,
    descriptors: Vec<ModuleDescriptor>,
}

impl ModuleCatalog {
    /// Build a catalog, validating every descriptor against the image.
    pub fn new(
        image: impl Into<Arc<[u8]>>,
        descriptors: Vec<ModuleDescriptor>,
    ) -> Result<Self, CatalogError> {
        let image = image.into();
        // 1. Descriptor count must fit in a ModuleId.
        if descriptors.len() > usize::from(u16::MAX) + 1 {
            return Err(CatalogError::TooManyModules {
                count: descriptors.len(),
            });
        }
        let image_len = u32::try_from(image.len()).unwrap_or(u32::MAX);
        for (i, desc) in descriptors.iter().enumerate() {
            let module = ModuleId(i as u16);
            // 2. Source range must be well-formed and inside the image.
            if desc.source.start > desc.source.end {
                return Err(CatalogError::InvertedRange {
                    module,
                    start: desc.source.start,
                    end: desc.source.end,
                });
            }
            if desc.source.end > image_len {
                return Err(CatalogError::SourceOutOfRange {
                    module,
                    end: desc.source.end,
                    image_len,
                });
            }
            // 3. Loaded size covers the source bytes.
            let source_len = desc.source_len();
            if desc.loaded_size < source_len {
                return Err(CatalogError::LoadedSizeTooSmall {
                    module,
                    loaded_size: desc.loaded_size,
                    source_len,
                });
            }
            // 4. Every relocation cell fits in the source range and its
            //    recorded target lies within the loaded image.
            for &offset in &desc.relocations {
                if offset.checked_add(4).is_none() || offset + 4 > source_len {
                    return Err(CatalogError::RelocationOutOfRange {
                        module,
                        offset,
                        source_len,
                    });
                }
                let abs = (desc.source.start + offset) as usize;
                let cell: [u8; 4] = image[abs..abs + 4]
                    .try_into()
                    .expect("cell bounds checked above");
                let target = u32::from_le_bytes(cell);
                if target > desc.loaded_size {
                    return Err(CatalogError::RelocationTargetOutOfRange {
                        module,
                        offset,
                        target,
                        loaded_size: desc.loaded_size,
                    });
                }
            }
        }
        Ok(Self { image, descriptors })
    }

    /// Look up a descriptor by id.
    pub fn get(&self, module: ModuleId) -> Option<&ModuleDescriptor> {
        self.descriptors.get(usize::from(module.0))
    }

    /// The shared source image.
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    /// Number of descriptors in the catalog.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns `true` if the catalog has no descriptors.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Iterate over `(id, descriptor)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (ModuleId, &ModuleDescriptor)> {
        self.descriptors
            .iter()
            .enumerate()
            .map(|(i, d)| (ModuleId(i as u16), d))
    }
}

impl fmt::Debug for ModuleCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleCatalog")
            .field("image_bytes", &self.image.len())
            .field("descriptors", &self.descriptors.len())
            .finish()
    }
}
