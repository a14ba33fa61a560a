//! Corpus loading, lookup tables and the persisted catalog.
//!
//! # Content Layout
//!
//! ```text
//! content/
//! ├── addiction-medicine/
//! │   ├── index.yaml                # Category barrel: exports + priority
//! │   ├── alcohol-withdrawal.yaml   # One lesson (or a list of lessons)
//! │   └── opioids/
//! │       └── opioid-use-disorder.yaml
//! └── reproductive-health/
//!     └── ...
//! ```

pub mod catalog;
pub mod manifest;
pub mod registry;
pub mod search;
pub mod source;

pub use catalog::{Catalog, CatalogDiff, CatalogItem};
pub use manifest::{CategoryManifest, ManifestError};
pub use registry::{CategorySummary, DuplicateId, Registry, RegistryEntry, RegistryStats};
pub use search::{Language, MatchField, SearchHit, SearchOptions};
pub use source::{
    ContentSource, FsSource, LoadError, LoadFailure, LoadedCorpus, LoadedFile, LoadedManifest,
    MemorySource,
};
