//! lessonkit - Multi-level educational content toolkit
//!
//! Loads a corpus of medical and health lessons, each explained at five
//! complexity levels (child, patient, nursing, medical student, physician),
//! and provides lookup, search, validation and cross-reference tooling.
//!
//! # Architecture
//!
//! Content is authored as YAML/JSON files and is immutable once loaded:
//! - A `ContentSource` discovers leaf files and category `index.yaml` manifests
//! - The `Registry` aggregates them into lookup tables
//! - `Validator`, `ContentGraph`, search and the `Catalog` consume the registry
//!
//! # Modules
//!
//! - `domain`: Data structures (EducationalContent, LevelContent, metadata)
//! - `library`: Loading, manifests, registry, search, catalog
//! - `validation`: Integrity rules and reports
//! - `graph`: Cross-reference graph
//! - `watch`: Re-validation on file changes
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Validate the corpus (exit code 1 on errors)
//! lessonkit validate --strict
//!
//! # Show the patient-level explanation of a lesson
//! lessonkit show alcohol-withdrawal --level 2
//!
//! # Search
//! lessonkit search "withdrawal"
//! ```

pub mod cli;
pub mod config;
pub mod domain;
pub mod graph;
pub mod library;
pub mod validation;
pub mod watch;

// Re-export main types at crate root for convenience
pub use domain::{
    ComplexityLevel, ContentId, ContentStatus, ContentType, EducationalContent, KeyTerm,
    LevelContent,
};
pub use graph::ContentGraph;
pub use library::{Catalog, ContentSource, FsSource, MemorySource, Registry, SearchOptions};
pub use validation::{ValidationReport, ValidationSettings, Validator};
pub use watch::{ContentWatcher, WatchConfig};
