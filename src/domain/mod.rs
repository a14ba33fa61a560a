//! Domain types for the lesson corpus.
//!
//! This module contains the core data structures:
//! - EducationalContent: one topic with its five levels
//! - LevelContent: the explanation at a single level
//! - Metadata: citations, media, cross references, tags
//! - Explanation levels: audience and readability targets

pub mod content;
pub mod explanation;
pub mod level;
pub mod metadata;

// Re-export commonly used types
pub use content::{ContentId, ContentStatus, ContentType, EducationalContent};
pub use explanation::{explanation_level, ExplanationLevel, Readability, EXPLANATION_LEVELS};
pub use level::{ComplexityLevel, KeyTerm, LevelContent};
pub use metadata::{
    Citation, CitationType, ClinicalRelevance, ContentTags, CrossReference, ExamRelevance,
    MediaAsset, MediaType, Relationship,
};
