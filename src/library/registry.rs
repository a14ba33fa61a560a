//! Lookup tables over a loaded corpus.
//!
//! The registry is the Rust counterpart of the category barrels: it
//! aggregates every lesson by id, category, type, status and tag, and
//! orders listings by the manifests' priority tables.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::manifest::CategoryManifest;
use super::source::{LoadFailure, LoadedCorpus, LoadedFile, LoadedManifest};
use crate::domain::{
    ComplexityLevel, ContentId, ContentStatus, ContentType, EducationalContent, LevelContent,
};

/// A lesson together with where it came from
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub content: EducationalContent,

    /// Effective category (explicit `category` field, else directory)
    pub category: String,

    /// Defining file, relative to the content root
    pub source: String,

    /// Digest of the defining file
    pub digest: String,

    /// Priority from the category manifest
    pub priority: Option<u32>,
}

impl RegistryEntry {
    pub fn id(&self) -> &ContentId {
        &self.content.id
    }
}

/// An id defined more than once
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateId {
    pub id: ContentId,
    /// Every defining file, in load order
    pub sources: Vec<String>,
}

/// Overview of one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub item_count: usize,
    pub has_manifest: bool,
}

/// Counts across the registry
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegistryStats {
    pub items: usize,
    pub files: usize,
    pub categories: usize,
    pub levels: usize,
    pub key_terms: usize,
    pub citations: usize,
    pub cross_references: usize,
    pub by_type: BTreeMap<String, usize>,
    pub by_status: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
}

/// Aggregated, read-only view of the corpus
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
    index: HashMap<ContentId, usize>,
    duplicates: Vec<DuplicateId>,
    manifests: Vec<LoadedManifest>,
    files: Vec<LoadedFile>,
    failures: Vec<LoadFailure>,
}

impl Registry {
    /// Build lookup tables from a loaded corpus.
    ///
    /// The first definition of a duplicated id wins; the rest are
    /// recorded in [`Registry::duplicates`].
    pub fn from_corpus(corpus: LoadedCorpus) -> Self {
        let mut manifests_by_category: HashMap<&str, Vec<&CategoryManifest>> = HashMap::new();
        for loaded in &corpus.manifests {
            manifests_by_category
                .entry(loaded.category.as_str())
                .or_default()
                .push(&loaded.manifest);
        }

        let mut entries: Vec<RegistryEntry> = Vec::new();
        let mut seen: HashMap<ContentId, Vec<String>> = HashMap::new();
        let mut duplicate_order: Vec<ContentId> = Vec::new();

        for (file, item) in corpus.items() {
            let sources = seen.entry(item.id.clone()).or_default();
            sources.push(file.relative_path.clone());
            if sources.len() > 1 {
                if sources.len() == 2 {
                    duplicate_order.push(item.id.clone());
                }
                continue;
            }

            let category = item.category.clone().unwrap_or_else(|| file.category.clone());
            let priority = manifests_by_category
                .get(category.as_str())
                .and_then(|ms| ms.iter().find_map(|m| m.priority_of(&item.id)));

            entries.push(RegistryEntry {
                content: item.clone(),
                category,
                source: file.relative_path.clone(),
                digest: file.digest.clone(),
                priority,
            });
        }

        entries.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then(a.priority.unwrap_or(u32::MAX).cmp(&b.priority.unwrap_or(u32::MAX)))
                .then_with(|| a.content.display_name().cmp(b.content.display_name()))
                .then_with(|| a.content.id.cmp(&b.content.id))
        });

        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.content.id.clone(), i))
            .collect();

        let duplicates = duplicate_order
            .into_iter()
            .map(|id| DuplicateId {
                sources: seen.remove(&id).unwrap_or_default(),
                id,
            })
            .collect();

        Self {
            entries,
            index,
            duplicates,
            manifests: corpus.manifests,
            files: corpus.files,
            failures: corpus.failures,
        }
    }

    /// Get a lesson by id
    pub fn get(&self, id: &str) -> Option<&RegistryEntry> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    /// Check whether an id is defined
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Get one level of a lesson
    pub fn level(&self, id: &str, level: ComplexityLevel) -> Option<&LevelContent> {
        self.get(id).and_then(|e| e.content.level(level))
    }

    /// All entries in listing order (category, priority, name)
    pub fn all(&self) -> &[RegistryEntry] {
        &self.entries
    }

    /// Entries of one category in priority order
    pub fn by_category(&self, category: &str) -> Vec<&RegistryEntry> {
        self.entries.iter().filter(|e| e.category == category).collect()
    }

    pub fn by_type(&self, content_type: ContentType) -> Vec<&RegistryEntry> {
        self.entries
            .iter()
            .filter(|e| e.content.content_type == content_type)
            .collect()
    }

    pub fn by_status(&self, status: ContentStatus) -> Vec<&RegistryEntry> {
        self.entries
            .iter()
            .filter(|e| e.content.status == status)
            .collect()
    }

    /// Entries tagged with a body system (case-insensitive)
    pub fn by_system(&self, system: &str) -> Vec<&RegistryEntry> {
        self.entries
            .iter()
            .filter(|e| e.content.tags().systems.iter().any(|s| s.eq_ignore_ascii_case(system)))
            .collect()
    }

    /// Entries tagged with a topic (case-insensitive)
    pub fn by_topic(&self, topic: &str) -> Vec<&RegistryEntry> {
        self.entries
            .iter()
            .filter(|e| e.content.tags().topics.iter().any(|t| t.eq_ignore_ascii_case(topic)))
            .collect()
    }

    /// Resolve an id re-exported by a category barrel.
    ///
    /// Returns `None` when the id is unknown or lives in another category.
    pub fn resolve_export(&self, category: &str, id: &ContentId) -> Option<&RegistryEntry> {
        self.get(id.as_str()).filter(|e| e.category == category)
    }

    /// Category names, sorted
    pub fn category_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .iter()
            .map(|e| e.category.clone())
            .chain(self.manifests.iter().map(|m| m.category.clone()))
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Summaries of every category, sorted by name
    pub fn categories(&self) -> Vec<CategorySummary> {
        self.category_names()
            .into_iter()
            .map(|name| {
                let manifest = self
                    .manifests
                    .iter()
                    .find(|m| m.category == name)
                    .map(|m| &m.manifest);
                CategorySummary {
                    item_count: self.entries.iter().filter(|e| e.category == name).count(),
                    title: manifest.map(|m| m.title.clone()).filter(|t| !t.is_empty()),
                    description: manifest.and_then(|m| m.description.clone()),
                    has_manifest: manifest.is_some(),
                    name,
                }
            })
            .collect()
    }

    /// Ids defined more than once
    pub fn duplicates(&self) -> &[DuplicateId] {
        &self.duplicates
    }

    pub fn manifests(&self) -> &[LoadedManifest] {
        &self.manifests
    }

    /// Manifests describing one category
    pub fn manifests_for(&self, category: &str) -> Vec<&LoadedManifest> {
        self.manifests.iter().filter(|m| m.category == category).collect()
    }

    pub fn files(&self) -> &[LoadedFile] {
        &self.files
    }

    /// Files that failed to parse
    pub fn failures(&self) -> &[LoadFailure] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Counts by type, status and category
    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats {
            items: self.entries.len(),
            files: self.files.len(),
            categories: self.category_names().len(),
            ..Default::default()
        };

        for entry in &self.entries {
            let content = &entry.content;
            stats.levels += content.levels.len();
            stats.key_terms += content.key_term_count();
            stats.citations += content.citations().len();
            stats.cross_references += content.cross_references().len();
            *stats.by_type.entry(content.content_type.to_string()).or_default() += 1;
            *stats.by_status.entry(content.status.to_string()).or_default() += 1;
            *stats.by_category.entry(entry.category.clone()).or_default() += 1;
        }

        stats
    }
}
