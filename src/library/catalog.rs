//! Catalog for tracking every lesson in the corpus.
//!
//! Simple JSON-based index that can be searched, filtered and diffed
//! against a previous run to detect added, removed and edited lessons.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tokio::fs;

use super::registry::{Registry, RegistryEntry};
use crate::domain::{ContentId, ContentStatus, ContentType};

/// Current catalog format version
pub const CATALOG_VERSION: u32 = 1;

/// Catalog of all lessons
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    /// Catalog format version
    pub version: u32,

    /// When the catalog was built
    pub generated_at: DateTime<Utc>,

    /// All cataloged items
    pub items: Vec<CatalogItem>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self {
            version: CATALOG_VERSION,
            generated_at: Utc::now(),
            items: Vec::new(),
        }
    }

    /// Build a catalog from the registry, in listing order
    pub fn from_registry(registry: &Registry) -> Self {
        Self {
            items: registry.all().iter().map(CatalogItem::from_entry).collect(),
            ..Self::new()
        }
    }

    /// Get the default catalog file path ($LESSONKIT_HOME/catalog.json)
    pub fn catalog_path() -> Result<PathBuf> {
        crate::config::catalog_path()
    }

    /// Load a catalog, returning an empty one if the file does not exist
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read catalog: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse catalog JSON")
    }

    /// Save the catalog under an exclusive file lock
    pub async fn save(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize catalog")?;
        let path = path.to_path_buf();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(false)
                .open(&path)
                .with_context(|| format!("Failed to open catalog: {}", path.display()))?;

            file.lock_exclusive()
                .context("Failed to acquire file lock on catalog")?;

            file.set_len(0)?;
            file.write_all(json.as_bytes())
                .with_context(|| format!("Failed to write catalog: {}", path.display()))?;
            file.flush().context("Failed to flush catalog")?;

            // Lock is released when file is dropped
            Ok(())
        })
        .await
        .context("Catalog writer task panicked")?
    }

    /// Get an item by ID
    pub fn get(&self, id: &ContentId) -> Option<&CatalogItem> {
        self.items.iter().find(|i| &i.id == id)
    }

    /// Search items by query (case-insensitive substring match)
    pub fn search(&self, query: &str) -> Vec<&CatalogItem> {
        let query_lower = query.to_lowercase();

        self.items
            .iter()
            .filter(|item| {
                item.name.to_lowercase().contains(&query_lower)
                    || item.id.as_str().to_lowercase().contains(&query_lower)
                    || item.category.to_lowercase().contains(&query_lower)
            })
            .collect()
    }

    /// Filter items by category
    pub fn filter_by_category(&self, category: &str) -> Vec<&CatalogItem> {
        self.items
            .iter()
            .filter(|item| item.category == category)
            .collect()
    }

    /// Compare against an older catalog
    pub fn diff(&self, previous: &Catalog) -> CatalogDiff {
        let old: HashMap<&ContentId, &CatalogItem> =
            previous.items.iter().map(|i| (&i.id, i)).collect();
        let new: HashMap<&ContentId, &CatalogItem> =
            self.items.iter().map(|i| (&i.id, i)).collect();

        let mut diff = CatalogDiff::default();

        for item in &self.items {
            match old.get(&item.id) {
                None => diff.added.push(item.id.clone()),
                Some(prev) if prev.digest != item.digest || prev.version != item.version => {
                    diff.changed.push(item.id.clone())
                }
                Some(_) => {}
            }
        }

        for item in &previous.items {
            if !new.contains_key(&item.id) {
                diff.removed.push(item.id.clone());
            }
        }

        diff.added.sort();
        diff.changed.sort();
        diff.removed.sort();
        diff
    }

    /// Get the number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A single lesson in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ContentId,

    pub name: String,

    pub category: String,

    pub content_type: ContentType,

    pub status: ContentStatus,

    /// Defining file, relative to the content root
    pub source: String,

    /// SHA256 of the defining file
    pub digest: String,

    /// Number of levels present
    pub levels: usize,

    pub version: u32,

    pub updated_at: NaiveDate,
}

impl CatalogItem {
    /// Summarise a registry entry
    pub fn from_entry(entry: &RegistryEntry) -> Self {
        let content = &entry.content;
        Self {
            id: content.id.clone(),
            name: content.display_name().to_string(),
            category: entry.category.clone(),
            content_type: content.content_type,
            status: content.status,
            source: entry.source.clone(),
            digest: entry.digest.clone(),
            levels: content.levels.len(),
            version: content.version,
            updated_at: content.updated_at,
        }
    }
}

/// Differences between two catalogs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogDiff {
    pub added: Vec<ContentId>,
    pub removed: Vec<ContentId>,
    /// File digest or version differs
    pub changed: Vec<ContentId>,
}

impl CatalogDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}
