//! Content sources: discovering and parsing leaf modules and manifests.
//!
//! Parse failures never abort a load. They are collected in
//! [`LoadedCorpus::failures`] so that validation can report every broken
//! file in one pass.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use glob::Pattern;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs;

use super::manifest::CategoryManifest;
use crate::domain::EducationalContent;

/// Category assigned to files directly under the content root
pub const UNCATEGORIZED: &str = "uncategorized";

/// Extensions recognised as content files
pub const CONTENT_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Errors that prevent a source from loading at all
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Content root does not exist: {0}")]
    RootNotFound(PathBuf),

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid ignore pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// A parsed leaf module
#[derive(Debug, Clone)]
pub struct LoadedFile {
    /// Path relative to the content root, `/`-separated
    pub relative_path: String,

    /// First path component under the root
    pub category: String,

    pub line_count: usize,

    /// SHA256 of the raw text (hex)
    pub digest: String,

    pub raw: String,

    pub items: Vec<EducationalContent>,
}

/// A parsed category manifest
#[derive(Debug, Clone)]
pub struct LoadedManifest {
    pub relative_path: String,

    /// Category this manifest describes: its top-level directory
    pub category: String,

    pub manifest: CategoryManifest,
}

/// A file that could not be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub relative_path: String,
    pub message: String,
    pub line: Option<usize>,
}

/// Everything a source produced
#[derive(Debug, Clone, Default)]
pub struct LoadedCorpus {
    pub root: Option<PathBuf>,
    pub files: Vec<LoadedFile>,
    pub manifests: Vec<LoadedManifest>,
    pub failures: Vec<LoadFailure>,
}

impl LoadedCorpus {
    /// Iterate over every content item with the file that defines it
    pub fn items(&self) -> impl Iterator<Item = (&LoadedFile, &EducationalContent)> {
        self.files
            .iter()
            .flat_map(|f| f.items.iter().map(move |item| (f, item)))
    }

    /// Number of content items across all files
    pub fn item_count(&self) -> usize {
        self.files.iter().map(|f| f.items.len()).sum()
    }
}

/// Trait for places content can be loaded from
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Human-readable source name
    fn name(&self) -> &str;

    /// Load and parse every leaf module and manifest
    async fn load(&self) -> Result<LoadedCorpus, LoadError>;
}

/// Compute the hex SHA256 of file contents
pub fn compute_digest(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

/// Category for a relative path: its first directory component
pub fn category_for(relative_path: &str) -> String {
    match relative_path.split_once('/') {
        Some((first, _)) if !first.is_empty() => first.to_string(),
        _ => UNCATEGORIZED.to_string(),
    }
}

/// Decode file bytes, locating the line of the first invalid sequence
pub fn decode_utf8(relative_path: &str, bytes: Vec<u8>) -> Result<String, LoadFailure> {
    String::from_utf8(bytes).map_err(|e| {
        let valid_up_to = e.utf8_error().valid_up_to();
        let bytes = e.as_bytes();
        let line = bytes[..valid_up_to].iter().filter(|&&b| b == b'\n').count() + 1;
        LoadFailure {
            relative_path: relative_path.to_string(),
            message: format!("invalid UTF-8 at byte {}", valid_up_to),
            line: Some(line),
        }
    })
}

/// Parse a leaf module holding one lesson or a list of lessons
pub fn parse_leaf(relative_path: &str, raw: &str) -> Result<Vec<EducationalContent>, LoadFailure> {
    let failure = |message: String, line: Option<usize>| LoadFailure {
        relative_path: relative_path.to_string(),
        message,
        line,
    };

    if relative_path.ends_with(".json") {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| failure(e.to_string(), Some(e.line())))?;
        let parsed = if value.is_array() {
            serde_json::from_str::<Vec<EducationalContent>>(raw)
        } else {
            serde_json::from_str::<EducationalContent>(raw).map(|c| vec![c])
        };
        parsed.map_err(|e| failure(e.to_string(), Some(e.line())))
    } else {
        let line_of = |e: &serde_yaml::Error| e.location().map(|l| l.line());
        let value: serde_yaml::Value =
            serde_yaml::from_str(raw).map_err(|e| failure(e.to_string(), line_of(&e)))?;
        let parsed = if value.is_sequence() {
            serde_yaml::from_str::<Vec<EducationalContent>>(raw)
        } else {
            serde_yaml::from_str::<EducationalContent>(raw).map(|c| vec![c])
        };
        parsed.map_err(|e| failure(e.to_string(), line_of(&e)))
    }
}

/// Loads content from a directory tree
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
    ignore: Vec<Pattern>,
}

impl FsSource {
    /// Default ignore patterns: `_`-prefixed files and `*.draft.*`
    pub fn default_ignore_patterns() -> Vec<String> {
        vec!["**/_*".to_string(), "**/*.draft.*".to_string()]
    }

    /// Create a source with the default ignore patterns
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let ignore = Self::default_ignore_patterns()
            .iter()
            .filter_map(|p| Pattern::new(p).ok())
            .collect();
        Self {
            root: root.into(),
            ignore,
        }
    }

    /// Replace the ignore patterns
    pub fn with_ignore_patterns(mut self, patterns: &[String]) -> Result<Self, LoadError> {
        self.ignore = patterns
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|source| LoadError::InvalidPattern {
                    pattern: p.clone(),
                    source,
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(self)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check a relative path against the ignore patterns
    pub fn is_ignored(&self, relative_path: &str) -> bool {
        self.ignore.iter().any(|p| p.matches(relative_path))
    }

    /// Whether a path looks like a content or manifest file
    pub fn is_content_path(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| CONTENT_EXTENSIONS.iter().any(|ext| ext.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }

    /// Collect content file paths under the root, sorted
    async fn discover(&self) -> Result<Vec<PathBuf>, LoadError> {
        let mut found = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await.map_err(|source| LoadError::Io {
                path: dir.clone(),
                source,
            })?;

            while let Some(entry) = entries.next_entry().await.map_err(|source| LoadError::Io {
                path: dir.clone(),
                source,
            })? {
                let path = entry.path();
                let file_type = entry.file_type().await.map_err(|source| LoadError::Io {
                    path: path.clone(),
                    source,
                })?;

                if file_type.is_dir() {
                    let hidden = path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .map(|n| n.starts_with('.'))
                        .unwrap_or(false);
                    if !hidden {
                        pending.push(path);
                    }
                } else if file_type.is_file() && Self::is_content_path(&path) {
                    found.push(path);
                }
            }
        }

        found.sort();
        Ok(found)
    }

    fn relative(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[async_trait]
impl ContentSource for FsSource {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn load(&self) -> Result<LoadedCorpus, LoadError> {
        if !self.root.exists() {
            return Err(LoadError::RootNotFound(self.root.clone()));
        }

        let mut corpus = LoadedCorpus {
            root: Some(self.root.clone()),
            ..Default::default()
        };

        for path in self.discover().await? {
            let relative_path = self.relative(&path);

            if self.is_ignored(&relative_path) {
                tracing::debug!("Skipping ignored file {}", relative_path);
                continue;
            }

            let bytes = fs::read(&path).await.map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?;
            let raw = match decode_utf8(&relative_path, bytes) {
                Ok(raw) => raw,
                Err(failure) => {
                    tracing::warn!("Failed to read {}: {}", relative_path, failure.message);
                    corpus.failures.push(failure);
                    continue;
                }
            };

            if CategoryManifest::is_manifest_file(&path) {
                match CategoryManifest::parse(&path, &raw) {
                    Ok(manifest) => {
                        let category = category_for(&relative_path);
                        tracing::debug!("Loaded manifest {} ({})", relative_path, category);
                        corpus.manifests.push(LoadedManifest {
                            relative_path,
                            category,
                            manifest,
                        });
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse manifest {}: {}", relative_path, e);
                        corpus.failures.push(LoadFailure {
                            line: e.line(),
                            relative_path,
                            message: e.to_string(),
                        });
                    }
                }
                continue;
            }

            match parse_leaf(&relative_path, &raw) {
                Ok(items) => {
                    tracing::debug!("Loaded {} item(s) from {}", items.len(), relative_path);
                    corpus.files.push(LoadedFile {
                        category: category_for(&relative_path),
                        line_count: raw.lines().count(),
                        digest: compute_digest(&raw),
                        relative_path,
                        raw,
                        items,
                    });
                }
                Err(failure) => {
                    tracing::warn!("Failed to parse {}: {}", relative_path, failure.message);
                    corpus.failures.push(failure);
                }
            }
        }

        tracing::info!(
            "Loaded {} item(s) from {} file(s), {} manifest(s), {} failure(s)",
            corpus.item_count(),
            corpus.files.len(),
            corpus.manifests.len(),
            corpus.failures.len()
        );

        Ok(corpus)
    }
}

/// In-memory source, for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    items: Vec<(String, EducationalContent)>,
    manifests: Vec<(String, CategoryManifest)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a lesson under a category
    pub fn with_item(mut self, category: impl Into<String>, item: EducationalContent) -> Self {
        self.items.push((category.into(), item));
        self
    }

    /// Add a manifest for a category
    pub fn with_manifest(mut self, category: impl Into<String>, manifest: CategoryManifest) -> Self {
        self.manifests.push((category.into(), manifest));
        self
    }
}

#[async_trait]
impl ContentSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load(&self) -> Result<LoadedCorpus, LoadError> {
        let mut corpus = LoadedCorpus::default();

        for (category, item) in &self.items {
            let relative_path = format!("{}/{}.yaml", category, item.id);
            // Serializing plain data to YAML does not fail
            let raw = serde_yaml::to_string(item).unwrap_or_default();
            corpus.files.push(LoadedFile {
                relative_path,
                category: category.clone(),
                line_count: raw.lines().count(),
                digest: compute_digest(&raw),
                raw,
                items: vec![item.clone()],
            });
        }

        for (category, manifest) in &self.manifests {
            corpus.manifests.push(LoadedManifest {
                relative_path: format!("{}/index.yaml", category),
                category: category.clone(),
                manifest: manifest.clone(),
            });
        }

        Ok(corpus)
    }
}
