//! Category index manifests (`index.yaml`).
//!
//! A manifest re-exports the lessons of one category and declares its
//! listing priority table:
//!
//! ```yaml
//! category: addiction-medicine
//! title: Addiction Medicine
//! exports: [alcohol-withdrawal, opioid-use-disorder]
//! priority:
//!   alcohol-withdrawal: 1
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ContentId;

/// File names recognised as category manifests
pub const MANIFEST_FILE_NAMES: [&str; 3] = ["index.yaml", "index.yml", "index.json"];

/// Errors that can occur while parsing a manifest
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported manifest format: {0}")]
    UnsupportedFormat(String),
}

impl ManifestError {
    /// 1-based line of the error, when the parser reports one
    pub fn line(&self) -> Option<usize> {
        match self {
            ManifestError::Yaml(e) => e.location().map(|l| l.line()),
            ManifestError::Json(e) => Some(e.line()),
            ManifestError::UnsupportedFormat(_) => None,
        }
    }
}

/// A category barrel: what it exports and in which order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryManifest {
    /// Declared category name. The top-level directory holding the manifest
    /// is authoritative; a differing value is reported by validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Content ids re-exported by this barrel
    #[serde(default)]
    pub exports: Vec<ContentId>,

    /// Listing order, lower first
    #[serde(default)]
    pub priority: BTreeMap<ContentId, u32>,

    #[serde(default)]
    pub subcategories: Vec<String>,
}

impl CategoryManifest {
    /// Parse a manifest, picking the format from the file extension
    pub fn parse(path: &Path, raw: &str) -> Result<Self, ManifestError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(raw)?),
            Some("json") => Ok(serde_json::from_str(raw)?),
            other => Err(ManifestError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    /// Whether a file name denotes a manifest
    pub fn is_manifest_file(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|n| MANIFEST_FILE_NAMES.contains(&n))
            .unwrap_or(false)
    }

    /// Whether `id` is re-exported by this barrel
    pub fn exports(&self, id: &ContentId) -> bool {
        self.exports.contains(id)
    }

    /// Listing priority for `id`, if declared
    pub fn priority_of(&self, id: &ContentId) -> Option<u32> {
        self.priority.get(id).copied()
    }
}
