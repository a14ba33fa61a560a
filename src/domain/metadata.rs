//! Bookkeeping attached to every lesson: citations, media, cross references and tags.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::content::{ContentId, ContentType};

/// Kind of cited source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CitationType {
    Textbook,
    Article,
    Guideline,
    Website,
    Other,
}

/// A bibliographic reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub id: String,

    #[serde(rename = "type")]
    pub citation_type: CitationType,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub authors: Vec<String>,

    #[serde(default)]
    pub source: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
}

/// Kind of media asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MediaType {
    Image,
    Video,
    Diagram,
    Animation,
    Audio,
}

/// An illustration or recording referenced by a lesson
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAsset {
    pub id: String,

    #[serde(rename = "type")]
    pub media_type: MediaType,

    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

/// How a cross reference relates its source to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Relationship {
    /// The target is the parent topic of the source
    Parent,
    /// The target is a subtopic of the source
    Child,
    Sibling,
    Related,
    SeeAlso,
}

impl Relationship {
    /// Whether this link takes part in the parent/child hierarchy
    pub fn is_hierarchical(self) -> bool {
        matches!(self, Relationship::Parent | Relationship::Child)
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Relationship::Parent => "parent",
            Relationship::Child => "child",
            Relationship::Sibling => "sibling",
            Relationship::Related => "related",
            Relationship::SeeAlso => "see-also",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for Relationship {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "parent" => Ok(Relationship::Parent),
            "child" => Ok(Relationship::Child),
            "sibling" => Ok(Relationship::Sibling),
            "related" => Ok(Relationship::Related),
            "see-also" | "see_also" | "seealso" => Ok(Relationship::SeeAlso),
            _ => anyhow::bail!("Unknown relationship: {}", s),
        }
    }
}

/// A link from one lesson to another by id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossReference {
    pub target_id: ContentId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<ContentType>,

    pub relationship: Relationship,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl CrossReference {
    pub fn new(target_id: impl Into<ContentId>, relationship: Relationship) -> Self {
        Self {
            target_id: target_id.into(),
            target_type: None,
            relationship,
            label: None,
        }
    }
}

/// Clinical importance of a topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClinicalRelevance {
    Low,
    Medium,
    High,
    Critical,
}

/// Board exam coverage of a topic
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExamRelevance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usmle: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbme: Option<bool>,

    /// Shelf exams (e.g. `pediatrics`, `surgery`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shelf: Vec<String>,

    /// Any other exam key; validation flags these
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_yaml::Value>,
}

/// Free-form classification of a lesson
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentTags {
    /// Body systems, optionally with ICD-11 codes (`ICD-11:BA00`)
    #[serde(default)]
    pub systems: Vec<String>,

    #[serde(default)]
    pub topics: Vec<String>,

    #[serde(default)]
    pub keywords: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_relevance: Option<ClinicalRelevance>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_relevance: Option<ExamRelevance>,
}
