//! The top-level lesson record.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::level::{ComplexityLevel, LevelContent};
use super::metadata::{Citation, ContentTags, CrossReference, MediaAsset};

/// Content identifier, unique across the corpus (e.g. `alcohol-withdrawal`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the id is empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ContentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ContentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::borrow::Borrow<str> for ContentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// What kind of topic a lesson describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Structure,
    System,
    Pathway,
    Process,
    Condition,
    Concept,
    Topic,
}

impl ContentType {
    pub const ALL: [ContentType; 7] = [
        ContentType::Structure,
        ContentType::System,
        ContentType::Pathway,
        ContentType::Process,
        ContentType::Condition,
        ContentType::Concept,
        ContentType::Topic,
    ];
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContentType::Structure => "structure",
            ContentType::System => "system",
            ContentType::Pathway => "pathway",
            ContentType::Process => "process",
            ContentType::Condition => "condition",
            ContentType::Concept => "concept",
            ContentType::Topic => "topic",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for ContentType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        ContentType::ALL
            .into_iter()
            .find(|t| t.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow::anyhow!("Unknown content type: {}", s))
    }
}

/// Editorial state of a lesson
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Draft,
    Review,
    Published,
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentStatus::Draft => write!(f, "draft"),
            ContentStatus::Review => write!(f, "review"),
            ContentStatus::Published => write!(f, "published"),
        }
    }
}

impl std::str::FromStr for ContentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(ContentStatus::Draft),
            "review" | "in-review" => Ok(ContentStatus::Review),
            "published" | "live" => Ok(ContentStatus::Published),
            _ => anyhow::bail!("Unknown content status: {}", s),
        }
    }
}

static EMPTY_TAGS: ContentTags = ContentTags {
    systems: Vec::new(),
    topics: Vec::new(),
    keywords: Vec::new(),
    clinical_relevance: None,
    exam_relevance: None,
};

/// One educational topic with explanations at every complexity level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationalContent {
    pub id: ContentId,

    #[serde(rename = "type")]
    pub content_type: ContentType,

    #[serde(default)]
    pub name: String,

    /// Spanish display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_es: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Overrides the category derived from the file location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default)]
    pub levels: BTreeMap<ComplexityLevel, LevelContent>,

    /// `None` when the file omits the key; an empty list is still present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<Vec<MediaAsset>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Citation>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_references: Option<Vec<CrossReference>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<ContentTags>,

    #[serde(with = "content_date")]
    pub created_at: NaiveDate,

    #[serde(with = "content_date")]
    pub updated_at: NaiveDate,

    pub version: u32,

    pub status: ContentStatus,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contributors: Vec<String>,
}

impl EducationalContent {
    /// Create a draft lesson with no levels, dated today
    pub fn new(id: impl Into<ContentId>, content_type: ContentType, name: impl Into<String>) -> Self {
        let today = Utc::now().date_naive();
        Self {
            id: id.into(),
            content_type,
            name: name.into(),
            name_es: None,
            description: None,
            category: None,
            levels: BTreeMap::new(),
            media: Some(Vec::new()),
            citations: Some(Vec::new()),
            cross_references: Some(Vec::new()),
            tags: Some(ContentTags::default()),
            created_at: today,
            updated_at: today,
            version: 1,
            status: ContentStatus::Draft,
            contributors: Vec::new(),
        }
    }

    /// Add a level, keyed by its own `level` field
    pub fn with_level(mut self, level: LevelContent) -> Self {
        self.levels.insert(level.level, level);
        self
    }

    /// Add a cross reference
    pub fn with_cross_reference(mut self, xref: CrossReference) -> Self {
        self.cross_references.get_or_insert_with(Vec::new).push(xref);
        self
    }

    /// Set the Spanish name
    pub fn with_name_es(mut self, name_es: impl Into<String>) -> Self {
        self.name_es = Some(name_es.into());
        self
    }

    /// Set the editorial status
    pub fn with_status(mut self, status: ContentStatus) -> Self {
        self.status = status;
        self
    }

    /// Get the explanation for one level
    pub fn level(&self, level: ComplexityLevel) -> Option<&LevelContent> {
        self.levels.get(&level)
    }

    /// Levels in 1..=5 that have no entry
    pub fn missing_levels(&self) -> Vec<ComplexityLevel> {
        ComplexityLevel::all()
            .filter(|l| !self.levels.contains_key(l))
            .collect()
    }

    /// Total number of key terms across all levels
    pub fn key_term_count(&self) -> usize {
        self.levels.values().map(|l| l.key_terms.len()).sum()
    }

    pub fn media(&self) -> &[MediaAsset] {
        self.media.as_deref().unwrap_or_default()
    }

    pub fn citations(&self) -> &[Citation] {
        self.citations.as_deref().unwrap_or_default()
    }

    pub fn cross_references(&self) -> &[CrossReference] {
        self.cross_references.as_deref().unwrap_or_default()
    }

    /// Tags, or an empty set when the file has none
    pub fn tags(&self) -> &ContentTags {
        self.tags.as_ref().unwrap_or(&EMPTY_TAGS)
    }

    /// Display name, falling back to the id
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            self.id.as_str()
        } else {
            &self.name
        }
    }
}

/// Dates are written as `YYYY-MM-DD`; RFC 3339 timestamps are accepted on read.
mod content_date {
    use chrono::{DateTime, NaiveDate};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(serde::de::Error::custom)
    }

    pub fn parse(s: &str) -> Result<NaiveDate, String> {
        let s = s.trim();
        NaiveDate::parse_from_str(s, FORMAT)
            .or_else(|_| DateTime::parse_from_rfc3339(s).map(|dt| dt.date_naive()))
            .map_err(|_| format!("invalid date '{}', expected YYYY-MM-DD", s))
    }
}
