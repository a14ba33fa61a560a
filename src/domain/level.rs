//! Complexity levels and per-level lesson content.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Depth tier of an explanation, from lay summary (1) to expert detail (5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ComplexityLevel(u8);

impl ComplexityLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Create a level, returning `None` outside 1..=5
    pub fn new(level: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&level).then_some(Self(level))
    }

    /// All levels in ascending order
    pub fn all() -> impl Iterator<Item = ComplexityLevel> {
        (Self::MIN..=Self::MAX).map(ComplexityLevel)
    }

    /// Get the numeric value
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for ComplexityLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| {
            format!(
                "complexity level must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            )
        })
    }
}

impl From<ComplexityLevel> for u8 {
    fn from(level: ComplexityLevel) -> Self {
        level.0
    }
}

impl fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ComplexityLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let n: u8 = s
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid level: {}", s))?;
        Self::try_from(n).map_err(|e| anyhow::anyhow!(e))
    }
}

/// A vocabulary entry attached to a level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyTerm {
    #[serde(default)]
    pub term: String,
    #[serde(default)]
    pub definition: String,
}

impl KeyTerm {
    pub fn new(term: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            definition: definition.into(),
        }
    }
}

/// Explanation of a topic at one complexity level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelContent {
    /// Must match the key this entry is stored under
    pub level: ComplexityLevel,

    /// One or two sentence overview
    #[serde(default)]
    pub summary: String,

    /// Long-form markdown explanation
    #[serde(default)]
    pub explanation: String,

    #[serde(default)]
    pub key_terms: Vec<KeyTerm>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub analogies: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patient_counseling_points: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_notes: Option<String>,
}

impl LevelContent {
    /// Create a level with a summary and explanation
    pub fn new(
        level: ComplexityLevel,
        summary: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            level,
            summary: summary.into(),
            explanation: explanation.into(),
            key_terms: Vec::new(),
            analogies: Vec::new(),
            examples: Vec::new(),
            patient_counseling_points: Vec::new(),
            clinical_notes: None,
        }
    }

    /// Add a key term
    pub fn with_key_term(mut self, term: impl Into<String>, definition: impl Into<String>) -> Self {
        self.key_terms.push(KeyTerm::new(term, definition));
        self
    }

    /// Set clinical notes
    pub fn with_clinical_notes(mut self, notes: impl Into<String>) -> Self {
        self.clinical_notes = Some(notes.into());
        self
    }
}
