//! Case-insensitive search over the registry.
//!
//! Every lesson is scored by the strongest field it matches; results are
//! ordered by score, then name. The query language decides which name
//! counts as primary.

use serde::Serialize;

use crate::domain::EducationalContent;

use super::registry::{Registry, RegistryEntry};

/// Which field produced a hit, strongest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchField {
    ExactName,
    Name,
    /// The name in the other language
    OtherName,
    Id,
    Keyword,
    KeyTerm,
    Summary,
}

impl MatchField {
    pub fn score(self) -> u32 {
        match self {
            MatchField::ExactName => 100,
            MatchField::Name => 80,
            MatchField::OtherName => 60,
            MatchField::Id => 50,
            MatchField::Keyword => 40,
            MatchField::KeyTerm => 25,
            MatchField::Summary => 10,
        }
    }
}

/// Language of a search query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
}

impl Language {
    /// The lesson name in this language, if it has one
    pub fn name_of(self, content: &EducationalContent) -> Option<&str> {
        match self {
            Language::En => Some(content.name.as_str()),
            Language::Es => content.name_es.as_deref(),
        }
    }

    fn other(self) -> Language {
        match self {
            Language::En => Language::Es,
            Language::Es => Language::En,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::En => write!(f, "en"),
            Language::Es => write!(f, "es"),
        }
    }
}

impl std::str::FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "es" | "spanish" | "espanol" | "español" => Ok(Language::Es),
            _ => anyhow::bail!("Unknown language: {} (expected en or es)", s),
        }
    }
}

/// Search filters
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub limit: Option<usize>,
    pub category: Option<String>,
    /// Also look inside level summaries
    pub include_summaries: bool,
    /// Which name is matched as primary
    pub language: Language,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: Some(20),
            category: None,
            include_summaries: true,
            language: Language::En,
        }
    }
}

/// A single search result
#[derive(Debug, Clone)]
pub struct SearchHit<'a> {
    pub entry: &'a RegistryEntry,
    pub field: MatchField,
    pub score: u32,
}

/// Find the strongest field of `entry` matching the lowercased query
fn best_match(entry: &RegistryEntry, query: &str, options: &SearchOptions) -> Option<MatchField> {
    let content = &entry.content;
    let contains = |text: &str| text.to_lowercase().contains(query);
    let primary = options.language.name_of(content);
    let secondary = options.language.other().name_of(content);

    if primary.map(|n| n.to_lowercase() == query).unwrap_or(false) {
        return Some(MatchField::ExactName);
    }
    if primary.map(contains).unwrap_or(false) {
        return Some(MatchField::Name);
    }
    if secondary.map(contains).unwrap_or(false) {
        return Some(MatchField::OtherName);
    }
    if contains(content.id.as_str()) {
        return Some(MatchField::Id);
    }
    let tags = content.tags();
    if tags.keywords.iter().chain(&tags.topics).chain(&tags.systems).any(|k| contains(k.as_str())) {
        return Some(MatchField::Keyword);
    }
    if content
        .levels
        .values()
        .flat_map(|l| &l.key_terms)
        .any(|t| contains(t.term.as_str()))
    {
        return Some(MatchField::KeyTerm);
    }
    if options.include_summaries && content.levels.values().any(|l| contains(l.summary.as_str())) {
        return Some(MatchField::Summary);
    }
    None
}

impl Registry {
    /// Search lessons by name, name in the other language, id, tags, key terms and summaries
    pub fn search(&self, query: &str, options: &SearchOptions) -> Vec<SearchHit<'_>> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<SearchHit<'_>> = self
            .all()
            .iter()
            .filter(|e| {
                options
                    .category
                    .as_deref()
                    .map(|c| e.category == c)
                    .unwrap_or(true)
            })
            .filter_map(|entry| {
                best_match(entry, &query, options).map(|field| SearchHit {
                    entry,
                    field,
                    score: field.score(),
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.entry.content.display_name().cmp(b.entry.content.display_name()))
        });

        if let Some(limit) = options.limit {
            hits.truncate(limit);
        }

        hits
    }
}
