//! Individual validation findings.

use std::fmt;

use serde::Serialize;

use crate::domain::ContentId;

/// How serious an issue is. Errors sort before warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Which family of rules produced an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueCategory {
    /// File does not parse into the content shape
    Schema,
    /// Required fields and levels
    Interface,
    /// Placeholder text, translations, code formats
    Quality,
    /// Size and character set of the file itself
    FileStructure,
    CrossReference,
    Metadata,
    /// Barrel exports and priority tables
    Manifest,
    Readability,
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IssueCategory::Schema => "schema",
            IssueCategory::Interface => "interface",
            IssueCategory::Quality => "quality",
            IssueCategory::FileStructure => "file-structure",
            IssueCategory::CrossReference => "cross-reference",
            IssueCategory::Metadata => "metadata",
            IssueCategory::Manifest => "manifest",
            IssueCategory::Readability => "readability",
        };
        f.write_str(s)
    }
}

/// A single finding, located by file and optionally line and item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// File relative to the content root
    pub file: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,

    /// Content item the issue belongs to, when file-level is too coarse
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<ContentId>,

    pub severity: Severity,

    pub category: IssueCategory,

    pub message: String,
}

impl ValidationIssue {
    pub fn new(
        severity: Severity,
        category: IssueCategory,
        file: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            line: None,
            item: None,
            severity,
            category,
            message: message.into(),
        }
    }

    pub fn error(category: IssueCategory, file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, category, file, message)
    }

    pub fn warning(category: IssueCategory, file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, category, file, message)
    }

    /// Attach a 1-based line number
    pub fn at_line(mut self, line: Option<usize>) -> Self {
        self.line = line;
        self
    }

    /// Attach the offending item
    pub fn for_item(mut self, id: &ContentId) -> Self {
        self.item = Some(id.clone());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file)?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
        }
        write!(f, ": {}[{}]", self.severity, self.category)?;
        if let Some(ref item) = self.item {
            write!(f, " ({})", item)?;
        }
        write!(f, " {}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_display() {
        let issue = ValidationIssue::error(IssueCategory::FileStructure, "cardio/hf.yaml", "Box drawing")
            .at_line(Some(12))
            .for_item(&ContentId::from("heart-failure"));
        assert_eq!(
            issue.to_string(),
            "cardio/hf.yaml:12: error[file-structure] (heart-failure) Box drawing"
        );

        let warning = ValidationIssue::warning(IssueCategory::Quality, "a.yaml", "Missing nameEs");
        assert_eq!(warning.to_string(), "a.yaml: warning[quality] Missing nameEs");
        assert!(!warning.is_error());
    }

    #[test]
    fn test_errors_sort_first() {
        assert!(Severity::Error < Severity::Warning);
    }
}
