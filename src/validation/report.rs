//! Aggregated validation results.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Serialize;

use super::issue::{IssueCategory, Severity, ValidationIssue};

/// Every issue found in one validation pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub files_checked: usize,
    pub items_checked: usize,

    /// Warnings also fail the report
    pub strict: bool,

    /// Sorted by file, line, then severity
    pub issues: Vec<ValidationIssue>,
}

/// Shape of `--json` output
#[derive(Debug, Serialize)]
struct ReportJson<'a> {
    valid: bool,
    strict: bool,
    files_checked: usize,
    items_checked: usize,
    error_count: usize,
    warning_count: usize,
    issues: &'a [ValidationIssue],
}

impl ValidationReport {
    pub fn new(
        mut issues: Vec<ValidationIssue>,
        files_checked: usize,
        items_checked: usize,
        strict: bool,
    ) -> Self {
        issues.sort_by(|a, b| {
            a.file
                .cmp(&b.file)
                .then(a.line.cmp(&b.line))
                .then(a.severity.cmp(&b.severity))
                .then(a.category.cmp(&b.category))
                .then_with(|| a.message.cmp(&b.message))
        });
        issues.dedup();

        Self {
            files_checked,
            items_checked,
            strict,
            issues,
        }
    }

    pub fn error_count(&self) -> usize {
        self.issues.iter().filter(|i| i.severity == Severity::Error).count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    /// No errors, and in strict mode no warnings either
    pub fn is_valid(&self) -> bool {
        self.error_count() == 0 && (!self.strict || self.warning_count() == 0)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| !i.is_error())
    }

    /// Issues of one category
    pub fn in_category(&self, category: IssueCategory) -> Vec<&ValidationIssue> {
        self.issues.iter().filter(|i| i.category == category).collect()
    }

    /// Issues grouped by file
    pub fn by_file(&self) -> BTreeMap<&str, Vec<&ValidationIssue>> {
        let mut grouped: BTreeMap<&str, Vec<&ValidationIssue>> = BTreeMap::new();
        for issue in &self.issues {
            grouped.entry(issue.file.as_str()).or_default().push(issue);
        }
        grouped
    }

    /// Issue counts per category
    pub fn by_category(&self) -> BTreeMap<IssueCategory, usize> {
        let mut counts = BTreeMap::new();
        for issue in &self.issues {
            *counts.entry(issue.category).or_default() += 1;
        }
        counts
    }

    /// Render the report with summary counts as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        let json = ReportJson {
            valid: self.is_valid(),
            strict: self.strict,
            files_checked: self.files_checked,
            items_checked: self.items_checked,
            error_count: self.error_count(),
            warning_count: self.warning_count(),
            issues: &self.issues,
        };
        serde_json::to_string_pretty(&json).context("Failed to serialize validation report")
    }
}
