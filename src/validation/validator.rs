//! Runs every rule over a registry and collects a report.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::issue::{IssueCategory, ValidationIssue};
use super::report::ValidationReport;
use super::rules;
use crate::graph::ContentGraph;
use crate::library::source::UNCATEGORIZED;
use crate::library::{ContentSource, LoadError, Registry};

/// Tunables for a validation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    /// Longer files get a warning
    pub max_file_lines: usize,

    /// Allowed distance in grades outside a level's target range
    pub readability_tolerance: f64,

    /// Treat warnings as failures
    pub strict: bool,

    /// Run the readability rules
    pub check_readability: bool,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            max_file_lines: 600,
            readability_tolerance: 4.0,
            strict: false,
            check_readability: false,
        }
    }
}

/// Content validator
#[derive(Debug, Clone, Default)]
pub struct Validator {
    settings: ValidationSettings,
}

impl Validator {
    pub fn new(settings: ValidationSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ValidationSettings {
        &self.settings
    }

    /// Load a source and validate it
    pub async fn validate_source(
        &self,
        source: &dyn ContentSource,
    ) -> Result<ValidationReport, LoadError> {
        let corpus = source.load().await?;
        let registry = Registry::from_corpus(corpus);
        Ok(self.validate(&registry))
    }

    /// Validate every file, item, manifest and cross reference
    pub fn validate(&self, registry: &Registry) -> ValidationReport {
        let mut issues = Vec::new();

        for failure in registry.failures() {
            issues.push(
                ValidationIssue::error(
                    IssueCategory::Schema,
                    &failure.relative_path,
                    format!("Failed to parse: {}", failure.message),
                )
                .at_line(failure.line),
            );
        }

        let mut items_checked = 0;
        for file in registry.files() {
            rules::check_file_structure(file, self.settings.max_file_lines, &mut issues);

            for item in &file.items {
                items_checked += 1;
                let path = file.relative_path.as_str();
                rules::check_interface(item, path, &mut issues);
                rules::check_quality(item, path, &mut issues);
                rules::check_metadata(item, path, &mut issues);
                if self.settings.check_readability {
                    rules::check_readability(
                        item,
                        path,
                        self.settings.readability_tolerance,
                        &mut issues,
                    );
                }
            }
        }

        self.check_duplicates(registry, &mut issues);
        self.check_manifests(registry, &mut issues);
        self.check_cross_references(registry, &mut issues);

        let report = ValidationReport::new(
            issues,
            registry.files().len() + registry.manifests().len() + registry.failures().len(),
            items_checked,
            self.settings.strict,
        );

        tracing::info!(
            "Validated {} item(s): {} error(s), {} warning(s)",
            report.items_checked,
            report.error_count(),
            report.warning_count()
        );

        report
    }

    fn check_duplicates(&self, registry: &Registry, issues: &mut Vec<ValidationIssue>) {
        for duplicate in registry.duplicates() {
            if duplicate.id.is_blank() {
                continue;
            }
            let Some((first, rest)) = duplicate.sources.split_first() else {
                continue;
            };
            for source in rest {
                issues.push(
                    ValidationIssue::error(
                        IssueCategory::Interface,
                        source,
                        format!("Duplicate id '{}', first defined in {}", duplicate.id, first),
                    )
                    .for_item(&duplicate.id),
                );
            }
        }
    }

    fn check_manifests(&self, registry: &Registry, issues: &mut Vec<ValidationIssue>) {
        for loaded in registry.manifests() {
            let manifest = &loaded.manifest;
            let path = loaded.relative_path.as_str();

            if let Some(declared) = manifest.category.as_deref() {
                if declared != loaded.category {
                    issues.push(ValidationIssue::warning(
                        IssueCategory::Manifest,
                        path,
                        format!(
                            "Manifest category '{}' does not match its directory '{}'",
                            declared, loaded.category
                        ),
                    ));
                }
            }

            for export in &manifest.exports {
                match registry.get(export.as_str()) {
                    None => issues.push(ValidationIssue::error(
                        IssueCategory::Manifest,
                        path,
                        format!("Export '{}' does not resolve to any content", export),
                    )),
                    Some(entry) if entry.category != loaded.category => issues.push(
                        ValidationIssue::warning(
                            IssueCategory::Manifest,
                            path,
                            format!(
                                "Export '{}' is defined in category '{}', not '{}'",
                                export, entry.category, loaded.category
                            ),
                        )
                        .for_item(export),
                    ),
                    Some(_) => {}
                }
            }

            for id in manifest.priority.keys() {
                if !manifest.exports(id) {
                    issues.push(ValidationIssue::warning(
                        IssueCategory::Manifest,
                        path,
                        format!("Priority entry '{}' is not exported", id),
                    ));
                }
            }
        }

        let with_manifest: BTreeSet<String> = registry
            .manifests()
            .iter()
            .map(|m| m.category.clone())
            .collect();

        let mut reported = BTreeSet::new();
        for file in registry.files() {
            if file.category == UNCATEGORIZED || with_manifest.contains(&file.category) {
                continue;
            }
            if reported.insert(file.category.clone()) {
                issues.push(ValidationIssue::warning(
                    IssueCategory::Manifest,
                    format!("{}/", file.category),
                    format!("Category '{}' has content but no index manifest", file.category),
                ));
            }
        }
    }

    fn check_cross_references(&self, registry: &Registry, issues: &mut Vec<ValidationIssue>) {
        // Every definition, including duplicates that lost to an earlier file
        for file in registry.files() {
            for item in &file.items {
                let shadowed = registry
                    .get(item.id.as_str())
                    .map(|e| e.source != file.relative_path)
                    .unwrap_or(false);

                for xref in item.cross_references() {
                    if xref.target_id.is_blank() {
                        issues.push(
                            ValidationIssue::error(
                                IssueCategory::CrossReference,
                                &file.relative_path,
                                "Cross reference with empty targetId",
                            )
                            .for_item(&item.id),
                        );
                    } else if xref.target_id == item.id {
                        issues.push(
                            ValidationIssue::warning(
                                IssueCategory::CrossReference,
                                &file.relative_path,
                                format!("Cross reference ({}) points at itself", xref.relationship),
                            )
                            .for_item(&item.id),
                        );
                    } else if shadowed && !registry.contains(xref.target_id.as_str()) {
                        // The graph only holds winning definitions
                        issues.push(
                            ValidationIssue::warning(
                                IssueCategory::CrossReference,
                                &file.relative_path,
                                format!(
                                    "Cross reference ({}) to unknown id '{}'",
                                    xref.relationship, xref.target_id
                                ),
                            )
                            .for_item(&item.id),
                        );
                    }
                }
            }
        }

        let graph = ContentGraph::build(registry);

        for dangling in graph.dangling() {
            let file = registry
                .get(dangling.source.as_str())
                .map(|e| e.source.clone())
                .unwrap_or_default();
            issues.push(
                ValidationIssue::warning(
                    IssueCategory::CrossReference,
                    file,
                    format!(
                        "Cross reference ({}) to unknown id '{}'",
                        dangling.relationship, dangling.target
                    ),
                )
                .for_item(&dangling.source),
            );
        }

        for cycle in graph.hierarchy_cycles() {
            let members: Vec<&str> = cycle.iter().map(|id| id.as_str()).collect();
            let file = registry
                .get(members[0])
                .map(|e| e.source.clone())
                .unwrap_or_default();
            issues.push(
                ValidationIssue::error(
                    IssueCategory::CrossReference,
                    file,
                    format!("Parent/child hierarchy cycle: {}", members.join(" -> ")),
                )
                .for_item(&cycle[0]),
            );
        }
    }
}
