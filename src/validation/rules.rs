//! Per-item and per-file validation rules.
//!
//! Each rule appends to an issue list and never fails. Corpus-wide rules
//! (duplicates, manifests, cross references) live in the validator.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::issue::{IssueCategory, ValidationIssue};
use crate::domain::{explanation_level, EducationalContent, Readability};
use crate::library::LoadedFile;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(TODO|FIXME|placeholder)\b").unwrap());

static ICD11_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]\d{1,2}\.?\d{0,3}$").unwrap());

static KEBAB_FILE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*\.(yaml|yml|json)$").unwrap());

static BOX_DRAWING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\u{2500}-\u{257F}]").unwrap());

/// True if the text contains TODO, FIXME or placeholder as a word
pub fn contains_placeholder(text: &str) -> bool {
    PLACEHOLDER.is_match(text)
}

/// True if the code looks like an ICD-11 stem code (e.g. `A12.345`)
pub fn is_valid_icd11_code(code: &str) -> bool {
    ICD11_CODE.is_match(code)
}

/// First 1-based line matching a pattern
fn find_line(raw: &str, pattern: &Regex) -> Option<usize> {
    raw.lines().position(|l| pattern.is_match(l)).map(|i| i + 1)
}

/// Required fields, all five levels and their key terms
pub fn check_interface(item: &EducationalContent, file: &str, issues: &mut Vec<ValidationIssue>) {
    let error = |message: String| {
        ValidationIssue::error(IssueCategory::Interface, file, message).for_item(&item.id)
    };

    if item.id.is_blank() {
        issues.push(ValidationIssue::error(
            IssueCategory::Interface,
            file,
            format!("Content '{}' has an empty id", item.display_name()),
        ));
    }

    if item.name.trim().is_empty() {
        issues.push(error("Missing or empty name".to_string()));
    }

    for level in item.missing_levels() {
        issues.push(error(format!("Missing complexity level {}", level)));
    }

    for (key, content) in &item.levels {
        if *key != content.level {
            issues.push(error(format!(
                "Level key {} does not match its level field ({})",
                key, content.level
            )));
        }

        if content.summary.trim().is_empty() {
            issues.push(error(format!("Level {}: Missing or empty summary", key)));
        }
        if content.explanation.trim().is_empty() {
            issues.push(error(format!("Level {}: Missing or empty explanation", key)));
        }

        if content.key_terms.is_empty() {
            issues.push(
                ValidationIssue::warning(
                    IssueCategory::Interface,
                    file,
                    format!("Level {}: No key terms", key),
                )
                .for_item(&item.id),
            );
        }

        for (i, term) in content.key_terms.iter().enumerate() {
            if term.term.trim().is_empty() {
                issues.push(error(format!("Level {}: Key term {} has empty term", key, i + 1)));
            }
            if term.definition.trim().is_empty() {
                issues.push(error(format!(
                    "Level {}: Key term {} (\"{}\") has empty definition",
                    key,
                    i + 1,
                    term.term
                )));
            }
        }
    }

    let sections = [
        ("media array", item.media.is_none()),
        ("citations array", item.citations.is_none()),
        ("crossReferences array", item.cross_references.is_none()),
        ("tags object", item.tags.is_none()),
    ];
    for (section, missing) in sections {
        if missing {
            issues.push(
                ValidationIssue::warning(IssueCategory::Interface, file, format!("Missing {}", section))
                    .for_item(&item.id),
            );
        }
    }
}

/// Placeholder text, Spanish name and ICD-11 code format
pub fn check_quality(item: &EducationalContent, file: &str, issues: &mut Vec<ValidationIssue>) {
    let error = |message: String| {
        ValidationIssue::error(IssueCategory::Quality, file, message).for_item(&item.id)
    };
    let warning = |message: String| {
        ValidationIssue::warning(IssueCategory::Quality, file, message).for_item(&item.id)
    };

    if contains_placeholder(&item.name) {
        issues.push(error(format!("Name contains placeholder text: {}", item.name)));
    }

    match item.name_es.as_deref().map(str::trim) {
        None | Some("") => issues.push(warning("Missing Spanish translation (nameEs)".to_string())),
        Some(name_es) if contains_placeholder(name_es) => {
            issues.push(error(format!("Spanish name contains placeholder text: {}", name_es)))
        }
        Some(_) => {}
    }

    for (key, content) in &item.levels {
        let fields = [
            ("summary", Some(content.summary.as_str())),
            ("explanation", Some(content.explanation.as_str())),
            ("clinicalNotes", content.clinical_notes.as_deref()),
        ];
        for (field, value) in fields {
            if value.map(contains_placeholder).unwrap_or(false) {
                issues.push(error(format!("Level {}: {} contains placeholder text", key, field)));
            }
        }

        for (i, term) in content.key_terms.iter().enumerate() {
            if contains_placeholder(&term.term) || contains_placeholder(&term.definition) {
                issues.push(error(format!(
                    "Level {}: Key term {} (\"{}\") contains placeholder text",
                    key,
                    i + 1,
                    term.term
                )));
            }
        }
    }

    for system in &item.tags().systems {
        let looks_like_code = system.starts_with("ICD-11")
            || system.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false);
        if !looks_like_code {
            continue;
        }
        let code = system.replacen("ICD-11:", "", 1);
        let code = code.trim();
        if !is_valid_icd11_code(code) {
            issues.push(warning(format!("Potentially invalid ICD-11 code format: {}", code)));
        }
    }
}

/// Version, dates, topics, exam relevance and citations
pub fn check_metadata(item: &EducationalContent, file: &str, issues: &mut Vec<ValidationIssue>) {
    let error = |message: String| {
        ValidationIssue::error(IssueCategory::Metadata, file, message).for_item(&item.id)
    };
    let warning = |message: String| {
        ValidationIssue::warning(IssueCategory::Metadata, file, message).for_item(&item.id)
    };

    if item.version < 1 {
        issues.push(error(format!("Version must be at least 1, got {}", item.version)));
    }

    if item.updated_at < item.created_at {
        issues.push(warning(format!(
            "updatedAt ({}) is earlier than createdAt ({})",
            item.updated_at, item.created_at
        )));
    }

    for (i, topic) in item.tags().topics.iter().enumerate() {
        if topic.trim().is_empty() {
            issues.push(error(format!("Topic {} in tags is empty", i + 1)));
        }
    }

    if let Some(ref exam) = item.tags().exam_relevance {
        if exam.shelf.iter().any(|s| s.trim().is_empty()) {
            issues.push(error("Empty shelf exam entry in examRelevance".to_string()));
        }
        for key in exam.other.keys() {
            issues.push(warning(format!("Unknown exam type in examRelevance: {}", key)));
        }
    }

    let mut citation_ids = HashSet::new();
    for (i, citation) in item.citations().iter().enumerate() {
        if citation.title.trim().is_empty() {
            issues.push(error(format!("Citation {} has no title", i + 1)));
        }
        if !citation.id.is_empty() && !citation_ids.insert(citation.id.as_str()) {
            issues.push(warning(format!("Duplicate citation id: {}", citation.id)));
        }
    }
}

/// Flag summaries whose estimated grade is far outside the level's target
pub fn check_readability(
    item: &EducationalContent,
    file: &str,
    tolerance: f64,
    issues: &mut Vec<ValidationIssue>,
) {
    for (key, content) in &item.levels {
        let Some(stats) = Readability::estimate(&content.summary) else {
            continue;
        };
        let target = explanation_level(*key);
        let (low, high) = target.grade_range;

        if stats.grade < low - tolerance || stats.grade > high + tolerance {
            issues.push(
                ValidationIssue::warning(
                    IssueCategory::Readability,
                    file,
                    format!(
                        "Level {}: summary reads at grade {:.1}, target for {} is {}-{}",
                        key, stats.grade, target.name, low, high
                    ),
                )
                .for_item(&item.id),
            );
        }
    }
}

/// File length and box-drawing characters
pub fn check_file_structure(file: &LoadedFile, max_lines: usize, issues: &mut Vec<ValidationIssue>) {
    if file.line_count > max_lines {
        issues.push(ValidationIssue::warning(
            IssueCategory::FileStructure,
            &file.relative_path,
            format!(
                "File exceeds {} lines ({} lines). Consider splitting into multiple files.",
                max_lines, file.line_count
            ),
        ));
    }

    let file_name = file.relative_path.rsplit('/').next().unwrap_or_default();
    if !KEBAB_FILE_NAME.is_match(file_name) {
        issues.push(ValidationIssue::warning(
            IssueCategory::FileStructure,
            &file.relative_path,
            format!("File name '{}' should use kebab-case", file_name),
        ));
    }

    if let Some(line) = find_line(&file.raw, &BOX_DRAWING) {
        issues.push(
            ValidationIssue::error(
                IssueCategory::FileStructure,
                &file.relative_path,
                "Contains Unicode box-drawing characters. Use ASCII equivalents.",
            )
            .at_line(Some(line)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ComplexityLevel, ContentTags, ContentType, ExamRelevance, LevelContent};
    use crate::library::source::compute_digest;
    use chrono::NaiveDate;

    fn complete(id: &str) -> EducationalContent {
        let mut item = EducationalContent::new(id, ContentType::Concept, "Hydration").with_name_es("Hidratación");
        for level in ComplexityLevel::all() {
            item = item.with_level(
                LevelContent::new(level, "Water matters.", "Drink water every day.")
                    .with_key_term("Water", "A clear liquid."),
            );
        }
        item
    }

    fn loaded(raw: &str) -> LoadedFile {
        LoadedFile {
            relative_path: "general/hydration.yaml".to_string(),
            category: "general".to_string(),
            line_count: raw.lines().count(),
            digest: compute_digest(raw),
            raw: raw.to_string(),
            items: Vec::new(),
        }
    }

    #[test]
    fn test_placeholder_detection() {
        assert!(contains_placeholder("TODO: write this"));
        assert!(contains_placeholder("a Placeholder value"));
        assert!(!contains_placeholder("Todos los pacientes"));
        assert!(!contains_placeholder("placeholders"));
    }

    #[test]
    fn test_icd11_code_format() {
        assert!(is_valid_icd11_code("A12"));
        assert!(is_valid_icd11_code("C40.3"));
        assert!(!is_valid_icd11_code("6C40.3"));
        assert!(!is_valid_icd11_code("cardio"));
    }

    #[test]
    fn test_complete_item_is_clean() {
        let item = complete("hydration");
        let mut issues = Vec::new();
        check_interface(&item, "f.yaml", &mut issues);
        check_quality(&item, "f.yaml", &mut issues);
        check_metadata(&item, "f.yaml", &mut issues);
        assert!(issues.is_empty(), "{:?}", issues);
    }

    #[test]
    fn test_missing_levels_and_empty_terms() {
        let mut item = complete("hydration");
        item.levels.remove(&ComplexityLevel::new(4).unwrap());
        if let Some(level) = item.levels.get_mut(&ComplexityLevel::new(2).unwrap()) {
            level.key_terms[0].definition = " ".to_string();
            level.summary.clear();
        }

        let mut issues = Vec::new();
        check_interface(&item, "f.yaml", &mut issues);

        let messages: Vec<&str> = issues.iter().map(|i| i.message.as_str()).collect();
        assert!(messages.contains(&"Missing complexity level 4"));
        assert!(messages.contains(&"Level 2: Missing or empty summary"));
        assert!(messages.contains(&"Level 2: Key term 1 (\"Water\") has empty definition"));
        assert!(issues.iter().all(|i| i.is_error()));
    }

    #[test]
    fn test_level_key_mismatch() {
        let mut item = complete("hydration");
        let three = ComplexityLevel::new(3).unwrap();
        if let Some(level) = item.levels.get_mut(&three) {
            level.level = ComplexityLevel::new(2).unwrap();
        }

        let mut issues = Vec::new();
        check_interface(&item, "f.yaml", &mut issues);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("does not match"));
    }

    #[test]
    fn test_quality_rules() {
        let mut item = complete("hydration");
        item.name_es = None;
        item.tags = Some(ContentTags {
            systems: vec!["ICD-11: 6C40".to_string(), "ICD-11:C40.3".to_string(), "renal".to_string()],
            ..Default::default()
        });
        if let Some(level) = item.levels.get_mut(&ComplexityLevel::new(5).unwrap()) {
            level.clinical_notes = Some("FIXME add dosing".to_string());
        }

        let mut issues = Vec::new();
        check_quality(&item, "f.yaml", &mut issues);

        assert_eq!(issues.len(), 3, "{:?}", issues);
        assert!(issues.iter().any(|i| i.message == "Missing Spanish translation (nameEs)" && !i.is_error()));
        assert!(issues.iter().any(|i| i.message.contains("6C40")));
        assert!(issues.iter().any(|i| i.message == "Level 5: clinicalNotes contains placeholder text"));
    }

    #[test]
    fn test_metadata_rules() {
        let mut item = complete("hydration");
        item.version = 0;
        item.created_at = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        item.updated_at = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();

        let mut issues = Vec::new();
        check_metadata(&item, "f.yaml", &mut issues);
        assert_eq!(issues.len(), 2);
        assert!(issues[0].is_error());
        assert!(!issues[1].is_error());
    }

    #[test]
    fn test_missing_sections_are_warnings() {
        let mut item = complete("hydration");
        item.media = None;
        item.tags = None;

        let mut issues = Vec::new();
        check_interface(&item, "f.yaml", &mut issues);

        let messages: Vec<&str> = issues.iter().map(|i| i.message.as_str()).collect();
        assert_eq!(messages, vec!["Missing media array", "Missing tags object"]);
        assert!(issues.iter().all(|i| !i.is_error()));
    }

    #[test]
    fn test_topics_and_exam_keys() {
        let mut item = complete("hydration");
        let mut exam = ExamRelevance {
            usmle: Some(true),
            ..Default::default()
        };
        exam.other.insert("step3".to_string(), serde_yaml::Value::Bool(true));
        item.tags = Some(ContentTags {
            topics: vec!["fluids".to_string(), "  ".to_string()],
            exam_relevance: Some(exam),
            ..Default::default()
        });

        let mut issues = Vec::new();
        check_metadata(&item, "f.yaml", &mut issues);

        assert_eq!(issues.len(), 2, "{:?}", issues);
        assert!(issues.iter().any(|i| i.is_error() && i.message == "Topic 2 in tags is empty"));
        assert!(issues
            .iter()
            .any(|i| !i.is_error() && i.message == "Unknown exam type in examRelevance: step3"));
    }

    #[test]
    fn test_readability_flags_dense_child_summary() {
        let mut item = complete("hydration");
        if let Some(level) = item.levels.get_mut(&ComplexityLevel::new(1).unwrap()) {
            level.summary = "Pathophysiological dysregulation of neurotransmitter homeostasis \
                             precipitates autonomic hyperexcitability and neuropsychiatric \
                             complications requiring pharmacological intervention."
                .to_string();
        }

        let mut issues = Vec::new();
        check_readability(&item, "f.yaml", 4.0, &mut issues);
        assert_eq!(issues.iter().filter(|i| i.message.starts_with("Level 1:")).count(), 1);
        // Two-word summaries are far too simple for the expert levels
        assert!(issues.iter().any(|i| i.message.starts_with("Level 5:")));
    }

    #[test]
    fn test_file_structure_rules() {
        let raw = "id: tree\nexplanation: |\n  ├── root\n";
        let mut issues = Vec::new();
        check_file_structure(&loaded(raw), 2, &mut issues);

        assert_eq!(issues.len(), 2);
        let box_issue = issues.iter().find(|i| i.is_error()).unwrap();
        assert_eq!(box_issue.line, Some(3));
    }

    #[test]
    fn test_file_names_must_be_kebab_case() {
        let mut issues = Vec::new();
        for name in ["general/hydration.yaml", "general/oral-rehydration-2.json"] {
            let file = LoadedFile {
                relative_path: name.to_string(),
                ..loaded("id: x\n")
            };
            check_file_structure(&file, 600, &mut issues);
        }
        assert!(issues.is_empty(), "{:?}", issues);

        for name in ["general/OralRehydration.yaml", "general/oral_rehydration.yml"] {
            let file = LoadedFile {
                relative_path: name.to_string(),
                ..loaded("id: x\n")
            };
            check_file_structure(&file, 600, &mut issues);
        }
        assert_eq!(issues.len(), 2);
        assert!(issues[0].message.contains("kebab-case"));
    }
}
