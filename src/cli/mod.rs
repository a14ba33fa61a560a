//! Command-line interface for lessonkit.
//!
//! Provides commands for browsing and searching the content corpus,
//! validating it, writing the catalog, and exploring cross references.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config;
use crate::domain::{
    explanation_level, ComplexityLevel, ContentStatus, ContentType, EducationalContent,
    Relationship, EXPLANATION_LEVELS,
};
use crate::graph::ContentGraph;
use crate::library::{
    Catalog, ContentSource, FsSource, Language, Registry, RegistryEntry, SearchOptions,
};
use crate::validation::{ValidationReport, ValidationSettings, Validator};
use crate::watch::{ContentWatcher, WatchConfig};

/// lessonkit - Multi-level educational content toolkit
#[derive(Parser, Debug)]
#[command(name = "lessonkit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Content root (defaults to config, then ./content)
    #[arg(long, global = true, env = "LESSONKIT_CONTENT")]
    pub content: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List lessons
    List {
        /// Only this category
        #[arg(short, long)]
        category: Option<String>,

        /// Only this status (draft, review, published)
        #[arg(short, long)]
        status: Option<String>,

        /// Only this content type
        #[arg(short = 't', long = "type")]
        content_type: Option<String>,

        /// Maximum number of items to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Show a lesson
    Show {
        /// Content ID
        content_id: String,

        /// Only this complexity level (1-5)
        #[arg(short, long)]
        level: Option<u8>,

        /// Print every field of every level
        #[arg(short, long)]
        full: bool,
    },

    /// Search lessons by name, tags, key terms and summaries
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Only this category
        #[arg(short, long)]
        category: Option<String>,

        /// Query language (en or es); es matches Spanish names first
        #[arg(long, default_value = "en")]
        lang: String,
    },

    /// List categories
    Categories,

    /// Describe the five complexity levels
    Levels,

    /// Validate the corpus
    Validate {
        /// Fail on warnings too
        #[arg(long)]
        strict: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Check summary readability against each level's target grade
        #[arg(long)]
        readability: bool,
    },

    /// Write the catalog and show what changed since the last run
    Index {
        /// Catalog path (defaults to $LESSONKIT_HOME/catalog.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show lessons linked to a lesson
    Related {
        /// Content ID
        content_id: String,

        /// Only this relationship (parent, child, sibling, related, see-also)
        #[arg(short, long)]
        relationship: Option<String>,

        /// Only related lessons of this content type
        #[arg(short = 't', long = "type")]
        content_type: Option<String>,
    },

    /// Find the shortest chain of cross references between two lessons
    Path {
        from: String,
        to: String,
    },

    /// Show corpus statistics
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show resolved configuration (debug)
    Config,

    /// Re-validate whenever content files change
    Watch,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let content = self.content.as_deref();

        match self.command {
            Commands::List {
                category,
                status,
                content_type,
                limit,
            } => list_content(content, category, status, content_type, limit).await,
            Commands::Show {
                content_id,
                level,
                full,
            } => show_content(content, &content_id, level, full).await,
            Commands::Search {
                query,
                limit,
                category,
                lang,
            } => search_content(content, &query, limit, category, &lang).await,
            Commands::Categories => list_categories(content).await,
            Commands::Levels => {
                show_levels();
                Ok(())
            }
            Commands::Validate {
                strict,
                json,
                readability,
            } => validate_content(content, strict, json, readability).await,
            Commands::Index { output } => write_index(content, output).await,
            Commands::Related {
                content_id,
                relationship,
                content_type,
            } => show_related(content, &content_id, relationship, content_type).await,
            Commands::Path { from, to } => show_path(content, &from, &to).await,
            Commands::Stats { json } => show_stats(content, json).await,
            Commands::Config => show_config(content),
            Commands::Watch => watch_content(content).await,
        }
    }
}

/// Content root from the flag, else config
fn content_root(content: Option<&Path>) -> Result<PathBuf> {
    match content {
        Some(path) => Ok(path.to_path_buf()),
        None => config::content_dir(),
    }
}

/// Load the content root into a registry
async fn load_registry(content: Option<&Path>) -> Result<Registry> {
    let root = content_root(content)?;
    let cfg = config::config()?;

    let source = FsSource::new(&root).with_ignore_patterns(&cfg.ignore)?;
    let corpus = source
        .load()
        .await
        .with_context(|| format!("Failed to load content from {}", root.display()))?;

    let registry = Registry::from_corpus(corpus);
    if !registry.failures().is_empty() {
        tracing::warn!(
            "{} file(s) failed to parse; run 'lessonkit validate' for details",
            registry.failures().len()
        );
    }

    Ok(registry)
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

fn print_entry_table<'a>(entries: impl IntoIterator<Item = &'a RegistryEntry>) {
    println!("{:<32} {:<10} {:<10} {:<40}", "ID", "TYPE", "STATUS", "NAME");
    println!("{}", "-".repeat(94));

    for entry in entries {
        println!(
            "{:<32} {:<10} {:<10} {:<40}",
            truncate(entry.id().as_str(), 32),
            entry.content.content_type.to_string(),
            entry.content.status.to_string(),
            truncate(entry.content.display_name(), 40)
        );
    }
}

/// List lessons with optional filters
async fn list_content(
    content: Option<&Path>,
    category: Option<String>,
    status: Option<String>,
    content_type: Option<String>,
    limit: usize,
) -> Result<()> {
    let registry = load_registry(content).await?;

    if registry.is_empty() {
        println!("No content found.");
        return Ok(());
    }

    let status: Option<ContentStatus> = status.map(|s| s.parse()).transpose()?;
    let content_type: Option<ContentType> = content_type.map(|t| t.parse()).transpose()?;

    let items: Vec<&RegistryEntry> = registry
        .all()
        .iter()
        .filter(|e| category.as_deref().map(|c| e.category == c).unwrap_or(true))
        .filter(|e| status.map(|s| e.content.status == s).unwrap_or(true))
        .filter(|e| content_type.map(|t| e.content.content_type == t).unwrap_or(true))
        .collect();

    print_entry_table(items.iter().take(limit).copied());

    println!("\nShowing {} of {} items", items.len().min(limit), items.len());

    Ok(())
}

/// Show one lesson
async fn show_content(
    content: Option<&Path>,
    content_id: &str,
    level: Option<u8>,
    full: bool,
) -> Result<()> {
    let registry = load_registry(content).await?;

    let entry = registry
        .get(content_id)
        .ok_or_else(|| anyhow::anyhow!("Content not found: {}", content_id))?;
    let item = &entry.content;

    println!("{}", "=".repeat(64));
    println!("  ID: {}", item.id);
    println!("  Name: {}", item.display_name());
    if let Some(ref name_es) = item.name_es {
        println!("  Spanish: {}", name_es);
    }
    println!("  Type: {}", item.content_type);
    println!("  Category: {}", entry.category);
    println!("  Status: {} (v{})", item.status, item.version);
    println!("  Updated: {}", item.updated_at);
    println!("  Source: {}", entry.source);
    if !item.tags().systems.is_empty() {
        println!("  Systems: {}", item.tags().systems.join(", "));
    }
    if !item.tags().topics.is_empty() {
        println!("  Topics: {}", item.tags().topics.join(", "));
    }
    println!("{}", "=".repeat(64));

    let requested = level;
    let levels: Vec<ComplexityLevel> = match level {
        Some(n) => vec![ComplexityLevel::new(n)
            .ok_or_else(|| anyhow::anyhow!("Level must be between 1 and 5, got {}", n))?],
        None => item.levels.keys().copied().collect(),
    };

    for level in levels {
        // An explicitly requested level is always shown in full
        print_level(item, level, full || requested.is_some());
    }

    if full {
        print_references(item);
    } else if level.is_none() {
        println!("\nUse --level N or --full to show explanations");
    }

    Ok(())
}

fn print_level(item: &EducationalContent, level: ComplexityLevel, full: bool) {
    let descriptor = explanation_level(level);
    println!("\n--- Level {}: {} ---", level, descriptor.name);

    let Some(content) = item.level(level) else {
        println!("(missing)");
        return;
    };

    println!("{}", content.summary);
    if !full {
        return;
    }

    println!("\n{}", content.explanation.trim_end());

    if !content.key_terms.is_empty() {
        println!("\nKey terms:");
        for term in &content.key_terms {
            println!("  {}: {}", term.term, term.definition);
        }
    }
    let lists = [
        ("Analogies", &content.analogies),
        ("Examples", &content.examples),
        ("Counseling points", &content.patient_counseling_points),
    ];
    for (title, values) in lists {
        if !values.is_empty() {
            println!("\n{}:", title);
            for value in values {
                println!("  - {}", value);
            }
        }
    }
    if let Some(ref notes) = content.clinical_notes {
        println!("\nClinical notes: {}", notes);
    }
}

fn print_references(item: &EducationalContent) {
    if !item.cross_references().is_empty() {
        println!("\nCross references:");
        for xref in item.cross_references() {
            println!("  {} -> {}", xref.relationship, xref.target_id);
        }
    }
    if !item.citations().is_empty() {
        println!("\nCitations:");
        for citation in item.citations() {
            let year = citation.year.map(|y| format!(" ({})", y)).unwrap_or_default();
            println!("  [{}] {}{}. {}", citation.id, citation.title, year, citation.source);
        }
    }
}

/// Search lessons
async fn search_content(
    content: Option<&Path>,
    query: &str,
    limit: usize,
    category: Option<String>,
    lang: &str,
) -> Result<()> {
    let language: Language = lang.parse()?;
    let registry = load_registry(content).await?;

    let options = SearchOptions {
        limit: Some(limit),
        category,
        language,
        ..Default::default()
    };
    let hits = registry.search(query, &options);

    if hits.is_empty() {
        println!("No results found for: {}", query);
        return Ok(());
    }

    println!("Found {} result(s) for \"{}\":\n", hits.len(), query);
    println!("{:<6} {:<14} {:<32} {:<40}", "SCORE", "MATCH", "ID", "NAME");
    println!("{}", "-".repeat(94));

    for hit in &hits {
        let field = serde_json::to_value(hit.field)?;
        println!(
            "{:<6} {:<14} {:<32} {:<40}",
            hit.score,
            field.as_str().unwrap_or_default(),
            truncate(hit.entry.id().as_str(), 32),
            truncate(
                language
                    .name_of(&hit.entry.content)
                    .unwrap_or_else(|| hit.entry.content.display_name()),
                40
            )
        );
    }

    Ok(())
}

/// List categories
async fn list_categories(content: Option<&Path>) -> Result<()> {
    let registry = load_registry(content).await?;

    println!("{:<28} {:<6} {:<40}", "CATEGORY", "ITEMS", "TITLE");
    println!("{}", "-".repeat(76));

    for category in registry.categories() {
        let title = category.title.unwrap_or_else(|| "(no manifest)".to_string());
        println!(
            "{:<28} {:<6} {:<40}",
            category.name,
            category.item_count,
            truncate(&title, 40)
        );
    }

    Ok(())
}

/// Describe the five complexity levels
fn show_levels() {
    for level in &EXPLANATION_LEVELS {
        println!("Level {}: {} ({})", level.level, level.name, level.label);
        println!("  Audience:      {}", level.audience);
        println!(
            "  Grade:         {}-{}",
            level.grade_range.0, level.grade_range.1
        );
        println!(
            "  Reading ease:  {}-{}",
            level.reading_ease_range.0, level.reading_ease_range.1
        );
        println!(
            "  Limits:        {} words/sentence, {} syllables/word",
            level.max_words_per_sentence, level.max_syllables_per_word
        );
    }
}

fn print_report(report: &ValidationReport) {
    for (file, issues) in report.by_file() {
        println!("{}", file);
        for issue in issues {
            let line = issue.line.map(|l| format!(":{}", l)).unwrap_or_default();
            let item = issue
                .item
                .as_ref()
                .map(|id| format!(" ({})", id))
                .unwrap_or_default();
            println!(
                "  {}{} [{}]{} {}",
                issue.severity, line, issue.category, item, issue.message
            );
        }
    }

    println!(
        "\nChecked {} item(s) in {} file(s): {} error(s), {} warning(s)",
        report.items_checked,
        report.files_checked,
        report.error_count(),
        report.warning_count()
    );
}

/// Validate the corpus; exits with status 1 on failure
async fn validate_content(
    content: Option<&Path>,
    strict: bool,
    json: bool,
    readability: bool,
) -> Result<()> {
    let registry = load_registry(content).await?;
    let cfg = config::config()?;

    let settings = ValidationSettings {
        strict: strict || cfg.validation.strict,
        check_readability: readability,
        ..cfg.validation.clone()
    };
    let report = Validator::new(settings).validate(&registry);

    if json {
        println!("{}", report.to_json()?);
    } else {
        print_report(&report);
    }

    if !report.is_valid() {
        if !json {
            eprintln!("\nValidation failed");
        }
        std::process::exit(1);
    }

    Ok(())
}

/// Write the catalog and print the diff against the previous one
async fn write_index(content: Option<&Path>, output: Option<PathBuf>) -> Result<()> {
    let registry = load_registry(content).await?;

    let path = match output {
        Some(path) => path,
        None => Catalog::catalog_path()?,
    };

    let previous = Catalog::load(&path).await?;
    let catalog = Catalog::from_registry(&registry);
    let diff = catalog.diff(&previous);

    catalog.save(&path).await?;

    println!("Wrote {} item(s) to {}", catalog.len(), path.display());
    if diff.is_empty() {
        println!("No changes since last index");
    } else {
        for id in &diff.added {
            println!("  + {}", id);
        }
        for id in &diff.changed {
            println!("  ~ {}", id);
        }
        for id in &diff.removed {
            println!("  - {}", id);
        }
    }

    Ok(())
}

/// Show lessons linked to a lesson
async fn show_related(
    content: Option<&Path>,
    content_id: &str,
    relationship: Option<String>,
    content_type: Option<String>,
) -> Result<()> {
    let registry = load_registry(content).await?;
    if !registry.contains(content_id) {
        anyhow::bail!("Content not found: {}", content_id);
    }

    let relationship: Option<Relationship> = relationship.map(|r| r.parse()).transpose()?;
    let content_type: Option<ContentType> = content_type.map(|t| t.parse()).transpose()?;
    let graph = ContentGraph::build(&registry);

    let related = graph.related(content_id, relationship, content_type);
    if related.is_empty() {
        println!("No related content for: {}", content_id);
        return Ok(());
    }

    print_entry_table(related.iter().filter_map(|id| registry.get(id.as_str())));

    Ok(())
}

/// Show the shortest chain between two lessons
async fn show_path(content: Option<&Path>, from: &str, to: &str) -> Result<()> {
    let registry = load_registry(content).await?;
    for id in [from, to] {
        if !registry.contains(id) {
            anyhow::bail!("Content not found: {}", id);
        }
    }

    let graph = ContentGraph::build(&registry);
    match graph.path(from, to) {
        Some(path) => {
            let ids: Vec<&str> = path.iter().map(|id| id.as_str()).collect();
            println!("{}", ids.join(" -> "));
        }
        None => println!("No path between {} and {}", from, to),
    }

    Ok(())
}

/// Show corpus statistics
async fn show_stats(content: Option<&Path>, json: bool) -> Result<()> {
    let registry = load_registry(content).await?;
    let stats = registry.stats();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    let graph = ContentGraph::build(&registry);

    println!("Items:            {}", stats.items);
    println!("Files:            {}", stats.files);
    println!("Categories:       {}", stats.categories);
    println!("Levels:           {}", stats.levels);
    println!("Key terms:        {}", stats.key_terms);
    println!("Citations:        {}", stats.citations);
    println!("Cross references: {} ({} dangling)", stats.cross_references, graph.dangling().len());
    println!("Orphans:          {}", graph.orphans().len());

    let tables = [
        ("By type", &stats.by_type),
        ("By status", &stats.by_status),
        ("By category", &stats.by_category),
    ];
    for (title, table) in tables {
        println!("\n{}:", title);
        for (key, count) in table {
            println!("  {:<28} {}", key, count);
        }
    }

    Ok(())
}

/// Show resolved configuration
fn show_config(content: Option<&Path>) -> Result<()> {
    let cfg = config::config()?;

    println!("lessonkit configuration");
    println!("{}", "=".repeat(64));
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:    {}", cfg.home.display());
    println!("  Content: {}", content_root(content)?.display());
    println!("  Catalog: {}", config::catalog_path()?.display());
    println!();
    println!("Validation:");
    println!("  Max file lines:        {}", cfg.validation.max_file_lines);
    println!("  Readability tolerance: {}", cfg.validation.readability_tolerance);
    println!("  Strict:                {}", cfg.validation.strict);
    println!();
    println!("Loader ignore patterns:");
    for pattern in &cfg.ignore {
        println!("  {}", pattern);
    }

    Ok(())
}

/// Re-validate on every change until interrupted
async fn watch_content(content: Option<&Path>) -> Result<()> {
    let cfg = config::config()?;

    let watch_config = WatchConfig {
        ignore: cfg.ignore.clone(),
        settings: cfg.validation.clone(),
        ..WatchConfig::new(content_root(content)?)
    };
    let watcher = ContentWatcher::new(watch_config);

    let initial = watcher.check_once().await?;
    print_report(&initial);

    let (mut events, handle) = watcher.watch().await?;
    println!("\nWatching for changes (Ctrl-C to stop)...");

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                println!("\n[{}] {} file(s) changed", event.validated_at.format("%H:%M:%S"), event.changed.len());
                print_report(&event.report);
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    handle.stop().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
        // Multi-byte characters are not split
        assert_eq!(truncate("hidratación oral", 10), "hidrata...");
    }

    #[test]
    fn test_cli_parses_validate_flags() {
        let cli = Cli::try_parse_from(["lessonkit", "--content", "/tmp/c", "validate", "--strict", "--json"]).unwrap();
        assert_eq!(cli.content, Some(PathBuf::from("/tmp/c")));
        assert!(matches!(
            cli.command,
            Commands::Validate {
                strict: true,
                json: true,
                readability: false
            }
        ));
    }

    #[test]
    fn test_cli_parses_show_level() {
        let cli = Cli::try_parse_from(["lessonkit", "show", "alcohol-withdrawal", "--level", "2"]).unwrap();
        match cli.command {
            Commands::Show { content_id, level, full } => {
                assert_eq!(content_id, "alcohol-withdrawal");
                assert_eq!(level, Some(2));
                assert!(!full);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_parses_type_and_lang_filters() {
        let cli = Cli::try_parse_from(["lessonkit", "related", "heart", "--type", "condition"]).unwrap();
        match cli.command {
            Commands::Related { content_type, relationship, .. } => {
                assert_eq!(content_type.as_deref(), Some("condition"));
                assert!(relationship.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::try_parse_from(["lessonkit", "search", "riñón", "--lang", "es"]).unwrap();
        match cli.command {
            Commands::Search { query, lang, .. } => {
                assert_eq!(query, "riñón");
                assert_eq!(lang.parse::<Language>().unwrap(), Language::Es);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
