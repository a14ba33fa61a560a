//! Registry Integration Tests
//!
//! Loads small content trees from temporary directories and checks lookup,
//! ordering, duplicate handling and search.

use std::path::Path;

use lessonkit::domain::{ContentId, ContentStatus, ContentType};
use lessonkit::library::{
    Catalog, ContentSource, FsSource, Language, LoadError, MatchField, Registry, SearchOptions,
};
use tempfile::TempDir;

fn lesson(id: &str, name: &str, extra: &str) -> String {
    let mut levels = String::new();
    for n in 1..=5 {
        levels.push_str(&format!(
            "  {n}:\n    level: {n}\n    summary: {name} at level {n}.\n    explanation: About {name}.\n    keyTerms:\n      - term: Term {n}\n        definition: Meaning {n}.\n"
        ));
    }
    format!(
        "id: {id}\ntype: condition\nname: {name}\nnameEs: {name} (es)\nlevels:\n{levels}createdAt: 2026-01-01\nupdatedAt: 2026-01-02\nversion: 1\nstatus: published\n{extra}"
    )
}

async fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
    tokio::fs::write(path, content).await.unwrap();
}

async fn load(root: &Path) -> Registry {
    Registry::from_corpus(FsSource::new(root).load().await.unwrap())
}

#[tokio::test]
async fn test_missing_root_is_an_error() {
    let temp = TempDir::new().unwrap();
    let result = FsSource::new(temp.path().join("nope")).load().await;
    assert!(matches!(result, Err(LoadError::RootNotFound(_))));
}

#[tokio::test]
async fn test_load_categories_and_priority_order() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    write(root, "cardio/heart-failure.yaml", &lesson("heart-failure", "Heart Failure", "")).await;
    write(root, "cardio/valves/aortic-stenosis.yaml", &lesson("aortic-stenosis", "Aortic Stenosis", "")).await;
    write(root, "cardio/angina.yaml", &lesson("angina", "Angina", "")).await;
    write(
        root,
        "cardio/index.yaml",
        "title: Cardiology\nexports: [heart-failure, aortic-stenosis, angina]\npriority:\n  heart-failure: 1\n  aortic-stenosis: 2\n",
    )
    .await;
    write(root, "renal/aki.yaml", &lesson("aki", "Acute Kidney Injury", "tags:\n  systems: [renal]\n  topics: [electrolytes]\n")).await;

    let registry = load(root).await;

    assert_eq!(registry.len(), 4);
    assert_eq!(registry.files().len(), 4);
    assert_eq!(registry.manifests().len(), 1);

    // Prioritised first, unlisted after
    let cardio: Vec<&str> = registry.by_category("cardio").iter().map(|e| e.id().as_str()).collect();
    assert_eq!(cardio, vec!["heart-failure", "aortic-stenosis", "angina"]);

    let nested = registry.get("aortic-stenosis").unwrap();
    assert_eq!(nested.category, "cardio");
    assert_eq!(nested.source, "cardio/valves/aortic-stenosis.yaml");
    assert_eq!(nested.digest.len(), 64);

    assert!(registry.resolve_export("cardio", &"angina".into()).is_some());
    assert!(registry.resolve_export("renal", &"angina".into()).is_none());

    assert_eq!(registry.by_system("RENAL").len(), 1);
    assert_eq!(registry.by_topic("electrolytes").len(), 1);
    assert_eq!(registry.by_type(ContentType::Condition).len(), 4);
    assert_eq!(registry.by_status(ContentStatus::Draft).len(), 0);

    let categories = registry.categories();
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0].title.as_deref(), Some("Cardiology"));
    assert!(!categories[1].has_manifest);

    let stats = registry.stats();
    assert_eq!(stats.levels, 20);
    assert_eq!(stats.key_terms, 20);
    assert_eq!(stats.by_category["cardio"], 3);
}

#[tokio::test]
async fn test_list_files_and_ignored_files() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    let pair = format!(
        "- {}\n- {}",
        lesson("a", "Alpha", "").replace('\n', "\n  "),
        lesson("b", "Beta", "").replace('\n', "\n  ")
    );
    write(root, "misc/pair.yaml", &pair).await;
    write(root, "misc/_scratch.yaml", &lesson("scratch", "Scratch", "")).await;
    write(root, "misc/c.draft.yaml", &lesson("c", "Gamma", "")).await;
    write(root, ".git/config.yaml", "not: content").await;
    write(root, "misc/notes.md", "# notes").await;

    let registry = load(root).await;

    assert_eq!(registry.len(), 2);
    assert!(registry.contains("a") && registry.contains("b"));
    assert!(!registry.contains("scratch"));
    assert!(!registry.contains("c"));
    assert!(registry.failures().is_empty());
}

#[tokio::test]
async fn test_custom_ignore_patterns() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    write(root, "misc/_kept.yaml", &lesson("kept", "Kept", "")).await;
    write(root, "archive/old.yaml", &lesson("old", "Old", "")).await;

    let source = FsSource::new(root)
        .with_ignore_patterns(&["archive/**".to_string()])
        .unwrap();
    let registry = Registry::from_corpus(source.load().await.unwrap());

    assert!(registry.contains("kept"));
    assert!(!registry.contains("old"));
}

#[tokio::test]
async fn test_duplicates_first_definition_wins() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    write(root, "a/first.yaml", &lesson("shared", "First", "")).await;
    write(root, "b/second.yaml", &lesson("shared", "Second", "")).await;

    let registry = load(root).await;

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get("shared").unwrap().content.name, "First");

    let duplicates = registry.duplicates();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].sources, vec!["a/first.yaml", "b/second.yaml"]);
}

#[tokio::test]
async fn test_parse_failures_are_collected() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    write(root, "x/good.yaml", &lesson("good", "Good", "")).await;
    write(root, "x/bad-level.yaml", &lesson("bad", "Bad", "").replace("  5:\n    level: 5", "  7:\n    level: 7")).await;
    write(root, "x/index.yaml", "title: [unclosed\n").await;

    let registry = load(root).await;

    assert_eq!(registry.len(), 1);
    let failed: Vec<&str> = registry.failures().iter().map(|f| f.relative_path.as_str()).collect();
    assert_eq!(failed, vec!["x/bad-level.yaml", "x/index.yaml"]);
}

#[tokio::test]
async fn test_non_utf8_file_does_not_abort_load() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    write(root, "ent/good.yaml", &lesson("good", "Good", "")).await;
    let mut latin1 = lesson("ear", "Ear", "").into_bytes();
    // Latin-1 "Oído"
    latin1.extend_from_slice(b"description: O\xEDdo\n");
    tokio::fs::write(root.join("ent/latin1.yaml"), latin1).await.unwrap();

    let registry = load(root).await;

    assert!(registry.contains("good"));
    assert!(!registry.contains("ear"));
    assert_eq!(registry.failures().len(), 1);
    let failure = &registry.failures()[0];
    assert_eq!(failure.relative_path, "ent/latin1.yaml");
    assert!(failure.message.contains("UTF-8"));
    assert!(failure.line.is_some());
}

#[tokio::test]
async fn test_search_scoring() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    write(root, "tox/withdrawal.yaml", &lesson("alcohol-withdrawal", "Alcohol Withdrawal", "")).await;
    write(
        root,
        "tox/dts.yaml",
        &lesson("delirium-tremens", "Delirium Tremens", "tags:\n  keywords: [alcohol withdrawal]\n"),
    )
    .await;
    write(root, "tox/ivf.yaml", &lesson("ivf", "IVF", "")).await;

    let registry = load(root).await;
    let options = SearchOptions::default();

    let hits = registry.search("  ALCOHOL withdrawal ", &options);
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].entry.id().as_str(), "alcohol-withdrawal");
    assert_eq!(hits[0].field, MatchField::ExactName);
    assert_eq!(hits[1].field, MatchField::Keyword);

    // Summaries mention the name at every level
    let summary_hits = registry.search("at level 3", &options);
    assert_eq!(summary_hits.len(), 3);
    assert!(summary_hits.iter().all(|h| h.field == MatchField::Summary));

    let no_summaries = SearchOptions {
        include_summaries: false,
        ..Default::default()
    };
    assert!(registry.search("at level 3", &no_summaries).is_empty());

    assert!(registry.search("   ", &options).is_empty());

    let limited = SearchOptions {
        limit: Some(1),
        ..Default::default()
    };
    assert_eq!(registry.search("term", &limited).len(), 1);
}

#[tokio::test]
async fn test_search_by_spanish_name() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    let kidney = lesson("kidney", "Kidney", "").replace("nameEs: Kidney (es)", "nameEs: Riñón");
    write(root, "renal/kidney.yaml", &kidney).await;
    write(root, "renal/nephron.yaml", &lesson("nephron", "Nephron", "")).await;

    let registry = load(root).await;
    let spanish = SearchOptions {
        language: Language::Es,
        ..Default::default()
    };

    // Only nameEs contains the query
    let hits = registry.search("riñón", &spanish);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].entry.id().as_str(), "kidney");
    assert_eq!(hits[0].field, MatchField::ExactName);

    let hits = registry.search("riñón", &SearchOptions::default());
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].field, MatchField::OtherName);

    // English names rank below Spanish ones in an es query
    let hits = registry.search("kidney", &spanish);
    assert_eq!(hits[0].field, MatchField::OtherName);

    assert_eq!("ES".parse::<Language>().unwrap(), Language::Es);
    assert!("fr".parse::<Language>().is_err());
}

#[tokio::test]
async fn test_catalog_round_trip_from_registry() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("content");

    write(&root, "cardio/angina.yaml", &lesson("angina", "Angina", "")).await;
    let first = Catalog::from_registry(&load(&root).await);

    let catalog_path = temp.path().join("home").join("catalog.json");
    first.save(&catalog_path).await.unwrap();

    write(&root, "cardio/angina.yaml", &lesson("angina", "Stable Angina", "")).await;
    write(&root, "cardio/mi.yaml", &lesson("mi", "Myocardial Infarction", "")).await;
    let second = Catalog::from_registry(&load(&root).await);

    let previous = Catalog::load(&catalog_path).await.unwrap();
    let diff = second.diff(&previous);

    assert_eq!(diff.added, vec![ContentId::from("mi")]);
    assert_eq!(diff.changed, vec![ContentId::from("angina")]);
    assert!(diff.removed.is_empty());
}
