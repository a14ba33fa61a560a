//! Cross-Reference Graph Tests

use lessonkit::domain::{ContentId, ContentType, CrossReference, EducationalContent, Relationship};
use lessonkit::library::{ContentSource, MemorySource, Registry};
use lessonkit::ContentGraph;

fn lesson(id: &str, links: &[(&str, Relationship)]) -> EducationalContent {
    typed(id, ContentType::Topic, links)
}

fn typed(id: &str, content_type: ContentType, links: &[(&str, Relationship)]) -> EducationalContent {
    links.iter().fold(
        EducationalContent::new(id, content_type, id),
        |item, (target, rel)| item.with_cross_reference(CrossReference::new(*target, *rel)),
    )
}

async fn graph(items: Vec<EducationalContent>) -> ContentGraph {
    let source = items
        .into_iter()
        .fold(MemorySource::new(), |s, item| s.with_item("x", item));
    let registry = Registry::from_corpus(source.load().await.unwrap());
    ContentGraph::build(&registry)
}

fn ids(found: Vec<&ContentId>) -> Vec<&str> {
    let mut ids: Vec<&str> = found.into_iter().map(|id| id.as_str()).collect();
    ids.sort();
    ids
}

#[tokio::test]
async fn test_related_in_both_directions() {
    let g = graph(vec![
        lesson("heart", &[("valve", Relationship::Child), ("lung", Relationship::Related)]),
        lesson("valve", &[("heart", Relationship::Parent)]),
        lesson("lung", &[]),
        lesson("aorta", &[("heart", Relationship::SeeAlso)]),
    ])
    .await;

    assert_eq!(g.node_count(), 4);
    assert_eq!(g.edge_count(), 4);

    // valve links both ways but is listed once
    assert_eq!(ids(g.related("heart", None, None)), vec!["aorta", "lung", "valve"]);
    assert_eq!(ids(g.related("heart", Some(Relationship::Related), None)), vec!["lung"]);
    assert_eq!(ids(g.related("lung", None, None)), vec!["heart"]);
    assert!(g.related("unknown", None, None).is_empty());

    assert_eq!(ids(g.references_to("heart")), vec!["aorta", "valve"]);
}

#[tokio::test]
async fn test_related_filtered_by_content_type() {
    let g = graph(vec![
        typed(
            "heart",
            ContentType::Structure,
            &[("angina", Relationship::Related), ("circulation", Relationship::Parent)],
        ),
        typed("angina", ContentType::Condition, &[]),
        typed("circulation", ContentType::System, &[]),
        typed("heart-failure", ContentType::Condition, &[("heart", Relationship::SeeAlso)]),
    ])
    .await;

    assert_eq!(
        ids(g.related("heart", None, Some(ContentType::Condition))),
        vec!["angina", "heart-failure"]
    );
    assert_eq!(
        ids(g.related("heart", Some(Relationship::SeeAlso), Some(ContentType::Condition))),
        vec!["heart-failure"]
    );
    assert!(g.related("heart", None, Some(ContentType::Pathway)).is_empty());
    assert_eq!(ids(g.related("heart", None, None)).len(), 3);
}

#[tokio::test]
async fn test_dangling_and_blank_targets() {
    let g = graph(vec![lesson(
        "heart",
        &[("ghost", Relationship::SeeAlso), ("", Relationship::Related)],
    )])
    .await;

    assert_eq!(g.edge_count(), 0);
    assert_eq!(g.dangling().len(), 1);
    assert_eq!(g.dangling()[0].target.as_str(), "ghost");
    assert_eq!(g.dangling()[0].relationship, Relationship::SeeAlso);
}

#[tokio::test]
async fn test_hierarchy_cycles() {
    let g = graph(vec![
        lesson("a", &[("b", Relationship::Parent)]),
        lesson("b", &[("a", Relationship::Child), ("c", Relationship::Parent)]),
        lesson("c", &[("a", Relationship::Parent)]),
        lesson("self", &[("self", Relationship::Parent)]),
        lesson("x", &[("y", Relationship::Sibling)]),
        lesson("y", &[("x", Relationship::Sibling)]),
    ])
    .await;

    let cycles = g.hierarchy_cycles();
    assert_eq!(cycles.len(), 1);
    let members: Vec<&str> = cycles[0].iter().map(|id| id.as_str()).collect();
    assert_eq!(members, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_consistent_parent_child_pair_is_not_a_cycle() {
    let g = graph(vec![
        lesson("parent", &[("child", Relationship::Child)]),
        lesson("child", &[("parent", Relationship::Parent)]),
    ])
    .await;

    assert!(g.hierarchy_cycles().is_empty());
}

#[tokio::test]
async fn test_path_and_orphans() {
    let g = graph(vec![
        lesson("a", &[("b", Relationship::Related)]),
        lesson("b", &[]),
        lesson("c", &[("b", Relationship::Related)]),
        lesson("d", &[("c", Relationship::SeeAlso)]),
        lesson("island", &[("island", Relationship::Related)]),
        lesson("lonely", &[]),
    ])
    .await;

    let path = g.path("a", "d").unwrap();
    let path: Vec<&str> = path.iter().map(|id| id.as_str()).collect();
    assert_eq!(path, vec!["a", "b", "c", "d"]);

    assert_eq!(g.path("a", "a").map(|p| p.len()), Some(1));
    assert!(g.path("a", "lonely").is_none());
    assert!(g.path("a", "missing").is_none());

    assert_eq!(ids(g.orphans()), vec!["island", "lonely"]);
}
