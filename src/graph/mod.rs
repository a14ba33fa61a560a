//! Cross-reference graph over the registry.
//!
//! One node per lesson and one directed edge per resolvable cross
//! reference. References to unknown ids are kept aside as dangling.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;

use crate::domain::{ContentId, ContentType, Relationship};
use crate::library::Registry;

/// A cross reference whose target is not in the corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingReference {
    pub source: ContentId,
    pub target: ContentId,
    pub relationship: Relationship,
}

/// Directed graph of lessons linked by cross references
#[derive(Debug, Clone, Default)]
pub struct ContentGraph {
    graph: DiGraph<ContentId, Relationship>,
    nodes: HashMap<ContentId, NodeIndex>,
    types: HashMap<NodeIndex, ContentType>,
    dangling: Vec<DanglingReference>,
}

impl ContentGraph {
    /// Build the graph from every entry's cross references
    pub fn build(registry: &Registry) -> Self {
        let mut graph = DiGraph::new();
        let mut nodes = HashMap::new();
        let mut types = HashMap::new();

        for entry in registry.all() {
            let idx = graph.add_node(entry.id().clone());
            nodes.insert(entry.id().clone(), idx);
            types.insert(idx, entry.content.content_type);
        }

        let mut dangling = Vec::new();
        for entry in registry.all() {
            let from = nodes[entry.id()];
            for xref in entry.content.cross_references() {
                if xref.target_id.is_blank() {
                    continue;
                }
                match nodes.get(&xref.target_id) {
                    Some(&to) => {
                        graph.add_edge(from, to, xref.relationship);
                    }
                    None => dangling.push(DanglingReference {
                        source: entry.id().clone(),
                        target: xref.target_id.clone(),
                        relationship: xref.relationship,
                    }),
                }
            }
        }

        tracing::debug!(
            "Built content graph: {} nodes, {} edges, {} dangling",
            graph.node_count(),
            graph.edge_count(),
            dangling.len()
        );

        Self {
            graph,
            nodes,
            types,
            dangling,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Lessons linked to `id` in either direction, outgoing first.
    ///
    /// Optionally restricted to one relationship and to neighbours of one
    /// content type. Unknown ids yield nothing.
    pub fn related(
        &self,
        id: &str,
        relationship: Option<Relationship>,
        content_type: Option<ContentType>,
    ) -> Vec<&ContentId> {
        let Some(&idx) = self.nodes.get(id) else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut results = Vec::new();

        let outgoing = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.target(), *e.weight()));
        let incoming = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| (e.source(), *e.weight()));

        for (other, rel) in outgoing.chain(incoming) {
            if other == idx || relationship.map(|r| r != rel).unwrap_or(false) {
                continue;
            }
            if content_type.is_some() && self.types.get(&other).copied() != content_type {
                continue;
            }
            if seen.insert(other) {
                results.push(&self.graph[other]);
            }
        }

        results
    }

    /// Lessons that reference `id`
    pub fn references_to(&self, id: &str) -> Vec<&ContentId> {
        let Some(&idx) = self.nodes.get(id) else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .filter(|&n| n != idx && seen.insert(n))
            .map(|n| &self.graph[n])
            .collect()
    }

    /// References whose target is not in the corpus
    pub fn dangling(&self) -> &[DanglingReference] {
        &self.dangling
    }

    /// Cycles in the parent/child hierarchy.
    ///
    /// `parent` links point child→parent; `child` links are reversed to
    /// the same orientation. Self-references are not reported here.
    /// Members of each cycle are sorted, and cycles are sorted.
    pub fn hierarchy_cycles(&self) -> Vec<Vec<ContentId>> {
        let mut hierarchy: DiGraphMap<NodeIndex, ()> = DiGraphMap::new();

        for edge in self.graph.edge_references() {
            let (child, parent) = match edge.weight() {
                Relationship::Parent => (edge.source(), edge.target()),
                Relationship::Child => (edge.target(), edge.source()),
                _ => continue,
            };
            if child != parent {
                hierarchy.add_edge(child, parent, ());
            }
        }

        let mut cycles: Vec<Vec<ContentId>> = tarjan_scc(&hierarchy)
            .into_iter()
            .filter(|component| component.len() > 1)
            .map(|component| {
                let mut ids: Vec<ContentId> =
                    component.into_iter().map(|n| self.graph[n].clone()).collect();
                ids.sort();
                ids
            })
            .collect();

        cycles.sort();
        cycles
    }

    /// Shortest chain of lessons from `from` to `to`, ignoring link direction
    pub fn path(&self, from: &str, to: &str) -> Option<Vec<ContentId>> {
        let start = *self.nodes.get(from)?;
        let goal = *self.nodes.get(to)?;

        let mut previous: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut visited = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            if current == goal {
                let mut path = vec![self.graph[current].clone()];
                let mut node = current;
                while let Some(&prev) = previous.get(&node) {
                    path.push(self.graph[prev].clone());
                    node = prev;
                }
                path.reverse();
                return Some(path);
            }

            for next in self.graph.neighbors_undirected(current) {
                if visited.insert(next) {
                    previous.insert(next, current);
                    queue.push_back(next);
                }
            }
        }

        None
    }

    /// Lessons with no resolvable links in either direction
    pub fn orphans(&self) -> Vec<&ContentId> {
        self.graph
            .node_indices()
            .filter(|&n| {
                self.graph
                    .neighbors_undirected(n)
                    .all(|other| other == n)
            })
            .map(|n| &self.graph[n])
            .collect()
    }
}
