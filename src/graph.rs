use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Undirected;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::matrix::{appearance_count, AppearanceMatrix};

/// Undirected weighted co-occurrence graph over character names.
/// Simple graph: at most one edge per unordered pair, no self-loops,
/// weights in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterGraph {
    graph: Graph<String, f64, Undirected>,
}

impl CharacterGraph {
    pub fn new() -> Self {
        Self {
            graph: Graph::new_undirected(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// The underlying petgraph value, for generic graph algorithms
    /// (shortest paths, community detection) run by callers.
    pub fn as_petgraph(&self) -> &Graph<String, f64, Undirected> {
        &self.graph
    }

    pub(crate) fn add_character(&mut self, name: String) -> NodeIndex {
        self.graph.add_node(name)
    }

    pub(crate) fn add_relation(&mut self, a: NodeIndex, b: NodeIndex, weight: f64) {
        self.graph.add_edge(a, b, weight);
    }

    pub fn characters(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(String::as_str)
    }

    fn node_index(&self, name: &str) -> Option<NodeIndex> {
        self.graph.node_indices().find(|&i| self.graph[i] == name)
    }

    /// All edges as (name, name, weight) triples, in insertion order.
    pub fn relations(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.graph.edge_references().map(|e| {
            (
                self.graph[e.source()].as_str(),
                self.graph[e.target()].as_str(),
                *e.weight(),
            )
        })
    }

    /// Weight of the edge between two characters, if both exist and the
    /// edge is present.
    pub fn relation_weight(&self, a: &str, b: &str) -> Option<f64> {
        let a = self.node_index(a)?;
        let b = self.node_index(b)?;
        let edge = self.graph.find_edge(a, b)?;
        self.graph.edge_weight(edge).copied()
    }

    /// The `top_n` heaviest edges in the graph, strongest first.
    pub fn top_edges(&self, top_n: usize) -> Vec<(String, String, f64)> {
        let mut edges: Vec<_> = self
            .relations()
            .map(|(a, b, w)| (a.to_string(), b.to_string(), w))
            .collect();
        edges.sort_by(|x, y| y.2.total_cmp(&x.2));
        edges.truncate(top_n);
        edges
    }

    /// A character's strongest relationships, or `None` for an unknown name.
    pub fn top_relationships(&self, name: &str, top_n: usize) -> Option<Vec<(String, f64)>> {
        let node = self.node_index(name)?;
        let mut edges: Vec<_> = self
            .graph
            .edges(node)
            .map(|e| {
                let other = if e.source() == node { e.target() } else { e.source() };
                (self.graph[other].clone(), *e.weight())
            })
            .collect();
        edges.sort_by(|x, y| y.1.total_cmp(&x.1));
        edges.truncate(top_n);
        Some(edges)
    }

    /// Sum of all edge weights incident to a character.
    pub fn popularity_score(&self, name: &str) -> Option<f64> {
        let node = self.node_index(name)?;
        Some(self.graph.edges(node).map(|e| *e.weight()).sum())
    }
}

impl Default for CharacterGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the complete weighted graph over a matrix's characters.
#[derive(Debug, Clone, Copy)]
pub struct GraphBuilder {
    /// Policy `low_support_zero_weight`: when two characters together
    /// appear in at most two episodes, their edge weight is forced to 0
    /// instead of computed, so two one-episode characters sharing that
    /// single episode do not produce a spurious weight-1 edge.
    pub low_support_zero_weight: bool,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self {
            low_support_zero_weight: true,
        }
    }
}

impl GraphBuilder {
    /// Produces a complete graph: every unordered pair of characters gets
    /// exactly one edge, `weight = dot(u, v) / max(sum(u), sum(v))`.
    /// Zero-weight edges are real edges; the trimming sweep needs them.
    pub fn build(&self, matrix: &AppearanceMatrix) -> Result<CharacterGraph> {
        let mut graph = CharacterGraph::new();
        if matrix.is_empty() {
            return Ok(graph);
        }

        let slots = matrix.episode_count();
        if let Some((name, vector)) = matrix.iter().find(|(_, v)| v.len() != slots) {
            return Err(Error::Precondition(format!(
                "appearance vector for {name:?} has length {}, expected {slots}",
                vector.len()
            )));
        }

        let nodes: Vec<(NodeIndex, &Vec<u8>)> = matrix
            .iter()
            .map(|(name, vector)| (graph.add_character(name.clone()), vector))
            .collect();

        for (i, (a, vec_a)) in nodes.iter().enumerate() {
            for (b, vec_b) in &nodes[i + 1..] {
                graph.add_relation(*a, *b, self.weight(vec_a, vec_b));
            }
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built complete co-occurrence graph"
        );
        Ok(graph)
    }

    fn weight(&self, a: &[u8], b: &[u8]) -> f64 {
        let sum_a = appearance_count(a);
        let sum_b = appearance_count(b);
        if self.low_support_zero_weight && sum_a + sum_b <= 2 {
            return 0.0;
        }
        let denominator = sum_a.max(sum_b);
        if denominator == 0 {
            return 0.0;
        }
        let dot: usize = a.iter().zip(b).map(|(&x, &y)| (x * y) as usize).sum();
        dot as f64 / denominator as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn matrix(rows: &[(&str, &[u8])]) -> AppearanceMatrix {
        AppearanceMatrix::from_vectors(
            rows.iter()
                .map(|(name, v)| (name.to_string(), v.to_vec()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    #[test]
    fn graph_is_complete_and_symmetric() {
        let m = matrix(&[
            ("A", &[1, 1, 0, 0]),
            ("B", &[1, 1, 1, 0]),
            ("C", &[0, 0, 1, 1]),
        ]);
        let graph = GraphBuilder::default().build(&m).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3); // C(3, 2)
        for (a, b) in [("A", "B"), ("A", "C"), ("B", "C")] {
            let forward = graph.relation_weight(a, b).unwrap();
            let backward = graph.relation_weight(b, a).unwrap();
            assert_eq!(forward, backward);
            assert!((0.0..=1.0).contains(&forward));
        }
    }

    #[test]
    fn weights_match_normalized_dot_product() {
        let m = matrix(&[
            ("A", &[1, 1, 0, 0]),
            ("B", &[1, 1, 1, 0]),
            ("C", &[0, 0, 1, 1]),
        ]);
        let graph = GraphBuilder::default().build(&m).unwrap();
        assert!((graph.relation_weight("A", "B").unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(graph.relation_weight("A", "C").unwrap(), 0.0);
        assert!((graph.relation_weight("B", "C").unwrap() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn zero_overlap_still_produces_edges() {
        let m = matrix(&[("A", &[1, 1, 0, 0]), ("B", &[0, 0, 1, 1])]);
        let graph = GraphBuilder::default().build(&m).unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.relation_weight("A", "B").unwrap(), 0.0);
    }

    #[test]
    fn low_support_pairs_are_zeroed() {
        let m = matrix(&[("A", &[1, 0]), ("B", &[1, 0])]);
        let graph = GraphBuilder::default().build(&m).unwrap();
        assert_eq!(graph.relation_weight("A", "B").unwrap(), 0.0);

        let permissive = GraphBuilder {
            low_support_zero_weight: false,
        };
        let graph = permissive.build(&m).unwrap();
        assert_eq!(graph.relation_weight("A", "B").unwrap(), 1.0);
    }

    #[test]
    fn empty_matrix_builds_empty_graph() {
        let graph = GraphBuilder::default().build(&matrix(&[])).unwrap();
        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn mismatched_vector_lengths_violate_precondition() {
        let m = matrix(&[("A", &[1, 1, 0]), ("B", &[1, 1])]);
        assert!(matches!(
            GraphBuilder::default().build(&m),
            Err(Error::Precondition(_))
        ));
    }

    #[test]
    fn top_edges_and_relationship_queries() {
        let m = matrix(&[
            ("A", &[1, 1, 0, 0]),
            ("B", &[1, 1, 1, 0]),
            ("C", &[0, 0, 1, 1]),
        ]);
        let graph = GraphBuilder::default().build(&m).unwrap();

        let top = graph.top_edges(2);
        assert_eq!(top.len(), 2);
        assert!((top[0].2 - 2.0 / 3.0).abs() < 1e-12);
        assert!(top[0].2 >= top[1].2);

        let friends = graph.top_relationships("B", 5).unwrap();
        assert_eq!(friends[0].0, "A");
        assert!(graph.top_relationships("Nobody", 5).is_none());

        let score = graph.popularity_score("B").unwrap();
        assert!((score - (2.0 / 3.0 + 1.0 / 3.0)).abs() < 1e-12);
    }
}
