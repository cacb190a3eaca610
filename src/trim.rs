use petgraph::graph::NodeIndex;
use petgraph::unionfind::UnionFind;
use tracing::info;

use crate::error::{Error, Result};
use crate::graph::CharacterGraph;

/// Outcome of one trimming run.
#[derive(Debug, Clone)]
pub struct TrimResult {
    /// Largest weight θ such that dropping every edge with weight ≤ θ keeps
    /// the graph connected. 0 when nothing can be removed.
    pub cutoff_weight: f64,
    /// Share of the original edges removed, in [0, 100].
    pub percentage_removed: f64,
    pub graph: CharacterGraph,
}

/// Trims a connected graph down to the sparsest connected sub-graph whose
/// edges all exceed the computed cutoff weight.
///
/// A Kruskal sweep over the edges in descending weight order builds a
/// maximum spanning tree with a `UnionFind`; the minimum tree-edge weight is
/// the weakest weight connectivity still needs (bottleneck optimality), so
/// the cutoff is the largest edge weight strictly below it. The kept set is
/// every edge above the cutoff plus the tree itself, so the result never
/// drops below a spanning tree even when every weight is 0.
///
/// O(E log E) for the sort, near-O(E) for the union-find sweep. The input is
/// not mutated; a new graph is returned.
pub fn trim(graph: &CharacterGraph) -> Result<TrimResult> {
    let g = graph.as_petgraph();
    let node_count = g.node_count();
    if node_count <= 1 {
        return Ok(TrimResult {
            cutoff_weight: 0.0,
            percentage_removed: 0.0,
            graph: graph.clone(),
        });
    }

    let mut edges: Vec<(NodeIndex, NodeIndex, f64)> = g
        .edge_indices()
        .map(|e| {
            let (a, b) = g.edge_endpoints(e).expect("edge endpoints");
            (a, b, g[e])
        })
        .collect();

    // Heaviest first; equal weights fall back to the ordered name pair so
    // the sweep is deterministic.
    let name_pair = |a: NodeIndex, b: NodeIndex| {
        let (na, nb) = (g[a].as_str(), g[b].as_str());
        if na <= nb {
            (na, nb)
        } else {
            (nb, na)
        }
    };
    edges.sort_by(|x, y| {
        y.2.total_cmp(&x.2)
            .then_with(|| name_pair(x.0, x.1).cmp(&name_pair(y.0, y.1)))
    });

    let mut components = UnionFind::new(node_count);
    let mut tree = Vec::with_capacity(node_count - 1);
    let mut bottleneck = 0.0;
    for (i, &(a, b, weight)) in edges.iter().enumerate() {
        if components.union(a.index(), b.index()) {
            tree.push(i);
            // Descending sweep: the latest tree edge is the lightest so far.
            bottleneck = weight;
            if tree.len() == node_count - 1 {
                break;
            }
        }
    }
    if tree.len() != node_count - 1 {
        return Err(Error::Precondition(
            "graph is not connected; trimming requires a connected input".to_string(),
        ));
    }

    // Largest weight that can be excluded outright: the heaviest edge still
    // strictly below the bottleneck. With no such edge nothing is removable
    // beyond what the spanning-tree floor allows.
    let cutoff_weight = edges
        .iter()
        .map(|e| e.2)
        .find(|&w| w < bottleneck)
        .unwrap_or(0.0);

    let mut keep = vec![false; edges.len()];
    for (i, &(_, _, weight)) in edges.iter().enumerate() {
        keep[i] = weight > cutoff_weight;
    }
    for &i in &tree {
        keep[i] = true;
    }

    let mut trimmed = CharacterGraph::new();
    for node in g.node_indices() {
        trimmed.add_character(g[node].clone());
    }
    let mut kept = 0usize;
    for (i, &(a, b, weight)) in edges.iter().enumerate() {
        if keep[i] {
            trimmed.add_relation(a, b, weight);
            kept += 1;
        }
    }

    let total = edges.len();
    let percentage_removed = if total == 0 {
        0.0
    } else {
        100.0 * (total - kept) as f64 / total as f64
    };
    info!(
        cutoff_weight,
        percentage_removed,
        kept,
        total,
        "trimmed graph to connected core"
    );

    Ok(TrimResult {
        cutoff_weight,
        percentage_removed,
        graph: trimmed,
    })
}
