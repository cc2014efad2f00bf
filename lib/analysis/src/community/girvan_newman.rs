//! Girvan-Newman divisive clustering.
//!
//! The edge with the highest unweighted betweenness is removed until the
//! number of connected components grows; that is one split. Betweenness is
//! recomputed after every removal. Equal scores remove the edge that comes
//! first in canonical order.

use super::{CommunityParams, Outcome};
use crate::adjacency::WeightedGraph;
use crate::edges::edge_betweenness;

const TIE_EPS: f64 = 1e-9;

pub(crate) fn girvan_newman(graph: &WeightedGraph, params: &CommunityParams) -> Outcome {
    let splits = params.best_n.unwrap_or(1);
    let mut current = graph.clone();
    let mut components = current.components().len();

    for _ in 0..splits {
        let target = components + 1;
        while components < target && current.edge_count() > 0 {
            let scores = edge_betweenness(&current, false);
            let top = scores.iter().copied().fold(f64::MIN, f64::max);
            let Some(e) = scores.iter().position(|&s| s >= top - TIE_EPS) else {
                break;
            };
            current = current.without_edge(e);
            components = current.components().len();
        }
        if current.edge_count() == 0 {
            break;
        }
    }

    tracing::debug!(components, "girvan-newman finished");
    Outcome::converged(current.components())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cograph_core::{Graph, Link, Point};

    fn graph(ids: &[&str], links: &[(&str, &str, u32)]) -> WeightedGraph {
        WeightedGraph::from_graph(&Graph::new(
            ids.iter().map(|id| Point::new(*id, *id)).collect(),
            links.iter().map(|&(a, b, w)| Link::new(a, b, w)).collect(),
        ))
    }

    fn barbell() -> WeightedGraph {
        graph(
            &["a", "b", "c", "d", "e", "f"],
            &[
                ("a", "b", 1),
                ("b", "c", 1),
                ("a", "c", 1),
                ("c", "d", 9),
                ("d", "e", 1),
                ("e", "f", 1),
                ("d", "f", 1),
            ],
        )
    }

    #[test]
    fn test_single_split_cuts_the_bridge() {
        // Weight is ignored: the heavy bridge still goes first.
        let outcome = girvan_newman(&barbell(), &CommunityParams::default());
        assert_eq!(outcome.groups, vec![vec![0, 1, 2], vec![3, 4, 5]]);
    }

    #[test]
    fn test_more_splits_than_possible() {
        let g = graph(&["a", "b", "c"], &[("a", "b", 1), ("b", "c", 1)]);
        let params = CommunityParams {
            best_n: Some(10),
            ..CommunityParams::default()
        };
        let outcome = girvan_newman(&g, &params);
        assert_eq!(outcome.groups, vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn test_path_splits_at_center_edge_first() {
        // a-b-c-d: the middle edge carries the most paths.
        let g = graph(&["a", "b", "c", "d"], &[("a", "b", 1), ("b", "c", 1), ("c", "d", 1)]);
        let outcome = girvan_newman(&g, &CommunityParams::default());
        assert_eq!(outcome.groups, vec![vec![0, 1], vec![2, 3]]);
    }
}
