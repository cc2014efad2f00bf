//! Kernighan-Lin bisection.
//!
//! The nodes are shuffled with the seed and split into two halves. Each pass
//! tentatively swaps the best remaining pair until every node is locked,
//! then keeps the prefix of swaps with the largest cumulative cut reduction.
//! Passes repeat until no prefix improves the cut.

use super::{CommunityParams, Outcome};
use crate::adjacency::WeightedGraph;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

const EPS: f64 = 1e-12;

pub(crate) fn kernighan_lin(graph: &WeightedGraph, params: &CommunityParams) -> Outcome {
    let n = graph.node_count();
    if n < 2 {
        return Outcome::converged((0..n).map(|u| vec![u]).collect());
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(params.seed));
    // right[u] is true for the second half.
    let mut right = vec![false; n];
    for &u in &order[n / 2..] {
        right[u] = true;
    }

    let mut exhausted = Some(params.max_iterations);
    for pass in 0..params.max_iterations {
        let swaps = run_pass(graph, &right);
        if swaps.is_empty() {
            tracing::debug!(passes = pass + 1, "kernighan-lin converged");
            exhausted = None;
            break;
        }
        for (a, b) in swaps {
            right[a] = true;
            right[b] = false;
        }
    }

    let (left_side, right_side): (Vec<usize>, Vec<usize>) = (0..n).partition(|&u| !right[u]);
    Outcome {
        groups: vec![left_side, right_side],
        exhausted,
    }
}

/// One pass; returns the improving prefix of `(left node, right node)` swaps,
/// empty when no prefix reduces the cut.
fn run_pass(graph: &WeightedGraph, right: &[bool]) -> Vec<(usize, usize)> {
    let n = graph.node_count();
    // D = external - internal weight.
    let mut d: Vec<f64> = (0..n)
        .map(|u| {
            graph
                .neighbors(u)
                .iter()
                .map(|&(v, w, _)| if right[v] != right[u] { w } else { -w })
                .sum()
        })
        .collect();
    let mut locked = vec![false; n];
    let mut swaps = Vec::new();
    let mut gains = Vec::new();

    loop {
        let mut best: Option<(f64, usize, usize)> = None;
        for a in (0..n).filter(|&a| !locked[a] && !right[a]) {
            for b in (0..n).filter(|&b| !locked[b] && right[b]) {
                let gain = d[a] + d[b] - 2.0 * graph.weight(a, b).unwrap_or(0.0);
                if best.map_or(true, |(g, _, _)| gain > g + EPS) {
                    best = Some((gain, a, b));
                }
            }
        }
        let Some((gain, a, b)) = best else { break };
        locked[a] = true;
        locked[b] = true;
        swaps.push((a, b));
        gains.push(gain);

        for &(x, w, _) in graph.neighbors(a) {
            if !locked[x] {
                // x on a's old side loses an internal neighbor; on b's side it gains one.
                d[x] += if right[x] { -2.0 * w } else { 2.0 * w };
            }
        }
        for &(y, w, _) in graph.neighbors(b) {
            if !locked[y] {
                d[y] += if right[y] { 2.0 * w } else { -2.0 * w };
            }
        }
    }

    let mut best_k = 0;
    let mut best_total = 0.0;
    let mut total = 0.0;
    for (k, g) in gains.iter().enumerate() {
        total += g;
        if total > best_total + EPS {
            best_total = total;
            best_k = k + 1;
        }
    }
    swaps.truncate(best_k);
    swaps
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

    fn cut(g: &WeightedGraph, groups: &[Vec<usize>]) -> f64 {
        g.edges()
            .iter()
            .filter(|e| groups[0].contains(&e.u) != groups[0].contains(&e.v))
            .map(|e| e.weight)
            .sum()
    }

    #[test]
    fn test_finds_minimum_cut_for_any_seed() {
        let g = graph(
            &["a", "b", "c", "d", "e", "f"],
            &[
                ("a", "b", 3),
                ("b", "c", 3),
                ("a", "c", 3),
                ("c", "d", 1),
                ("d", "e", 3),
                ("e", "f", 3),
                ("d", "f", 3),
            ],
        );
        for seed in 0..8 {
            let params = CommunityParams {
                seed,
                ..CommunityParams::default()
            };
            let outcome = kernighan_lin(&g, &params);
            assert!(outcome.exhausted.is_none());
            assert_eq!(outcome.groups.len(), 2);
            assert_eq!(outcome.groups[0].len(), 3);
            assert_eq!(cut(&g, &outcome.groups), 1.0, "seed {}", seed);
        }
    }

    #[test]
    fn test_two_nodes_split() {
        let g = graph(&["a", "b"], &[("a", "b", 1)]);
        let outcome = kernighan_lin(&g, &CommunityParams::default());
        assert_eq!(outcome.groups.len(), 2);
        assert_eq!(outcome.groups[0].len() + outcome.groups[1].len(), 2);
        assert!(outcome.groups.iter().all(|g| g.len() == 1));
    }
}
