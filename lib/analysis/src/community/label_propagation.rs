//! Asynchronous label propagation.
//!
//! Each node starts with its own label. A sweep visits the nodes in a
//! seeded random order and gives each the label with the largest summed
//! link weight among its neighbors, taking the smallest label on ties.
//! The run has converged once every node already carries one of its best
//! labels.

use super::{CommunityParams, Outcome};
use crate::adjacency::WeightedGraph;
use ahash::AHashMap;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

const EPS: f64 = 1e-12;

pub(crate) fn label_propagation(graph: &WeightedGraph, params: &CommunityParams) -> Outcome {
    let n = graph.node_count();
    let mut labels: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut order: Vec<usize> = (0..n).collect();
    let mut scores: AHashMap<usize, f64> = AHashMap::new();
    let mut exhausted = Some(params.max_iterations);

    for sweep in 0..params.max_iterations {
        order.shuffle(&mut rng);
        for &u in &order {
            if let Some(best) = best_labels(graph, &labels, u, &mut scores).first() {
                labels[u] = *best;
            }
        }
        let stable = (0..n).all(|u| {
            let best = best_labels(graph, &labels, u, &mut scores);
            best.is_empty() || best.contains(&labels[u])
        });
        if stable {
            tracing::debug!(sweeps = sweep + 1, "label propagation converged");
            exhausted = None;
            break;
        }
    }

    let mut groups: AHashMap<usize, Vec<usize>> = AHashMap::new();
    for (u, &label) in labels.iter().enumerate() {
        groups.entry(label).or_default().push(u);
    }
    let mut groups: Vec<Vec<usize>> = groups.into_iter().map(|(_, members)| members).collect();
    groups.sort_by_key(|g| g[0]);
    Outcome { groups, exhausted }
}

/// Labels with the largest neighbor weight around `u`, ascending.
fn best_labels(graph: &WeightedGraph, labels: &[usize], u: usize, scores: &mut AHashMap<usize, f64>) -> Vec<usize> {
    scores.clear();
    for &(v, w, _) in graph.neighbors(u) {
        *scores.entry(labels[v]).or_insert(0.0) += w;
    }
    let Some(top) = scores.values().copied().reduce(f64::max) else {
        return Vec::new();
    };
    let mut best: Vec<usize> = scores
        .iter()
        .filter(|&(_, &s)| s >= top - EPS)
        .map(|(&label, _)| label)
        .collect();
    best.sort_unstable();
    best
}
