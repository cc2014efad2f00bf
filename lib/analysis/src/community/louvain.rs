//! Louvain modularity optimization.
//!
//! Local moving followed by aggregation, repeated until a level moves no
//! node. Node visiting order is shuffled once per level with the seed, and
//! candidate communities are scanned in ascending id so equal gains resolve
//! the same way every run.

use super::{CommunityParams, Outcome};
use crate::adjacency::WeightedGraph;
use ahash::AHashMap;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

const MIN_GAIN: f64 = 1e-12;

/// One aggregation level. Internal weight of a collapsed community only
/// survives in its strength, so `adj` never holds self loops.
struct Level {
    adj: Vec<Vec<(usize, f64)>>,
    strength: Vec<f64>,
}

impl Level {
    fn from_graph(graph: &WeightedGraph) -> Self {
        let n = graph.node_count();
        let adj: Vec<Vec<(usize, f64)>> = (0..n)
            .map(|u| graph.neighbors(u).iter().map(|&(v, w, _)| (v, w)).collect())
            .collect();
        let strength = (0..n).map(|u| graph.strength(u)).collect();
        Self { adj, strength }
    }

    fn len(&self) -> usize {
        self.adj.len()
    }

    /// Collapses each community into one node.
    fn aggregate(&self, community: &[usize], count: usize) -> Level {
        let mut strength = vec![0.0; count];
        let mut links: Vec<AHashMap<usize, f64>> = vec![AHashMap::new(); count];
        for u in 0..self.len() {
            let cu = community[u];
            strength[cu] += self.strength[u];
            for &(v, w) in &self.adj[u] {
                let cv = community[v];
                if cu != cv {
                    *links[cu].entry(cv).or_insert(0.0) += w;
                }
            }
        }
        let adj = links
            .into_iter()
            .map(|m| {
                let mut list: Vec<(usize, f64)> = m.into_iter().collect();
                list.sort_by_key(|&(v, _)| v);
                list
            })
            .collect();
        Level { adj, strength }
    }
}

pub(crate) fn louvain(graph: &WeightedGraph, params: &CommunityParams) -> Outcome {
    let n = graph.node_count();
    let two_m = 2.0 * graph.total_weight();
    if two_m <= 0.0 {
        return Outcome::converged((0..n).map(|u| vec![u]).collect());
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut membership: Vec<usize> = (0..n).collect();
    let mut level = Level::from_graph(graph);
    let mut exhausted = None;
    let mut passes = 0usize;

    loop {
        let (community, count, moved, finished) =
            local_moving(&level, two_m, params.resolution, params.max_iterations, &mut rng);
        passes += 1;
        if !finished {
            exhausted = Some(params.max_iterations);
        }
        for m in membership.iter_mut() {
            *m = community[*m];
        }
        if !moved || count == level.len() || exhausted.is_some() {
            break;
        }
        if passes >= params.max_iterations {
            exhausted = Some(params.max_iterations);
            break;
        }
        level = level.aggregate(&community, count);
    }

    let groups_count = membership.iter().copied().max().map_or(0, |m| m + 1);
    let mut groups = vec![Vec::new(); groups_count];
    for (u, &c) in membership.iter().enumerate() {
        groups[c].push(u);
    }
    Outcome { groups, exhausted }
}

/// Returns `(community per node, community count, any node moved, converged)`.
/// Communities are renumbered by first appearance in node order.
fn local_moving(
    level: &Level,
    two_m: f64,
    resolution: f64,
    max_sweeps: usize,
    rng: &mut StdRng,
) -> (Vec<usize>, usize, bool, bool) {
    let n = level.len();
    let mut community: Vec<usize> = (0..n).collect();
    let mut total: Vec<f64> = level.strength.clone();
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);

    let mut moved_any = false;
    let mut converged = false;
    let mut weights: AHashMap<usize, f64> = AHashMap::new();

    for _ in 0..max_sweeps {
        let mut moved = false;
        for &u in &order {
            let cu = community[u];
            let k = level.strength[u];

            weights.clear();
            for &(v, w) in &level.adj[u] {
                *weights.entry(community[v]).or_insert(0.0) += w;
            }

            total[cu] -= k;
            let gain = |c: usize, w_in: f64, total: &[f64]| w_in - resolution * total[c] * k / two_m;
            let mut best = cu;
            let mut best_gain = gain(cu, weights.get(&cu).copied().unwrap_or(0.0), &total);

            let mut candidates: Vec<(usize, f64)> = weights.iter().map(|(&c, &w)| (c, w)).collect();
            candidates.sort_by_key(|&(c, _)| c);
            for (c, w_in) in candidates {
                let g = gain(c, w_in, &total);
                if g > best_gain + MIN_GAIN {
                    best = c;
                    best_gain = g;
                }
            }

            total[best] += k;
            if best != cu {
                community[u] = best;
                moved = true;
                moved_any = true;
            }
        }
        if !moved {
            converged = true;
            break;
        }
    }

    let mut renumber = vec![usize::MAX; n];
    let mut count = 0;
    for c in community.iter_mut() {
        if renumber[*c] == usize::MAX {
            renumber[*c] = count;
            count += 1;
        }
        *c = renumber[*c];
    }
    (community, count, moved_any, converged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cograph_core::{Graph, Link, Point};

    fn ring_of_triangles() -> WeightedGraph {
        // Four triangles, consecutive ones joined by a single edge.
        let mut points = Vec::new();
        let mut links = Vec::new();
        for t in 0..4 {
            let ids: Vec<String> = (0..3).map(|i| format!("t{}n{}", t, i)).collect();
            for id in &ids {
                points.push(Point::new(id.clone(), id.clone()));
            }
            links.push(Link::new(ids[0].clone(), ids[1].clone(), 3));
            links.push(Link::new(ids[1].clone(), ids[2].clone(), 3));
            links.push(Link::new(ids[0].clone(), ids[2].clone(), 3));
            links.push(Link::new(ids[2].clone(), format!("t{}n0", (t + 1) % 4), 1));
        }
        WeightedGraph::from_graph(&Graph::new(points, links))
    }

    fn sorted(outcome: Outcome) -> Vec<Vec<usize>> {
        let mut groups: Vec<Vec<usize>> = outcome.groups.into_iter().filter(|g| !g.is_empty()).collect();
        groups.sort();
        groups
    }

    #[test]
    fn test_finds_triangles() {
        let g = ring_of_triangles();
        let groups = sorted(louvain(&g, &CommunityParams::default()));
        assert_eq!(groups.len(), 4);
        assert!(groups.iter().all(|c| c.len() == 3));
    }

    #[test]
    fn test_same_seed_same_partition() {
        let g = ring_of_triangles();
        let params = CommunityParams {
            seed: 7,
            ..CommunityParams::default()
        };
        assert_eq!(sorted(louvain(&g, &params)), sorted(louvain(&g, &params)));
    }

    #[test]
    fn test_low_resolution_merges() {
        let g = ring_of_triangles();
        let params = CommunityParams {
            resolution: 0.01,
            ..CommunityParams::default()
        };
        let groups = sorted(louvain(&g, &params));
        assert!(groups.len() < 4);
    }

    #[test]
    fn test_iteration_budget_reports_exhaustion() {
        let g = ring_of_triangles();
        let params = CommunityParams {
            max_iterations: 1,
            ..CommunityParams::default()
        };
        let outcome = louvain(&g, &params);
        assert_eq!(outcome.exhausted, Some(1));
        let covered: usize = outcome.groups.iter().map(Vec::len).sum();
        assert_eq!(covered, 12);
    }

    #[test]
    fn test_unexhausted_runs_are_final() {
        let g = ring_of_triangles();
        for resolution in [1.0, 0.01] {
            let unbounded = CommunityParams {
                resolution,
                ..CommunityParams::default()
            };
            let reference = sorted(louvain(&g, &unbounded));
            for max_iterations in 1..=6 {
                let params = CommunityParams {
                    max_iterations,
                    ..unbounded.clone()
                };
                let outcome = louvain(&g, &params);
                if outcome.exhausted.is_none() {
                    assert_eq!(sorted(outcome), reference, "budget {}", max_iterations);
                }
            }
        }
    }
}
