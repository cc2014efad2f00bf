//! Clauset-Newman-Moore greedy modularity agglomeration.
//!
//! Every node starts alone; at each step the pair of linked communities with
//! the largest modularity gain is merged. Only linked communities are ever
//! merged, so components never join.

use super::{CommunityParams, Outcome};
use crate::adjacency::WeightedGraph;
use ahash::AHashMap;

pub(crate) fn greedy_modularity(graph: &WeightedGraph, params: &CommunityParams) -> Outcome {
    let n = graph.node_count();
    let two_m = 2.0 * graph.total_weight();
    if two_m <= 0.0 {
        return Outcome::converged((0..n).map(|u| vec![u]).collect());
    }

    // a_i = k_i / 2m; links[i][j] = w_ij / 2m (e_ij)
    let mut a: Vec<f64> = (0..n).map(|u| graph.strength(u) / two_m).collect();
    let mut links: Vec<AHashMap<usize, f64>> = (0..n)
        .map(|u| graph.neighbors(u).iter().map(|&(v, w, _)| (v, w / two_m)).collect())
        .collect();
    let mut members: Vec<Vec<usize>> = (0..n).map(|u| vec![u]).collect();
    let mut alive = vec![true; n];
    let mut count = n;

    loop {
        let mut best: Option<(f64, usize, usize)> = None;
        for i in 0..n {
            if !alive[i] {
                continue;
            }
            for (&j, &e_ij) in &links[i] {
                if j <= i {
                    continue;
                }
                let dq = 2.0 * (e_ij - params.resolution * a[i] * a[j]);
                let better = match best {
                    None => true,
                    Some((q, bi, bj)) => dq > q || (dq == q && (i, j) < (bi, bj)),
                };
                if better {
                    best = Some((dq, i, j));
                }
            }
        }

        let Some((dq, i, j)) = best else { break };
        let forced = params.best_n.is_some_and(|target| count > target);
        if dq <= 0.0 && !forced {
            break;
        }

        // Merge j into i.
        let absorbed = std::mem::take(&mut links[j]);
        for (k, e_jk) in absorbed {
            if k == i {
                continue;
            }
            *links[i].entry(k).or_insert(0.0) += e_jk;
            let back = links[k].remove(&j).unwrap_or(0.0);
            *links[k].entry(i).or_insert(0.0) += back;
        }
        links[i].remove(&j);
        a[i] += a[j];
        a[j] = 0.0;
        let moved = std::mem::take(&mut members[j]);
        members[i].extend(moved);
        alive[j] = false;
        count -= 1;
    }

    tracing::debug!(communities = count, "greedy modularity finished");
    Outcome::converged(members.into_iter().filter(|m| !m.is_empty()).collect())
}
