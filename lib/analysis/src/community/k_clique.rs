//! Clique percolation.
//!
//! Maximal cliques of at least `k` nodes are enumerated with pivoted
//! Bron-Kerbosch. Two cliques belong to the same community when they share
//! `k - 1` nodes. Communities may overlap and nodes in no k-clique are left
//! uncovered; ranking resolves both.

use super::Outcome;
use crate::adjacency::WeightedGraph;
use std::collections::BTreeSet;

pub(crate) fn k_clique(graph: &WeightedGraph, k: usize) -> Outcome {
    let n = graph.node_count();
    let neighbors: Vec<BTreeSet<usize>> = (0..n)
        .map(|u| graph.neighbors(u).iter().map(|&(v, _, _)| v).collect())
        .collect();

    let mut cliques = Vec::new();
    bron_kerbosch(
        &neighbors,
        &mut Vec::new(),
        (0..n).collect(),
        BTreeSet::new(),
        k,
        &mut cliques,
    );

    // Only cliques sharing a node can share k - 1 of them.
    let mut by_node: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (c, clique) in cliques.iter().enumerate() {
        for &u in clique {
            by_node[u].push(c);
        }
    }
    let mut sets = UnionFind::new(cliques.len());
    for list in &by_node {
        for (i, &a) in list.iter().enumerate() {
            for &b in &list[i + 1..] {
                if sets.find(a) != sets.find(b) && shared(&cliques[a], &cliques[b]) + 1 >= k {
                    sets.union(a, b);
                }
            }
        }
    }

    let mut communities: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); cliques.len()];
    for (c, clique) in cliques.iter().enumerate() {
        communities[sets.find(c)].extend(clique.iter().copied());
    }
    let groups: Vec<Vec<usize>> = communities
        .into_iter()
        .filter(|c| !c.is_empty())
        .map(|c| c.into_iter().collect())
        .collect();
    tracing::debug!(cliques = cliques.len(), communities = groups.len(), k, "clique percolation finished");
    Outcome::converged(groups)
}

/// Size of the intersection of two sorted cliques.
fn shared(a: &[usize], b: &[usize]) -> usize {
    let (mut i, mut j, mut count) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                count += 1;
                i += 1;
                j += 1;
            }
        }
    }
    count
}

/// Collects maximal cliques with at least `k` members, each sorted.
fn bron_kerbosch(
    neighbors: &[BTreeSet<usize>],
    r: &mut Vec<usize>,
    mut p: BTreeSet<usize>,
    mut x: BTreeSet<usize>,
    k: usize,
    out: &mut Vec<Vec<usize>>,
) {
    if p.is_empty() {
        if x.is_empty() && r.len() >= k {
            let mut clique = r.clone();
            clique.sort_unstable();
            out.push(clique);
        }
        return;
    }
    if r.len() + p.len() < k {
        return;
    }

    // Pivot on the node covering most of P.
    let pivot = p
        .iter()
        .chain(x.iter())
        .copied()
        .max_by_key(|&u| (p.intersection(&neighbors[u]).count(), std::cmp::Reverse(u)))
        .unwrap_or(0);
    let candidates: Vec<usize> = p.difference(&neighbors[pivot]).copied().collect();
    for v in candidates {
        r.push(v);
        let next_p = p.intersection(&neighbors[v]).copied().collect();
        let next_x = x.intersection(&neighbors[v]).copied().collect();
        bron_kerbosch(neighbors, r, next_p, next_x, k, out);
        r.pop();
        p.remove(&v);
        x.insert(v);
    }
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cograph_core::{Graph, Link, Point};

    fn graph(ids: &[&str], links: &[(&str, &str)]) -> WeightedGraph {
        WeightedGraph::from_graph(&Graph::new(
            ids.iter().map(|id| Point::new(*id, *id)).collect(),
            links.iter().map(|&(a, b)| Link::new(a, b, 1)).collect(),
        ))
    }

    fn sorted(outcome: Outcome) -> Vec<Vec<usize>> {
        let mut groups = outcome.groups;
        groups.sort();
        groups
    }

    #[test]
    fn test_adjacent_triangles_percolate() {
        // abc and bcd share an edge; de hangs off.
        let g = graph(
            &["a", "b", "c", "d", "e"],
            &[("a", "b"), ("a", "c"), ("b", "c"), ("b", "d"), ("c", "d"), ("d", "e")],
        );
        assert_eq!(sorted(k_clique(&g, 3)), vec![vec![0, 1, 2, 3]]);
    }

    #[test]
    fn test_triangles_sharing_one_node_stay_apart() {
        // Bowtie around "c".
        let g = graph(
            &["a", "b", "c", "d", "e"],
            &[("a", "b"), ("a", "c"), ("b", "c"), ("c", "d"), ("c", "e"), ("d", "e")],
        );
        assert_eq!(sorted(k_clique(&g, 3)), vec![vec![0, 1, 2], vec![2, 3, 4]]);
    }

    #[test]
    fn test_k_two_is_components() {
        let g = graph(&["a", "b", "c", "d"], &[("a", "b"), ("b", "c")]);
        assert_eq!(sorted(k_clique(&g, 2)), vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_shared_count() {
        assert_eq!(shared(&[1, 2, 5, 9], &[2, 3, 9]), 2);
        assert_eq!(shared(&[], &[1]), 0);
    }
}
