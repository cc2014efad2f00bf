//! Brandes edge betweenness.
//!
//! Weighted runs treat link weight as path length (Dijkstra); unweighted runs
//! use BFS. Sources are processed in parallel in fixed-size chunks and the
//! chunk totals are added up in source order, so scores do not depend on
//! thread scheduling.

use crate::adjacency::WeightedGraph;
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

const SOURCES_PER_CHUNK: usize = 32;

/// Raw edge betweenness indexed like [`WeightedGraph::edges`].
///
/// Each unordered pair is counted from both ends, matching the usual
/// undirected accumulation before rescaling.
pub(crate) fn edge_betweenness(graph: &WeightedGraph, weighted: bool) -> Vec<f64> {
    let n = graph.node_count();
    let m = graph.edge_count();
    if n == 0 || m == 0 {
        return vec![0.0; m];
    }

    let sources: Vec<usize> = (0..n).collect();
    let partials: Vec<Vec<f64>> = sources
        .par_chunks(SOURCES_PER_CHUNK)
        .map(|chunk| {
            let mut acc = vec![0.0; m];
            let mut state = Traversal::new(n);
            for &s in chunk {
                state.run(graph, s, weighted);
                state.accumulate(&mut acc);
            }
            acc
        })
        .collect();

    let mut total = vec![0.0; m];
    for partial in partials {
        for (t, p) in total.iter_mut().zip(partial) {
            *t += p;
        }
    }
    total
}

/// Per-source scratch space, reused across sources of one chunk.
struct Traversal {
    order: Vec<usize>,
    preds: Vec<Vec<(usize, usize)>>,
    sigma: Vec<f64>,
    dist: Vec<f64>,
    delta: Vec<f64>,
}

impl Traversal {
    fn new(n: usize) -> Self {
        Self {
            order: Vec::with_capacity(n),
            preds: vec![Vec::new(); n],
            sigma: vec![0.0; n],
            dist: vec![f64::INFINITY; n],
            delta: vec![0.0; n],
        }
    }

    fn reset(&mut self) {
        self.order.clear();
        for p in &mut self.preds {
            p.clear();
        }
        self.sigma.iter_mut().for_each(|x| *x = 0.0);
        self.dist.iter_mut().for_each(|x| *x = f64::INFINITY);
        self.delta.iter_mut().for_each(|x| *x = 0.0);
    }

    fn run(&mut self, graph: &WeightedGraph, source: usize, weighted: bool) {
        self.reset();
        self.sigma[source] = 1.0;
        self.dist[source] = 0.0;
        if weighted {
            self.dijkstra(graph, source);
        } else {
            self.bfs(graph, source);
        }
    }

    fn bfs(&mut self, graph: &WeightedGraph, source: usize) {
        let mut queue = VecDeque::from([source]);
        while let Some(u) = queue.pop_front() {
            self.order.push(u);
            for &(v, _, e) in graph.neighbors(u) {
                if self.dist[v].is_infinite() {
                    self.dist[v] = self.dist[u] + 1.0;
                    queue.push_back(v);
                }
                if self.dist[v] == self.dist[u] + 1.0 {
                    self.sigma[v] += self.sigma[u];
                    self.preds[v].push((u, e));
                }
            }
        }
    }

    fn dijkstra(&mut self, graph: &WeightedGraph, source: usize) {
        let mut settled = vec![false; graph.node_count()];
        let mut heap = BinaryHeap::new();
        heap.push(Reverse((OrderedFloat(0.0), source)));
        while let Some(Reverse((OrderedFloat(d), u))) = heap.pop() {
            if settled[u] || d > self.dist[u] {
                continue;
            }
            settled[u] = true;
            self.order.push(u);
            for &(v, w, e) in graph.neighbors(u) {
                let alt = d + w;
                if alt < self.dist[v] {
                    self.dist[v] = alt;
                    self.sigma[v] = self.sigma[u];
                    self.preds[v].clear();
                    self.preds[v].push((u, e));
                    heap.push(Reverse((OrderedFloat(alt), v)));
                } else if alt == self.dist[v] && !settled[v] {
                    self.sigma[v] += self.sigma[u];
                    self.preds[v].push((u, e));
                }
            }
        }
    }

    /// Back-propagates dependencies of the last run into `acc`.
    fn accumulate(&mut self, acc: &mut [f64]) {
        while let Some(w) = self.order.pop() {
            let coeff = (1.0 + self.delta[w]) / self.sigma[w];
            for &(v, e) in &self.preds[w] {
                let c = self.sigma[v] * coeff;
                acc[e] += c;
                self.delta[v] += c;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cograph_core::{Graph, Link, Point};

    fn path(weights: &[u32]) -> WeightedGraph {
        let ids: Vec<String> = (0..=weights.len()).map(|i| format!("n{}", i)).collect();
        let points = ids.iter().map(|id| Point::new(id.clone(), id.clone())).collect();
        let links = weights
            .iter()
            .enumerate()
            .map(|(i, &w)| Link::new(ids[i].clone(), ids[i + 1].clone(), w))
            .collect();
        WeightedGraph::from_graph(&Graph::new(points, links))
    }

    #[test]
    fn test_path_counts_both_directions() {
        // n0 - n1 - n2: each edge carries 2 of the 3 pairs, counted twice.
        let scores = edge_betweenness(&path(&[1, 1]), false);
        assert_eq!(scores, vec![4.0, 4.0]);
    }

    #[test]
    fn test_weights_change_shortest_paths() {
        let graph = Graph::new(
            vec![Point::new("a", "a"), Point::new("b", "b"), Point::new("c", "c")],
            vec![Link::new("a", "b", 1), Link::new("b", "c", 1), Link::new("a", "c", 5)],
        );
        let g = WeightedGraph::from_graph(&graph);
        let weighted = edge_betweenness(&g, true);
        // a-c is longer than a-b-c and lies on no shortest path.
        assert_eq!(weighted[1], 0.0);
        assert_eq!(weighted[0], 4.0);

        let unweighted = edge_betweenness(&g, false);
        assert_eq!(unweighted, vec![2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_split_paths_share_credit() {
        // Square: diagonals split their credit over two shortest paths.
        let graph = Graph::new(
            ["a", "b", "c", "d"].iter().map(|id| Point::new(*id, *id)).collect(),
            vec![Link::new("a", "b", 1), Link::new("a", "c", 1), Link::new("b", "d", 1), Link::new("c", "d", 1)],
        );
        let scores = edge_betweenness(&WeightedGraph::from_graph(&graph), false);
        assert_eq!(scores, vec![4.0, 4.0, 4.0, 4.0]);
    }

    #[test]
    fn test_parallel_chunks_are_deterministic() {
        let weights: Vec<u32> = (0..120).map(|i| (i % 4 + 1) as u32).collect();
        let g = path(&weights);
        assert_eq!(edge_betweenness(&g, true), edge_betweenness(&g, true));
    }
}
