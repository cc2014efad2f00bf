//! Current-flow (random-walk) edge betweenness.
//!
//! Each connected component is treated as an electrical network with link
//! weights as conductances. For a unit current injected at `s` and drawn at
//! `t`, the current through edge `(u, v)` is `w * (C[u,s] - C[v,s] - C[u,t] + C[v,t])`
//! where `C` is the inverse of the Laplacian grounded at one node. Summing
//! its absolute value over all pairs `s < t` gives the edge score; the sum is
//! computed per edge in `O(n log n)` by sorting the edge's potential row.

use crate::adjacency::WeightedGraph;

/// Current-flow scores indexed like [`WeightedGraph::edges`].
///
/// Normalized scores divide by `(n-1)(n-2)` for a component of `n` nodes
/// (by 1 when `n <= 2`); unnormalized scores divide by 2. Edges of a
/// component whose Laplacian is singular score 0.
pub(crate) fn current_flow_betweenness(graph: &WeightedGraph, normalized: bool) -> Vec<f64> {
    let mut scores = vec![0.0; graph.edge_count()];
    for component in graph.components() {
        let n = component.len();
        if n < 2 {
            continue;
        }
        let Some(inverse) = grounded_inverse(graph, &component) else {
            tracing::warn!(nodes = n, "singular Laplacian; component left unscored");
            continue;
        };

        let mut local = vec![usize::MAX; graph.node_count()];
        for (i, &node) in component.iter().enumerate() {
            local[node] = i;
        }
        let scale = if normalized {
            if n > 2 {
                ((n - 1) * (n - 2)) as f64
            } else {
                1.0
            }
        } else {
            2.0
        };

        let mut row = vec![0.0; n];
        for (e, edge) in graph.edges().iter().enumerate() {
            let (lu, lv) = (local[edge.u], local[edge.v]);
            if lu == usize::MAX {
                continue;
            }
            for (k, r) in row.iter_mut().enumerate() {
                *r = edge.weight * (inverse.get(lu, k) - inverse.get(lv, k));
            }
            scores[e] = pairwise_abs_sum(&mut row) / scale;
        }
    }
    scores
}

/// `sum_{i<j} |x_i - x_j|`; reorders `values`.
fn pairwise_abs_sum(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| b.total_cmp(a));
    let n = values.len() as f64;
    values
        .iter()
        .enumerate()
        .map(|(k, &x)| (n - 1.0 - 2.0 * k as f64) * x)
        .sum()
}

/// Dense `n x n` matrix, row-major.
struct Dense {
    n: usize,
    data: Vec<f64>,
}

impl Dense {
    fn zeros(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    #[inline]
    fn get(&self, r: usize, c: usize) -> f64 {
        self.data[r * self.n + c]
    }

    #[inline]
    fn set(&mut self, r: usize, c: usize, x: f64) {
        self.data[r * self.n + c] = x;
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for c in 0..self.n {
            self.data.swap(a * self.n + c, b * self.n + c);
        }
    }
}

/// Inverse of the component Laplacian with its first node grounded, padded
/// back to `n x n` with a zero row and column for the ground.
fn grounded_inverse(graph: &WeightedGraph, component: &[usize]) -> Option<Dense> {
    let n = component.len();
    let mut local = vec![usize::MAX; graph.node_count()];
    for (i, &node) in component.iter().enumerate() {
        local[node] = i;
    }

    // Reduced Laplacian over local nodes 1..n.
    let size = n - 1;
    let mut lap = Dense::zeros(size);
    for &node in component {
        let i = local[node];
        for &(nb, w, _) in graph.neighbors(node) {
            let j = local[nb];
            if i > 0 {
                lap.set(i - 1, i - 1, lap.get(i - 1, i - 1) + w);
                if j > 0 {
                    lap.set(i - 1, j - 1, lap.get(i - 1, j - 1) - w);
                }
            }
        }
    }

    let reduced = invert(lap)?;
    let mut full = Dense::zeros(n);
    for r in 0..size {
        for c in 0..size {
            full.set(r + 1, c + 1, reduced.get(r, c));
        }
    }
    Some(full)
}

/// Gauss-Jordan elimination with partial pivoting.
fn invert(mut a: Dense) -> Option<Dense> {
    let n = a.n;
    let mut inv = Dense::zeros(n);
    for i in 0..n {
        inv.set(i, i, 1.0);
    }

    for col in 0..n {
        let pivot = (col..n).max_by(|&x, &y| a.get(x, col).abs().total_cmp(&a.get(y, col).abs()))?;
        if a.get(pivot, col).abs() < 1e-12 {
            return None;
        }
        a.swap_rows(col, pivot);
        inv.swap_rows(col, pivot);

        let p = a.get(col, col);
        for c in 0..n {
            a.set(col, c, a.get(col, c) / p);
            inv.set(col, c, inv.get(col, c) / p);
        }
        for r in 0..n {
            if r == col {
                continue;
            }
            let factor = a.get(r, col);
            if factor == 0.0 {
                continue;
            }
            for c in 0..n {
                a.set(r, c, a.get(r, c) - factor * a.get(col, c));
                inv.set(r, c, inv.get(r, c) - factor * inv.get(col, c));
            }
        }
    }
    Some(inv)
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

    #[test]
    fn test_pairwise_abs_sum() {
        let mut values = vec![1.0, -2.0, 4.0];
        // |1+2| + |1-4| + |-2-4| = 3 + 3 + 6
        assert_eq!(pairwise_abs_sum(&mut values), 12.0);
    }

    #[test]
    fn test_inverse_of_small_matrix() {
        let mut m = Dense::zeros(2);
        m.set(0, 0, 2.0);
        m.set(0, 1, -1.0);
        m.set(1, 0, -1.0);
        m.set(1, 1, 2.0);
        let inv = invert(m).unwrap();
        assert!((inv.get(0, 0) - 2.0 / 3.0).abs() < 1e-12);
        assert!((inv.get(0, 1) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_path_matches_shortest_path_betweenness() {
        // On a tree every unit of current follows the unique path.
        let g = graph(&["a", "b", "c"], &[("a", "b", 1), ("b", "c", 1)]);
        let raw = current_flow_betweenness(&g, false);
        // Each edge carries 2 pairs; unnormalized divides the sum by 2.
        assert!((raw[0] - 1.0).abs() < 1e-9);
        assert!((raw[1] - 1.0).abs() < 1e-9);

        let norm = current_flow_betweenness(&g, true);
        assert!((norm[0] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_triangle_is_symmetric() {
        let g = graph(&["a", "b", "c"], &[("a", "b", 1), ("b", "c", 1), ("a", "c", 1)]);
        let scores = current_flow_betweenness(&g, true);
        assert!((scores[0] - scores[1]).abs() < 1e-9);
        assert!((scores[1] - scores[2]).abs() < 1e-9);
        assert!(scores[0] > 0.0);
    }

    #[test]
    fn test_components_scored_separately() {
        let g = graph(&["a", "b", "c", "d"], &[("a", "b", 2), ("c", "d", 1)]);
        let scores = current_flow_betweenness(&g, false);
        // A lone edge carries exactly its own pair, halved when unnormalized.
        assert!((scores[0] - 0.5).abs() < 1e-9);
        assert!((scores[1] - 0.5).abs() < 1e-9);
    }
}
