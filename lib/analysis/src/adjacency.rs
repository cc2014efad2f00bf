// Indexed weighted adjacency view over a Graph
use ahash::AHashMap;
use cograph_core::Graph;

/// Undirected edge `u < v` in dense indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub u: usize,
    pub v: usize,
    pub weight: f64,
}

/// Read-only adjacency lists over a [`Graph`].
///
/// Nodes are indexed in ascending id order, so a smaller index always means
/// a smaller id and index order doubles as the canonical tie-break.
#[derive(Debug, Clone, Default)]
pub struct WeightedGraph {
    ids: Vec<String>,
    /// `(neighbor, weight, edge index)`, sorted by neighbor.
    adj: Vec<Vec<(usize, f64, usize)>>,
    edges: Vec<Edge>,
}

impl WeightedGraph {
    /// Builds the view over every point of `graph`. Link endpoints missing
    /// from `points` are added as nodes; self links are ignored and repeated
    /// links between the same pair are summed.
    pub fn from_graph(graph: &Graph) -> Self {
        let mut ids: Vec<String> = graph.points.iter().map(|p| p.id.clone()).collect();
        for link in &graph.links {
            ids.push(link.source.clone());
            ids.push(link.target.clone());
        }
        ids.sort_unstable();
        ids.dedup();
        let index: AHashMap<&str, usize> = ids.iter().enumerate().map(|(i, id)| (id.as_str(), i)).collect();

        let mut merged: AHashMap<(usize, usize), f64> = AHashMap::new();
        for link in &graph.links {
            let (a, b) = (index[link.source.as_str()], index[link.target.as_str()]);
            if a == b {
                continue;
            }
            *merged.entry((a.min(b), a.max(b))).or_insert(0.0) += link.weight as f64;
        }
        let mut edges: Vec<Edge> = merged
            .into_iter()
            .map(|((u, v), weight)| Edge { u, v, weight })
            .collect();
        edges.sort_by(|a, b| (a.u, a.v).cmp(&(b.u, b.v)));

        Self::from_parts(ids, edges)
    }

    fn from_parts(ids: Vec<String>, edges: Vec<Edge>) -> Self {
        let mut adj = vec![Vec::new(); ids.len()];
        for (e, edge) in edges.iter().enumerate() {
            adj[edge.u].push((edge.v, edge.weight, e));
            adj[edge.v].push((edge.u, edge.weight, e));
        }
        for list in &mut adj {
            list.sort_by_key(|&(n, _, _)| n);
        }
        Self { ids, adj, edges }
    }

    /// Subgraph induced by the nodes whose ids are in `subset`. Unknown ids
    /// are ignored.
    pub fn induced<S: AsRef<str>>(&self, subset: &[S]) -> Self {
        let mut keep = vec![false; self.ids.len()];
        let index: AHashMap<&str, usize> = self.ids.iter().enumerate().map(|(i, id)| (id.as_str(), i)).collect();
        for id in subset {
            if let Some(&i) = index.get(id.as_ref()) {
                keep[i] = true;
            }
        }
        let mut remap = vec![usize::MAX; self.ids.len()];
        let mut ids = Vec::new();
        for (i, id) in self.ids.iter().enumerate() {
            if keep[i] {
                remap[i] = ids.len();
                ids.push(id.clone());
            }
        }
        let edges = self
            .edges
            .iter()
            .filter(|e| keep[e.u] && keep[e.v])
            .map(|e| Edge {
                u: remap[e.u],
                v: remap[e.v],
                weight: e.weight,
            })
            .collect();
        Self::from_parts(ids, edges)
    }

    /// Copy of this graph without edge `e`.
    pub(crate) fn without_edge(&self, e: usize) -> Self {
        let edges = self
            .edges
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != e)
            .map(|(_, edge)| *edge)
            .collect();
        Self::from_parts(self.ids.clone(), edges)
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn id(&self, node: usize) -> &str {
        &self.ids[node]
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[inline]
    pub fn neighbors(&self, node: usize) -> &[(usize, f64, usize)] {
        &self.adj[node]
    }

    /// Weighted degree (sum of incident edge weights).
    pub fn strength(&self, node: usize) -> f64 {
        self.adj[node].iter().map(|&(_, w, _)| w).sum()
    }

    pub fn total_weight(&self) -> f64 {
        self.edges.iter().map(|e| e.weight).sum()
    }

    /// Weight of the edge between `a` and `b`, if any.
    pub fn weight(&self, a: usize, b: usize) -> Option<f64> {
        let list = &self.adj[a];
        list.binary_search_by_key(&b, |&(n, _, _)| n).ok().map(|i| list[i].1)
    }

    /// Connected components, each sorted, ordered by smallest member.
    pub fn components(&self) -> Vec<Vec<usize>> {
        let n = self.ids.len();
        let mut seen = vec![false; n];
        let mut out = Vec::new();
        for start in 0..n {
            if seen[start] {
                continue;
            }
            seen[start] = true;
            let mut stack = vec![start];
            let mut members = Vec::new();
            while let Some(u) = stack.pop() {
                members.push(u);
                for &(v, _, _) in &self.adj[u] {
                    if !seen[v] {
                        seen[v] = true;
                        stack.push(v);
                    }
                }
            }
            members.sort_unstable();
            out.push(members);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cograph_core::{Link, Point};

    fn sample() -> Graph {
        Graph::new(
            vec![Point::new("c", "c"), Point::new("a", "a"), Point::new("b", "b"), Point::new("z", "z")],
            vec![Link::new("a", "b", 3), Link::new("b", "c", 1)],
        )
    }

    #[test]
    fn test_indices_follow_id_order() {
        let g = WeightedGraph::from_graph(&sample());
        assert_eq!(g.ids(), &["a", "b", "c", "z"]);
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.weight(0, 1), Some(3.0));
        assert_eq!(g.weight(1, 0), Some(3.0));
        assert_eq!(g.weight(0, 2), None);
        assert_eq!(g.strength(1), 4.0);
        assert_eq!(g.total_weight(), 4.0);
    }

    #[test]
    fn test_components_include_isolated() {
        let g = WeightedGraph::from_graph(&sample());
        assert_eq!(g.components(), vec![vec![0, 1, 2], vec![3]]);
    }

    #[test]
    fn test_induced_keeps_inner_edges_only() {
        let g = WeightedGraph::from_graph(&sample());
        let sub = g.induced(&["b", "c", "missing"]);
        assert_eq!(sub.ids(), &["b", "c"]);
        assert_eq!(sub.edge_count(), 1);
        assert_eq!(sub.edges()[0], Edge { u: 0, v: 1, weight: 1.0 });
    }

    #[test]
    fn test_without_edge() {
        let g = WeightedGraph::from_graph(&sample());
        let cut = g.without_edge(0);
        assert_eq!(cut.edge_count(), 1);
        assert_eq!(cut.components().len(), 3);
    }
}
