// Bridge detection (iterative Tarjan low-link)
use crate::adjacency::WeightedGraph;

/// `true` for every edge whose removal disconnects its component.
pub(crate) fn bridges(graph: &WeightedGraph) -> Vec<bool> {
    let n = graph.node_count();
    let mut is_bridge = vec![false; graph.edge_count()];
    let mut disc = vec![usize::MAX; n];
    let mut low = vec![0usize; n];
    let mut timer = 0usize;

    for root in 0..n {
        if disc[root] != usize::MAX {
            continue;
        }
        disc[root] = timer;
        low[root] = timer;
        timer += 1;
        // (node, edge used to enter it, next neighbor position)
        let mut stack: Vec<(usize, usize, usize)> = vec![(root, usize::MAX, 0)];

        while let Some(frame) = stack.last_mut() {
            let (u, parent_edge, pos) = *frame;
            let neighbors = graph.neighbors(u);
            if pos < neighbors.len() {
                frame.2 += 1;
                let (v, _, e) = neighbors[pos];
                if e == parent_edge {
                    continue;
                }
                if disc[v] == usize::MAX {
                    disc[v] = timer;
                    low[v] = timer;
                    timer += 1;
                    stack.push((v, e, 0));
                } else {
                    low[u] = low[u].min(disc[v]);
                }
            } else {
                stack.pop();
                if let Some(&(p, _, _)) = stack.last() {
                    low[p] = low[p].min(low[u]);
                    if low[u] > disc[p] {
                        is_bridge[parent_edge] = true;
                    }
                }
            }
        }
    }
    is_bridge
}
