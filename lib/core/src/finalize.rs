//! Shared thresholding, ranking and capping policy.
//!
//! Both topologies hand their raw pair counts to [`Finalizer`], so the tag
//! co-occurrence graph and the entity graph are capped by the same rule:
//!
//! 1. drop pairs below `min_weight`;
//! 2. rank nodes by weighted degree over the surviving pairs (descending,
//!    ties by id ascending) and keep the top `max_nodes`;
//! 3. among pairs whose endpoints both survived, keep the top `max_edges` by
//!    weight (ties by canonical `(source, target)` order);
//! 4. drop nodes left without links unless `keep_isolated` is set.

use crate::config::GraphLimits;
use crate::pair::PairKey;
use std::cmp::Reverse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SelectedNode {
    pub idx: u32,
    /// Weighted degree over the selected edges.
    pub degree: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SelectedEdge {
    pub key: PairKey,
    /// Endpoint whose id sorts first.
    pub source: u32,
    pub target: u32,
    pub weight: u32,
}

/// Result of finalization, still in dense ids.
///
/// Nodes are ordered by id ascending, edges by weight descending then
/// canonical pair order.
#[derive(Debug, Default)]
pub(crate) struct Selection {
    pub nodes: Vec<SelectedNode>,
    pub edges: Vec<SelectedEdge>,
    pub pairs_over_threshold: usize,
}

pub(crate) struct Finalizer<'a> {
    limits: &'a GraphLimits,
    min_weight: u32,
    names: &'a [String],
}

impl<'a> Finalizer<'a> {
    /// `names[i]` is the external id of dense id `i`.
    pub(crate) fn new(limits: &'a GraphLimits, names: &'a [String]) -> Self {
        Self {
            limits,
            min_weight: limits.min_weight,
            names,
        }
    }

    pub(crate) fn with_min_weight(mut self, min_weight: u32) -> Self {
        self.min_weight = min_weight;
        self
    }

    /// Applies the policy to raw pair counts.
    ///
    /// `reweight` maps a count that passed the threshold to its link weight
    /// (identity, clipping, or constant 1 for unweighted graphs).
    pub(crate) fn finalize<I, F>(&self, pairs: I, reweight: F) -> Selection
    where
        I: IntoIterator<Item = (PairKey, u32)>,
        F: Fn(u32) -> u32,
    {
        let names = self.names;
        let node_count = names.len();

        let mut edges: Vec<SelectedEdge> = pairs
            .into_iter()
            .filter(|&(_, count)| count >= self.min_weight)
            .map(|(key, count)| {
                let (lo, hi) = (key.low(), key.high());
                let (source, target) = if names[lo as usize] <= names[hi as usize] {
                    (lo, hi)
                } else {
                    (hi, lo)
                };
                SelectedEdge {
                    key,
                    source,
                    target,
                    weight: reweight(count).max(1),
                }
            })
            .collect();
        let pairs_over_threshold = edges.len();

        let mut strength = vec![0u64; node_count];
        for e in &edges {
            strength[e.source as usize] += e.weight as u64;
            strength[e.target as usize] += e.weight as u64;
        }

        let mut ranked: Vec<u32> = (0..node_count as u32)
            .filter(|&i| self.limits.keep_isolated || strength[i as usize] > 0)
            .collect();
        let mut kept = vec![false; node_count];
        match self.limits.node_cap() {
            Some(cap) if ranked.len() > cap => {
                ranked.sort_by(|&a, &b| {
                    strength[b as usize]
                        .cmp(&strength[a as usize])
                        .then_with(|| names[a as usize].cmp(&names[b as usize]))
                });
                ranked.truncate(cap);
            }
            _ => {}
        }
        for &i in &ranked {
            kept[i as usize] = true;
        }

        edges.retain(|e| kept[e.source as usize] && kept[e.target as usize]);
        edges.sort_by(|a, b| {
            Reverse(a.weight)
                .cmp(&Reverse(b.weight))
                .then_with(|| names[a.source as usize].cmp(&names[b.source as usize]))
                .then_with(|| names[a.target as usize].cmp(&names[b.target as usize]))
        });
        if let Some(cap) = self.limits.edge_cap() {
            edges.truncate(cap);
        }

        let mut degree = vec![0u64; node_count];
        for e in &edges {
            degree[e.source as usize] += e.weight as u64;
            degree[e.target as usize] += e.weight as u64;
        }

        let mut nodes: Vec<SelectedNode> = ranked
            .into_iter()
            .filter(|&i| self.limits.keep_isolated || degree[i as usize] > 0)
            .map(|idx| SelectedNode {
                idx,
                degree: degree[idx as usize],
            })
            .collect();
        nodes.sort_by(|a, b| names[a.idx as usize].cmp(&names[b.idx as usize]));

        Selection {
            nodes,
            edges,
            pairs_over_threshold,
        }
    }
}
