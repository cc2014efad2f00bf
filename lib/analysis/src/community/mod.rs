//! Community detection over co-occurrence graphs.
//!
//! Every algorithm returns a partition of the graph's points into integer
//! communities `0..k-1`, numbered by descending size (ties: the community
//! holding the smallest point id comes first). Isolated points never reach
//! the algorithms; they and any point an algorithm leaves uncovered (such
//! as points in no k-clique) are appended as singleton communities after
//! the ranked list.
//!
//! ## Algorithms and weights
//!
//! | Name | Weight use |
//! |------|-----------|
//! | `louvain` | weighted modularity with resolution γ, seeded node order |
//! | `greedy_modularity` | weighted Clauset-Newman-Moore agglomeration, optional `best_n` |
//! | `label_propagation` | asynchronous, neighbor labels scored by summed weight |
//! | `kernighan_lin` | bisection minimizing the weighted cut |
//! | `edge_betweenness` | Girvan-Newman on unweighted shortest paths |
//! | `k_clique` | clique percolation, weight ignored |
//!
//! Iterative algorithms stop at `max_iterations` and return their current
//! partition together with a [`Warning::Convergence`].

mod girvan_newman;
mod greedy;
mod k_clique;
mod kernighan_lin;
mod label_propagation;
mod louvain;

use crate::adjacency::WeightedGraph;
use cograph_core::{Error, Graph, Result, Warning};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunityAlgorithm {
    Louvain,
    GreedyModularity,
    LabelPropagation,
    KernighanLin,
    EdgeBetweenness,
    KClique,
}

impl CommunityAlgorithm {
    pub const ALL: [CommunityAlgorithm; 6] = [
        CommunityAlgorithm::Louvain,
        CommunityAlgorithm::GreedyModularity,
        CommunityAlgorithm::LabelPropagation,
        CommunityAlgorithm::KernighanLin,
        CommunityAlgorithm::EdgeBetweenness,
        CommunityAlgorithm::KClique,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommunityAlgorithm::Louvain => "louvain",
            CommunityAlgorithm::GreedyModularity => "greedy_modularity",
            CommunityAlgorithm::LabelPropagation => "label_propagation",
            CommunityAlgorithm::KernighanLin => "kernighan_lin",
            CommunityAlgorithm::EdgeBetweenness => "edge_betweenness",
            CommunityAlgorithm::KClique => "k_clique",
        }
    }

    /// Whether link weights influence the result.
    pub fn uses_weight(&self) -> bool {
        !matches!(self, CommunityAlgorithm::EdgeBetweenness | CommunityAlgorithm::KClique)
    }
}

impl fmt::Display for CommunityAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommunityAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CommunityAlgorithm::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| Error::UnknownAlgorithm {
                kind: "community",
                name: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunityParams {
    /// Modularity resolution γ (Louvain, greedy modularity); higher gives
    /// more, smaller communities.
    pub resolution: f64,
    /// Seed for node orderings and initial splits.
    pub seed: u64,
    /// Greedy modularity: merge down to this many communities.
    /// Edge betweenness: number of Girvan-Newman splits (default 1).
    pub best_n: Option<usize>,
    /// Clique size for `k_clique`; required there.
    pub k: Option<usize>,
    pub max_iterations: usize,
}

impl Default for CommunityParams {
    fn default() -> Self {
        Self {
            resolution: 1.0,
            seed: 0,
            best_n: None,
            k: None,
            max_iterations: 100,
        }
    }
}

impl CommunityParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "resolution must be positive, got {}",
                self.resolution
            )));
        }
        if self.max_iterations == 0 {
            return Err(Error::InvalidConfig("max_iterations must be positive".to_string()));
        }
        if self.best_n == Some(0) {
            return Err(Error::InvalidConfig("best_n must be positive".to_string()));
        }
        Ok(())
    }
}

/// Result of one detection run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub algorithm: String,
    pub assignments: BTreeMap<String, usize>,
    pub community_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
}

impl Detection {
    /// Members of each community, indexed by community id.
    pub fn members(&self) -> Vec<Vec<&str>> {
        let mut out = vec![Vec::new(); self.community_count];
        for (id, &c) in &self.assignments {
            out[c].push(id.as_str());
        }
        out
    }

    pub fn sizes(&self) -> Vec<usize> {
        self.members().iter().map(Vec::len).collect()
    }
}

/// Raw algorithm output in dense indices.
pub(crate) struct Outcome {
    /// May overlap and may leave nodes uncovered.
    pub groups: Vec<Vec<usize>>,
    /// Set when the iteration budget ran out.
    pub exhausted: Option<usize>,
}

impl Outcome {
    pub(crate) fn converged(groups: Vec<Vec<usize>>) -> Self {
        Self {
            groups,
            exhausted: None,
        }
    }
}

/// Runs `algorithm` over every point of `graph`.
pub fn detect(graph: &Graph, algorithm: CommunityAlgorithm, params: &CommunityParams) -> Result<Detection> {
    params.validate()?;
    let g = WeightedGraph::from_graph(graph);
    if g.node_count() == 0 {
        return Ok(Detection {
            algorithm: algorithm.as_str().to_string(),
            ..Detection::default()
        });
    }

    if algorithm == CommunityAlgorithm::KClique {
        match params.k {
            None => return Err(Error::InvalidInput("k_clique requires parameter k".to_string())),
            Some(k) if k < 2 => {
                return Err(Error::InvalidInput(format!("k must be at least 2, got {}", k)));
            }
            Some(_) => {}
        }
    }

    let active: Vec<usize> = (0..g.node_count()).filter(|&u| !g.neighbors(u).is_empty()).collect();
    let connected = g.induced(&active.iter().map(|&u| g.id(u)).collect::<Vec<_>>());
    let outcome = if connected.node_count() == 0 {
        Outcome::converged(Vec::new())
    } else {
        match algorithm {
            CommunityAlgorithm::Louvain => louvain::louvain(&connected, params),
            CommunityAlgorithm::GreedyModularity => greedy::greedy_modularity(&connected, params),
            CommunityAlgorithm::LabelPropagation => label_propagation::label_propagation(&connected, params),
            CommunityAlgorithm::KernighanLin => kernighan_lin::kernighan_lin(&connected, params),
            CommunityAlgorithm::EdgeBetweenness => girvan_newman::girvan_newman(&connected, params),
            CommunityAlgorithm::KClique => k_clique::k_clique(&connected, params.k.unwrap_or(2)),
        }
    };

    let mut warnings = Vec::new();
    if let Some(iterations) = outcome.exhausted {
        let warning = Warning::Convergence {
            algorithm: algorithm.as_str().to_string(),
            iterations,
        };
        tracing::warn!("{}", warning);
        warnings.push(warning);
    }

    let groups = outcome
        .groups
        .into_iter()
        .map(|members| members.into_iter().map(|i| active[i]).collect())
        .collect();
    let ranked = rank(g.node_count(), groups);
    let mut assignments = BTreeMap::new();
    for (c, members) in ranked.iter().enumerate() {
        for &node in members {
            assignments.insert(g.id(node).to_string(), c);
        }
    }
    tracing::info!(
        algorithm = %algorithm,
        nodes = g.node_count(),
        communities = ranked.len(),
        "communities detected"
    );

    Ok(Detection {
        algorithm: algorithm.as_str().to_string(),
        assignments,
        community_count: ranked.len(),
        warnings,
    })
}

/// Turns raw groups into the final ranked partition.
///
/// A node claimed by several groups stays in the largest one (ties: the
/// earlier group). Groups are ordered by size descending, then smallest
/// member; uncovered nodes follow as singletons in index order.
fn rank(n: usize, groups: Vec<Vec<usize>>) -> Vec<Vec<usize>> {
    let mut owner = vec![usize::MAX; n];
    for (g, members) in groups.iter().enumerate() {
        for &node in members {
            let current = owner[node];
            if current == usize::MAX || members.len() > groups[current].len() {
                owner[node] = g;
            }
        }
    }

    let mut resolved: Vec<Vec<usize>> = vec![Vec::new(); groups.len()];
    let mut uncovered = Vec::new();
    for (node, &g) in owner.iter().enumerate() {
        if g == usize::MAX {
            uncovered.push(node);
        } else {
            resolved[g].push(node);
        }
    }
    resolved.retain(|members| !members.is_empty());
    resolved.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a[0].cmp(&b[0])));
    resolved.extend(uncovered.into_iter().map(|node| vec![node]));
    resolved
}
