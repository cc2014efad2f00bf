//! Edge importance scoring over induced subgraphs.
//!
//! | Algorithm | Weight use | Score |
//! |-----------|-----------|-------|
//! | `edge_betweenness` | path length | share of shortest paths through the edge |
//! | `current_flow_betweenness` | conductance | share of random-walk current through the edge |
//! | `bridges` | ignored | 1.0 if removing the edge disconnects its component, else 0.0 |
//!
//! Scores of different algorithms are not comparable; every [`EdgeScore`]
//! carries the name of the algorithm that produced it.

mod betweenness;
mod bridges;
mod current_flow;

pub(crate) use betweenness::edge_betweenness;

use crate::adjacency::WeightedGraph;
use cograph_core::{Error, Graph, Result};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeAlgorithm {
    EdgeBetweenness,
    CurrentFlowBetweenness,
    Bridges,
}

impl EdgeAlgorithm {
    pub const ALL: [EdgeAlgorithm; 3] = [
        EdgeAlgorithm::EdgeBetweenness,
        EdgeAlgorithm::CurrentFlowBetweenness,
        EdgeAlgorithm::Bridges,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeAlgorithm::EdgeBetweenness => "edge_betweenness",
            EdgeAlgorithm::CurrentFlowBetweenness => "current_flow_betweenness",
            EdgeAlgorithm::Bridges => "bridges",
        }
    }
}

impl fmt::Display for EdgeAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        EdgeAlgorithm::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| Error::UnknownAlgorithm {
                kind: "edge",
                name: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeParams {
    /// Rescale betweenness scores; ignored by `bridges`.
    pub normalized: bool,
}

impl Default for EdgeParams {
    fn default() -> Self {
        Self { normalized: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeScore {
    pub source: String,
    pub target: String,
    pub score: f64,
    pub algorithm: String,
}

/// Scores the edges of the subgraph induced by `subset`.
///
/// Results are sorted by score descending, ties by canonical
/// `(source, target)` order, and truncated to `top_k`. Subgraphs with fewer
/// than two nodes or no edges yield an empty list.
pub fn score<S: AsRef<str>>(
    graph: &Graph,
    subset: &[S],
    algorithm: EdgeAlgorithm,
    top_k: Option<usize>,
    params: &EdgeParams,
) -> Result<Vec<EdgeScore>> {
    let sub = WeightedGraph::from_graph(graph).induced(subset);
    Ok(score_weighted(&sub, algorithm, top_k, params))
}

pub(crate) fn score_weighted(
    graph: &WeightedGraph,
    algorithm: EdgeAlgorithm,
    top_k: Option<usize>,
    params: &EdgeParams,
) -> Vec<EdgeScore> {
    let n = graph.node_count();
    if n < 2 || graph.edge_count() == 0 {
        return Vec::new();
    }

    let raw: Vec<f64> = match algorithm {
        EdgeAlgorithm::EdgeBetweenness => {
            let scale = if params.normalized {
                1.0 / (n * (n - 1)) as f64
            } else {
                0.5
            };
            edge_betweenness(graph, true).into_iter().map(|b| b * scale).collect()
        }
        EdgeAlgorithm::CurrentFlowBetweenness => current_flow::current_flow_betweenness(graph, params.normalized),
        EdgeAlgorithm::Bridges => bridges::bridges(graph)
            .into_iter()
            .map(|b| if b { 1.0 } else { 0.0 })
            .collect(),
    };

    let mut scores: Vec<EdgeScore> = graph
        .edges()
        .iter()
        .zip(raw)
        .map(|(edge, s)| EdgeScore {
            source: graph.id(edge.u).to_string(),
            target: graph.id(edge.v).to_string(),
            score: round6(s),
            algorithm: algorithm.as_str().to_string(),
        })
        .collect();
    scores.sort_by(|a, b| {
        OrderedFloat(b.score)
            .cmp(&OrderedFloat(a.score))
            .then_with(|| a.source.cmp(&b.source))
            .then_with(|| a.target.cmp(&b.target))
    });
    if let Some(k) = top_k {
        scores.truncate(k);
    }
    tracing::debug!(algorithm = %algorithm, nodes = n, edges = scores.len(), "edges scored");
    scores
}

#[inline]
fn round6(x: f64) -> f64 {
    (x * 1e6).round() / 1e6
}
