use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Thresholds and caps shared by both graph topologies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphLimits {
    /// Pairs observed fewer times than this are dropped.
    pub min_weight: u32,
    /// Maximum number of points; 0 = uncapped.
    pub max_nodes: usize,
    /// Maximum number of links; 0 = uncapped.
    pub max_edges: usize,
    /// Emit zero-degree points instead of dropping them.
    pub keep_isolated: bool,
}

impl Default for GraphLimits {
    fn default() -> Self {
        Self {
            min_weight: 2,
            max_nodes: 0,
            max_edges: 0,
            keep_isolated: false,
        }
    }
}

impl GraphLimits {
    pub fn validate(&self) -> Result<()> {
        if self.min_weight == 0 {
            return Err(Error::InvalidConfig("min_weight must be at least 1".to_string()));
        }
        Ok(())
    }

    pub(crate) fn node_cap(&self) -> Option<usize> {
        (self.max_nodes > 0).then_some(self.max_nodes)
    }

    pub(crate) fn edge_cap(&self) -> Option<usize> {
        (self.max_edges > 0).then_some(self.max_edges)
    }
}

/// Configuration of the tag co-occurrence accumulator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooccurrenceConfig {
    #[serde(flatten)]
    pub limits: GraphLimits,
}

impl CooccurrenceConfig {
    pub fn validate(&self) -> Result<()> {
        self.limits.validate()
    }
}

/// What to do with a tag whose posting list exceeds `max_tag_degree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighDegreePolicy {
    /// Seeded uniform sample of exactly `max_tag_degree` entities.
    Sample,
    /// Ignore the tag entirely.
    Skip,
}

/// Which pair counter the entity graph builder uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairStrategy {
    /// Uncapped counter: exact enumeration of the (possibly sampled) postings.
    Exact,
    /// Capacity-bounded counter with batch eviction.
    Bounded,
    /// Exact when the estimated pair volume fits within the capacity.
    Auto,
}

/// Configuration of the entity (shared-tag) graph builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityGraphConfig {
    #[serde(flatten)]
    pub limits: GraphLimits,
    /// Posting lists longer than this are sampled or skipped; `None` = unbounded.
    pub max_tag_degree: Option<usize>,
    pub high_degree: HighDegreePolicy,
    pub seed: u64,
    /// Distinct pairs the counter may hold; `None` = unbounded.
    pub counter_capacity: Option<usize>,
    /// Share of the capacity evicted per eviction round.
    pub eviction_fraction: f64,
    pub strategy: PairStrategy,
    /// Clip link weights to this value after thresholding.
    pub max_edge_weight: Option<u32>,
    /// Every surviving pair gets weight 1 and `min_weight` is treated as 1.
    pub unweighted: bool,
    /// Keep only the entities carrying the most distinct tags before pairing.
    pub max_entities: Option<usize>,
}

impl Default for EntityGraphConfig {
    fn default() -> Self {
        Self {
            limits: GraphLimits::default(),
            max_tag_degree: Some(200),
            high_degree: HighDegreePolicy::Sample,
            seed: 0,
            counter_capacity: Some(50_000_000),
            eviction_fraction: 0.1,
            strategy: PairStrategy::Auto,
            max_edge_weight: None,
            unweighted: false,
            max_entities: None,
        }
    }
}

impl EntityGraphConfig {
    /// Uncapped configuration: every pair of entities sharing a tag is counted.
    pub fn exact() -> Self {
        Self {
            max_tag_degree: None,
            counter_capacity: None,
            strategy: PairStrategy::Exact,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.limits.validate()?;
        if self.max_tag_degree == Some(0) {
            return Err(Error::InvalidConfig("max_tag_degree must be positive".to_string()));
        }
        if self.counter_capacity == Some(0) {
            return Err(Error::InvalidConfig("counter_capacity must be positive".to_string()));
        }
        if !(self.eviction_fraction > 0.0 && self.eviction_fraction <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "eviction_fraction must be in (0, 1], got {}",
                self.eviction_fraction
            )));
        }
        if self.max_edge_weight == Some(0) {
            return Err(Error::InvalidConfig("max_edge_weight must be positive".to_string()));
        }
        if self.max_entities == Some(0) {
            return Err(Error::InvalidConfig("max_entities must be positive".to_string()));
        }
        Ok(())
    }

    pub(crate) fn effective_min_weight(&self) -> u32 {
        if self.unweighted {
            1
        } else {
            self.limits.min_weight
        }
    }
}
