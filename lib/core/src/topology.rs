// Topology selection: one entry point over both graph builders
use crate::accumulator::CooccurrenceBuilder;
use crate::config::{CooccurrenceConfig, EntityGraphConfig};
use crate::generator::EntityGraphBuilder;
use crate::normalize::Labeler;
use crate::progress::Progress;
use crate::record::RecordSource;
use crate::report::BuildOutput;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What the nodes of a graph are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    /// Nodes are tags, linked when they appear on the same record.
    TagCooccurrence,
    /// Nodes are records, linked when they share tags.
    SharedTags,
}

impl Topology {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topology::TagCooccurrence => "tag_cooccurrence",
            Topology::SharedTags => "shared_tags",
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topology {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "tag_cooccurrence" | "tags" | "cooccurrence" => Ok(Topology::TagCooccurrence),
            "shared_tags" | "entities" | "entity" => Ok(Topology::SharedTags),
            other => Err(Error::InvalidConfig(format!("unknown topology: {}", other))),
        }
    }
}

/// A topology together with its builder configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "topology", rename_all = "snake_case")]
pub enum BuildConfig {
    TagCooccurrence(CooccurrenceConfig),
    SharedTags(EntityGraphConfig),
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig::TagCooccurrence(CooccurrenceConfig::default())
    }
}

impl From<Topology> for BuildConfig {
    fn from(topology: Topology) -> Self {
        match topology {
            Topology::TagCooccurrence => BuildConfig::TagCooccurrence(CooccurrenceConfig::default()),
            Topology::SharedTags => BuildConfig::SharedTags(EntityGraphConfig::default()),
        }
    }
}

impl BuildConfig {
    pub fn topology(&self) -> Topology {
        match self {
            BuildConfig::TagCooccurrence(_) => Topology::TagCooccurrence,
            BuildConfig::SharedTags(_) => Topology::SharedTags,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            BuildConfig::TagCooccurrence(config) => config.validate(),
            BuildConfig::SharedTags(config) => config.validate(),
        }
    }

    /// Builds a graph from `source`. `labeler` only applies to tag nodes;
    /// entity nodes take their label from the record.
    pub fn build<S: RecordSource + ?Sized>(
        &self,
        source: &S,
        labeler: &dyn Labeler,
        progress: &dyn Progress,
    ) -> Result<BuildOutput> {
        tracing::info!(topology = %self.topology(), "building graph");
        match self {
            BuildConfig::TagCooccurrence(config) => {
                let mut builder = CooccurrenceBuilder::new(config.clone())?;
                builder.extend_from(source, labeler, progress)?;
                Ok(builder.build_with(&config.limits, progress))
            }
            BuildConfig::SharedTags(config) => {
                EntityGraphBuilder::new(config.clone())?.build_with_progress(source, progress)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Identity;
    use crate::progress::NoProgress;
    use crate::TaggedRecord;

    #[test]
    fn test_parse_topology() {
        assert_eq!("tags".parse::<Topology>().unwrap(), Topology::TagCooccurrence);
        assert_eq!("shared-tags".parse::<Topology>().unwrap(), Topology::SharedTags);
        assert!("nodes".parse::<Topology>().is_err());
    }

    #[test]
    fn test_config_json_is_tagged() {
        let config = BuildConfig::from(Topology::SharedTags);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["topology"], "shared_tags");
        let back: BuildConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_both_topologies_build() {
        let records = vec![
            TaggedRecord::new("r1", ["a", "b"]),
            TaggedRecord::new("r2", ["a", "b"]),
            TaggedRecord::new("r3", ["a"]),
        ];

        let tags = BuildConfig::default()
            .build(&records, &Identity, &NoProgress)
            .unwrap();
        assert_eq!(tags.graph.links.len(), 1);
        assert_eq!(tags.graph.links[0].weight, 2);

        let entities = BuildConfig::from(Topology::SharedTags)
            .build(&records, &Identity, &NoProgress)
            .unwrap();
        let ids: Vec<&str> = entities.graph.points.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2"]);
        assert_eq!(entities.graph.links[0].weight, 2);
    }
}
