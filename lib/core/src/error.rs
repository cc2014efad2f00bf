use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown {kind} algorithm: {name}")]
    UnknownAlgorithm { kind: &'static str, name: String },

    #[error("Record source error: {0}")]
    Source(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Non-fatal degradation attached to build reports and detection results.
///
/// Warnings never abort an operation. They exist so that sampling, eviction
/// and non-convergence stay visible to whoever consumes the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Records without an id or without any usable tag were skipped.
    InvalidInput { skipped: usize },
    /// The bounded pair counter hit its capacity and evicted entries.
    CapacityExceeded {
        capacity: usize,
        evicted_keys: usize,
        eviction_rounds: usize,
        rejected_increments: u64,
    },
    /// Posting lists longer than `max_tag_degree` were down-sampled.
    TagsSampled { tags: usize, max_tag_degree: usize },
    /// Posting lists longer than `max_tag_degree` were dropped.
    TagsSkipped { tags: usize, max_tag_degree: usize },
    /// An iterative algorithm stopped at its iteration budget.
    Convergence { algorithm: String, iterations: usize },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::InvalidInput { skipped } => {
                write!(f, "{} invalid records skipped", skipped)
            }
            Warning::CapacityExceeded {
                capacity,
                evicted_keys,
                eviction_rounds,
                rejected_increments,
            } => write!(
                f,
                "pair counter capacity {} exceeded: {} keys evicted in {} rounds, {} increments rejected",
                capacity, evicted_keys, eviction_rounds, rejected_increments
            ),
            Warning::TagsSampled { tags, max_tag_degree } => {
                write!(f, "{} tags sampled down to {} entities", tags, max_tag_degree)
            }
            Warning::TagsSkipped { tags, max_tag_degree } => {
                write!(f, "{} tags skipped (degree > {})", tags, max_tag_degree)
            }
            Warning::Convergence { algorithm, iterations } => write!(
                f,
                "{} did not converge after {} iterations; returning best partial result",
                algorithm, iterations
            ),
        }
    }
}
