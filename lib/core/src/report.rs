use crate::{Graph, Warning};
use serde::{Deserialize, Serialize};

/// Operator-facing metadata of one build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    pub rows_seen: usize,
    pub rows_skipped: usize,
    /// Distinct pairs held when finalization started.
    pub unique_pairs: usize,
    pub pairs_over_threshold: usize,
    pub points: usize,
    pub links: usize,
    /// Whether the pair counter ran with a capacity bound.
    pub bounded: bool,
    pub warnings: Vec<Warning>,
}

impl BuildReport {
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub(crate) fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }
}

#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub graph: Graph,
    pub report: BuildReport,
}
