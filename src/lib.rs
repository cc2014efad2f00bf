//! # cograph
//!
//! A tag co-occurrence graph engine.
//!
//! cograph turns streams of tagged records into weighted graphs and runs
//! community detection and edge scoring on them. It builds two kinds of
//! graph:
//!
//! - **Tag co-occurrence**: nodes are tags, linked by how many records carry
//!   both. Counting is streaming and exact.
//! - **Shared tags**: nodes are records, linked by how many tags they share.
//!   Pairs are generated from an inverted index with bounded fan-out and a
//!   bounded pair counter, so memory stays flat on large inputs.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! cargo install cograph
//! cograph serve --data-dir ./data --cache-dir ./cache --http-port 8080
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use cograph::prelude::*;
//!
//! let records = vec![
//!     TaggedRecord::new("t1", ["rock", "indie"]),
//!     TaggedRecord::new("t2", ["rock", "indie"]),
//!     TaggedRecord::new("t3", ["jazz", "soul"]),
//!     TaggedRecord::new("t4", ["jazz", "soul"]),
//! ];
//! let output = BuildConfig::default().build(&records, &Identity, &NoProgress).unwrap();
//! assert_eq!(output.graph.links.len(), 2);
//!
//! let detection = detect(&output.graph, CommunityAlgorithm::Louvain, &CommunityParams::default()).unwrap();
//! assert_eq!(detection.community_count, 2);
//! let colored = output.graph.with_communities(&detection.assignments);
//! assert!(colored.points.iter().all(|p| p.community.is_some()));
//! ```
//!
//! ## Crate Structure
//!
//! - `cograph-core` - Records, graph model, accumulator, bounded pair generator, finalizer
//! - `cograph-analysis` - Community detection and edge scoring
//! - `cograph-storage` - Fingerprints, build-or-load cache, JSON-lines source, graph registry
//! - `cograph-api` - REST API

// Re-export core types
pub use cograph_core::{
    BuildConfig, BuildOutput, BuildReport, CooccurrenceBuilder, CooccurrenceConfig, EntityGraphBuilder,
    EntityGraphConfig, Error, Graph, GraphLimits, HighDegreePolicy, Identity, Labeler, Link, NoProgress,
    PairStrategy, Point, PrettyLabels, Progress, RecordSource, Result, TaggedRecord, Topology, TracingProgress,
    Warning,
};

// Re-export analysis
pub use cograph_analysis::{
    detect, score, CommunityAlgorithm, CommunityParams, Detection, EdgeAlgorithm, EdgeParams, EdgeScore,
};

// Re-export storage
pub use cograph_storage::{GraphCache, GraphStore, JsonLinesSource};

// Re-export API
pub use cograph_api::RestApi;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        detect, score, BuildConfig, CommunityAlgorithm, CommunityParams, CooccurrenceBuilder, EdgeAlgorithm,
        EdgeParams, EntityGraphBuilder, EntityGraphConfig, Error, Graph, GraphLimits, Identity, JsonLinesSource,
        Link, NoProgress, Point, RecordSource, Result, TaggedRecord, Topology,
    };
}

/// Tag normalization helpers
pub mod normalize {
    pub use cograph_core::normalize::{pretty_label, split_tags};
}
