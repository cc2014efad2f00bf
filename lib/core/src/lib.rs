//! # cograph Core
//!
//! Core library for cograph: turns streams of tagged records into weighted
//! co-occurrence graphs.
//!
//! This crate provides the graph construction engine:
//!
//! - [`TaggedRecord`] / [`RecordSource`] - Input records and re-iterable sources
//! - [`CooccurrenceBuilder`] - Streaming tag co-occurrence accumulator
//! - [`EntityGraphBuilder`] - Three-pass inverted-index generator for entity graphs
//! - [`Graph`] - Output points and canonical links
//! - [`BuildConfig`] - One entry point over both topologies
//!
//! ## Example
//!
//! ```rust
//! use cograph_core::{CooccurrenceBuilder, CooccurrenceConfig};
//!
//! let mut builder = CooccurrenceBuilder::new(CooccurrenceConfig::default()).unwrap();
//! builder.add(&["rock", "indie"], Some(1_700_000_000_000));
//! builder.add(&["rock", "indie"], None);
//! builder.add(&["rock", "jazz"], None);
//!
//! let out = builder.build();
//! assert_eq!(out.graph.links.len(), 1);
//! assert_eq!(out.graph.links[0].weight, 2);
//! ```

pub mod accumulator;
pub mod config;
pub mod error;
pub mod generator;
pub mod graph;
pub mod normalize;
pub mod progress;
pub mod record;
pub mod report;
pub mod topology;

mod bounded;
mod finalize;
mod pair;

pub use accumulator::{AccumulatorStats, CooccurrenceBuilder};
pub use config::{CooccurrenceConfig, EntityGraphConfig, GraphLimits, HighDegreePolicy, PairStrategy};
pub use error::{Error, Result, Warning};
pub use generator::EntityGraphBuilder;
pub use graph::{Graph, Link, Point};
pub use normalize::{pretty_label, split_tags, Identity, Labeler, PrettyLabels};
pub use progress::{NoProgress, Phase, Progress, TracingProgress};
pub use record::{RecordSource, SourceStats, TaggedRecord};
pub use report::{BuildOutput, BuildReport};
pub use topology::{BuildConfig, Topology};
