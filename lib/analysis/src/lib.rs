//! # cograph Analysis
//!
//! Graph analytics over [`cograph_core::Graph`]:
//!
//! - [`detect`] - Community detection (Louvain, greedy modularity, label
//!   propagation, Kernighan-Lin, Girvan-Newman, clique percolation)
//! - [`score`] - Edge scoring on induced subgraphs (edge betweenness,
//!   current-flow betweenness, bridges)
//! - [`WeightedGraph`] - Indexed adjacency view shared by both
//!
//! Results are plain mappings and score lists; the input graph is never
//! modified. Use [`Graph::with_communities`](cograph_core::Graph::with_communities)
//! to attach a detection to a copy of the graph.
//!
//! ## Example
//!
//! ```rust
//! use cograph_analysis::{detect, CommunityAlgorithm, CommunityParams};
//! use cograph_core::{Graph, Link, Point};
//!
//! let graph = Graph::new(
//!     vec![Point::new("a", "A"), Point::new("b", "B"), Point::new("c", "C")],
//!     vec![Link::new("a", "b", 3)],
//! );
//! let detection = detect(&graph, CommunityAlgorithm::Louvain, &CommunityParams::default()).unwrap();
//! assert_eq!(detection.assignments["a"], detection.assignments["b"]);
//! assert_eq!(detection.assignments["c"], 1);
//! ```

pub mod adjacency;
pub mod community;
pub mod edges;

pub use adjacency::WeightedGraph;
pub use community::{detect, CommunityAlgorithm, CommunityParams, Detection};
pub use edges::{score, EdgeAlgorithm, EdgeParams, EdgeScore};
