//! # cograph Storage
//!
//! Everything between files on disk and an in-memory [`cograph_core::Graph`]:
//!
//! - [`JsonLinesSource`] - Re-iterable record source over a `.jsonl` file
//! - [`fingerprint_file`] - SHA-256 cache key over input and build config
//! - [`GraphCache`] - Build-or-load cache of finished graphs
//! - [`GraphStore`] - Registry of loaded graphs keyed by data file name

pub mod cache;
pub mod error;
pub mod fingerprint;
pub mod loader;
pub mod manager;

pub use cache::{CacheManifest, CachedGraph, GraphCache};
pub use error::{Error, Result};
pub use fingerprint::{fingerprint_bytes, fingerprint_file, Fingerprinter};
pub use loader::JsonLinesSource;
pub use manager::GraphStore;
