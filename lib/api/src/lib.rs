//! # cograph API
//!
//! actix-web REST surface over a [`cograph_storage::GraphStore`]:
//!
//! | Method | Path | Body | Response |
//! |--------|------|------|----------|
//! | GET | `/health` | | `{status, loaded}` |
//! | GET | `/graphs/{dataFile}` | | `{points, links}` |
//! | POST | `/cluster` | `{dataFile, algorithm, params}` | `{assignments, communityCount, warnings}` |
//! | POST | `/edges` | `{dataFile, algorithm, nodeIds?, topK?, normalized?}` | `{edges}` |
//!
//! Failures answer with `{"error": message}`: 400 for unknown algorithms and
//! invalid input or parameters, 404 for unknown data files, 500 otherwise.

pub mod error;
pub mod rest;

pub use error::ApiError;
pub use rest::RestApi;
