//! Content-addressed cache for expensive build transformations.
//!
//! Transpile, bundle, and style outputs are keyed by a hash of their
//! input, so cache entries are immutable and survive across builds and
//! processes. The cache is strictly best-effort: a miss or a disk
//! failure only costs recomputation, never a build error.

#![warn(missing_docs)]

mod cache;

pub use cache::Cache;
