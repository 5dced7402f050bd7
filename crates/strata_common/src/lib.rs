//! Shared foundational types used across the Strata build toolchain.
//!
//! This crate provides content hashing for cache keys, the normalized
//! path model used by the virtual filesystem, and common result types.

#![warn(missing_docs)]

pub mod hash;
pub mod paths;
pub mod result;

pub use hash::ContentHash;
pub use result::{InternalError, StrataResult};
