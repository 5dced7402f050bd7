//! Write-buffered virtual filesystem for the build pipeline.
//!
//! All output produced during a build is staged in memory first. A single
//! [`VirtualFs::commit`] call at the end of the build diffs the staged
//! state against what is already cached from disk and performs only the
//! operations that are actually needed. Reads are cached so repeated
//! lookups of the same source file cost one physical read per build
//! session.
//!
//! The [`plan`] module holds the pure planner that turns the staged entry
//! map into an ordered set of disk instructions; it is the only place
//! commit ordering rules live.

#![warn(missing_docs)]

pub mod disk;
mod error;
pub mod plan;
mod vfs;

#[cfg(test)]
pub(crate) mod testfs;

pub use disk::{DiskFs, DiskStat, NativeFs};
pub use error::FsError;
pub use vfs::{CommitResults, CopyTask, FsItem, FsStat, ReadDirItem, VirtualFs};
