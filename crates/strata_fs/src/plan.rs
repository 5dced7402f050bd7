//! The pure commit planner.
//!
//! Turns the staged entry map plus the queued copy tasks into an ordered
//! set of disk instructions. No I/O happens here; the planner only reads
//! pending flags and path shapes, which makes every ordering rule easy to
//! test in isolation.

use std::collections::BTreeMap;

use strata_common::paths::{ancestors, depth, dirname, is_root};

use crate::vfs::{CopyTask, FsItem};

/// The ordered disk operations produced by [`commit_instructions`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CommitInstructions {
    /// Files whose staged content must be written, unordered.
    pub files_to_write: Vec<String>,
    /// Files to remove from disk, unordered.
    pub files_to_delete: Vec<String>,
    /// Directories to create, shallowest first.
    pub dirs_to_ensure: Vec<String>,
    /// Directories to remove, deepest first.
    pub dirs_to_delete: Vec<String>,
    /// File copies to perform, unordered.
    pub copy_tasks: Vec<CopyTask>,
}

impl CommitInstructions {
    /// Returns `true` when there is nothing to do.
    pub fn is_empty(&self) -> bool {
        self.files_to_write.is_empty()
            && self.files_to_delete.is_empty()
            && self.dirs_to_ensure.is_empty()
            && self.dirs_to_delete.is_empty()
            && self.copy_tasks.is_empty()
    }
}

/// Plans the disk operations for the current pending set.
///
/// Pending flags are cleared as instructions are drawn, so a second call
/// with an unchanged map yields an empty plan. A file queued for both
/// write and delete is written; the write flag is inspected first and
/// both flags are cleared together. Ensured directories are closed over
/// their ancestors, ensures are ordered shallowest first and deletes
/// deepest first, ensuring rescues a directory from deletion, and
/// filesystem roots are never created or removed.
///
/// The entry map iterates in sorted order, so identical maps always
/// yield identical instruction orderings.
pub fn commit_instructions(
    items: &mut BTreeMap<String, FsItem>,
    copy_tasks: Vec<CopyTask>,
) -> CommitInstructions {
    let mut files_to_write: Vec<String> = Vec::new();
    let mut files_to_delete: Vec<String> = Vec::new();
    let mut dirs_to_ensure: Vec<String> = Vec::new();
    let mut dirs_to_delete: Vec<String> = Vec::new();

    for (path, item) in items.iter_mut() {
        if item.queue_write {
            if item.is_file {
                files_to_write.push(path.clone());
                let dir = dirname(path);
                if !dirs_to_ensure.contains(&dir) {
                    dirs_to_ensure.push(dir);
                }
            } else if item.is_dir && !dirs_to_ensure.contains(path) {
                dirs_to_ensure.push(path.clone());
            }
        } else if item.queue_delete {
            if item.is_dir {
                dirs_to_delete.push(path.clone());
            } else if item.is_file {
                files_to_delete.push(path.clone());
            }
        }

        item.queue_write = false;
        item.queue_delete = false;
    }

    for task in &copy_tasks {
        let dir = dirname(&task.dest);
        if !dirs_to_ensure.contains(&dir) {
            dirs_to_ensure.push(dir);
        }
    }

    // every ensured directory needs its whole parent chain too
    let direct: Vec<String> = dirs_to_ensure.clone();
    for dir in &direct {
        for ancestor in ancestors(dir) {
            if !dirs_to_ensure.contains(&ancestor) {
                dirs_to_ensure.push(ancestor);
            }
        }
    }

    // shallowest first, so parents exist before their children
    dirs_to_ensure.sort_by(|a, b| depth(a).cmp(&depth(b)).then(a.len().cmp(&b.len())));

    // deepest first, so directories are empty when removed
    dirs_to_delete.sort_by(|a, b| depth(b).cmp(&depth(a)).then(b.len().cmp(&a.len())));

    // a directory that will receive output must survive the delete pass
    dirs_to_delete.retain(|dir| !dirs_to_ensure.contains(dir));
    dirs_to_delete.retain(|dir| !is_root(dir));

    dirs_to_ensure.retain(|dir| {
        if is_root(dir) {
            return false;
        }
        match items.get(dir) {
            Some(item) => !(item.exists == Some(true) && item.is_dir),
            None => true,
        }
    });

    CommitInstructions {
        files_to_write,
        files_to_delete,
        dirs_to_ensure,
        dirs_to_delete,
        copy_tasks,
    }
}
