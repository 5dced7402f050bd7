//! The write-buffered virtual filesystem.

use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use rayon::prelude::*;

use strata_common::paths::{is_under, join, normalize_path, rel_from};

use crate::disk::DiskFs;
use crate::error::FsError;
use crate::plan;

/// Cached state for one path.
///
/// `exists: None` means the path has never been statted. The flags and
/// content are filled in lazily as reads happen; the queue flags stage
/// work for the next [`VirtualFs::commit`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FsItem {
    /// Whether the path exists, once known.
    pub exists: Option<bool>,
    /// Whether the path is a regular file.
    pub is_file: bool,
    /// Whether the path is a directory.
    pub is_dir: bool,
    /// Cached file content, once read or written.
    pub content: Option<String>,
    /// A write to disk is pending for this path.
    pub queue_write: bool,
    /// A delete from disk is pending for this path.
    pub queue_delete: bool,
}

/// Stat result served from the cache or from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsStat {
    /// Whether the path is a regular file.
    pub is_file: bool,
    /// Whether the path is a directory.
    pub is_dir: bool,
}

/// One entry returned by [`VirtualFs::read_dir`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReadDirItem {
    /// Normalized absolute path of the entry.
    pub abs_path: String,
    /// Path of the entry relative to the listed directory.
    pub rel_path: String,
    /// Whether the entry is a regular file.
    pub is_file: bool,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

/// A queued file copy, expanded from [`VirtualFs::copy`] at queue time.
#[derive(Debug, Clone, PartialEq)]
pub struct CopyTask {
    /// Normalized source file path.
    pub src: String,
    /// Normalized destination file path.
    pub dest: String,
}

/// Outcome of one [`VirtualFs::commit`].
///
/// Per-operation failures are collected in `errors` instead of aborting
/// the commit; sibling operations always run.
#[derive(Debug, Default, Clone)]
pub struct CommitResults {
    /// Files whose content was written.
    pub files_written: Vec<String>,
    /// Destination paths of performed copies.
    pub files_copied: Vec<String>,
    /// Files removed from disk.
    pub files_deleted: Vec<String>,
    /// Directories removed from disk.
    pub dirs_deleted: Vec<String>,
    /// Directories created on disk.
    pub dirs_added: Vec<String>,
    /// Human-readable descriptions of failed operations.
    pub errors: Vec<String>,
}

/// Shared, write-buffered view over a [`DiskFs`].
///
/// Reads go through a per-path cache so each source file costs one
/// physical read per session. Writes and deletes are staged in memory and
/// only reach disk on [`commit`](Self::commit), which diffs the staged
/// state against the cache and performs the minimal set of operations.
pub struct VirtualFs {
    disk: Arc<dyn DiskFs>,
    items: Mutex<BTreeMap<String, FsItem>>,
    copy_tasks: Mutex<Vec<CopyTask>>,
}

impl VirtualFs {
    /// Creates an empty virtual filesystem over the given disk.
    pub fn new(disk: Arc<dyn DiskFs>) -> Self {
        Self {
            disk,
            items: Mutex::new(BTreeMap::new()),
            copy_tasks: Mutex::new(Vec::new()),
        }
    }

    /// The underlying disk seam.
    pub fn disk(&self) -> &Arc<dyn DiskFs> {
        &self.disk
    }

    fn items(&self) -> MutexGuard<'_, BTreeMap<String, FsItem>> {
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn tasks(&self) -> MutexGuard<'_, Vec<CopyTask>> {
        self.copy_tasks.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cached existence check. At most one physical stat per path; a
    /// negative result is cached too.
    pub fn access(&self, path: &str) -> bool {
        let path = normalize_path(path);
        let mut items = self.items();

        if let Some(item) = items.get(&path) {
            if let Some(exists) = item.exists {
                return exists;
            }
        }

        match self.disk.stat(&path) {
            Ok(stat) => {
                let item = items.entry(path).or_default();
                item.exists = Some(true);
                item.is_file = stat.is_file;
                item.is_dir = stat.is_dir;
                true
            }
            Err(_) => {
                let item = items.entry(path).or_default();
                item.exists = Some(false);
                false
            }
        }
    }

    /// Stats a path, served from the cache when its flags are known.
    pub fn stat(&self, path: &str) -> Result<FsStat, FsError> {
        let path = normalize_path(path);
        let mut items = self.items();
        self.stat_locked(&mut items, &path)
    }

    fn stat_locked(
        &self,
        items: &mut BTreeMap<String, FsItem>,
        path: &str,
    ) -> Result<FsStat, FsError> {
        if let Some(item) = items.get(path) {
            if item.exists == Some(true) && (item.is_file || item.is_dir) {
                return Ok(FsStat {
                    is_file: item.is_file,
                    is_dir: item.is_dir,
                });
            }
        }

        let stat = self
            .disk
            .stat(path)
            .map_err(|e| FsError::from_io(path, e))?;
        let item = items.entry(path.to_string()).or_default();
        item.exists = Some(true);
        item.is_file = stat.is_file;
        item.is_dir = stat.is_dir;
        Ok(FsStat {
            is_file: stat.is_file,
            is_dir: stat.is_dir,
        })
    }

    /// Reads a file through the cache.
    pub fn read_file(&self, path: &str) -> Result<String, FsError> {
        self.read_file_with(path, true)
    }

    /// Reads a file, optionally bypassing the content cache. A bypassing
    /// read still refreshes the cached content.
    pub fn read_file_with(&self, path: &str, use_cache: bool) -> Result<String, FsError> {
        let path = normalize_path(path);
        let mut items = self.items();

        if use_cache {
            if let Some(item) = items.get(&path) {
                if item.exists == Some(true) {
                    if let Some(text) = &item.content {
                        return Ok(text.clone());
                    }
                }
            }
        }

        let text = self
            .disk
            .read_to_string(&path)
            .map_err(|e| FsError::from_io(&path, e))?;
        let item = items.entry(path).or_default();
        item.exists = Some(true);
        item.is_file = true;
        item.is_dir = false;
        item.content = Some(text.clone());
        Ok(text)
    }

    /// Stages a file write. The write only reaches disk on commit, and
    /// only when the content differs from what is already cached for the
    /// path, so rewriting unchanged output is free.
    pub fn write_file(&self, path: &str, content: &str) {
        self.write_impl(path, content, false);
    }

    /// Updates the cached content without ever queueing a disk write.
    pub fn write_file_in_memory(&self, path: &str, content: &str) {
        self.write_impl(path, content, true);
    }

    /// Stages several file writes.
    pub fn write_files<'a>(&self, files: impl IntoIterator<Item = (&'a str, &'a str)>) {
        for (path, content) in files {
            self.write_file(path, content);
        }
    }

    fn write_impl(&self, path: &str, content: &str, in_memory_only: bool) {
        let path = normalize_path(path);
        let mut items = self.items();
        let item = items.entry(path).or_default();

        item.exists = Some(true);
        item.is_file = true;
        item.is_dir = false;
        item.queue_delete = false;

        if !in_memory_only && !item.queue_write && item.content.as_deref() != Some(content) {
            item.queue_write = true;
        }
        item.content = Some(content.to_string());
    }

    /// Stages a file delete.
    pub fn remove_file(&self, path: &str) {
        let path = normalize_path(path);
        let mut items = self.items();
        let item = items.entry(path).or_default();
        item.queue_delete = true;
    }

    /// Stages a recursive directory delete. A directory that never
    /// existed is not an error; there is simply nothing to queue.
    pub fn remove_dir(&self, path: &str) {
        let path = normalize_path(path);
        let mut items = self.items();
        self.remove_dir_locked(&mut items, &path);
    }

    fn remove_dir_locked(&self, items: &mut BTreeMap<String, FsItem>, path: &str) {
        {
            let item = items.entry(path.to_string()).or_default();
            item.is_file = false;
            item.is_dir = true;
            item.queue_delete = true;
        }

        let mut entries = Vec::new();
        if self
            .read_dir_locked(items, path, path, true, &mut entries)
            .is_ok()
        {
            for entry in entries {
                let item = items.entry(entry.abs_path).or_default();
                if entry.is_dir {
                    item.is_file = false;
                    item.is_dir = true;
                }
                item.queue_delete = true;
            }
        }
    }

    /// Stages the removal of everything inside a directory while keeping
    /// the directory itself, creating it if needed.
    pub fn empty_dir(&self, path: &str) {
        let path = normalize_path(path);
        let mut items = self.items();
        self.remove_dir_locked(&mut items, &path);

        let item = items.entry(path).or_default();
        item.is_file = false;
        item.is_dir = true;
        item.queue_write = true;
    }

    /// Lists a directory. Always a physical listing; the stat cache for
    /// each child is refreshed as a side effect.
    pub fn read_dir(&self, path: &str, recursive: bool) -> Result<Vec<ReadDirItem>, FsError> {
        let path = normalize_path(path);
        let mut items = self.items();
        let mut out = Vec::new();
        self.read_dir_locked(&mut items, &path, &path, recursive, &mut out)?;
        Ok(out)
    }

    fn read_dir_locked(
        &self,
        items: &mut BTreeMap<String, FsItem>,
        init: &str,
        dir: &str,
        recursive: bool,
        out: &mut Vec<ReadDirItem>,
    ) -> Result<(), FsError> {
        let names = self
            .disk
            .read_dir(dir)
            .map_err(|e| FsError::from_io(dir, e))?;

        {
            let item = items.entry(dir.to_string()).or_default();
            item.exists = Some(true);
            item.is_file = false;
            item.is_dir = true;
        }

        for name in names {
            let abs_path = join(dir, &name);
            let rel_path = rel_from(init, &abs_path).unwrap_or_else(|| name.clone());
            let stat = self.stat_locked(items, &abs_path)?;

            out.push(ReadDirItem {
                abs_path: abs_path.clone(),
                rel_path,
                is_file: stat.is_file,
                is_dir: stat.is_dir,
            });

            if recursive && stat.is_dir {
                self.read_dir_locked(items, init, &abs_path, recursive, out)?;
            }
        }

        Ok(())
    }

    /// Queues a copy. Directories expand to per-file tasks at queue time
    /// by listing the source; the filter sees normalized source and
    /// destination paths and excludes files eagerly.
    pub fn copy(
        &self,
        src: &str,
        dest: &str,
        filter: Option<&dyn Fn(&str, &str) -> bool>,
    ) -> Result<(), FsError> {
        let src = normalize_path(src);
        let dest = normalize_path(dest);

        let mut queued = Vec::new();
        {
            let mut items = self.items();
            let stat = self.stat_locked(&mut items, &src)?;

            if stat.is_dir {
                let mut entries = Vec::new();
                self.read_dir_locked(&mut items, &src, &src, true, &mut entries)?;
                for entry in entries {
                    if !entry.is_file {
                        continue;
                    }
                    let dest_path = join(&dest, &entry.rel_path);
                    if filter.map_or(true, |f| f(&entry.abs_path, &dest_path)) {
                        queued.push(CopyTask {
                            src: entry.abs_path,
                            dest: dest_path,
                        });
                    }
                }
            } else if stat.is_file && filter.map_or(true, |f| f(&src, &dest)) {
                queued.push(CopyTask { src, dest });
            }
        }

        self.tasks().extend(queued);
        Ok(())
    }

    /// Flushes all staged changes to disk.
    ///
    /// Directories are created shallowest first, file writes and copies
    /// run in parallel, then files are deleted, then directories deepest
    /// first. Cache entries for deleted paths are dropped so later reads
    /// see the real disk. A failure in one operation never stops the
    /// others, and an empty pending set is a no-op.
    pub fn commit(&self) -> CommitResults {
        let mut results = CommitResults::default();

        let (instructions, writes) = {
            let mut items = self.items();
            let tasks = std::mem::take(&mut *self.tasks());
            let instructions = plan::commit_instructions(&mut items, tasks);
            if instructions.is_empty() {
                return results;
            }

            let writes: Vec<(String, String)> = instructions
                .files_to_write
                .iter()
                .filter_map(|path| {
                    let content = items.get(path).and_then(|item| item.content.clone())?;
                    Some((path.clone(), content))
                })
                .collect();

            (instructions, writes)
        };

        let mut ensured: Vec<&String> = Vec::new();
        for dir in &instructions.dirs_to_ensure {
            match self.disk.create_dir(dir) {
                Ok(()) => {
                    results.dirs_added.push(dir.clone());
                    ensured.push(dir);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => ensured.push(dir),
                Err(e) => results.errors.push(format!("create dir {dir}: {e}")),
            }
        }

        // only directories that actually exist become known directories
        {
            let mut items = self.items();
            for dir in ensured {
                let item = items.entry(dir.clone()).or_default();
                item.exists = Some(true);
                item.is_file = false;
                item.is_dir = true;
            }
        }

        let write_outcomes: Vec<Result<String, String>> = writes
            .par_iter()
            .map(|(path, content)| {
                self.disk
                    .write(path, content)
                    .map(|_| path.clone())
                    .map_err(|e| format!("write {path}: {e}"))
            })
            .collect();

        let copy_outcomes: Vec<Result<String, String>> = instructions
            .copy_tasks
            .par_iter()
            .map(|task| {
                self.disk
                    .copy_file(&task.src, &task.dest)
                    .map(|_| task.dest.clone())
                    .map_err(|e| format!("copy {} -> {}: {e}", task.src, task.dest))
            })
            .collect();

        for outcome in write_outcomes {
            match outcome {
                Ok(path) => results.files_written.push(path),
                Err(e) => results.errors.push(e),
            }
        }
        for outcome in copy_outcomes {
            match outcome {
                Ok(path) => results.files_copied.push(path),
                Err(e) => results.errors.push(e),
            }
        }

        for path in &instructions.files_to_delete {
            match self.disk.remove_file(path) {
                Ok(()) => results.files_deleted.push(path.clone()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    results.files_deleted.push(path.clone())
                }
                Err(e) => results.errors.push(format!("delete {path}: {e}")),
            }
        }

        for dir in &instructions.dirs_to_delete {
            match self.disk.remove_dir(dir) {
                Ok(()) => results.dirs_deleted.push(dir.clone()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    results.dirs_deleted.push(dir.clone())
                }
                Err(e) => results.errors.push(format!("delete dir {dir}: {e}")),
            }
        }

        {
            let mut items = self.items();
            for path in &instructions.files_to_delete {
                items.remove(path);
            }
            for dir in &instructions.dirs_to_delete {
                clear_dir_locked(&mut items, dir);
            }
        }

        results
    }

    /// Drops the cache entry for a single path.
    pub fn clear_file_cache(&self, path: &str) {
        let path = normalize_path(path);
        self.items().remove(&path);
    }

    /// Drops the cache entries for a directory and everything under it.
    pub fn clear_dir_cache(&self, path: &str) {
        let path = normalize_path(path);
        clear_dir_locked(&mut self.items(), &path);
    }

    /// Drops the entire cache.
    pub fn clear_cache(&self) {
        self.items().clear();
    }
}

fn clear_dir_locked(items: &mut BTreeMap<String, FsItem>, dir: &str) {
    items.retain(|path, _| !is_under(dir, path));
}
