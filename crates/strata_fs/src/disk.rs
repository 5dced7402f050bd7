//! The seam between the virtual filesystem and real disk I/O.
//!
//! Everything above this trait works with normalized forward-slash path
//! strings and never touches `std::fs` directly, which keeps the rest of
//! the pipeline testable against in-memory disks.

use std::fs;
use std::io;
use std::path::Path;

/// Minimal stat result for a disk entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskStat {
    /// Whether the entry is a regular file.
    pub is_file: bool,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

/// The physical disk operations the virtual filesystem needs.
///
/// All paths are normalized absolute strings. Implementations must be
/// shareable across the rayon pool used during commit.
pub trait DiskFs: Send + Sync {
    /// Stats a path.
    fn stat(&self, path: &str) -> io::Result<DiskStat>;

    /// Reads a file to a UTF-8 string.
    fn read_to_string(&self, path: &str) -> io::Result<String>;

    /// Lists the names of a directory's immediate children.
    fn read_dir(&self, path: &str) -> io::Result<Vec<String>>;

    /// Creates a single directory. Parents must already exist.
    fn create_dir(&self, path: &str) -> io::Result<()>;

    /// Writes a file, replacing any existing content.
    fn write(&self, path: &str, content: &str) -> io::Result<()>;

    /// Copies a file byte for byte.
    fn copy_file(&self, src: &str, dest: &str) -> io::Result<()>;

    /// Removes a file.
    fn remove_file(&self, path: &str) -> io::Result<()>;

    /// Removes an empty directory.
    fn remove_dir(&self, path: &str) -> io::Result<()>;
}

/// [`DiskFs`] backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeFs;

impl DiskFs for NativeFs {
    fn stat(&self, path: &str) -> io::Result<DiskStat> {
        let meta = fs::metadata(Path::new(path))?;
        Ok(DiskStat {
            is_file: meta.is_file(),
            is_dir: meta.is_dir(),
        })
    }

    fn read_to_string(&self, path: &str) -> io::Result<String> {
        fs::read_to_string(Path::new(path))
    }

    fn read_dir(&self, path: &str) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(Path::new(path))? {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn create_dir(&self, path: &str) -> io::Result<()> {
        fs::create_dir(Path::new(path))
    }

    fn write(&self, path: &str, content: &str) -> io::Result<()> {
        fs::write(Path::new(path), content)
    }

    fn copy_file(&self, src: &str, dest: &str) -> io::Result<()> {
        fs::copy(Path::new(src), Path::new(dest)).map(|_| ())
    }

    fn remove_file(&self, path: &str) -> io::Result<()> {
        fs::remove_file(Path::new(path))
    }

    fn remove_dir(&self, path: &str) -> io::Result<()> {
        fs::remove_dir(Path::new(path))
    }
}
