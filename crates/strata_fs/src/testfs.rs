//! In-memory counting disk used by tests in this crate.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use strata_common::paths::{ancestors, dirname, is_under, rel_from};

use crate::disk::{DiskFs, DiskStat};

pub struct MemDisk {
    files: Mutex<BTreeMap<String, String>>,
    dirs: Mutex<BTreeSet<String>>,
    stats: AtomicUsize,
    reads: AtomicUsize,
    writes: AtomicUsize,
    lists: AtomicUsize,
}

impl MemDisk {
    pub fn new() -> Self {
        let mut dirs = BTreeSet::new();
        dirs.insert("/".to_string());
        Self {
            files: Mutex::new(BTreeMap::new()),
            dirs: Mutex::new(dirs),
            stats: AtomicUsize::new(0),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            lists: AtomicUsize::new(0),
        }
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        {
            let mut dirs = self.dirs.lock().unwrap();
            for dir in ancestors(path) {
                dirs.insert(dir);
            }
            self.files
                .lock()
                .unwrap()
                .insert(path.to_string(), content.to_string());
        }
        self
    }

    pub fn stat_calls(&self) -> usize {
        self.stats.load(Ordering::SeqCst)
    }

    pub fn read_calls(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn write_calls(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    pub fn file(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.dirs.lock().unwrap().contains(path)
    }

    fn not_found() -> io::Error {
        io::Error::new(io::ErrorKind::NotFound, "not found")
    }
}

impl DiskFs for MemDisk {
    fn stat(&self, path: &str) -> io::Result<DiskStat> {
        self.stats.fetch_add(1, Ordering::SeqCst);
        if self.files.lock().unwrap().contains_key(path) {
            return Ok(DiskStat {
                is_file: true,
                is_dir: false,
            });
        }
        if self.dirs.lock().unwrap().contains(path) {
            return Ok(DiskStat {
                is_file: false,
                is_dir: true,
            });
        }
        Err(Self::not_found())
    }

    fn read_to_string(&self, path: &str) -> io::Result<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(Self::not_found)
    }

    fn read_dir(&self, path: &str) -> io::Result<Vec<String>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        let files = self.files.lock().unwrap();
        let dirs = self.dirs.lock().unwrap();
        if !dirs.contains(path) {
            return Err(Self::not_found());
        }

        let mut names = BTreeSet::new();
        for entry in files.keys().chain(dirs.iter()) {
            if entry == path || !is_under(path, entry) {
                continue;
            }
            if let Some(rel) = rel_from(path, entry) {
                if let Some(first) = rel.split('/').next() {
                    if !first.is_empty() {
                        names.insert(first.to_string());
                    }
                }
            }
        }
        Ok(names.into_iter().collect())
    }

    fn create_dir(&self, path: &str) -> io::Result<()> {
        if self.files.lock().unwrap().contains_key(path) {
            return Err(io::Error::new(io::ErrorKind::Other, "file in the way"));
        }
        let mut dirs = self.dirs.lock().unwrap();
        if dirs.contains(path) {
            return Err(io::Error::new(io::ErrorKind::AlreadyExists, "exists"));
        }
        if !dirs.contains(&dirname(path)) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "parent missing"));
        }
        dirs.insert(path.to_string());
        Ok(())
    }

    fn write(&self, path: &str, content: &str) -> io::Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if !self.dirs.lock().unwrap().contains(&dirname(path)) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "parent missing"));
        }
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_string());
        Ok(())
    }

    fn copy_file(&self, src: &str, dest: &str) -> io::Result<()> {
        let content = self
            .files
            .lock()
            .unwrap()
            .get(src)
            .cloned()
            .ok_or_else(Self::not_found)?;
        if !self.dirs.lock().unwrap().contains(&dirname(dest)) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "parent missing"));
        }
        self.files.lock().unwrap().insert(dest.to_string(), content);
        Ok(())
    }

    fn remove_file(&self, path: &str) -> io::Result<()> {
        self.files
            .lock()
            .unwrap()
            .remove(path)
            .map(|_| ())
            .ok_or_else(Self::not_found)
    }

    fn remove_dir(&self, path: &str) -> io::Result<()> {
        let files = self.files.lock().unwrap();
        let mut dirs = self.dirs.lock().unwrap();
        if !dirs.contains(path) {
            return Err(Self::not_found());
        }
        let occupied = files.keys().any(|f| is_under(path, f) && f != path)
            || dirs.iter().any(|d| is_under(path, d) && d != path);
        if occupied {
            return Err(io::Error::new(io::ErrorKind::Other, "directory not empty"));
        }
        dirs.remove(path);
        Ok(())
    }
}
