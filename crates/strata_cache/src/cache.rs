use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use strata_common::hash::ContentHash;
use strata_common::paths::{join, normalize_path};
use strata_diagnostics::Logger;
use strata_fs::VirtualFs;

/// After this many consecutive failed gets, disk reads are skipped for
/// the remainder of the build. A commit resets the counter.
const MAX_FAILED_GETS: usize = 20;

/// Content-addressed cache persisted through the shared [`VirtualFs`].
///
/// Each entry is one file in the cache directory, named by its key, with
/// the raw output string as content. Keys combine a domain with a hash
/// of the input, so an entry never becomes stale and never needs
/// invalidation.
pub struct Cache {
    fs: Arc<VirtualFs>,
    cache_dir: String,
    enabled: bool,
    logger: Logger,
    failed_gets: AtomicUsize,
}

impl Cache {
    /// Creates a cache rooted at `cache_dir`.
    ///
    /// When disabled, stale entries from previous runs are unusable, so
    /// the cache directory is emptied and committed immediately.
    pub fn new(fs: Arc<VirtualFs>, cache_dir: &str, enabled: bool, logger: Logger) -> Self {
        let cache_dir = normalize_path(cache_dir);

        if enabled {
            logger.debug(format!("cache enabled, dir: {cache_dir}"));
        } else {
            logger.debug(format!("cache disabled, emptying dir: {cache_dir}"));
            fs.empty_dir(&cache_dir);
            fs.commit();
        }

        Self {
            fs,
            cache_dir,
            enabled,
            logger,
            failed_gets: AtomicUsize::new(0),
        }
    }

    /// Whether gets and puts are live.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Builds the key for a domain and input content:
    /// `<domain>_<32-hex content hash>`. When the cache is disabled the
    /// key is an empty sentinel that never matches an entry.
    pub fn create_key(&self, domain: &str, content: &str) -> String {
        if !self.enabled {
            return String::new();
        }
        format!("{domain}_{}", ContentHash::from_str_content(content))
    }

    /// Looks up a cached entry. Never errors: any failure is a miss.
    ///
    /// Consecutive failures trip a circuit breaker so a broken cache
    /// directory does not tax every transformation with a doomed disk
    /// read; one successful get arms it again.
    pub fn get(&self, key: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }

        if self.failed_gets.load(Ordering::SeqCst) >= MAX_FAILED_GETS {
            return None;
        }

        match self.fs.read_file(&self.entry_path(key)) {
            Ok(text) => {
                self.failed_gets.store(0, Ordering::SeqCst);
                Some(text)
            }
            Err(_) => {
                let failed = self.failed_gets.fetch_add(1, Ordering::SeqCst) + 1;
                if failed == MAX_FAILED_GETS {
                    self.logger.debug(format!(
                        "cache had {failed} failed gets, skipping cache reads for the rest of the build"
                    ));
                }
                None
            }
        }
    }

    /// Stores an entry. Best-effort: returns `false` when the cache is
    /// disabled, never errors.
    pub fn put(&self, key: &str, value: &str) -> bool {
        if !self.enabled {
            return false;
        }
        self.fs.write_file(&self.entry_path(key), value);
        true
    }

    /// Flushes pending entries to disk and re-arms the failed-get
    /// breaker. Runs after the primary output commit; failures here are
    /// reported by the filesystem but never affect build results.
    pub fn commit(&self) {
        if self.enabled {
            self.failed_gets.store(0, Ordering::SeqCst);
            self.fs.commit();
        }
    }

    /// Drops the in-memory file cache backing the entries.
    pub fn clear(&self) {
        self.fs.clear_cache();
    }

    fn entry_path(&self, key: &str) -> String {
        join(&self.cache_dir, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_common::paths::normalize_path;
    use strata_fs::{DiskFs, NativeFs, VirtualFs};
    use tempfile::TempDir;

    fn setup(enabled: bool) -> (TempDir, Arc<VirtualFs>, Cache) {
        let tmp = TempDir::new().unwrap();
        let disk: Arc<dyn DiskFs> = Arc::new(NativeFs);
        let fs = Arc::new(VirtualFs::new(disk));
        let dir = join(
            &normalize_path(&tmp.path().to_string_lossy()),
            ".strata/cache",
        );
        let cache = Cache::new(fs.clone(), &dir, enabled, Logger::default());
        (tmp, fs, cache)
    }

    #[test]
    fn keys_are_domain_prefixed_and_content_addressed() {
        let (_tmp, _fs, cache) = setup(true);

        let a = cache.create_key("transpile", "const a = 1;");
        let b = cache.create_key("transpile", "const a = 1;");
        let c = cache.create_key("transpile", "const a = 2;");
        let d = cache.create_key("style", "const a = 1;");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert!(a.starts_with("transpile_"));
        assert_eq!(a.len(), "transpile_".len() + 32);
    }

    #[test]
    fn put_then_get_round_trip() {
        let (_tmp, _fs, cache) = setup(true);

        let key = cache.create_key("transpile", "input");
        assert!(cache.get(&key).is_none());
        assert!(cache.put(&key, "output"));
        assert_eq!(cache.get(&key).as_deref(), Some("output"));
    }

    #[test]
    fn entries_survive_commit_and_reload() {
        let (tmp, fs, cache) = setup(true);

        let key = cache.create_key("style", "a { color: red }");
        cache.put(&key, "a{color:red}");
        cache.commit();

        // a fresh session over the same directory sees the entry
        let disk: Arc<dyn DiskFs> = Arc::new(NativeFs);
        let fs2 = Arc::new(VirtualFs::new(disk));
        let dir = join(
            &normalize_path(&tmp.path().to_string_lossy()),
            ".strata/cache",
        );
        let cache2 = Cache::new(fs2, &dir, true, Logger::default());
        assert_eq!(cache2.get(&key).as_deref(), Some("a{color:red}"));
        drop(fs);
    }

    #[test]
    fn disabled_cache_misses_everything() {
        let (_tmp, _fs, cache) = setup(false);

        assert_eq!(cache.create_key("transpile", "x"), "");
        assert!(!cache.put("transpile_abc", "y"));
        assert!(cache.get("transpile_abc").is_none());
    }

    #[test]
    fn failed_gets_trip_the_breaker() {
        let (_tmp, _fs, cache) = setup(true);

        for i in 0..MAX_FAILED_GETS {
            assert!(cache.get(&format!("missing_{i}")).is_none());
        }
        assert_eq!(cache.failed_gets.load(Ordering::SeqCst), MAX_FAILED_GETS);

        // short-circuits without touching disk now
        assert!(cache.get("missing_more").is_none());
        assert_eq!(cache.failed_gets.load(Ordering::SeqCst), MAX_FAILED_GETS);

        // commit re-arms it
        cache.commit();
        assert_eq!(cache.failed_gets.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn successful_get_resets_the_counter() {
        let (_tmp, _fs, cache) = setup(true);

        let key = cache.create_key("transpile", "real");
        cache.put(&key, "entry");

        cache.get("missing_one");
        cache.get("missing_two");
        assert_eq!(cache.failed_gets.load(Ordering::SeqCst), 2);

        assert!(cache.get(&key).is_some());
        assert_eq!(cache.failed_gets.load(Ordering::SeqCst), 0);
    }
}
