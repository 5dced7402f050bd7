//! Watcher change feed.
//!
//! The pipeline does not watch the filesystem itself; a host feeds it
//! [`WatchEvent`]s and passes the folded [`WatcherResults`] into
//! [`build`](crate::build()) to trigger a rebuild.

use strata_common::paths::normalize_path;

/// One filesystem change reported by a host-side watcher.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    /// A file was created.
    FileAdd(String),
    /// An existing file's content changed.
    FileUpdate(String),
    /// A file was removed.
    FileDelete(String),
    /// A directory was created.
    DirAdd(String),
    /// A directory was removed.
    DirDelete(String),
}

/// The accumulated change set behind one rebuild.
///
/// `files_changed` is the union of updated and added files; all lists
/// are sorted and deduplicated so change-set reconciliation and build
/// stats are deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatcherResults {
    /// Updated plus added files.
    pub files_changed: Vec<String>,
    /// Files whose content changed.
    pub files_updated: Vec<String>,
    /// Files that were created.
    pub files_added: Vec<String>,
    /// Files that were removed.
    pub files_deleted: Vec<String>,
    /// Directories that were created.
    pub dirs_added: Vec<String>,
    /// Directories that were removed.
    pub dirs_deleted: Vec<String>,
    /// The project configuration file itself changed; the rebuild must
    /// be a full build.
    pub config_updated: bool,
}

impl WatcherResults {
    /// Folds raw watcher events into a change set.
    pub fn from_events(events: impl IntoIterator<Item = WatchEvent>) -> Self {
        let mut results = Self::default();

        for event in events {
            match event {
                WatchEvent::FileAdd(path) => results.files_added.push(normalize_path(&path)),
                WatchEvent::FileUpdate(path) => results.files_updated.push(normalize_path(&path)),
                WatchEvent::FileDelete(path) => results.files_deleted.push(normalize_path(&path)),
                WatchEvent::DirAdd(path) => results.dirs_added.push(normalize_path(&path)),
                WatchEvent::DirDelete(path) => results.dirs_deleted.push(normalize_path(&path)),
            }
        }

        results.files_changed = results
            .files_updated
            .iter()
            .chain(results.files_added.iter())
            .cloned()
            .collect();

        for list in [
            &mut results.files_changed,
            &mut results.files_updated,
            &mut results.files_added,
            &mut results.files_deleted,
            &mut results.dirs_added,
            &mut results.dirs_deleted,
        ] {
            list.sort();
            list.dedup();
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changed_is_union_of_updated_and_added() {
        let results = WatcherResults::from_events(vec![
            WatchEvent::FileUpdate("/src/b.tsx".to_string()),
            WatchEvent::FileAdd("/src/a.tsx".to_string()),
            WatchEvent::FileUpdate("/src/b.tsx".to_string()),
            WatchEvent::FileDelete("/src/gone.tsx".to_string()),
        ]);

        assert_eq!(results.files_changed, vec!["/src/a.tsx", "/src/b.tsx"]);
        assert_eq!(results.files_updated, vec!["/src/b.tsx"]);
        assert_eq!(results.files_added, vec!["/src/a.tsx"]);
        assert_eq!(results.files_deleted, vec!["/src/gone.tsx"]);
    }

    #[test]
    fn paths_are_normalized() {
        let results = WatcherResults::from_events(vec![WatchEvent::DirAdd(
            "C:\\proj\\src\\cmp\\".to_string(),
        )]);
        assert_eq!(results.dirs_added, vec!["C:/proj/src/cmp"]);
    }
}
