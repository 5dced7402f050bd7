use std::io;
use thiserror::Error;

/// Errors surfaced by the virtual filesystem.
///
/// Only read-side operations return these; queueing writes and deletes is
/// infallible, and commit reports per-operation failures in its results
/// instead of erroring.
#[derive(Debug, Error)]
pub enum FsError {
    /// The path does not exist on disk or in the cache.
    #[error("path not found: {path}")]
    NotFound {
        /// Normalized path that was requested.
        path: String,
    },

    /// An underlying disk operation failed.
    #[error("io error at {path}: {source}")]
    Io {
        /// Normalized path the operation targeted.
        path: String,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
}

impl FsError {
    pub(crate) fn from_io(path: &str, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            FsError::NotFound { path: path.to_string() }
        } else {
            FsError::Io { path: path.to_string(), source }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_from_io_kind() {
        let err = FsError::from_io("/a/b", io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(matches!(err, FsError::NotFound { .. }));
        assert_eq!(err.to_string(), "path not found: /a/b");
    }

    #[test]
    fn other_io_kinds_wrapped() {
        let err = FsError::from_io("/a/b", io::Error::new(io::ErrorKind::PermissionDenied, "no"));
        assert!(matches!(err, FsError::Io { .. }));
    }
}
