use std::io;
use std::path::{Path, PathBuf};

/// Failure of an `AssetStore` operation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backend could not be read or written.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
    /// A committed record is unreadable or disagrees with its metadata.
    #[error("corrupt record at {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },
}

impl StorageError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }

    pub fn corrupt(path: &Path, reason: impl Into<String>) -> Self {
        Self::Corrupt { path: path.to_path_buf(), reason: reason.into() }
    }
}
