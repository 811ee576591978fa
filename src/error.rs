use std::path::PathBuf;

use vidlib_core::{SidecarError, VidlibCoreError};

/// Result type for migration operations
pub type Result<T> = std::result::Result<T, MigrateError>;

/// Error types for the migration pipeline
#[derive(thiserror::Error, Debug)]
pub enum MigrateError {
    #[error("source root {} is not a readable directory: {source}", path.display())]
    SourceRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot list directory {}: {source}", path.display())]
    ListDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid sidecar {}: {source}", path.display())]
    Sidecar {
        path: PathBuf,
        #[source]
        source: SidecarError,
    },

    #[error("copied video {} does not match its source (md5 {expected} != {actual})", path.display())]
    VerifyMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("invalid metadata file {}: {source}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: VidlibCoreError,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] VidlibCoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MigrateError::Io {
            path: path.into(),
            source,
        }
    }
}
