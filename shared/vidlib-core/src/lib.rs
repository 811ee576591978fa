//! Vidlib Core - Shared data structures and pure transforms for the video library migration

pub mod encoding;
pub mod metadata;
pub mod sidecar;
pub mod source_item;
pub mod title;

pub use encoding::{decode_to_utf8, detect_encoding};
pub use metadata::{format_size, MetadataRecord};
pub use sidecar::{parse_sidecar, SidecarError, SidecarMeta};
pub use source_item::SourceItem;
pub use title::{TitleCleaner, TitleRule};

/// Result type for Vidlib Core operations
pub type Result<T> = std::result::Result<T, VidlibCoreError>;

/// Error types for Vidlib Core operations
#[derive(thiserror::Error, Debug)]
pub enum VidlibCoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path error: {0}")]
    Path(String),

    #[error("Sidecar error: {0}")]
    Sidecar(#[from] SidecarError),

    #[error("Invalid title rule '{pattern}': {source}")]
    Rule {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
