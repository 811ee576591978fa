//! Video Library Migration - Rust Implementation
//!
//! Converts a legacy archive of `.mp4` videos with optional XML sidecars into
//! a tree of per-video directories holding `meta.json` and `video.mp4`, and
//! builds the `items.json` manifest the library front end reads.

pub mod config;
pub mod error;
pub mod fs;
pub mod logging;
pub mod manifest;
pub mod normalize;
pub mod processing;
pub mod traverse;
pub mod writer;

// Re-export main types for easy access
pub use crate::config::{Config, ConfigBuilder, OnItemError};
pub use crate::error::{MigrateError, Result};
pub use crate::fs::{MemoryFs, OsFs, SourceFs};
pub use crate::manifest::{build_manifest, write_manifest, ManifestNode};
pub use crate::normalize::MetadataNormalizer;
pub use crate::processing::{MigrateOptions, MigrationReport, MigrationSummary, Migrator};
pub use crate::traverse::SourceWalker;
pub use crate::writer::{TreeWriter, VideoMode};
pub use vidlib_core::{MetadataRecord, SourceItem, TitleCleaner};
