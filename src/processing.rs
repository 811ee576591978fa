use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use vidlib_core::{format_size, SourceItem, TitleCleaner};

use crate::config::{Config, OnItemError};
use crate::error::{MigrateError, Result};
use crate::fs::SourceFs;
use crate::normalize::MetadataNormalizer;
use crate::traverse::SourceWalker;
use crate::writer::{TreeWriter, VideoMode, WrittenItem};

/// Per-run switches, usually taken from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrateOptions {
    /// Copy video bytes instead of writing a placeholder
    pub hot: bool,
    /// Compare MD5 digests after copying
    pub verify: bool,
    pub on_item_error: OnItemError,
}

impl MigrateOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            hot: false,
            verify: false,
            on_item_error: config.errors.on_item_error,
        }
    }

    pub fn hot(mut self, hot: bool) -> Self {
        self.hot = hot;
        self
    }

    pub fn verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn on_item_error(mut self, policy: OnItemError) -> Self {
        self.on_item_error = policy;
        self
    }

    fn video_mode(&self) -> VideoMode {
        if self.hot {
            VideoMode::Copy {
                verify: self.verify,
            }
        } else {
            VideoMode::Placeholder
        }
    }
}

/// An item that could not be migrated while errors were being skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Counters accumulated over one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationSummary {
    pub videos_found: usize,
    pub migrated: usize,
    pub with_sidecar: usize,
    pub skipped: usize,
    pub collisions: usize,
    /// Size of every discovered source video, migrated or not
    pub total_source_bytes: u64,
    pub failures: Vec<ItemFailure>,
}

impl MigrationSummary {
    pub fn total_size_formatted(&self) -> String {
        format_size(self.total_source_bytes)
    }
}

/// Run metadata written with `--report`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub source_root: PathBuf,
    pub destination_root: PathBuf,
    pub hot: bool,
    pub total_size: String,
    pub summary: MigrationSummary,
}

impl MigrationReport {
    pub async fn save(&self, path: &Path) -> Result<()> {
        let json_data = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json_data)
            .await
            .map_err(|source| MigrateError::io(path, source))?;
        info!("💾 Report saved to: {}", path.display());
        Ok(())
    }
}

/// Drives traversal, normalization and writing, one item at a time
pub struct Migrator {
    config: Config,
    cleaner: TitleCleaner,
}

impl Migrator {
    pub fn new(config: Config) -> Result<Self> {
        config
            .validate()
            .map_err(|e| MigrateError::Config(e.to_string()))?;
        let cleaner = config
            .title_cleaner()
            .map_err(|e| MigrateError::Config(e.to_string()))?;

        debug!("Title cleaner has {} rules", cleaner.len());
        Ok(Self { config, cleaner })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Migrate every video below `source_root` into `destination_root`
    pub async fn run<F: SourceFs>(
        &self,
        fs: &F,
        source_root: &Path,
        destination_root: &Path,
        options: &MigrateOptions,
    ) -> Result<MigrationSummary> {
        info!("🚀 Starting migration...");
        info!("📁 Source: {}", source_root.display());
        info!("📂 Destination: {}", destination_root.display());

        let walker = SourceWalker::new(fs, source_root, &self.config.source)?;
        let normalizer = MetadataNormalizer::new(fs, &self.cleaner);
        let mut writer = TreeWriter::new(
            destination_root,
            self.config.output.clone(),
            options.video_mode(),
        );

        tokio::fs::create_dir_all(destination_root)
            .await
            .map_err(|source| MigrateError::io(destination_root, source))?;

        let mut summary = MigrationSummary::default();

        for item in walker {
            let item = item?;
            summary.videos_found += 1;

            match fs.file_size(&item.path) {
                Ok(size) => summary.total_source_bytes += size,
                Err(source) => {
                    let err = MigrateError::io(&item.path, source);
                    Self::item_failed(&mut summary, &item, err, options.on_item_error)?;
                    continue;
                }
            }

            match Self::migrate_item(fs, &normalizer, &mut writer, &item).await {
                Ok(written) => {
                    summary.migrated += 1;
                    if item.has_sidecar() {
                        summary.with_sidecar += 1;
                    }
                    if written.collided {
                        summary.collisions += 1;
                    }
                    info!("...migration successful");
                }
                Err(err) => Self::item_failed(&mut summary, &item, err, options.on_item_error)?,
            }
        }

        info!("Finished. Total video size: {}", summary.total_size_formatted());
        if summary.skipped > 0 {
            warn!("⚠️ Skipped {} of {} videos", summary.skipped, summary.videos_found);
        }

        Ok(summary)
    }

    async fn migrate_item<F: SourceFs>(
        fs: &F,
        normalizer: &MetadataNormalizer<'_, F>,
        writer: &mut TreeWriter,
        item: &SourceItem,
    ) -> Result<WrittenItem> {
        let record = normalizer.normalize(item)?;
        let dir_name = normalizer.file_title(item);
        writer.write(fs, item, &record, &dir_name).await
    }

    fn item_failed(
        summary: &mut MigrationSummary,
        item: &SourceItem,
        err: MigrateError,
        policy: OnItemError,
    ) -> Result<()> {
        match policy {
            OnItemError::Abort => {
                error!("❌ Failed: {} - {}", item.path.display(), err);
                Err(err)
            }
            OnItemError::Skip => {
                warn!("❌ Skipping {}: {}", item.path.display(), err);
                summary.skipped += 1;
                summary.failures.push(ItemFailure {
                    path: item.path.clone(),
                    error: err.to_string(),
                });
                Ok(())
            }
        }
    }
}
