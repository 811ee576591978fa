//! Writes the migrated output tree

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};
use vidlib_core::{MetadataRecord, SourceItem};

use crate::config::OutputConfig;
use crate::error::{MigrateError, Result};
use crate::fs::SourceFs;

/// How `video.mp4` is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoMode {
    /// Write the configured placeholder bytes
    Placeholder,
    /// Copy the source video, optionally comparing MD5 digests afterwards
    Copy { verify: bool },
}

/// Paths written for one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenItem {
    pub dir: PathBuf,
    pub meta_path: PathBuf,
    pub video_path: PathBuf,
    /// The directory name was suffixed with the record id
    pub collided: bool,
}

/// Writes `meta.json` and `video.mp4` per item below the destination root
pub struct TreeWriter {
    destination_root: PathBuf,
    output: OutputConfig,
    mode: VideoMode,
    written_dirs: HashSet<PathBuf>,
    folder_dirs: HashSet<PathBuf>,
}

impl TreeWriter {
    pub fn new(destination_root: impl Into<PathBuf>, output: OutputConfig, mode: VideoMode) -> Self {
        Self {
            destination_root: destination_root.into(),
            output,
            mode,
            written_dirs: HashSet::new(),
            folder_dirs: HashSet::new(),
        }
    }

    pub fn mode(&self) -> VideoMode {
        self.mode
    }

    /// `destination_root / relative_dir / dir_name`, before collision handling
    pub fn target_dir(&self, item: &SourceItem, dir_name: &str) -> PathBuf {
        self.destination_root.join(&item.relative_dir).join(dir_name)
    }

    /// Write one item.
    ///
    /// A directory already written during this run, either for another item
    /// or as a mirrored source folder, gets `-<id>` appended; directories
    /// left by earlier runs are overwritten. In copy mode the video bytes are
    /// read through `fs`. Nothing is rolled back when a later step fails.
    pub async fn write<F: SourceFs>(
        &mut self,
        fs: &F,
        item: &SourceItem,
        record: &MetadataRecord,
        dir_name: &str,
    ) -> Result<WrittenItem> {
        let dir_name = if dir_name.trim().is_empty() {
            warn!("Empty title for {}, using id as directory name", item.path.display());
            record.id.as_str()
        } else {
            dir_name
        };

        let mut dir = self.target_dir(item, dir_name);
        let collided = self.written_dirs.contains(&dir) || self.folder_dirs.contains(&dir);
        if collided {
            let renamed = format!("{}-{}", dir_name, record.id);
            warn!(
                "⚠️ {} was already written in this run, using {}",
                dir.display(),
                renamed
            );
            dir = self.target_dir(item, &renamed);
        }

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| MigrateError::io(&dir, source))?;
        self.written_dirs.insert(dir.clone());
        self.record_folders(item);

        if let Some(video_dir) = dir
            .ancestors()
            .skip(1)
            .find(|ancestor| self.written_dirs.contains(*ancestor))
        {
            warn!(
                "⚠️ {} is nested inside the video directory {}",
                dir.display(),
                video_dir.display()
            );
        }

        let meta_path = dir.join(&self.output.meta_file_name);
        let video_path = dir.join(&self.output.video_file_name);

        let json = record.to_pretty_json()?;
        tokio::fs::write(&meta_path, json)
            .await
            .map_err(|source| MigrateError::io(&meta_path, source))?;
        debug!("Wrote {}", meta_path.display());

        match self.mode {
            VideoMode::Placeholder => {
                tokio::fs::write(&video_path, self.output.placeholder.as_bytes())
                    .await
                    .map_err(|source| MigrateError::io(&video_path, source))?;
            }
            VideoMode::Copy { verify } => {
                info!("...copy video file");
                fs.copy_to(&item.path, &video_path)
                    .map_err(|source| MigrateError::io(&video_path, source))?;

                if verify {
                    verify_copy(fs, &item.path, &video_path).await?;
                }
            }
        }

        Ok(WrittenItem {
            dir,
            meta_path,
            video_path,
            collided,
        })
    }

    /// Remember every mirrored source folder leading to `item`
    fn record_folders(&mut self, item: &SourceItem) {
        let mut folder = self.destination_root.clone();
        for component in item.relative_dir.components() {
            folder.push(component);
            self.folder_dirs.insert(folder.clone());
        }
    }
}

async fn verify_copy<F: SourceFs>(fs: &F, source: &Path, copy: &Path) -> Result<()> {
    let expected = fs.digest(source).map_err(|e| MigrateError::io(source, e))?;
    let actual = file_digest(copy)
        .await
        .map_err(|e| MigrateError::io(copy, e))?;

    if expected != actual {
        return Err(MigrateError::VerifyMismatch {
            path: copy.to_path_buf(),
            expected,
            actual,
        });
    }

    debug!("Verified {} (md5 {})", copy.display(), actual);
    Ok(())
}

/// MD5 of a file, read in chunks
pub async fn file_digest(path: &Path) -> std::io::Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut context = md5::Context::new();
    let mut buf = vec![0u8; 64 * 1024];

    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        context.consume(&buf[..n]);
    }

    Ok(format!("{:x}", context.compute()))
}
