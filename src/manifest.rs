//! `items.json` generation for a migrated tree

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use vidlib_core::MetadataRecord;
use walkdir::WalkDir;

use crate::config::{ManifestConfig, OutputConfig};
use crate::error::{MigrateError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderMeta {
    pub title: String,
}

/// One entry of the front end's item list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ManifestNode {
    Folder {
        meta: FolderMeta,
        items: Vec<ManifestNode>,
    },
    Video {
        meta: MetadataRecord,
        src: String,
    },
}

impl ManifestNode {
    /// Number of video nodes in this subtree
    pub fn video_count(&self) -> usize {
        match self {
            ManifestNode::Folder { items, .. } => items.iter().map(Self::video_count).sum(),
            ManifestNode::Video { .. } => 1,
        }
    }
}

/// Walks a destination tree and turns it into manifest nodes
pub struct ManifestBuilder<'a> {
    manifest: &'a ManifestConfig,
    output: &'a OutputConfig,
}

impl<'a> ManifestBuilder<'a> {
    pub fn new(manifest: &'a ManifestConfig, output: &'a OutputConfig) -> Self {
        Self { manifest, output }
    }

    /// Nodes for every migrated video below `destination_root`.
    ///
    /// A directory holding a metadata file is a video. Its subdirectories
    /// are still searched; videos found there go into a folder node of the
    /// same name that follows the video node. Directories without any video
    /// below them are left out.
    pub fn build(&self, destination_root: &Path) -> Result<Vec<ManifestNode>> {
        self.build_dir(destination_root, &[])
    }

    fn build_dir(&self, dir: &Path, segments: &[String]) -> Result<Vec<ManifestNode>> {
        let mut nodes = Vec::new();

        let entries = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        for entry in entries {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
                MigrateError::ListDir { path, source }
            })?;

            if !entry.file_type().is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            let mut child_segments = segments.to_vec();
            child_segments.push(name.clone());

            let meta_path = entry.path().join(&self.output.meta_file_name);
            let is_video = meta_path.is_file();
            if is_video {
                nodes.push(self.video_node(&meta_path, &child_segments)?);
            }

            let items = self.build_dir(entry.path(), &child_segments)?;
            if items.is_empty() {
                if !is_video {
                    debug!("Skipping {} without videos", entry.path().display());
                }
                continue;
            }

            nodes.push(ManifestNode::Folder {
                meta: FolderMeta { title: name },
                items,
            });
        }

        Ok(nodes)
    }

    fn video_node(&self, meta_path: &Path, segments: &[String]) -> Result<ManifestNode> {
        let json = std::fs::read_to_string(meta_path)
            .map_err(|source| MigrateError::io(meta_path, source))?;
        let meta = MetadataRecord::from_json(&json).map_err(|source| MigrateError::Metadata {
            path: meta_path.to_path_buf(),
            source,
        })?;

        Ok(ManifestNode::Video {
            meta,
            src: self.src_for(segments),
        })
    }

    /// `/`-joined URL path of the video file inside `segments`
    pub fn src_for(&self, segments: &[String]) -> String {
        let prefix = self.manifest.src_prefix.trim_end_matches('/');
        let mut parts: Vec<&str> = Vec::with_capacity(segments.len() + 2);
        if !prefix.is_empty() {
            parts.push(prefix);
        }
        parts.extend(segments.iter().map(String::as_str));
        parts.push(&self.output.video_file_name);
        parts.join("/")
    }
}

/// Build the manifest for `destination_root`
pub fn build_manifest(
    destination_root: &Path,
    manifest: &ManifestConfig,
    output: &OutputConfig,
) -> Result<Vec<ManifestNode>> {
    if !destination_root.is_dir() {
        return Err(MigrateError::SourceRoot {
            path: destination_root.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        });
    }
    ManifestBuilder::new(manifest, output).build(destination_root)
}

/// Build the manifest and write it as pretty JSON.
///
/// Writes to `out_path`, or to the configured file name inside
/// `destination_root` when no path is given. Returns the written path.
pub fn write_manifest(
    destination_root: &Path,
    manifest: &ManifestConfig,
    output: &OutputConfig,
    out_path: Option<&Path>,
) -> Result<PathBuf> {
    let nodes = build_manifest(destination_root, manifest, output)?;
    let path = out_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| destination_root.join(&manifest.file_name));

    let json_data = serde_json::to_string_pretty(&nodes)?;
    std::fs::write(&path, json_data).map_err(|source| MigrateError::io(&path, source))?;

    let videos: usize = nodes.iter().map(ManifestNode::video_count).sum();
    info!("📋 Manifest with {} videos written to: {}", videos, path.display());
    Ok(path)
}
