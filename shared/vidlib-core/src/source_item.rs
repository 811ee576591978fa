//! Video file discovered in the legacy source tree

use std::path::{Path, PathBuf};

/// A video file found during traversal, together with its optional XML sidecar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceItem {
    /// Path to the video file
    pub path: PathBuf,

    /// File name without the video extension
    pub stem: String,

    /// XML metadata file next to the video, if one exists
    pub sidecar_path: Option<PathBuf>,

    /// Containing directory relative to the source root
    pub relative_dir: PathBuf,
}

impl SourceItem {
    pub fn new(path: PathBuf, stem: impl Into<String>, relative_dir: PathBuf) -> Self {
        Self {
            path,
            stem: stem.into(),
            sidecar_path: None,
            relative_dir,
        }
    }

    pub fn with_sidecar(mut self, sidecar_path: Option<PathBuf>) -> Self {
        self.sidecar_path = sidecar_path;
        self
    }

    /// Get the full filename
    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Directory holding the video, including the source root
    pub fn containing_dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("."))
    }

    /// Containing directory as text, the context title rules match against
    pub fn containing_dir_str(&self) -> String {
        self.containing_dir().to_string_lossy().into_owned()
    }

    pub fn has_sidecar(&self) -> bool {
        self.sidecar_path.is_some()
    }

    /// Candidate sidecar paths for a video stem, in probe order
    pub fn sidecar_candidates(dir: &Path, stem: &str, suffixes: &[String]) -> Vec<PathBuf> {
        suffixes
            .iter()
            .map(|suffix| dir.join(format!("{}{}", stem, suffix)))
            .collect()
    }
}
