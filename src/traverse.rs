//! Lazy depth-first discovery of videos and their sidecars

use std::path::{Path, PathBuf};
use std::vec::IntoIter;

use tracing::info;
use vidlib_core::SourceItem;

use crate::config::SourceConfig;
use crate::error::{MigrateError, Result};
use crate::fs::{EntryKind, FsEntry, SourceFs};

/// Iterator over every video below a source root.
///
/// Entries are visited in file-name order and each directory is finished
/// before its next sibling. An `Err` item means a directory could not be
/// listed; the walk should be abandoned.
pub struct SourceWalker<'a, F: SourceFs> {
    fs: &'a F,
    root: PathBuf,
    video_extension: String,
    sidecar_suffixes: Vec<String>,
    stack: Vec<IntoIter<FsEntry>>,
    discovered: usize,
}

impl<'a, F: SourceFs> SourceWalker<'a, F> {
    /// Start a walk; fails if the root cannot be listed
    pub fn new(fs: &'a F, root: &Path, config: &SourceConfig) -> Result<Self> {
        let entries = fs.read_dir(root).map_err(|source| MigrateError::SourceRoot {
            path: root.to_path_buf(),
            source,
        })?;

        Ok(Self {
            fs,
            root: root.to_path_buf(),
            video_extension: config.video_extension.clone(),
            sidecar_suffixes: config.sidecar_suffixes.clone(),
            stack: vec![entries.into_iter()],
            discovered: 0,
        })
    }

    /// Number of videos yielded so far
    pub fn discovered(&self) -> usize {
        self.discovered
    }

    fn video_stem<'n>(&self, name: &'n str) -> Option<&'n str> {
        name.strip_suffix(self.video_extension.as_str())
            .filter(|stem| !stem.is_empty())
    }

    fn source_item(&self, entry: &FsEntry, stem: &str) -> SourceItem {
        let dir = entry.path.parent().unwrap_or(&self.root);
        let relative_dir = dir
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let sidecar = SourceItem::sidecar_candidates(dir, stem, &self.sidecar_suffixes)
            .into_iter()
            .find(|candidate| self.fs.is_file(candidate));

        SourceItem::new(entry.path.clone(), stem, relative_dir).with_sidecar(sidecar)
    }
}

impl<F: SourceFs> Iterator for SourceWalker<'_, F> {
    type Item = Result<SourceItem>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.stack.last_mut()?.next() {
                Some(entry) => entry,
                None => {
                    self.stack.pop();
                    continue;
                }
            };

            match entry.kind {
                EntryKind::Dir => match self.fs.read_dir(&entry.path) {
                    Ok(children) => self.stack.push(children.into_iter()),
                    Err(source) => {
                        // the walk ends with this error
                        self.stack.clear();
                        return Some(Err(MigrateError::ListDir {
                            path: entry.path,
                            source,
                        }));
                    }
                },
                EntryKind::File => {
                    let Some(stem) = self.video_stem(&entry.name) else {
                        continue;
                    };
                    let item = self.source_item(&entry, stem);

                    self.discovered += 1;
                    info!("Found video {}: {}", self.discovered, item.path.display());
                    return Some(Ok(item));
                }
            }
        }
    }
}
