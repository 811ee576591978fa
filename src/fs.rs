//! Read-only view of the source tree, injectable for tests

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Kind of a directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// A single directory entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEntry {
    pub path: PathBuf,
    pub name: String,
    pub kind: EntryKind,
}

/// Filesystem operations the traversal and normalizer need
pub trait SourceFs {
    /// Entries of `dir`, sorted by file name
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<FsEntry>>;

    /// Whether `path` exists and is not a directory
    fn is_file(&self, path: &Path) -> bool;

    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    fn file_size(&self, path: &Path) -> io::Result<u64>;

    /// Copy a source file to `to` on the local disk, returning bytes written
    fn copy_to(&self, from: &Path, to: &Path) -> io::Result<u64> {
        let contents = self.read(from)?;
        std::fs::write(to, &contents)?;
        Ok(contents.len() as u64)
    }

    /// Hex MD5 of a source file
    fn digest(&self, path: &Path) -> io::Result<String> {
        Ok(format!("{:x}", md5::compute(self.read(path)?)))
    }
}

/// The real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

impl SourceFs for OsFs {
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<FsEntry>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            // follow symlinks like a plain stat would
            let kind = if std::fs::metadata(&path)?.is_dir() {
                EntryKind::Dir
            } else {
                EntryKind::File
            };
            entries.push(FsEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path,
                kind,
            });
        }
        entries.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
        Ok(entries)
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn file_size(&self, path: &Path) -> io::Result<u64> {
        Ok(std::fs::metadata(path)?.len())
    }

    fn copy_to(&self, from: &Path, to: &Path) -> io::Result<u64> {
        std::fs::copy(from, to)
    }

    fn digest(&self, path: &Path) -> io::Result<String> {
        let mut file = std::fs::File::open(path)?;
        let mut context = md5::Context::new();
        let mut buf = vec![0u8; 64 * 1024];

        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            context.consume(&buf[..n]);
        }

        Ok(format!("{:x}", context.compute()))
    }
}

/// In-memory snapshot of a directory tree
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    dirs: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, Vec<u8>>,
    unreadable: BTreeSet<PathBuf>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty directory and its ancestors
    pub fn with_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.add_dir(path.as_ref());
        self
    }

    /// Add a file and its ancestor directories
    pub fn with_file(mut self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) -> Self {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.files.insert(path.to_path_buf(), contents.into());
        self
    }

    /// Add a directory whose listing fails with `PermissionDenied`
    pub fn with_unreadable_dir(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        self.add_dir(path);
        self.unreadable.insert(path.to_path_buf());
        self
    }

    fn add_dir(&mut self, path: &Path) {
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(ancestor.to_path_buf());
        }
    }

    fn not_found(path: &Path) -> io::Error {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} not found", path.display()),
        )
    }
}

impl SourceFs for MemoryFs {
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<FsEntry>> {
        if !self.dirs.contains(dir) {
            return Err(Self::not_found(dir));
        }
        if self.unreadable.contains(dir) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} is not readable", dir.display()),
            ));
        }

        let children_of = |path: &PathBuf| path.parent() == Some(dir);
        let dirs = self
            .dirs
            .iter()
            .filter(|path| children_of(*path))
            .map(|path| (path, EntryKind::Dir));
        let files = self
            .files
            .keys()
            .filter(|path| children_of(*path))
            .map(|path| (path, EntryKind::File));

        let mut entries: Vec<FsEntry> = dirs
            .chain(files)
            .map(|(path, kind)| FsEntry {
                name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                path: path.clone(),
                kind,
            })
            .collect();
        entries.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
        Ok(entries)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| Self::not_found(path))
    }

    fn file_size(&self, path: &Path) -> io::Result<u64> {
        self.files
            .get(path)
            .map(|contents| contents.len() as u64)
            .ok_or_else(|| Self::not_found(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_fs_lists_sorted_children() {
        let fs = MemoryFs::new()
            .with_file("/src/b.mp4", "bb")
            .with_file("/src/a/c.mp4", "c")
            .with_dir("/src/empty");

        let names: Vec<_> = fs
            .read_dir(Path::new("/src"))
            .unwrap()
            .into_iter()
            .map(|e| (e.name, e.kind))
            .collect();

        assert_eq!(
            names,
            vec![
                ("a".to_string(), EntryKind::Dir),
                ("b.mp4".to_string(), EntryKind::File),
                ("empty".to_string(), EntryKind::Dir),
            ]
        );
        assert_eq!(fs.file_size(Path::new("/src/b.mp4")).unwrap(), 2);
        assert!(fs.is_file(Path::new("/src/a/c.mp4")));
        assert!(!fs.is_file(Path::new("/src/a")));
    }

    #[test]
    fn test_memory_fs_missing_dir() {
        let fs = MemoryFs::new();
        let err = fs.read_dir(Path::new("/nope")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_memory_fs_unreadable_dir() {
        let fs = MemoryFs::new()
            .with_file("/src/a.mp4", "")
            .with_unreadable_dir("/src/locked");

        let names: Vec<_> = fs
            .read_dir(Path::new("/src"))
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["a.mp4", "locked"]);

        let err = fs.read_dir(Path::new("/src/locked")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_memory_fs_copy_and_digest() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let fs = MemoryFs::new().with_file("/src/a.mp4", "payload");
        let target = temp_dir.path().join("video.mp4");

        assert_eq!(fs.copy_to(Path::new("/src/a.mp4"), &target).unwrap(), 7);
        assert_eq!(std::fs::read(&target).unwrap(), b"payload");
        assert_eq!(
            fs.digest(Path::new("/src/a.mp4")).unwrap(),
            OsFs.digest(&target).unwrap()
        );
        assert!(fs.copy_to(Path::new("/src/missing.mp4"), &target).is_err());
    }

    #[test]
    fn test_os_fs_sorted_listing() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("b.txt"), b"b").unwrap();
        std::fs::write(temp_dir.path().join("a.txt"), b"a").unwrap();
        std::fs::create_dir(temp_dir.path().join("c")).unwrap();

        let entries = OsFs.read_dir(temp_dir.path()).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "c"]);
        assert_eq!(entries[2].kind, EntryKind::Dir);
    }
}
