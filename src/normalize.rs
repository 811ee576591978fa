//! Turns a discovered video into its canonical metadata record

use tracing::{debug, info};
use vidlib_core::{MetadataRecord, SidecarMeta, SourceItem, TitleCleaner};

use crate::error::{MigrateError, Result};
use crate::fs::SourceFs;

/// Builds a [`MetadataRecord`] per [`SourceItem`], from its sidecar or its file name
pub struct MetadataNormalizer<'a, F: SourceFs> {
    fs: &'a F,
    cleaner: &'a TitleCleaner,
}

impl<'a, F: SourceFs> MetadataNormalizer<'a, F> {
    pub fn new(fs: &'a F, cleaner: &'a TitleCleaner) -> Self {
        Self { fs, cleaner }
    }

    /// Cleaned file-name title, also used as the output directory name
    pub fn file_title(&self, item: &SourceItem) -> String {
        self.cleaner.clean(&item.stem, &item.containing_dir_str())
    }

    /// Produce the record for `item` with a freshly generated id.
    ///
    /// A sidecar that cannot be read, transcoded or parsed is an error; there
    /// is no fallback to the file name in that case.
    pub fn normalize(&self, item: &SourceItem) -> Result<MetadataRecord> {
        let Some(sidecar_path) = &item.sidecar_path else {
            let title = self.file_title(item);
            info!("...no meta file found; convert file name {}", item.stem);
            info!("...new name {}", title);
            return Ok(MetadataRecord::new(title));
        };

        debug!("Reading sidecar {}", sidecar_path.display());
        let bytes = self
            .fs
            .read(sidecar_path)
            .map_err(|source| MigrateError::io(sidecar_path, source))?;

        let meta = SidecarMeta::from_bytes(&bytes).map_err(|source| MigrateError::Sidecar {
            path: sidecar_path.clone(),
            source,
        })?;

        let title = self.cleaner.clean(&meta.title, &item.containing_dir_str());
        Ok(MetadataRecord::new(title)
            .with_description(meta.description)
            .with_tags(meta.tags)
            .with_people(meta.people))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;
    use crate::fs::MemoryFs;
    use crate::traverse::SourceWalker;
    use std::path::Path;
    use vidlib_core::SidecarError;

    fn items(fs: &MemoryFs) -> Vec<SourceItem> {
        SourceWalker::new(fs, Path::new("/old"), &SourceConfig::default())
            .unwrap()
            .map(|item| item.unwrap())
            .collect()
    }

    #[test]
    fn test_without_sidecar_uses_cleaned_file_name() {
        let fs = MemoryFs::new().with_file("/old/20190615_a1_my_talk.mp4", "video");
        let cleaner = TitleCleaner::standard().unwrap();
        let normalizer = MetadataNormalizer::new(&fs, &cleaner);

        let item = &items(&fs)[0];
        let record = normalizer.normalize(item).unwrap();

        assert_eq!(record.title, "mytalk");
        assert_eq!(record.description, "");
        assert!(record.tags.is_empty());
        assert!(record.people.is_empty());
        assert!(!record.id.is_empty());
    }

    #[test]
    fn test_legacy_encoded_sidecar() {
        let xml = "<meta><title>20190101_a1_Foo</title><description>Bar</description>\
                   <tags><tag>x</tag><tag>y</tag></tags><speaker>Alice</speaker></meta>";
        let (bytes, _, _) = encoding_rs::WINDOWS_1252.encode(xml);

        let fs = MemoryFs::new()
            .with_file("/old/talk.mp4", "video")
            .with_file("/old/talk.xml", bytes.into_owned());
        let cleaner = TitleCleaner::standard().unwrap();
        let normalizer = MetadataNormalizer::new(&fs, &cleaner);

        let record = normalizer.normalize(&items(&fs)[0]).unwrap();
        assert_eq!(record.title, "Foo");
        assert_eq!(record.description, "Bar");
        assert_eq!(record.tags, vec!["x", "y"]);
        assert_eq!(record.people, vec!["Alice"]);
    }

    #[test]
    fn test_sidecar_title_cleaned_with_directory_rules() {
        let fs = MemoryFs::new()
            .with_file("/old/TechTalks/rust.mp4", "")
            .with_file(
                "/old/TechTalks/rust.mp4.xml",
                "<meta><title>TechTalk : Rust</title></meta>",
            );
        let cleaner = TitleCleaner::standard().unwrap();
        let normalizer = MetadataNormalizer::new(&fs, &cleaner);

        let record = normalizer.normalize(&items(&fs)[0]).unwrap();
        assert_eq!(record.title, "Rust");
    }

    #[test]
    fn test_broken_sidecar_does_not_fall_back() {
        let fs = MemoryFs::new()
            .with_file("/old/talk.mp4", "")
            .with_file("/old/talk.xml", "<video><title>x</title></video>");
        let cleaner = TitleCleaner::standard().unwrap();
        let normalizer = MetadataNormalizer::new(&fs, &cleaner);

        let err = normalizer.normalize(&items(&fs)[0]).unwrap_err();
        match err {
            MigrateError::Sidecar { path, source } => {
                assert_eq!(path, Path::new("/old/talk.xml"));
                assert_eq!(source, SidecarError::UnexpectedRoot("video".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_each_record_gets_its_own_id() {
        let fs = MemoryFs::new().with_file("/old/a.mp4", "");
        let cleaner = TitleCleaner::standard().unwrap();
        let normalizer = MetadataNormalizer::new(&fs, &cleaner);

        let item = &items(&fs)[0];
        let first = normalizer.normalize(item).unwrap();
        let second = normalizer.normalize(item).unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(first.title, second.title);
    }
}
