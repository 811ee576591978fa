//! Title cleaning rules for legacy archive file names and sidecar titles

use regex::Regex;
use tracing::debug;

use crate::{Result, VidlibCoreError};

/// A single substitution, optionally gated on the containing directory.
///
/// Each rule replaces at most the first match.
#[derive(Debug, Clone)]
pub struct TitleRule {
    dir_contains: Option<String>,
    pattern: Regex,
    replacement: String,
}

impl TitleRule {
    /// Rule from a regular expression
    pub fn regex(pattern: &str, replacement: impl Into<String>) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|source| VidlibCoreError::Rule {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self {
            dir_contains: None,
            pattern,
            replacement: replacement.into(),
        })
    }

    /// Rule matching a literal substring
    pub fn literal(text: &str, replacement: impl Into<String>) -> Result<Self> {
        Self::regex(&regex::escape(text), replacement)
    }

    /// Only apply when the containing directory path contains `needle`
    pub fn in_dir(mut self, needle: impl Into<String>) -> Self {
        self.dir_contains = Some(needle.into());
        self
    }

    pub fn applies_to(&self, dir: &str) -> bool {
        self.dir_contains
            .as_deref()
            .map_or(true, |needle| dir.contains(needle))
    }

    pub fn apply(&self, title: &str) -> String {
        self.pattern
            .replacen(title, 1, self.replacement.as_str())
            .into_owned()
    }
}

/// Ordered table of [`TitleRule`]s
#[derive(Debug, Clone, Default)]
pub struct TitleCleaner {
    rules: Vec<TitleRule>,
}

impl TitleCleaner {
    /// Cleaner without any rules
    pub fn empty() -> Self {
        Self::default()
    }

    /// The rules for the two legacy conference archives
    pub fn standard() -> Result<Self> {
        Ok(Self {
            rules: vec![
                // recording date plus optional session code, e.g. "20190101_a1_"
                TitleRule::regex(r"\d{8}[_ ]([aAbB]\d_)?", "")?,
                TitleRule::literal("_", "")?,
                TitleRule::literal("TechTalk : ", "")?.in_dir("TechTalks"),
                TitleRule::regex(r"SDC\d{4}", "")?.in_dir("sdc"),
                TitleRule::regex(r"\d{2}t\d[-_]?", "")?.in_dir("sdc"),
            ],
        })
    }

    pub fn push(&mut self, rule: TitleRule) {
        self.rules.push(rule);
    }

    pub fn with_rule(mut self, rule: TitleRule) -> Self {
        self.push(rule);
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply every rule whose directory predicate matches `dir`, in order
    pub fn clean(&self, title: &str, dir: &str) -> String {
        let cleaned = self
            .rules
            .iter()
            .filter(|rule| rule.applies_to(dir))
            .fold(title.to_string(), |acc, rule| rule.apply(&acc));

        if cleaned != title {
            debug!("Cleaned title: {:?} -> {:?}", title, cleaned);
        }
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cleaner() -> TitleCleaner {
        TitleCleaner::standard().unwrap()
    }

    #[test]
    fn test_strips_date_and_session_code() {
        assert_eq!(cleaner().clean("20190615_a1_my_talk", "/src"), "mytalk");
        assert_eq!(cleaner().clean("20190615_B2_Intro", "/src"), "Intro");
    }

    #[test]
    fn test_strips_date_with_space() {
        assert_eq!(
            cleaner().clean("20190615 Keynote_Opening", "/src"),
            "KeynoteOpening"
        );
    }

    #[test]
    fn test_removes_only_first_underscore() {
        assert_eq!(cleaner().clean("a_b_c", "/src"), "ab_c");
    }

    #[test]
    fn test_only_first_date_is_removed() {
        assert_eq!(
            cleaner().clean("20190101_20190202 talk", "/src"),
            "20190202 talk"
        );
        assert_eq!(
            cleaner().clean("20190101 x 20190202 talk", "/src"),
            "x 20190202 talk"
        );
    }

    #[test]
    fn test_session_code_must_be_a_or_b() {
        assert_eq!(cleaner().clean("20190615_c1_talk", "/src"), "c1talk");
    }

    #[test]
    fn test_tech_talk_prefix_only_in_tech_talks_dir() {
        assert_eq!(
            cleaner().clean("TechTalk : Rust in Production", "/old/TechTalks/2018"),
            "Rust in Production"
        );
        assert_eq!(
            cleaner().clean("TechTalk : Rust in Production", "/old/meetups"),
            "TechTalk : Rust in Production"
        );
        assert_eq!(
            cleaner().clean("Rust in Production", "/old/TechTalks"),
            "Rust in Production"
        );
    }

    #[test]
    fn test_sdc_tokens_removed_in_sdc_dir() {
        assert_eq!(
            cleaner().clean("SDC2019 04t2-Opening Keynote", "/old/sdc/2019"),
            " Opening Keynote"
        );
        assert_eq!(
            cleaner().clean("SDC2019-04t2-Keynote", "/old/sdc"),
            "-Keynote"
        );
        assert_eq!(cleaner().clean("Plain Title", "/old/sdc"), "Plain Title");
    }

    #[test]
    fn test_sdc_tokens_kept_outside_sdc_dir() {
        assert_eq!(
            cleaner().clean("SDC2019 04t2-Opening", "/old/other"),
            "SDC2019 04t2-Opening"
        );
    }

    #[test]
    fn test_custom_rule_appended() {
        let cleaner = cleaner().with_rule(
            TitleRule::literal(" (final)", "").unwrap().in_dir("archive"),
        );
        assert_eq!(cleaner.clean("Demo (final)", "/old/archive"), "Demo");
        assert_eq!(cleaner.clean("Demo (final)", "/old/live"), "Demo (final)");
    }

    #[test]
    fn test_invalid_rule_is_rejected() {
        assert!(matches!(
            TitleRule::regex("(unclosed", ""),
            Err(VidlibCoreError::Rule { .. })
        ));
    }
}
