use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use vidlib_core::{TitleCleaner, TitleRule};

/// Configuration for the video library migration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source tree conventions
    pub source: SourceConfig,

    /// Output tree layout
    pub output: OutputConfig,

    /// Failure handling
    pub errors: ErrorConfig,

    /// `items.json` generation
    pub manifest: ManifestConfig,

    /// Extra title rules, applied after the built-in ones
    pub title_rules: Vec<TitleRuleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Exact, case-sensitive file name suffix of video files
    pub video_extension: String,

    /// Sidecar suffixes appended to the video stem, probed in order
    pub sidecar_suffixes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Metadata file written per video
    pub meta_file_name: String,

    /// Video file written per video
    pub video_file_name: String,

    /// Payload written instead of the video when not copying
    pub placeholder: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorConfig {
    /// What to do when a single item cannot be migrated
    pub on_item_error: OnItemError,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnItemError {
    /// Stop the whole run
    #[default]
    Abort,
    /// Log, record the failure and continue
    Skip,
}

impl FromStr for OnItemError {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(OnItemError::Abort),
            "skip" => Ok(OnItemError::Skip),
            other => Err(anyhow!("unknown item error policy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    /// Manifest file name inside the destination root
    pub file_name: String,

    /// URL path prefix of `src` entries
    pub src_prefix: String,
}

/// A title rule as written in the config file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TitleRuleConfig {
    /// Only apply when the containing directory contains this text
    #[serde(default)]
    pub dir_contains: Option<String>,

    pub pattern: String,

    #[serde(default)]
    pub replacement: String,

    /// Treat `pattern` as plain text instead of a regular expression
    #[serde(default)]
    pub literal: bool,
}

impl TitleRuleConfig {
    pub fn to_rule(&self) -> vidlib_core::Result<TitleRule> {
        let rule = if self.literal {
            TitleRule::literal(&self.pattern, self.replacement.clone())?
        } else {
            TitleRule::regex(&self.pattern, self.replacement.clone())?
        };

        Ok(match &self.dir_contains {
            Some(needle) => rule.in_dir(needle.clone()),
            None => rule,
        })
    }
}

impl Config {
    /// Load configuration from the first config file found in the default locations
    pub fn load() -> Result<Self> {
        let config_paths = ["vidlib-migrate.toml", "config/vidlib-migrate.toml"];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str::<Config>(&config_str) {
                    Ok(mut config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        config.apply_env_overrides();
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Err(anyhow!("No configuration file found"))
    }

    /// Load configuration from an explicit file
    pub fn from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        tracing::info!("📄 Loaded configuration from: {}", path.display());
        config.apply_env_overrides();
        Ok(config)
    }

    /// Explicit file if given, else the default locations, else defaults
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::load().unwrap_or_else(|e| {
                tracing::debug!("{}, using defaults", e);
                Self::from_env()
            })),
        }
    }

    /// Default configuration with environment overrides applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(extension) = std::env::var("VIDLIB_VIDEO_EXTENSION") {
            self.source.video_extension = extension;
        }

        if let Ok(policy) = std::env::var("VIDLIB_ON_ITEM_ERROR") {
            match policy.parse() {
                Ok(policy) => self.errors.on_item_error = policy,
                Err(e) => tracing::warn!("Ignoring VIDLIB_ON_ITEM_ERROR: {}", e),
            }
        }

        if let Ok(prefix) = std::env::var("VIDLIB_MANIFEST_SRC_PREFIX") {
            self.manifest.src_prefix = prefix;
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.source.video_extension.is_empty() {
            return Err(anyhow!("video_extension must not be empty"));
        }

        if self.source.sidecar_suffixes.is_empty()
            || self.source.sidecar_suffixes.iter().any(|s| s.is_empty())
        {
            return Err(anyhow!("sidecar_suffixes must contain non-empty suffixes"));
        }

        if self.output.meta_file_name.is_empty() || self.output.video_file_name.is_empty() {
            return Err(anyhow!("output file names must not be empty"));
        }

        if self.output.meta_file_name == self.output.video_file_name {
            return Err(anyhow!("meta_file_name and video_file_name must differ"));
        }

        if self.manifest.file_name.is_empty() {
            return Err(anyhow!("manifest file_name must not be empty"));
        }

        self.title_cleaner()?;

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }

    /// Built-in title rules followed by the configured ones
    pub fn title_cleaner(&self) -> Result<TitleCleaner> {
        let mut cleaner = TitleCleaner::standard()?;
        for rule in &self.title_rules {
            cleaner.push(rule.to_rule()?);
        }
        Ok(cleaner)
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Migration Configuration:\n\
            - Video Extension: {}\n\
            - Sidecar Suffixes: {}\n\
            - Output Files: {}, {}\n\
            - On Item Error: {:?}\n\
            - Extra Title Rules: {}",
            self.source.video_extension,
            self.source.sidecar_suffixes.join(", "),
            self.output.meta_file_name,
            self.output.video_file_name,
            self.errors.on_item_error,
            self.title_rules.len()
        )
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            video_extension: ".mp4".to_string(),
            sidecar_suffixes: vec![".xml".to_string(), ".mp4.xml".to_string()],
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            meta_file_name: "meta.json".to_string(),
            video_file_name: "video.mp4".to_string(),
            placeholder: "sample".to_string(),
        }
    }
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            file_name: "items.json".to_string(),
            src_prefix: "data".to_string(),
        }
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_video_extension(mut self, extension: impl Into<String>) -> Self {
        self.config.source.video_extension = extension.into();
        self
    }

    pub fn with_sidecar_suffixes(mut self, suffixes: Vec<String>) -> Self {
        self.config.source.sidecar_suffixes = suffixes;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.config.output.placeholder = placeholder.into();
        self
    }

    pub fn on_item_error(mut self, policy: OnItemError) -> Self {
        self.config.errors.on_item_error = policy;
        self
    }

    pub fn with_src_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.manifest.src_prefix = prefix.into();
        self
    }

    pub fn with_title_rule(mut self, rule: TitleRuleConfig) -> Self {
        self.config.title_rules.push(rule);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.source.video_extension, ".mp4");
        assert_eq!(config.source.sidecar_suffixes, vec![".xml", ".mp4.xml"]);
        assert_eq!(config.output.placeholder, "sample");
        assert_eq!(config.errors.on_item_error, OnItemError::Abort);
        assert_eq!(config.manifest.file_name, "items.json");
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .with_video_extension(".m4v")
            .on_item_error(OnItemError::Skip)
            .with_src_prefix("media")
            .build();

        assert_eq!(config.source.video_extension, ".m4v");
        assert_eq!(config.errors.on_item_error, OnItemError::Skip);
        assert_eq!(config.manifest.src_prefix, "media");
    }

    #[test]
    fn test_config_validation() {
        assert!(Config::default().validate().is_ok());

        let config = ConfigBuilder::new().with_video_extension("").build();
        assert!(config.validate().is_err());

        let config = ConfigBuilder::new().with_sidecar_suffixes(vec![]).build();
        assert!(config.validate().is_err());

        let config = ConfigBuilder::new()
            .with_title_rule(TitleRuleConfig {
                dir_contains: None,
                pattern: "[unclosed".to_string(),
                replacement: String::new(),
                literal: false,
            })
            .build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [errors]
            on_item_error = "skip"

            [[title_rules]]
            dir_contains = "archive"
            pattern = " (final)"
            literal = true
            "#,
        )
        .unwrap();

        assert_eq!(config.errors.on_item_error, OnItemError::Skip);
        assert_eq!(config.source.video_extension, ".mp4");
        assert_eq!(config.output.meta_file_name, "meta.json");

        let cleaner = config.title_cleaner().unwrap();
        assert_eq!(cleaner.clean("Demo (final)", "/old/archive"), "Demo");
    }

    #[test]
    fn test_item_error_policy_parsing() {
        assert_eq!("skip".parse::<OnItemError>().unwrap(), OnItemError::Skip);
        assert_eq!(" Abort ".parse::<OnItemError>().unwrap(), OnItemError::Abort);
        assert!("retry".parse::<OnItemError>().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("vidlib-migrate.toml");

        let config = ConfigBuilder::new().with_placeholder("stub").build();
        config.save(&path).unwrap();

        let reloaded = Config::from_file(&path).unwrap();
        assert_eq!(reloaded.output.placeholder, "stub");
    }

    #[test]
    fn test_resolve_explicit_missing_file_fails() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        assert!(Config::resolve(Some(&temp_dir.path().join("nope.toml"))).is_err());
    }
}
