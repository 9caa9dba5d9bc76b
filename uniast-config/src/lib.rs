//! Shared configuration loader for the uniast tools.
//!
//! `defaults/uniast.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer user-specific files on top
//! of those defaults via [`Loader`] before deserializing into [`UniAstConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use uniast::formats::markdown::MarkdownParserOptions;
use uniast::reference::PathReferenceService;

const DEFAULT_TOML: &str = include_str!("../defaults/uniast.default.toml");

/// Top-level configuration consumed by uniast applications.
#[derive(Debug, Clone, Deserialize)]
pub struct UniAstConfig {
    pub references: ReferencesConfig,
    pub parser: ParserConfig,
    pub markdown: MarkdownConfig,
    pub remote: RemoteConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReferencesConfig {
    pub base_url: String,
}

impl From<&ReferencesConfig> for PathReferenceService {
    fn from(config: &ReferencesConfig) -> Self {
        PathReferenceService::new(config.base_url.as_str())
    }
}

/// Switches for the Markdown reader.
#[derive(Debug, Clone, Deserialize)]
pub struct ParserConfig {
    pub nested_internal_links: bool,
}

impl From<&ParserConfig> for MarkdownParserOptions {
    fn from(config: &ParserConfig) -> Self {
        MarkdownParserOptions {
            nested_internal_links: config.nested_internal_links,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarkdownConfig {
    pub link_serializer: LinkSerializerKind,
    #[serde(default)]
    pub current_document: Option<String>,
}

/// Strategy used to write internal links back to Markdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkSerializerKind {
    Wiki,
    Filesystem,
    Remote,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
    pub timeout_secs: u64,
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive such as `warn` or `uniast=debug`
    pub level: String,
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<UniAstConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<UniAstConfig, ConfigError> {
    Loader::new().build()
}
