//! Configuration loading and management for glosstip.
//!
//! Loads settings from `glosstip.toml`, with an environment variable override
//! for the source list. The configuration is an ordinary value: callers load it
//! once and pass it down.

use crate::annotator::{AnnotateOptions, DEFAULT_CLASS_NAME};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Path appended to a source site to reach its glossary listing
pub const DEFAULT_ENDPOINT: &str = "/wp-json/custom/v1/glossary";

/// Environment variable replacing the configured source list
pub const SOURCES_ENV: &str = "GLOSSTIP_SOURCES";

const CONFIG_FILE_NAME: &str = "glosstip.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    WriteError(#[from] toml::ser::Error),
    #[error("invalid glossary source {url:?}: {reason}")]
    InvalidSource { url: String, reason: String },
}

/// Glossary sources, in priority order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Base URLs of the sites publishing a glossary. Earlier sources win
    /// when two define the same term.
    pub urls: Vec<String>,
    /// Path appended to each base URL; empty to use the URLs as given
    pub endpoint: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

/// HTTP fetch settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-source timeout in seconds
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Payload cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Directory holding the cache database
    pub path: PathBuf,
    /// How long a fetched payload is reused without refetching
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("./data/cache"),
            ttl_secs: 3600,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Annotation markup settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotateConfig {
    pub class_name: String,
}

impl Default for AnnotateConfig {
    fn default() -> Self {
        Self {
            class_name: DEFAULT_CLASS_NAME.to_string(),
        }
    }
}

impl AnnotateConfig {
    pub fn options(&self) -> AnnotateOptions {
        AnnotateOptions {
            class_name: self.class_name.clone(),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sources: SourcesConfig,
    pub fetch: FetchConfig,
    pub cache: CacheConfig,
    pub annotate: AnnotateConfig,
}

impl Config {
    /// Load configuration from the default location (glosstip.toml in cwd or
    /// home). No config file means the defaults, with no sources.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::find_config_file() {
            Some(path) => Self::read(&path)?,
            None => Config::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::read(path)?;
        config.apply_env();
        Ok(config)
    }

    /// Load the configuration as stored on disk, without environment
    /// overrides. Use this for anything that saves the configuration back.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        Self::read(path)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Override the source list from the environment
    fn apply_env(&mut self) {
        if let Ok(value) = std::env::var(SOURCES_ENV) {
            self.sources.urls = dedup(value.split_whitespace().map(str::to_string));
        }
    }

    /// Write the configuration as TOML, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Where `load` reads from, or where a new config file should be written
    pub fn default_path() -> PathBuf {
        Self::find_config_file().unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        // Check current directory first
        let local_config = PathBuf::from(CONFIG_FILE_NAME);
        if local_config.exists() {
            return Some(local_config);
        }

        // Check home directory
        if let Some(home) = dirs::home_dir() {
            let home_config = home
                .join(".config")
                .join("glosstip")
                .join(CONFIG_FILE_NAME);
            if home_config.exists() {
                return Some(home_config);
            }
        }

        None
    }

    /// Append a source, returning `false` if it is already configured
    pub fn add_source(&mut self, url: &str) -> Result<bool, ConfigError> {
        let url = validate_source(url)?;
        if self.sources.urls.contains(&url) {
            return Ok(false);
        }
        self.sources.urls.push(url);
        Ok(true)
    }

    /// Remove a source, returning `false` if it was not configured
    pub fn remove_source(&mut self, url: &str) -> bool {
        let url = url.trim();
        let before = self.sources.urls.len();
        self.sources.urls.retain(|existing| existing != url);
        self.sources.urls.len() != before
    }

    /// Replace the source list, validating every entry
    pub fn set_sources(&mut self, urls: Vec<String>) -> Result<(), ConfigError> {
        let urls = urls
            .iter()
            .map(|url| validate_source(url))
            .collect::<Result<Vec<_>, _>>()?;
        self.sources.urls = dedup(urls.into_iter());
        Ok(())
    }

    /// The source list as text, one URL per line
    pub fn sources_text(&self) -> String {
        let mut text = self.sources.urls.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        text
    }
}

/// Parse a one-per-line source list.
///
/// Lines are trimmed, blank lines ignored and repeated entries dropped; order
/// is kept.
pub fn parse_source_list(text: &str) -> Vec<String> {
    dedup(
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string),
    )
}

fn dedup(urls: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = Vec::new();
    for url in urls {
        if !seen.contains(&url) {
            seen.push(url);
        }
    }
    seen
}

/// Check that a source is an absolute http(s) URL
pub fn validate_source(url: &str) -> Result<String, ConfigError> {
    let url = url.trim();
    let invalid = |reason: String| ConfigError::InvalidSource {
        url: url.to_string(),
        reason,
    };
    let parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(url.to_string()),
        other => Err(invalid(format!("unsupported scheme {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.sources.urls.is_empty());
        assert_eq!(config.sources.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.annotate.class_name, "glossary-term");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [sources]
            urls = ["https://a.example/book", "https://b.example"]

            [cache]
            ttl_secs = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.sources.urls.len(), 2);
        assert_eq!(config.sources.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.cache.ttl(), Duration::from_secs(60));
        assert!(config.cache.enabled);
        assert_eq!(config.fetch.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn parse_source_list_trims_and_skips_blanks() {
        let text = "  https://a.example \n\n\t\nhttps://b.example\nhttps://a.example\n";
        assert_eq!(
            parse_source_list(text),
            ["https://a.example", "https://b.example"]
        );
        assert!(parse_source_list("\n   \n").is_empty());
    }

    #[test]
    fn add_and_remove_sources() {
        let mut config = Config::default();
        assert!(config.add_source(" https://a.example ").unwrap());
        assert!(!config.add_source("https://a.example").unwrap());
        assert!(config.add_source("http://b.example/book").unwrap());
        assert_eq!(config.sources.urls, ["https://a.example", "http://b.example/book"]);

        assert!(config.remove_source("https://a.example"));
        assert!(!config.remove_source("https://a.example"));
        assert_eq!(config.sources_text(), "http://b.example/book\n");
    }

    #[test]
    fn invalid_sources_are_rejected() {
        let mut config = Config::default();
        assert!(matches!(
            config.add_source("not a url"),
            Err(ConfigError::InvalidSource { .. })
        ));
        assert!(matches!(
            config.add_source("ftp://files.example"),
            Err(ConfigError::InvalidSource { .. })
        ));
        assert!(config
            .set_sources(vec!["https://ok.example".into(), "nope".into()])
            .is_err());
        assert!(config.sources.urls.is_empty());
    }

    #[test]
    fn environment_sources_are_never_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("glosstip.toml");
        std::fs::write(&path, "[sources]\nurls = [\"https://file.example\"]\n").unwrap();

        std::env::set_var(SOURCES_ENV, "https://env-only.example");
        let effective = Config::load_from(&path).unwrap();
        let mut stored = Config::load_file(&path).unwrap();
        std::env::remove_var(SOURCES_ENV);

        assert_eq!(effective.sources.urls, ["https://env-only.example"]);
        assert_eq!(stored.sources.urls, ["https://file.example"]);

        stored.add_source("https://added.example").unwrap();
        stored.save_to(&path).unwrap();
        let reloaded = Config::load_file(&path).unwrap();
        assert_eq!(
            reloaded.sources.urls,
            ["https://file.example", "https://added.example"]
        );
    }

    #[test]
    fn load_file_without_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_file(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("glosstip.toml");

        let mut config = Config::default();
        config.add_source("https://a.example").unwrap();
        config.cache.ttl_secs = 5;
        config.save_to(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let reloaded: Config = toml::from_str(&content).unwrap();
        assert_eq!(reloaded, config);
    }
}
