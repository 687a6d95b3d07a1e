//! Configuration for the harvester.
//!
//! One immutable [`Config`] is loaded at startup and handed to the engine;
//! nothing below reads global state. Files are TOML.

pub mod browser;
pub mod selectors;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use browser::{BrowserEngineConfig, BrowserEngineType};
pub use selectors::SiteSelectors;

/// Application directory name under the user config dir.
pub const APP_DIR: &str = "placereviews";

/// Default config filename.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Errors from loading or writing configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserEngineConfig,
    #[serde(default)]
    pub selectors: SiteSelectors,
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub timings: Timings,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Default config location: `<config dir>/placereviews/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILENAME))
    }

    /// Load from an explicit path, else the file `prefer` discovers for
    /// the app, else built-in defaults. Environment overrides are applied last.
    pub async fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match explicit {
            Some(path) => Self::load_from_path(path)?,
            None => match Self::discover().await {
                Some(path) => {
                    tracing::debug!("Using config file {}", path.display());
                    Self::load_from_path(&path)?
                }
                None => Self::default(),
            },
        };
        Ok(config.with_env_overrides())
    }

    /// Locate the config file through `prefer`'s standard search paths.
    pub async fn discover() -> Option<PathBuf> {
        match prefer::load(APP_DIR).await {
            Ok(found) => found.source_path().map(|path| path.to_path_buf()),
            Err(e) => {
                tracing::debug!("No config file discovered: {}", e);
                None
            }
        }
    }

    /// Parse a TOML config file.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply environment variable overrides.
    ///
    /// - `BROWSER_URL` - Remote Chrome DevTools URL
    /// - `PLACEREVIEWS_OUTPUT_DIR` - Directory for harvested snapshots
    pub fn with_env_overrides(mut self) -> Self {
        self.browser = self.browser.with_env_overrides();
        if let Ok(dir) = std::env::var("PLACEREVIEWS_OUTPUT_DIR") {
            if !dir.is_empty() {
                self.output.directory = PathBuf::from(dir);
            }
        }
        self
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write this config to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml()?;
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, content).map_err(write_err)
    }
}

/// Scroll-loading parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Reviews expected per scroll-triggered batch.
    pub batch_size: u64,
    /// Batches added on top of `expected / batch_size`.
    pub extra_batches: u64,
    /// Minimum number of scroll iterations.
    pub min_batches: u64,
    /// Tag of the candidate scroll containers.
    pub container_tag: String,
    /// Computed `overflow-y` values that make a container scrollable.
    pub overflow_values: Vec<String>,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            extra_batches: 2,
            min_batches: 5,
            container_tag: "div".to_string(),
            overflow_values: vec!["auto".to_string(), "scroll".to_string()],
        }
    }
}

/// Fixed settle delays, in milliseconds. The page offers no completion
/// signal, so each step waits this long before the next read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub navigation_settle_ms: u64,
    pub count_settle_ms: u64,
    pub tab_settle_ms: u64,
    pub scroll_settle_ms: u64,
    pub expand_pause_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            navigation_settle_ms: 3000,
            count_settle_ms: 2000,
            tab_settle_ms: 2000,
            scroll_settle_ms: 2000,
            expand_pause_ms: 200,
        }
    }
}

impl Timings {
    /// All delays zero (tests, pre-rendered pages).
    pub fn immediate() -> Self {
        Self {
            navigation_settle_ms: 0,
            count_settle_ms: 0,
            tab_settle_ms: 0,
            scroll_settle_ms: 0,
            expand_pause_ms: 0,
        }
    }

    pub fn navigation_settle(&self) -> Duration {
        Duration::from_millis(self.navigation_settle_ms)
    }

    pub fn count_settle(&self) -> Duration {
        Duration::from_millis(self.count_settle_ms)
    }

    pub fn tab_settle(&self) -> Duration {
        Duration::from_millis(self.tab_settle_ms)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }

    pub fn expand_pause(&self) -> Duration {
        Duration::from_millis(self.expand_pause_ms)
    }
}

/// Output and URL preparation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving `<place>_reviews.json` snapshots.
    pub directory: PathBuf,
    /// Value of the `hl` query parameter appended to place URLs.
    pub language: String,
    /// Click "show original" controls after expanding truncated text.
    pub revert_translations: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            language: "en".to_string(),
            revert_translations: false,
        }
    }
}
