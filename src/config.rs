//! Configuration management for the application.
//!
//! This module handles loading, validating, and saving application configuration
//! in TOML format with platform-specific directory resolution.
//!
//! Trello credentials are deliberately not part of this file: they are entered
//! interactively and kept in the persistence store.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::canvas::CanvasMetrics;
use crate::constants::CONFIG_DIR_NAME;

/// Theme display mode preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ThemeMode {
    /// Automatically detect OS theme (dark/light)
    #[default]
    Auto,
    /// Always use dark theme
    Dark,
    /// Always use light theme
    Light,
}

/// Trello API access settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrelloConfig {
    /// Base URL of the Trello REST API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base_url() -> String {
    "https://api.trello.com".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

impl Default for TrelloConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Where persisted cards, credentials and logs live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Data directory override. Defaults to the platform data directory:
    ///
    /// - Linux: `~/.local/share/Trakr/`
    /// - macOS: `~/Library/Application Support/Trakr/`
    /// - Windows: `%APPDATA%\Trakr\`
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolves the effective data directory.
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }

        Ok(dirs::data_dir()
            .context("Failed to determine data directory")?
            .join(CONFIG_DIR_NAME))
    }
}

/// UI preferences configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UiConfig {
    /// Theme mode preference (Auto, Dark, Light)
    #[serde(default)]
    pub theme_mode: ThemeMode,
}

/// Canvas overrides, in terminal cells.
///
/// Unset values fall back to [`CanvasMetrics::terminal`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CanvasConfig {
    /// Card width in cells
    #[serde(default)]
    pub card_width: Option<f64>,
    /// Card height in rows
    #[serde(default)]
    pub card_height: Option<f64>,
    /// Rows between the card's top edge and the point where it is gripped
    #[serde(default)]
    pub grip_offset: Option<f64>,
    /// Maximum random offset applied when first arranging cards
    #[serde(default)]
    pub jitter: Option<f64>,
}

impl CanvasConfig {
    /// Builds canvas metrics from the terminal defaults plus overrides.
    #[must_use]
    pub fn metrics(&self) -> CanvasMetrics {
        let mut metrics = CanvasMetrics::terminal();
        if let Some(width) = self.card_width {
            metrics.card.width = width;
        }
        if let Some(height) = self.card_height {
            metrics.card.height = height;
        }
        if let Some(grip) = self.grip_offset {
            metrics.grip_offset = grip;
        }
        if let Some(jitter) = self.jitter {
            metrics.grid.jitter = jitter;
        }
        metrics
    }
}

/// Application configuration.
///
/// # File Location
///
/// - Linux: `~/.config/Trakr/config.toml`
/// - macOS: `~/Library/Application Support/Trakr/config.toml`
/// - Windows: `%APPDATA%\Trakr\config.toml`
///
/// # Validation
///
/// - `trello.api_base_url` must be an absolute http(s) URL
/// - `trello.timeout_secs` must be positive
/// - canvas overrides must be finite; card dimensions positive, grip and jitter non-negative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Trello API settings
    #[serde(default)]
    pub trello: TrelloConfig,
    /// Storage settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// UI preferences
    #[serde(default)]
    pub ui: UiConfig,
    /// Canvas overrides
    #[serde(default)]
    pub canvas: CanvasConfig,
}

impl Config {
    /// Creates a new Config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the platform-specific config directory path.
    ///
    /// - Linux: `~/.config/Trakr/`
    /// - macOS: `~/Library/Application Support/Trakr/`
    /// - Windows: `%APPDATA%\Trakr\`
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join(CONFIG_DIR_NAME);

        Ok(config_dir)
    }

    /// Gets the full path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Loads configuration from the default config file.
    ///
    /// If the file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Loads configuration from an explicit path.
    ///
    /// A missing file yields the default configuration.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(config_path).context(format!(
            "Failed to read config file: {}",
            config_path.display()
        ))?;

        let config: Self = toml::from_str(&content).context(format!(
            "Failed to parse config file: {}",
            config_path.display()
        ))?;

        config.validate().context(format!(
            "Invalid configuration in {}",
            config_path.display()
        ))?;

        Ok(config)
    }

    /// Saves configuration to the default config file using atomic write.
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir()?;
        fs::create_dir_all(&config_dir).context(format!(
            "Failed to create config directory: {}",
            config_dir.display()
        ))?;

        self.save_to(&Self::config_file_path()?)
    }

    /// Saves configuration to an explicit path.
    ///
    /// Uses temp file + rename pattern for atomic writes.
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        self.validate()?;

        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        let temp_path = config_path.with_extension("toml.tmp");

        fs::write(&temp_path, content).context(format!(
            "Failed to write temp config file: {}",
            temp_path.display()
        ))?;

        fs::rename(&temp_path, config_path).context(format!(
            "Failed to rename temp config file to: {}",
            config_path.display()
        ))?;

        Ok(())
    }

    /// Validates configuration values.
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.trello.api_base_url).context(format!(
            "Trello API base URL is invalid: {}",
            self.trello.api_base_url
        ))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!(
                "Trello API base URL must use http or https: {}",
                self.trello.api_base_url
            );
        }

        if self.trello.timeout_secs == 0 {
            anyhow::bail!("Trello request timeout must be at least 1 second");
        }

        let canvas = &self.canvas;
        for (name, value) in [
            ("card_width", canvas.card_width),
            ("card_height", canvas.card_height),
        ] {
            if let Some(value) = value {
                if !value.is_finite() || value <= 0.0 {
                    anyhow::bail!("canvas.{name} must be a positive number, got {value}");
                }
            }
        }
        for (name, value) in [
            ("grip_offset", canvas.grip_offset),
            ("jitter", canvas.jitter),
        ] {
            if let Some(value) = value {
                if !value.is_finite() || value < 0.0 {
                    anyhow::bail!("canvas.{name} must not be negative, got {value}");
                }
            }
        }

        Ok(())
    }
}
