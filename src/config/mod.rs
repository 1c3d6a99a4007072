use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::toast::DEFAULT_TOAST_DELAY;

/// Optional color overrides as `#RRGGBB` / `#RGB` strings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ColorOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub danger: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_dim: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_selected: Option<String>,
}

fn default_toast_delay_ms() -> u64 {
    DEFAULT_TOAST_DELAY.as_millis() as u64
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// How long the "Copied!" toast stays up
    #[serde(default = "default_toast_delay_ms")]
    pub toast_delay_ms: u64,

    /// Ask before deleting a verse
    #[serde(default = "default_true")]
    pub confirm_delete: bool,

    /// Desktop notification after `--copy`
    #[serde(default)]
    pub notifications: bool,

    /// Where verses.json lives (defaults to the platform data dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    #[serde(default)]
    pub colors: ColorOverrides,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            toast_delay_ms: default_toast_delay_ms(),
            confirm_delete: true,
            notifications: false,
            data_dir: None,
            colors: ColorOverrides::default(),
        }
    }
}

impl AppConfig {
    /// Get the config file path
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("versekeep");

        std::fs::create_dir_all(&config_dir)
            .with_context(|| format!("Could not create {}", config_dir.display()))?;

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from file, or create default.
    ///
    /// Never fails: any problem comes back next to the defaults so it can be
    /// logged once logging is up.
    pub fn load() -> (Self, Option<anyhow::Error>) {
        match Self::config_path() {
            Ok(path) => Self::load_or_default(&path),
            Err(e) => (AppConfig::default(), Some(e)),
        }
    }

    fn load_or_default(path: &Path) -> (Self, Option<anyhow::Error>) {
        match Self::load_from(path) {
            Ok(Some(config)) => (config, None),
            Ok(None) => {
                let config = AppConfig::default();
                let err = config
                    .save_to(path)
                    .err()
                    .map(|e| e.context("Could not write default config"));
                (config, err)
            }
            // Broken file stays in place, defaults for this run
            Err(e) => (AppConfig::default(), Some(e)),
        }
    }

    /// `None` if there is no file at `path`
    pub fn load_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(Some(config))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Save config to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn toast_delay(&self) -> Duration {
        Duration::from_millis(self.toast_delay_ms)
    }
}
