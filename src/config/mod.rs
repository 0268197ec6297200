use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::utils::mask_secret;
use crate::TimestamperError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Gemini model settings
    pub gemini: GeminiConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key; usually supplied through `GEMINI_API_KEY` rather than the file
    pub api_key: Option<String>,

    /// Model name
    pub model: String,

    /// Sampling temperature, higher is more playful
    pub temperature: f64,

    /// API base URL
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Minutes between planned timestamps
    pub interval_minutes: i64,

    /// Directory for saved reports (current directory if not set)
    pub output_dir: Option<PathBuf>,

    /// Save reports to disk in addition to printing them
    pub save_output: bool,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.8,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 30,
            output_dir: None,
            save_output: true,
        }
    }
}

impl Config {
    /// Load configuration from an explicit file, the default locations, or defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config_path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::config_path(),
        };

        let config = match config_path {
            Some(path) if path.exists() || explicit.is_some() => {
                tracing::debug!("Loading configuration from {}", path.display());
                let content = fs_err::read_to_string(&path)
                    .context("Failed to read config file")?;

                serde_yaml::from_str(&content).context("Failed to parse config file")?
            }
            _ => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Get configuration file path, preferring `./config.yaml`
    fn config_path() -> Option<PathBuf> {
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::config_dir().map(|dir| dir.join("video-timestamper").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.gemini.model.trim().is_empty() {
            anyhow::bail!("Gemini model must be configured");
        }

        if !(0.0..=2.0).contains(&self.gemini.temperature) {
            anyhow::bail!(
                "Temperature must be between 0.0 and 2.0, got {}",
                self.gemini.temperature
            );
        }

        if self.app.interval_minutes <= 0 {
            anyhow::bail!(
                "Default interval must be positive, got {}",
                self.app.interval_minutes
            );
        }

        Url::parse(&self.gemini.base_url)
            .with_context(|| format!("Invalid Gemini base URL: {}", self.gemini.base_url))?;

        Ok(())
    }

    /// The API key, or a configuration error if none was supplied
    pub fn require_api_key(&self) -> Result<&str, TimestamperError> {
        self.gemini
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                TimestamperError::Configuration(
                    "Please set GEMINI_API_KEY environment variable or pass --api-key".to_string(),
                )
            })
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Model: {}", self.gemini.model);
        println!("  Temperature: {}", self.gemini.temperature);
        println!("  Base URL: {}", self.gemini.base_url);
        match &self.gemini.api_key {
            Some(key) => println!("  API Key: {}", mask_secret(key)),
            None => println!("  API Key: (not set)"),
        }
        println!("  Interval: {} minutes", self.app.interval_minutes);
        if let Some(dir) = &self.app.output_dir {
            println!("  Output Dir: {}", dir.display());
        }
        println!("  Save Output: {}", self.app.save_output);
    }
}
