//! Runtime configuration for the backend connection and model selection.
//!
//! Configuration is resolved in three layers: built-in defaults, an optional
//! `~/.config/snapgpt/config.toml` file, and `SNAPGPT_*` environment
//! variables (highest precedence).

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default backend base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
/// Default vision-capable model used for regular chat turns.
pub const DEFAULT_CHAT_MODEL: &str = "llama3.2-vision";
/// Fixed model used for PDF analysis and PDF-mode questions.
pub const DEFAULT_PDF_MODEL: &str = "mistral:latest";

/// Connection and model settings for the inference backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the backend API server
    pub base_url: String,
    /// Model used for regular chat turns (session default)
    pub chat_model: String,
    /// Model forced for PDF analysis and PDF-mode questions
    pub pdf_model: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            pdf_model: DEFAULT_PDF_MODEL.to_string(),
        }
    }
}

impl BackendConfig {
    /// Loads the configuration from the config file and environment.
    ///
    /// A missing config file is not an error; defaults are used. A present
    /// but unreadable/unparsable file is.
    pub fn load() -> Result<Self> {
        let mut config = match config_path() {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(&path)?;
                let parsed = Self::from_toml_str(&content)?;
                tracing::debug!("[Config] Loaded configuration from {}", path.display());
                parsed
            }
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Parses a configuration from TOML text, filling missing fields with
    /// defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Applies `SNAPGPT_BASE_URL`, `SNAPGPT_CHAT_MODEL` and
    /// `SNAPGPT_PDF_MODEL` environment overrides.
    pub fn apply_env(&mut self) {
        if let Ok(value) = std::env::var("SNAPGPT_BASE_URL") {
            self.base_url = value;
        }
        if let Ok(value) = std::env::var("SNAPGPT_CHAT_MODEL") {
            self.chat_model = value;
        }
        if let Ok(value) = std::env::var("SNAPGPT_PDF_MODEL") {
            self.pdf_model = value;
        }
    }
}

/// Returns the path to the configuration file: ~/.config/snapgpt/config.toml
fn config_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(home.join(".config").join("snapgpt").join("config.toml"))
}
