// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application configuration.
//!
//! Settings are read from `config.yaml` in the platform config directory
//! (`~/.config/overtype/` on Linux) and then overridden by environment
//! variables. A missing file means defaults; a broken one is reported and
//! ignored.

use crate::editor::history::DEFAULT_MAX_HISTORY;
use crate::editor::BubbleDefaults;
use crate::models::bubble::{Shape, DEFAULT_FONT_FAMILY};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_SERVICE_URL: &str = "OVERTYPE_SERVICE_URL";
pub const ENV_TARGET_LANGUAGE: &str = "OVERTYPE_TARGET_LANGUAGE";

const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the translation backend
    pub service_url: String,
    pub target_language: String,
    pub request_timeout_secs: u64,
    /// Snapshots kept for undo
    pub max_history: usize,
    /// Shape of bubbles created by a scan and of newly drawn boxes
    pub default_shape: Shape,
    pub default_font_family: String,
    /// Extra `.ttf`/`.otf` files, registered under their file names
    pub font_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_url: "http://127.0.0.1:8080".to_string(),
            target_language: "English".to_string(),
            request_timeout_secs: 60,
            max_history: DEFAULT_MAX_HISTORY,
            default_shape: Shape::Rectangle,
            default_font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_dir: None,
        }
    }
}

impl AppConfig {
    /// Location of the config file, if the platform has a config directory.
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(env!("CARGO_PKG_NAME")).join(CONFIG_FILE))
    }

    /// Load the user's configuration with environment overrides applied.
    pub fn load() -> Self {
        let mut config = match Self::path() {
            Some(path) if path.exists() => match Self::from_file(&path) {
                Ok(config) => {
                    log::info!("Loaded configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("Ignoring configuration: {:#}", e);
                    Self::default()
                }
            },
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_yaml(&yaml).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Apply overrides from `lookup`, normally the process environment.
    /// Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = non_empty(ENV_SERVICE_URL) {
            log::debug!("{} overrides service URL", ENV_SERVICE_URL);
            self.service_url = url;
        }
        if let Some(language) = non_empty(ENV_TARGET_LANGUAGE) {
            self.target_language = language;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn bubble_defaults(&self) -> BubbleDefaults {
        BubbleDefaults {
            shape: self.default_shape,
            font_family: self.default_font_family.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = AppConfig::from_yaml("target_language: German\ndefault_shape: ellipse\n").unwrap();
        assert_eq!(config.target_language, "German");
        assert_eq!(config.default_shape, Shape::Ellipse);
        assert_eq!(config.max_history, DEFAULT_MAX_HISTORY);
        assert_eq!(config.service_url, AppConfig::default().service_url);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(AppConfig::from_yaml("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        assert!(AppConfig::from_yaml("default_shape: hexagon").is_err());
        assert!(AppConfig::from_file(Path::new("/nonexistent/overtype.yaml")).is_err());
    }

    #[test]
    fn test_environment_overrides() {
        let mut config = AppConfig::default();
        config.apply_overrides(|key| match key {
            ENV_SERVICE_URL => Some("http://translate.local:9000".to_string()),
            ENV_TARGET_LANGUAGE => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.service_url, "http://translate.local:9000");
        assert_eq!(config.target_language, "English");
    }

    #[test]
    fn test_timeout_is_never_zero() {
        let config = AppConfig {
            request_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.request_timeout(), Duration::from_secs(1));
    }
}
