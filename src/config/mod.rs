// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for the labeling tool

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Batch label selecting `data/<date>` and `feedback/<date>`
    #[serde(default = "default_date")]
    pub date: String,

    /// Root of the unzipped input data
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Root of the feedback output
    #[serde(default = "default_feedback_dir")]
    pub feedback_dir: String,

    /// Web UI settings
    #[serde(default)]
    pub web: WebConfig,

    /// Imagery gallery settings
    #[serde(default)]
    pub gallery: GalleryConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_web_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GalleryConfig {
    /// Image extensions shown in the timeline viewer (lowercase, no dot)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Hide images whose timeline caption says they are obscured by clouds
    #[serde(default = "default_true")]
    pub hide_cloudy: bool,
    /// Longest side in pixels of images sent to the browser
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
}

// Default value functions
fn default_date() -> String { "202301".to_string() }
fn default_data_dir() -> String { "data".to_string() }
fn default_feedback_dir() -> String { "feedback".to_string() }
fn default_web_host() -> String { "127.0.0.1".to_string() }
fn default_web_port() -> u16 { 8501 }
fn default_true() -> bool { true }
fn default_max_dimension() -> u32 { 1600 }

fn default_extensions() -> Vec<String> {
    vec!["jpg", "jpeg", "png"].into_iter().map(String::from).collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            date: default_date(),
            data_dir: default_data_dir(),
            feedback_dir: default_feedback_dir(),
            web: WebConfig::default(),
            gallery: GalleryConfig::default(),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
        }
    }
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            hide_cloudy: true,
            max_dimension: default_max_dimension(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| crate::LabelError::Config(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check values that end up in file paths or sockets
    pub fn validate(&self) -> crate::Result<()> {
        if self.date.is_empty() {
            return Err(crate::LabelError::Config("date must not be empty".to_string()));
        }
        if !self.date.chars().all(|c| c.is_ascii_digit() || c == '-') {
            return Err(crate::LabelError::Config(format!(
                "date '{}' may only contain digits and '-'",
                self.date
            )));
        }
        if self.gallery.max_dimension == 0 {
            return Err(crate::LabelError::Config("gallery.max_dimension must be positive".to_string()));
        }
        Ok(())
    }

    /// Folder holding one sub-folder per article for the configured date
    pub fn validation_dir(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.date)
    }

    /// CSV file receiving the reviewer's feedback for the configured date
    pub fn feedback_file(&self) -> PathBuf {
        Path::new(&self.feedback_dir).join(&self.date).join("feedback.csv")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let config = AppConfig::default();
        assert_eq!(config.validation_dir(), PathBuf::from("data/202301"));
        assert_eq!(config.feedback_file(), PathBuf::from("feedback/202301/feedback.csv"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"date": "202305"}"#).unwrap();
        assert_eq!(config.date, "202305");
        assert_eq!(config.web.port, 8501);
        assert_eq!(config.gallery.extensions, vec!["jpg", "jpeg", "png"]);
        assert!(config.gallery.hide_cloudy);
    }

    #[test]
    fn test_validate_rejects_path_like_dates() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.date = "../202301".to_string();
        assert!(config.validate().is_err());

        config.date = String::new();
        assert!(config.validate().is_err());

        config.date = "2023-01".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = AppConfig::default();
        config.date = "202402".to_string();
        config.web.port = 9000;
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.date, "202402");
        assert_eq!(loaded.web.port, 9000);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = AppConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(loaded.date, "202301");
    }
}
