//! Engine settings.
//!
//! Loaded from an `[snapshot]` / `[export]` TOML document or from the
//! environment:
//!
//! - `ANALYSIS_SNAPSHOT_WRITE_BACK`: write computed overviews back on a
//!   snapshot miss (default: true)
//! - `ANALYSIS_EXPORT_SHEET_TITLE`: sheet title for flat exports
//!   (default: "Data Details")
//! - `ANALYSIS_EXPORT_DIR`: directory `export()` writes into
//!   (default: `<temp>/analysis-exports`)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::services::error::AnalysisError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub snapshot: SnapshotSettings,
    #[serde(default)]
    pub export: ExportSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSettings {
    /// Persist a live computation when a snapshot analysis has no snapshot.
    #[serde(default = "default_write_back")]
    pub write_back: bool,
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            write_back: default_write_back(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSettings {
    #[serde(default = "default_sheet_title")]
    pub sheet_title: String,
    #[serde(default = "default_export_directory")]
    pub directory: PathBuf,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            sheet_title: default_sheet_title(),
            directory: default_export_directory(),
        }
    }
}

fn default_write_back() -> bool {
    true
}

fn default_sheet_title() -> String {
    "Data Details".to_string()
}

fn default_export_directory() -> PathBuf {
    std::env::temp_dir().join("analysis-exports")
}

impl EngineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AnalysisError::configuration(format!(
                "Failed to read engine config {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, AnalysisError> {
        toml::from_str(content).map_err(|e| {
            AnalysisError::configuration(format!("Failed to parse engine config: {}", e))
        })
    }

    /// Defaults overridden by any `ANALYSIS_*` variables that are set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(write_back) = std::env::var("ANALYSIS_SNAPSHOT_WRITE_BACK")
            .ok()
            .and_then(|v| parse_bool(&v))
        {
            config.snapshot.write_back = write_back;
        }
        if let Ok(title) = std::env::var("ANALYSIS_EXPORT_SHEET_TITLE") {
            if !title.trim().is_empty() {
                config.export.sheet_title = title;
            }
        }
        if let Ok(dir) = std::env::var("ANALYSIS_EXPORT_DIR") {
            if !dir.trim().is_empty() {
                config.export.directory = PathBuf::from(dir);
            }
        }
        config
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
