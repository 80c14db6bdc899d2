//! # Configuration
//!
//! Application configuration lives in `config.json` inside the data root.
//! A missing file means defaults; missing keys fall back per field.
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `default-time-limit` | `60` | Minutes seeded into `timeLimit` on first run |
//! | `tab-leave-limit` | `3` | Leaves of the exam view before forced submission |
//! | `legacy-import` | unset | Legacy flat-store dump migrated on startup |
//! | `log-filter` | unset | `tracing` filter used when `EXAMDESK_LOG` is not set |
//!
//! The data root is `EXAMDESK_HOME` when set, otherwise the OS data directory.

use crate::error::{ExamError, Result};
use crate::exam::DEFAULT_TAB_LEAVE_LIMIT;
use crate::model::settings::DEFAULT_TIME_LIMIT_MINUTES;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "config.json";
pub const HOME_ENV: &str = "EXAMDESK_HOME";

pub const KEYS: &[&str] = &[
    "default-time-limit",
    "tab-leave-limit",
    "legacy-import",
    "log-filter",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default = "default_time_limit")]
    pub default_time_limit: u64,

    #[serde(default = "default_tab_leave_limit")]
    pub tab_leave_limit: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_import: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

fn default_time_limit() -> u64 {
    DEFAULT_TIME_LIMIT_MINUTES
}

fn default_tab_leave_limit() -> u32 {
    DEFAULT_TAB_LEAVE_LIMIT
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_time_limit: default_time_limit(),
            tab_leave_limit: default_tab_leave_limit(),
            legacy_import: None,
            log_filter: None,
        }
    }
}

/// Resolve the data root: `EXAMDESK_HOME`, else the per-user data directory.
pub fn data_root() -> Result<PathBuf> {
    if let Some(home) = std::env::var_os(HOME_ENV) {
        return Ok(PathBuf::from(home));
    }
    ProjectDirs::from("com", "examdesk", "examdesk")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| ExamError::StoreUnavailable("Could not determine data directory".into()))
}

impl AppConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let path = dir.as_ref().join(CONFIG_FILENAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path).map_err(ExamError::from_io)?;
        serde_json::from_str(&content)
            .map_err(|e| ExamError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(ExamError::from_io)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(dir.join(CONFIG_FILENAME), content).map_err(ExamError::from_io)?;
        Ok(())
    }

    /// Display value for a key; `None` for unknown keys.
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "default-time-limit" => self.default_time_limit.to_string(),
            "tab-leave-limit" => self.tab_leave_limit.to_string(),
            "legacy-import" => self
                .legacy_import
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            "log-filter" => self.log_filter.clone().unwrap_or_default(),
            _ => return None,
        };
        Some(value)
    }

    /// An empty value unsets the optional keys.
    pub fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), String> {
        match key {
            "default-time-limit" => {
                let minutes: u64 = value
                    .parse()
                    .map_err(|_| format!("Invalid number of minutes: {}", value))?;
                if minutes == 0 {
                    return Err("Time limit must be at least one minute".to_string());
                }
                self.default_time_limit = minutes;
            }
            "tab-leave-limit" => {
                let limit: u32 = value
                    .parse()
                    .map_err(|_| format!("Invalid limit: {}", value))?;
                if limit == 0 {
                    return Err("Tab-leave limit must be at least 1".to_string());
                }
                self.tab_leave_limit = limit;
            }
            "legacy-import" => {
                self.legacy_import = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            "log-filter" => {
                self.log_filter = (!value.is_empty()).then(|| value.to_string());
            }
            _ => return Err(format!("Unknown config key: {}", key)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.default_time_limit, 60);
        assert_eq!(config.tab_leave_limit, 3);
        assert!(config.legacy_import.is_none());
    }

    #[test]
    fn test_load_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(dir.path()).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested");

        let mut config = AppConfig::default();
        config.set("tab-leave-limit", "5").unwrap();
        config.set("legacy-import", "/tmp/legacy.json").unwrap();
        config.save(&root).unwrap();

        let loaded = AppConfig::load(&root).unwrap();
        assert_eq!(loaded.tab_leave_limit, 5);
        assert_eq!(loaded.legacy_import, Some(PathBuf::from("/tmp/legacy.json")));
    }

    #[test]
    fn test_partial_file_uses_field_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), r#"{"tab_leave_limit": 1}"#).unwrap();

        let config = AppConfig::load(dir.path()).unwrap();
        assert_eq!(config.tab_leave_limit, 1);
        assert_eq!(config.default_time_limit, 60);
    }

    #[test]
    fn test_corrupt_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "{not json").unwrap();

        let err = AppConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, ExamError::Config(ref msg) if msg.contains(CONFIG_FILENAME)));
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = AppConfig::default();
        assert!(config.set("default-time-limit", "0").is_err());
        assert!(config.set("default-time-limit", "soon").is_err());
        assert!(config.set("tab-leave-limit", "0").is_err());
        assert!(config.set("color", "red").is_err());
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_empty_value_unsets() {
        let mut config = AppConfig::default();
        config.set("log-filter", "debug").unwrap();
        assert_eq!(config.get("log-filter").as_deref(), Some("debug"));
        config.set("log-filter", "").unwrap();
        assert!(config.log_filter.is_none());
        assert!(config.get("nope").is_none());
    }
}
