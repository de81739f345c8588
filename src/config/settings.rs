//! Application settings

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use snmp_reader_core::{DEFAULT_TICK_INTERVAL, INFO_BUFFER_LEN, LABEL_BUFFER_LEN};
use snmp_reader_snmp::SessionSettings;
use std::path::{Path, PathBuf};
use std::time::Duration;

const QUALIFIER: &str = "com";
const ORGANIZATION: &str = "github.snmp_reader";
const APPLICATION: &str = "snmp-reader";

/// Application-wide settings, stored as `config.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Version of the settings format
    pub version: u32,
    /// Host tick period in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default)]
    pub snmp: SnmpSettings,
    /// Longest label, in characters
    #[serde(default = "default_label_budget")]
    pub label_budget: usize,
    /// Longest tooltip, in characters
    #[serde(default = "default_info_budget")]
    pub info_budget: usize,
}

/// Transport tuning shared by every session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnmpSettings {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_max_outstanding")]
    pub max_outstanding: usize,
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL.as_millis() as u64
}

fn default_label_budget() -> usize {
    LABEL_BUFFER_LEN
}

fn default_info_budget() -> usize {
    INFO_BUFFER_LEN
}

fn default_timeout_ms() -> u64 {
    1000
}

fn default_retries() -> u32 {
    5
}

fn default_max_outstanding() -> usize {
    16
}

impl Default for SnmpSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            retries: default_retries(),
            max_outstanding: default_max_outstanding(),
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: 1,
            tick_interval_ms: default_tick_interval_ms(),
            snmp: SnmpSettings::default(),
            label_budget: default_label_budget(),
            info_budget: default_info_budget(),
        }
    }
}

impl AppSettings {
    /// Load settings from disk
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        Self::load_from_path(&config_path)
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_path()?)
    }

    fn project_dirs() -> Result<directories::ProjectDirs> {
        directories::ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    /// Get the settings file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.json"))
    }

    /// Default location of the reader definitions
    pub fn readers_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("readers.conf"))
    }

    /// Load settings from a specific file path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {:?}", path))?;
        let settings = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings: {:?}", path))?;
        Ok(settings)
    }

    /// Save settings to a specific file path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            timeout: Duration::from_millis(self.snmp.timeout_ms),
            retries: self.snmp.retries,
            max_outstanding: self.snmp.max_outstanding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_session_defaults() {
        let settings = AppSettings::default();
        assert_eq!(settings.session_settings(), SessionSettings::default());
        assert_eq!(settings.tick_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: AppSettings =
            serde_json::from_str(r#"{"version": 1, "snmp": {"retries": 2}}"#).unwrap();
        assert_eq!(settings.snmp.retries, 2);
        assert_eq!(settings.snmp.timeout_ms, 1000);
        assert_eq!(settings.label_budget, LABEL_BUFFER_LEN);
    }

    #[test]
    fn test_save_and_load_path() {
        let path = std::env::temp_dir()
            .join(format!("snmp-reader-settings-{}", std::process::id()))
            .join("config.json");
        let settings = AppSettings {
            tick_interval_ms: 250,
            ..AppSettings::default()
        };
        settings.save_to_path(&path).unwrap();
        assert_eq!(AppSettings::load_from_path(&path).unwrap(), settings);
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).unwrap();
        }
    }
}
