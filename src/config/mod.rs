//! @acp:module "Configuration"
//! @acp:summary "Project configuration loading and defaults"
//! @acp:domain personalization
//! @acp:layer config

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ab::{FileStore, MIN_SAMPLE_SIZE};
use crate::observer::ObserverConfig;

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = ".hero.config.json";

fn default_version() -> String {
    "1.0.0".to_string()
}

/// @acp:summary "Main hero configuration structure"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Configuration format version
    #[serde(default = "default_version")]
    pub version: String,

    /// Template and asset registry documents
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Signal table document replacing the built-in keyword/pattern tables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signals: Option<PathBuf>,

    /// Behavioral re-personalization settings
    #[serde(default)]
    pub observer: ObserverConfig,

    /// A/B exploration settings
    #[serde(default)]
    pub ab: AbConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            catalog: CatalogConfig::default(),
            signals: None,
            observer: ObserverConfig::default(),
            ab: AbConfig::default(),
        }
    }
}

impl Config {
    /// @acp:summary "Load config from a .hero.config.json file"
    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// @acp:summary "Save config to a file"
    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// @acp:summary "Load from default location or fall back to defaults"
    pub fn load_or_default() -> Self {
        Self::load(DEFAULT_CONFIG_FILE).unwrap_or_default()
    }

    /// Config from `path` when given, else the default file, else defaults
    pub fn load_or_warn(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::load(path).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Failed to load config, using defaults");
                Self::default()
            }),
            None => Self::load_or_default(),
        }
    }

    /// Where persisted A/B state lives, if anywhere
    pub fn ab_state_path(&self) -> Option<PathBuf> {
        self.ab
            .state_path
            .clone()
            .or_else(FileStore::default_location)
    }
}

/// @acp:summary "Registry document locations"
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogConfig {
    /// Template registry (`{templates, defaultTemplate}`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templates: Option<PathBuf>,

    /// Asset registry (`{images, badges, content}`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<PathBuf>,
}

/// @acp:summary "A/B exploration settings"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Impressions per intent before a winner is locked
    #[serde(default = "default_min_sample_size")]
    pub min_sample_size: u64,

    /// State file; defaults to `<data-local-dir>/hero/ab-state.json`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_path: Option<PathBuf>,
}

impl Default for AbConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_sample_size: default_min_sample_size(),
            state_path: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_min_sample_size() -> u64 {
    MIN_SAMPLE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.ab.enabled);
        assert_eq!(config.ab.min_sample_size, 100);
        assert_eq!(config.observer.cooldown_ms, 10_000);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);

        let mut config = Config::default();
        config.catalog.templates = Some(PathBuf::from("registry/templates.json"));
        config.ab.state_path = Some(dir.path().join("ab.json"));
        config.observer.settle_delay_ms = 0;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.ab_state_path(), Some(dir.path().join("ab.json")));
    }

    #[test]
    fn test_camel_case_keys() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert!(json["ab"]["minSampleSize"].is_number());
        assert!(json["observer"]["settleDelayMs"].is_number());
        assert!(json.get("signals").is_none());
    }
}
