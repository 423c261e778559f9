//! @acp:module "Init Command"
//! @acp:summary "Write a default hero configuration"
//! @acp:domain cli
//! @acp:layer handler
//!
//! Implements `hero init` for project initialization.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use console::style;

use crate::config::{Config, DEFAULT_CONFIG_FILE};

/// Options for the init command
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Force overwrite existing config
    pub force: bool,
    /// Config file to write; defaults to `.hero.config.json`
    pub path: Option<PathBuf>,
    /// Template registry path to record
    pub templates: Option<PathBuf>,
    /// Asset registry path to record
    pub assets: Option<PathBuf>,
    /// A/B state file to record
    pub ab_state: Option<PathBuf>,
    /// Disable A/B exploration
    pub no_ab: bool,
}

/// Execute the init command
pub fn execute_init(options: InitOptions) -> Result<PathBuf> {
    let config_path = options
        .path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    if config_path.exists() && !options.force {
        bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    let mut config = Config::default();
    config.catalog.templates = options.templates;
    config.catalog.assets = options.assets;
    config.ab.state_path = options.ab_state;
    config.ab.enabled = !options.no_ab;

    config
        .save(&config_path)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("{} Created {}", style("✓").green(), config_path.display());

    match config.ab_state_path() {
        Some(path) if config.ab.enabled => {
            println!("  A/B state: {}", style(path.display()).dim())
        }
        _ => println!("  A/B exploration: {}", style("disabled").dim()),
    }
    Ok(config_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_and_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        let options = InitOptions {
            path: Some(path.clone()),
            ab_state: Some(dir.path().join("ab.json")),
            ..Default::default()
        };

        execute_init(options.clone()).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.ab.state_path, Some(dir.path().join("ab.json")));

        assert!(execute_init(options.clone()).is_err());
        assert!(execute_init(InitOptions { force: true, ..options }).is_ok());
    }
}
