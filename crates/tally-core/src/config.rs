//! Configuration for import, detection and insight thresholds
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path, or the override in the data dir (~/.local/share/tally/config.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! An override file is layered over the embedded defaults: tables merge key by
//! key, any other value (including the `[[rules]]` array) replaces the default.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::categorize::CategorizationConfig;
use crate::detect::DetectionConfig;
use crate::error::{Error, Result};
use crate::import::ImportConfig;
use crate::insights::InsightsConfig;
use crate::models::RuleSet;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/tally.toml");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub import: ImportConfig,
    pub detection: DetectionConfig,
    pub insights: InsightsConfig,
    pub categorization: CategorizationConfig,
    /// Seed rules written to an empty rule store on `init`
    pub rules: RuleSet,
}

impl Config {
    /// The configuration compiled into the binary
    pub fn embedded() -> Result<Self> {
        Ok(toml::from_str(DEFAULT_CONFIG)?)
    }

    /// Parse an override document on top of the embedded defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut merged: toml::Table = toml::from_str(DEFAULT_CONFIG)?;
        let overrides: toml::Table = toml::from_str(content)?;
        merge_tables(&mut merged, overrides);
        Ok(toml::Value::Table(merged).try_into()?)
    }

    /// Load configuration (explicit path, then user override, then embedded default)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let candidate = match path {
            Some(p) => {
                if !p.exists() {
                    return Err(Error::NotFound(format!(
                        "config file {}",
                        p.display()
                    )));
                }
                Some(p.to_path_buf())
            }
            None => default_config_path().filter(|p| p.exists()),
        };

        match candidate {
            Some(p) => {
                debug!("Loading config from {}", p.display());
                let content = fs::read_to_string(&p).map_err(|e| {
                    Error::InvalidData(format!("Failed to read config {}: {}", p.display(), e))
                })?;
                Self::from_toml(&content)
            }
            None => {
                debug!("Using embedded default config");
                Self::embedded()
            }
        }
    }
}

fn merge_tables(base: &mut toml::Table, overrides: toml::Table) {
    for (key, value) in overrides {
        match value {
            toml::Value::Table(table) => {
                if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                    merge_tables(existing, table);
                    continue;
                }
                base.insert(key, toml::Value::Table(table));
            }
            value => {
                base.insert(key, value);
            }
        }
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("tally").join("config.toml"))
}
