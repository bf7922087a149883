//! Runtime configuration
//!
//! Handles loading `aggregated.toml`. Every key is optional:
//!
//! ```toml
//! enabled = true
//! debug = false
//! max_relations = 15
//! default_hydrator = "array"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::hydrator::HydratorKind;

pub const CONFIG_FILE: &str = "aggregated.toml";

/// Default cap on relation + count entries per query.
pub const DEFAULT_MAX_RELATIONS: u32 = 15;

/// Comment prepended to executed statements when `debug` is on.
pub const DEBUG_SQL_PREFIX: &str = "/* aggregated-queries */ ";

/// Builder behaviour switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// When `false` every builder operation fails with `Disabled`
    pub enabled: bool,
    /// Tag executed SQL with [`DEBUG_SQL_PREFIX`]
    pub debug: bool,
    /// Maximum relations + counts per query; `0` means unbounded
    pub max_relations: u32,
    /// Strategy used by `get_result` / `get_one`
    pub default_hydrator: HydratorKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            debug: false,
            max_relations: DEFAULT_MAX_RELATIONS,
            default_hydrator: HydratorKind::Array,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    enabled: Option<bool>,
    debug: Option<bool>,
    max_relations: Option<u32>,
    default_hydrator: Option<String>,
}

impl Config {
    /// Load from the default config file in the working directory
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Load from specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.into(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse from TOML text, applying defaults for missing keys
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(content)?;
        let defaults = Self::default();

        let default_hydrator = match raw.default_hydrator {
            Some(name) => HydratorKind::parse(&name).ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "unknown default_hydrator '{name}', expected one of: {}",
                    HydratorKind::ALL.join(", ")
                ))
            })?,
            None => defaults.default_hydrator,
        };

        Ok(Self {
            enabled: raw.enabled.unwrap_or(defaults.enabled),
            debug: raw.debug.unwrap_or(defaults.debug),
            max_relations: raw.max_relations.unwrap_or(defaults.max_relations),
            default_hydrator,
        })
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_max_relations(mut self, max_relations: u32) -> Self {
        self.max_relations = max_relations;
        self
    }

    #[must_use]
    pub fn with_default_hydrator(mut self, kind: HydratorKind) -> Self {
        self.default_hydrator = kind;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
