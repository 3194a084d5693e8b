use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::filters::Condition;
use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_MAX_BODY_BYTES, DEFAULT_MAX_CONDITIONS,
    DEFAULT_MAX_DEPTH, SPACES_ENDPOINT,
};

// =============================================================================
// File Configuration (all fields optional)
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct LimitsFileConfig {
    pub max_body_bytes: Option<usize>,
    pub max_depth: Option<usize>,
    pub max_conditions: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EndpointFileConfig {
    /// Property key -> condition used for bare `key=value` query parameters
    #[serde(default)]
    pub defaults: BTreeMap<String, Condition>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub limits: Option<LimitsFileConfig>,
    pub endpoints: Option<BTreeMap<String, EndpointFileConfig>>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(limits) = other.limits {
            let current = self.limits.get_or_insert_with(LimitsFileConfig::default);
            if limits.max_body_bytes.is_some() {
                tracing::trace!(max_body_bytes = ?limits.max_body_bytes, "Merging limits.max_body_bytes");
                current.max_body_bytes = limits.max_body_bytes;
            }
            if limits.max_depth.is_some() {
                tracing::trace!(max_depth = ?limits.max_depth, "Merging limits.max_depth");
                current.max_depth = limits.max_depth;
            }
            if limits.max_conditions.is_some() {
                tracing::trace!(max_conditions = ?limits.max_conditions, "Merging limits.max_conditions");
                current.max_conditions = limits.max_conditions;
            }
        }

        // Endpoint defaults merge per property
        if let Some(endpoints) = other.endpoints {
            let current = self.endpoints.get_or_insert_with(BTreeMap::new);
            for (name, endpoint) in endpoints {
                tracing::trace!(endpoint = %name, "Merging endpoint defaults");
                current
                    .entry(name)
                    .or_default()
                    .defaults
                    .extend(endpoint.defaults);
            }
        }
    }
}

// =============================================================================
// Resolved Configuration
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitsConfig {
    pub max_body_bytes: usize,
    pub max_depth: usize,
    pub max_conditions: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_depth: DEFAULT_MAX_DEPTH,
            max_conditions: DEFAULT_MAX_CONDITIONS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EndpointConfig {
    pub defaults: BTreeMap<String, Condition>,
}

/// Filter configuration
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    pub limits: LimitsConfig,
    pub endpoints: BTreeMap<String, EndpointConfig>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        let spaces = EndpointConfig {
            defaults: BTreeMap::from([("name".to_string(), Condition::Contains)]),
        };
        Self {
            limits: LimitsConfig::default(),
            endpoints: BTreeMap::from([(SPACES_ENDPOINT.to_string(), spaces)]),
        }
    }
}

impl FilterConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.dvfilter/dvfilter.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading filter configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        let profile_path = get_profile_config_path().filter(|path| path.exists());
        Self::load_layers(profile_path.as_deref(), overlay_path.as_deref(), cli)
    }

    /// Layer the given config files and CLI overrides over the defaults
    fn load_layers(profile: Option<&Path>, overlay: Option<&Path>, cli: &CliConfig) -> Result<Self> {
        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        for path in [profile, overlay].into_iter().flatten() {
            let layer = FileConfig::load_from_file(path)?;
            layer.warn_unknown_fields();
            file_config.merge(layer);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        let config = Self::from_layers(file_config, cli);
        config.validate()?;
        Ok(config)
    }

    fn from_layers(file_config: FileConfig, cli: &CliConfig) -> Self {
        let file_limits = file_config.limits.unwrap_or_default();
        let defaults = LimitsConfig::default();

        let limits = LimitsConfig {
            max_body_bytes: cli
                .max_body_bytes
                .or(file_limits.max_body_bytes)
                .unwrap_or(defaults.max_body_bytes),
            max_depth: cli
                .max_depth
                .or(file_limits.max_depth)
                .unwrap_or(defaults.max_depth),
            max_conditions: cli
                .max_conditions
                .or(file_limits.max_conditions)
                .unwrap_or(defaults.max_conditions),
        };

        let mut endpoints = Self::default().endpoints;
        for (name, endpoint) in file_config.endpoints.unwrap_or_default() {
            endpoints
                .entry(name)
                .or_default()
                .defaults
                .extend(endpoint.defaults);
        }

        Self { limits, endpoints }
    }

    fn validate(&self) -> Result<()> {
        if self.limits.max_body_bytes == 0 {
            anyhow::bail!("Configuration error: limits.max_body_bytes must be greater than 0");
        }
        if self.limits.max_depth == 0 {
            anyhow::bail!("Configuration error: limits.max_depth must be greater than 0");
        }
        if self.limits.max_conditions == 0 {
            anyhow::bail!("Configuration error: limits.max_conditions must be greater than 0");
        }
        Ok(())
    }
}

/// Get the profile config path (~/.dvfilter/dvfilter.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}
