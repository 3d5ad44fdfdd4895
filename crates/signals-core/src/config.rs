//! Configuration loading and typed config structures for the signals engine.
//!
//! The canonical configuration lives in `signals-config.yaml` at the project
//! root. Every field has a default, so an empty or partial file is valid.

use std::path::Path;

use serde::Deserialize;
use signals_network::ZeroDirectionalPolicy;
use tracing::warn;

/// Environment variable that overrides [`EngineConfig::tick_interval_ms`].
pub const TICK_INTERVAL_ENV: &str = "SIGNALS_TICK_INTERVAL_MS";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level signals configuration.
///
/// Mirrors the structure of `signals-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SignalsConfig {
    /// Graph compilation settings.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Tick loop settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SignalsConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `SIGNALS_TICK_INTERVAL_MS` overrides `engine.tick_interval_ms`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Unparseable values are logged and ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = lookup(TICK_INTERVAL_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => self.engine.tick_interval_ms = ms,
                Err(err) => warn!(
                    variable = TICK_INTERVAL_ENV,
                    value = %raw,
                    error = %err,
                    "Ignoring invalid tick interval override"
                ),
            }
        }
    }
}

/// Graph compilation configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NetworkConfig {
    /// How runs whose signals forbid both directions are compiled.
    #[serde(default)]
    pub zero_directional: ZeroDirectionalPolicy,
}

/// Tick loop configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Real-time milliseconds between evaluations.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Stop after this many ticks (0 = unlimited).
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: default_max_ticks(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default log filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_tick_interval_ms() -> u64 {
    50
}

const fn default_max_ticks() -> u64 {
    0
}

fn default_log_level() -> String {
    "info".to_owned()
}
