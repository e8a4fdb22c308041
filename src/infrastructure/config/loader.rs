use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::{Config, EncoderProvider};

/// Environment variable prefix; nested keys are separated by `__`.
pub const ENV_PREFIX: &str = "GEOEMBED_";

/// Configuration error types
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Spatial extension name cannot be empty when spatial is enabled")]
    EmptySpatialExtension,

    #[error("Invalid embedding dimension: {0}. Must be at least 1")]
    InvalidDimension(usize),

    #[error("Invalid max_input_chars: {0}. Must be at least 1")]
    InvalidMaxInputChars(usize),

    #[error("Embedding model cannot be empty for the bert provider")]
    EmptyModel,

    #[error("The bert provider requires building with the `bert` feature")]
    BertUnavailable,

    #[error("Invalid cell_resolution: {0}. Must be between 0 and 15")]
    InvalidCellResolution(u8),

    #[error("Invalid default_k: {0}. Must be at least 1")]
    InvalidDefaultK(usize),

    #[error("Invalid similarity_threshold: {0}. Must be between -1 and 1")]
    InvalidThreshold(f32),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .geoembed/config.yaml (project config)
    /// 3. .geoembed/local.yaml (local overrides, optional)
    /// 4. Environment variables (`GEOEMBED_*`, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".geoembed/config.yaml"))
            .merge(Yaml::file(".geoembed/local.yaml"))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honouring env overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let db = &config.database;
        if db.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if db.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(db.max_connections));
        }
        if db.spatial.enabled && db.spatial.extension.is_empty() {
            return Err(ConfigError::EmptySpatialExtension);
        }

        let embedding = &config.embedding;
        match embedding.provider {
            EncoderProvider::Hashing => {
                if embedding.dimension == 0 {
                    return Err(ConfigError::InvalidDimension(embedding.dimension));
                }
                if embedding.max_input_chars == 0 {
                    return Err(ConfigError::InvalidMaxInputChars(embedding.max_input_chars));
                }
            }
            EncoderProvider::Bert => {
                if !cfg!(feature = "bert") {
                    return Err(ConfigError::BertUnavailable);
                }
                if embedding.model.is_empty() {
                    return Err(ConfigError::EmptyModel);
                }
            }
        }

        if config.context.cell_resolution > 15 {
            return Err(ConfigError::InvalidCellResolution(config.context.cell_resolution));
        }

        if config.search.default_k == 0 {
            return Err(ConfigError::InvalidDefaultK(config.search.default_k));
        }
        let threshold = config.search.similarity_threshold;
        if !(-1.0..=1.0).contains(&threshold) {
            return Err(ConfigError::InvalidThreshold(threshold));
        }

        let logging = &config.logging;
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(logging.level.clone()));
        }
        if !["json", "pretty"].contains(&logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(logging.format.clone()));
        }
        if !["daily", "hourly", "never"].contains(&logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(logging.rotation.clone()));
        }

        Ok(())
    }
}
