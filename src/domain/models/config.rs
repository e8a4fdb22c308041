use serde::{Deserialize, Serialize};

/// Main configuration structure for geoembed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Text encoder configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Context text generation
    #[serde(default)]
    pub context: ContextConfig,

    /// Search defaults
    #[serde(default)]
    pub search: SearchConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file, or `:memory:`
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Delay before the single capability retry
    #[serde(default = "default_capability_retry_delay_ms")]
    pub capability_retry_delay_ms: u64,

    /// Optional spatial extension
    #[serde(default)]
    pub spatial: SpatialConfig,
}

fn default_database_path() -> String {
    ".geoembed/geoembed.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

const fn default_capability_retry_delay_ms() -> u64 {
    100
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
            capability_retry_delay_ms: default_capability_retry_delay_ms(),
            spatial: SpatialConfig::default(),
        }
    }
}

impl DatabaseConfig {
    /// In-memory database, used by tests and one-off runs.
    pub fn in_memory() -> Self {
        Self {
            path: ":memory:".to_string(),
            ..Self::default()
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.path == ":memory:" || self.path.starts_with("file::memory:")
    }
}

/// `SpatiaLite` configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SpatialConfig {
    /// Attempt to load the spatial extension at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Extension library name or path passed to the loader
    #[serde(default = "default_spatial_extension")]
    pub extension: String,
}

fn default_spatial_extension() -> String {
    "mod_spatialite".to_string()
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            extension: default_spatial_extension(),
        }
    }
}

/// Which encoder backs the pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderProvider {
    /// Deterministic feature hashing, always available
    #[default]
    Hashing,
    /// Sentence-transformers BERT via candle (`bert` feature)
    Bert,
}

/// Text encoder configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EncoderProvider,

    /// HuggingFace model id for the bert provider
    #[serde(default = "default_model")]
    pub model: String,

    /// Output dimension of the hashing provider
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Longest input accepted by the hashing provider, in characters
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

fn default_model() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

const fn default_dimension() -> usize {
    384
}

const fn default_max_input_chars() -> usize {
    8192
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EncoderProvider::default(),
            model: default_model(),
            dimension: default_dimension(),
            max_input_chars: default_max_input_chars(),
        }
    }
}

/// Context text generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ContextConfig {
    /// Append the H3 cell clause for point features
    #[serde(default = "default_true")]
    pub include_topology: bool,

    /// H3 resolution (0-15)
    #[serde(default = "default_cell_resolution")]
    pub cell_resolution: u8,
}

const fn default_cell_resolution() -> u8 {
    9
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            include_topology: true,
            cell_resolution: default_cell_resolution(),
        }
    }
}

/// Search defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SearchConfig {
    #[serde(default = "default_k")]
    pub default_k: usize,

    #[serde(default)]
    pub similarity_threshold: f32,
}

const fn default_k() -> usize {
    10
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_k: default_k(),
            similarity_threshold: 0.0,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    #[serde(default = "default_true")]
    pub enable_console: bool,

    /// Rotation: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            enable_console: true,
            rotation: default_rotation(),
        }
    }
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.database.path, ".geoembed/geoembed.db");
        assert_eq!(config.database.capability_retry_delay_ms, 100);
        assert!(config.database.spatial.enabled);
        assert_eq!(config.database.spatial.extension, "mod_spatialite");
        assert_eq!(config.embedding.provider, EncoderProvider::Hashing);
        assert_eq!(config.embedding.dimension, 384);
        assert_eq!(config.context.cell_resolution, 9);
        assert_eq!(config.search.default_k, 10);
        assert!(config.search.similarity_threshold.abs() < f32::EPSILON);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r"
database:
  path: /tmp/geo.db
  spatial:
    enabled: false
embedding:
  provider: bert
";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.database.path, "/tmp/geo.db");
        assert!(!config.database.spatial.enabled);
        assert_eq!(config.database.spatial.extension, "mod_spatialite");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.embedding.provider, EncoderProvider::Bert);
        assert_eq!(config.search, SearchConfig::default());
    }

    #[test]
    fn test_in_memory_detection() {
        assert!(DatabaseConfig::in_memory().is_in_memory());
        assert!(!DatabaseConfig::default().is_in_memory());
    }
}
