//! geoembed setup and wiring
//!
//! - Project initialization (`.geoembed/config.yaml`)
//! - Building the encoder, store and facade from a loaded [`Config`]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::domain::models::{Config, EmbeddingConfig, EncoderProvider};
use crate::domain::ports::TextEncoder;
use crate::infrastructure::database::SqliteEmbeddingStore;
use crate::infrastructure::spatial::H3CellIndexer;
use crate::infrastructure::vector::HashingEncoder;
use crate::services::{ContextGenerator, GeoEmbeddingService};

/// Project configuration directory, relative to the working directory
pub const CONFIG_DIR: &str = ".geoembed";

/// Default configuration template content
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# geoembed configuration
# Override settings by editing this file or setting environment variables
# with the GEOEMBED_ prefix, for example:
#   export GEOEMBED_DATABASE__PATH=/data/geo.db
#   export GEOEMBED_DATABASE__SPATIAL__ENABLED=false
#   export GEOEMBED_LOGGING__LEVEL=debug

database:
  # SQLite database file, or ":memory:"
  path: ".geoembed/geoembed.db"
  max_connections: 5
  # Delay before retrying a failed capability probe
  capability_retry_delay_ms: 100
  spatial:
    # Load SpatiaLite for native geometry storage; falls back to GeoJSON text
    enabled: true
    extension: "mod_spatialite"

embedding:
  # hashing (built in) or bert (requires the `bert` cargo feature)
  provider: "hashing"
  model: "sentence-transformers/all-MiniLM-L6-v2"
  dimension: 384
  max_input_chars: 8192

context:
  include_topology: true
  # H3 resolution used for point features (0-15)
  cell_resolution: 9

search:
  default_k: 10
  similarity_threshold: 0.0

logging:
  # trace, debug, info, warn, error
  level: "warn"
  # json or pretty
  format: "pretty"
  enable_console: true
  # daily, hourly or never; only used with log_dir
  rotation: "daily"
"#;

/// Write the default config under `root/.geoembed/`.
///
/// Returns the path written, or `None` when a config already exists and
/// `force` is false.
pub fn init_project(root: &Path, force: bool) -> Result<Option<PathBuf>> {
    let dir = root.join(CONFIG_DIR);
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let path = dir.join("config.yaml");
    if path.exists() && !force {
        return Ok(None);
    }
    fs::write(&path, DEFAULT_CONFIG_TEMPLATE)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "wrote default configuration");
    Ok(Some(path))
}

/// Build the configured text encoder.
pub fn build_encoder(config: &EmbeddingConfig) -> Result<Arc<dyn TextEncoder>> {
    match config.provider {
        EncoderProvider::Hashing => Ok(Arc::new(HashingEncoder::new(
            config.dimension,
            config.max_input_chars,
        ))),
        #[cfg(feature = "bert")]
        EncoderProvider::Bert => {
            let encoder = crate::infrastructure::vector::BertEncoder::load(&config.model)
                .with_context(|| format!("Failed to load embedding model {}", config.model))?;
            Ok(Arc::new(encoder))
        }
        #[cfg(not(feature = "bert"))]
        EncoderProvider::Bert => {
            anyhow::bail!("embedding.provider 'bert' requires building with the `bert` feature")
        }
    }
}

/// Open the store and assemble the facade.
pub async fn build_service(config: &Config) -> Result<GeoEmbeddingService> {
    let encoder = build_encoder(&config.embedding)?;
    let store = SqliteEmbeddingStore::initialize(&config.database)
        .await
        .context("Failed to initialize embedding store")?;

    let context = ContextGenerator::new(
        Arc::new(H3CellIndexer::new()),
        config.context.cell_resolution,
    );

    Ok(GeoEmbeddingService::new(
        Arc::new(store),
        encoder,
        context,
        config.search.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_parses_to_defaults() {
        let parsed: Config = serde_yaml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_init_project_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let first = init_project(dir.path(), false).unwrap();
        assert!(first.is_some());

        fs::write(dir.path().join(".geoembed/config.yaml"), "search:\n  default_k: 3\n").unwrap();
        assert_eq!(init_project(dir.path(), false).unwrap(), None);
        let kept = fs::read_to_string(dir.path().join(".geoembed/config.yaml")).unwrap();
        assert!(kept.contains("default_k: 3"));

        assert!(init_project(dir.path(), true).unwrap().is_some());
    }

    #[test]
    fn test_hashing_encoder_is_built() {
        let encoder = build_encoder(&EmbeddingConfig::default()).unwrap();
        assert_eq!(encoder.dimension(), 384);
        assert_eq!(encoder.model_identifier(), "geoembed-hashing-v1-d384");
    }
}
