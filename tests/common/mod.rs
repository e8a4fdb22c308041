//! Common test utilities for integration tests

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;

use geoembed::domain::models::{DatabaseConfig, Feature, SearchConfig, SpatialConfig};
use geoembed::infrastructure::spatial::H3CellIndexer;
use geoembed::services::ContextGenerator;
use geoembed::{GeoEmbeddingService, HashingEncoder, SqliteEmbeddingStore};

pub const TEST_DIMENSION: usize = 384;

/// Create a temporary test database path
///
/// The directory is removed when the returned `TempDir` is dropped.
pub fn temp_db_path() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("geoembed.db");
    (dir, db_path)
}

/// Database config that never attempts to load SpatiaLite.
pub fn fallback_config(path: &str) -> DatabaseConfig {
    DatabaseConfig {
        path: path.to_string(),
        capability_retry_delay_ms: 1,
        spatial: SpatialConfig {
            enabled: false,
            ..SpatialConfig::default()
        },
        ..DatabaseConfig::default()
    }
}

/// Database config that requests SpatiaLite; it may or may not be installed.
pub fn spatial_config(path: &str) -> DatabaseConfig {
    DatabaseConfig {
        path: path.to_string(),
        capability_retry_delay_ms: 1,
        ..DatabaseConfig::default()
    }
}

pub fn point_feature(name: &str, lon: f64, lat: f64, extra: Value) -> Feature {
    let mut properties = match extra {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    properties.insert("name".to_string(), Value::String(name.to_string()));
    serde_json::from_value(json!({
        "type": "Feature",
        "geometry": {"type": "Point", "coordinates": [lon, lat]},
        "properties": properties,
    }))
    .expect("valid feature")
}

/// Facade over a store opened from `config` with the hashing encoder.
pub async fn hashing_service(config: &DatabaseConfig) -> GeoEmbeddingService {
    let store = SqliteEmbeddingStore::initialize(config)
        .await
        .expect("store initializes");
    GeoEmbeddingService::new(
        Arc::new(store),
        Arc::new(HashingEncoder::new(TEST_DIMENSION, 8192)),
        ContextGenerator::new(Arc::new(H3CellIndexer::new()), 9),
        SearchConfig::default(),
    )
}

/// Unit vector along `axis`.
pub fn axis(dimension: usize, axis: usize) -> Vec<f32> {
    let mut v = vec![0.0; dimension];
    v[axis] = 1.0;
    v
}
