//! Persisted embedding records and query shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Source type assigned to features when the caller gives none.
pub const DEFAULT_SOURCE_TYPE: &str = "vector";

/// A record ready to be written to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEmbeddingRecord {
    pub name: String,
    pub source_type: String,
    pub properties: Map<String, Value>,
    /// GeoJSON geometry text
    pub geometry: Option<String>,
    /// Empty means "no embedding"; such rows never match a search
    pub embedding: Vec<f32>,
    pub embedding_model: String,
}

/// A similarity search request against the store.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub embedding: Vec<f32>,
    pub k: usize,
    pub source_type: Option<String>,
    pub threshold: f32,
}

impl SearchQuery {
    pub fn new(embedding: Vec<f32>, k: usize) -> Self {
        Self {
            embedding,
            k,
            source_type: None,
            threshold: 0.0,
        }
    }

    pub fn with_source_type(mut self, source_type: impl Into<String>) -> Self {
        self.source_type = Some(source_type.into());
        self
    }

    pub const fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }
}

/// One ranked result of a similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: Uuid,
    pub name: String,
    pub source_type: String,
    pub properties: Map<String, Value>,
    /// GeoJSON text, whatever the internal representation
    pub geometry: Option<String>,
    pub similarity: f32,
    pub embedding_model: String,
    pub created_at: DateTime<Utc>,
}

/// Aggregate counts over the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_embeddings: u64,
    pub source_types: u64,
    pub models: u64,
    pub spatial_enabled: bool,
}

/// Identity of the encoder in use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model: String,
    pub embedding_dim: usize,
}

/// Outcome of a batch insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertReport {
    pub feature_count: usize,
    pub embedding_ids: Vec<Uuid>,
    pub model_info: ModelInfo,
}
