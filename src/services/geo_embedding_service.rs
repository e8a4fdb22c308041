//! Geospatial embedding facade.
//!
//! Ties the context generator, text encoder and embedding repository together
//! behind the operations the transport layer exposes.

use std::sync::Arc;

use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::errors::{DomainResult, EncodingError};
use crate::domain::models::{
    Feature, Geometry, InsertReport, ModelInfo, NewEmbeddingRecord, SearchConfig, SearchHit, SearchQuery,
    StoreStats, DEFAULT_SOURCE_TYPE,
};
use crate::domain::ports::{EmbeddingRepository, TextEncoder};
use crate::services::ContextGenerator;

/// Per-call options for inserting features.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertOptions {
    pub template: Option<String>,
    pub include_topology: bool,
    pub source_type: String,
}

impl Default for InsertOptions {
    fn default() -> Self {
        Self {
            template: None,
            include_topology: true,
            source_type: DEFAULT_SOURCE_TYPE.to_string(),
        }
    }
}

/// Per-call search options; unset values use the configured defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOptions {
    pub k: Option<usize>,
    pub source_type: Option<String>,
    pub threshold: Option<f32>,
}

/// Feature insertion and text search over an encoder and a repository.
pub struct GeoEmbeddingService {
    repository: Arc<dyn EmbeddingRepository>,
    encoder: Arc<dyn TextEncoder>,
    context: ContextGenerator,
    search_defaults: SearchConfig,
}

impl GeoEmbeddingService {
    pub fn new(
        repository: Arc<dyn EmbeddingRepository>,
        encoder: Arc<dyn TextEncoder>,
        context: ContextGenerator,
        search_defaults: SearchConfig,
    ) -> Self {
        Self {
            repository,
            encoder,
            context,
            search_defaults,
        }
    }

    /// Embed a feature and persist it.
    #[instrument(skip(self, feature, options), fields(source_type = %options.source_type))]
    pub async fn insert_feature(&self, feature: &Feature, options: &InsertOptions) -> DomainResult<Uuid> {
        let text = self.context.generate_context(
            feature,
            options.template.as_deref(),
            options.include_topology,
        );
        debug!(context = %text, "generated feature context");

        let embedding = self.encode(&text).await?;

        let record = NewEmbeddingRecord {
            name: feature.name(),
            source_type: options.source_type.clone(),
            properties: feature.properties.clone(),
            geometry: feature.geometry.as_ref().map(Geometry::to_geojson),
            embedding,
            embedding_model: self.encoder.model_identifier().to_string(),
        };

        self.repository.insert(record).await
    }

    /// Insert features in order, stopping at the first failure.
    pub async fn insert_features(
        &self,
        features: &[Feature],
        options: &InsertOptions,
    ) -> DomainResult<InsertReport> {
        let mut embedding_ids = Vec::with_capacity(features.len());
        for feature in features {
            embedding_ids.push(self.insert_feature(feature, options).await?);
        }

        Ok(InsertReport {
            feature_count: embedding_ids.len(),
            embedding_ids,
            model_info: self.model_info(),
        })
    }

    /// Features whose context is most similar to `query_text`.
    #[instrument(skip(self, options))]
    pub async fn search_by_text(
        &self,
        query_text: &str,
        options: &SearchOptions,
    ) -> DomainResult<Vec<SearchHit>> {
        let embedding = self.encode(query_text).await?;

        let mut query = SearchQuery::new(embedding, options.k.unwrap_or(self.search_defaults.default_k))
            .with_threshold(
                options
                    .threshold
                    .unwrap_or(self.search_defaults.similarity_threshold),
            );
        if let Some(source_type) = &options.source_type {
            query = query.with_source_type(source_type.clone());
        }

        self.repository.search(query).await
    }

    pub async fn get_stats(&self) -> DomainResult<StoreStats> {
        self.repository.stats().await
    }

    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            model: self.encoder.model_identifier().to_string(),
            embedding_dim: self.encoder.dimension(),
        }
    }

    /// Release the underlying store.
    pub async fn close(&self) -> DomainResult<()> {
        self.repository.close().await
    }

    async fn encode(&self, text: &str) -> DomainResult<Vec<f32>> {
        let embedding = self.encoder.encode(text).await?;
        if embedding.len() != self.encoder.dimension() {
            return Err(EncodingError::DimensionMismatch {
                expected: self.encoder.dimension(),
                actual: embedding.len(),
            }
            .into());
        }
        Ok(embedding)
    }
}
