//! geoembed - semantic search over geospatial features
//!
//! Features (a geometry plus a property bag) are turned into descriptive
//! context text, encoded as fixed-dimension vectors and stored in SQLite.
//! Similarity search runs inside SQL through a registered
//! `cosine_similarity(blob, blob)` function. SpatiaLite is used for native
//! geometry storage when it loads; otherwise geometry falls back to GeoJSON
//! text.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors and ports
//! - **Service Layer** (`services`): context generation, capability
//!   negotiation and the `GeoEmbeddingService` facade
//! - **Infrastructure Layer** (`infrastructure`): SQLite store, encoders, H3
//!   cells, configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use geoembed::infrastructure::setup::build_service;
//! use geoembed::{Config, Feature, Geometry, InsertOptions, SearchOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let service = build_service(&Config::default()).await?;
//!     let mut properties = serde_json::Map::new();
//!     properties.insert("name".into(), "Test City".into());
//!     let feature = Feature::new(Some(Geometry::point(-74.006, 40.7128)), properties);
//!
//!     service.insert_feature(&feature, &InsertOptions::default()).await?;
//!     let hits = service.search_by_text("a city", &SearchOptions::default()).await?;
//!     println!("{}", hits[0].name);
//!     service.close().await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Config, Feature, Geometry, InsertReport, ModelInfo, SearchHit, SearchQuery, StoreStats,
};
pub use infrastructure::database::SqliteEmbeddingStore;
pub use infrastructure::vector::HashingEncoder;
pub use services::{GeoEmbeddingService, InsertOptions, SearchOptions};
