//! Application services

pub mod capability_negotiator;
pub mod context_generator;
pub mod geo_embedding_service;
pub mod similarity;
pub mod template;

pub use capability_negotiator::CapabilityNegotiator;
pub use context_generator::ContextGenerator;
pub use geo_embedding_service::{GeoEmbeddingService, InsertOptions, SearchOptions};
pub use similarity::cosine_similarity;
