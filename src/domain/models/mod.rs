//! Domain models

pub mod capability;
pub mod config;
pub mod feature;
pub mod record;

pub use capability::{Capability, CapabilityState, Requirement, SchemaKind};
pub use config::{
    Config, ContextConfig, DatabaseConfig, EmbeddingConfig, EncoderProvider, LoggingConfig,
    SearchConfig, SpatialConfig,
};
pub use feature::{Feature, Geometry, PropertyValue, NAME_PROPERTY, UNKNOWN_NAME};
pub use record::{
    InsertReport, ModelInfo, NewEmbeddingRecord, SearchHit, SearchQuery, StoreStats,
    DEFAULT_SOURCE_TYPE,
};
