//! Ports: traits the services depend on and infrastructure implements

pub mod cell_indexer;
pub mod embedding;
pub mod embedding_repository;
pub mod extension_host;

pub use cell_indexer::SpatialCellIndexer;
pub use embedding::TextEncoder;
pub use embedding_repository::EmbeddingRepository;
pub use extension_host::ExtensionHost;
