//! Spatial discretization

pub mod h3_indexer;

pub use h3_indexer::H3CellIndexer;
