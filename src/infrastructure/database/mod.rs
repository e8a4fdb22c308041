//! SQLite storage: connection pool, capability probing, SQL functions,
//! schema management and the embedding store.

pub mod connection;
pub mod embedding_store;
pub mod extensions;
pub mod functions;
pub mod schema;
pub mod utils;

pub use embedding_store::SqliteEmbeddingStore;
pub use extensions::SqliteExtensionHost;
