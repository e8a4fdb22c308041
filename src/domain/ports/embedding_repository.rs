//! Embedding repository port.
//!
//! Persistence and similarity search over geospatial embedding records.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{CapabilityState, NewEmbeddingRecord, SearchHit, SearchQuery, StoreStats};

#[async_trait]
pub trait EmbeddingRepository: Send + Sync {
    /// Persist one record and return its new identifier.
    async fn insert(&self, record: NewEmbeddingRecord) -> DomainResult<Uuid>;

    /// Records ranked by cosine similarity to the query embedding.
    ///
    /// Ordered by similarity descending, ties broken by insertion order.
    async fn search(&self, query: SearchQuery) -> DomainResult<Vec<SearchHit>>;

    async fn stats(&self) -> DomainResult<StoreStats>;

    /// Capabilities negotiated when the store was opened.
    fn capabilities(&self) -> CapabilityState;

    /// Release the connection pool. Safe to call more than once.
    async fn close(&self) -> DomainResult<()>;
}
