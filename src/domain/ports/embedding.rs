//! Text encoder port.
//!
//! Converts context text into a dense vector for similarity search.

use async_trait::async_trait;

use crate::domain::errors::EncodingError;

/// Encodes text into a fixed-dimension vector.
///
/// Implementations must be deterministic for a given model and safe to call
/// from many tasks at once.
#[async_trait]
pub trait TextEncoder: Send + Sync {
    /// Encode a single text.
    async fn encode(&self, text: &str) -> Result<Vec<f32>, EncodingError>;

    /// Length of every vector this encoder produces.
    fn dimension(&self) -> usize;

    /// Identifier stored alongside each embedding.
    fn model_identifier(&self) -> &str;
}
