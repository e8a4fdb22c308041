//! CLI command implementations.

pub mod init;
pub mod insert;
pub mod search;
pub mod stats;

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::domain::models::Config;
use crate::infrastructure::setup::build_service;
use crate::services::GeoEmbeddingService;

/// Open the store, run `command`, then close the store whether or not the
/// command succeeded.
async fn with_service<T, F, Fut>(config: &Config, command: F) -> Result<T>
where
    F: FnOnce(Arc<GeoEmbeddingService>) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let service = Arc::new(build_service(config).await?);
    let result = command(Arc::clone(&service)).await;
    let closed = service.close().await.context("Failed to close embedding store");
    let value = result?;
    closed?;
    Ok(value)
}
