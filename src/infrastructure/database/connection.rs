use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};

use super::functions::register_similarity_function;
use crate::domain::errors::StorageInitializationError;
use crate::domain::models::DatabaseConfig;

/// Connection options for the configured database.
///
/// # Configuration
/// - Journal mode: WAL (file databases)
/// - Synchronous: NORMAL
/// - Busy timeout: 5 seconds
/// - The spatial extension is loaded on every connection when given
pub fn connect_options(
    config: &DatabaseConfig,
    spatial_extension: Option<&str>,
) -> Result<SqliteConnectOptions, StorageInitializationError> {
    let options = if config.is_in_memory() {
        SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(StorageInitializationError::Connection)?
    } else {
        let path = Path::new(&config.path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageInitializationError::Configuration(format!(
                    "cannot create database directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
        SqliteConnectOptions::new()
            .filename(path)
            .journal_mode(SqliteJournalMode::Wal)
            .create_if_missing(true)
    };

    let options = options
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(5));

    Ok(match spatial_extension {
        Some(extension) => options.extension(extension.to_string()),
        None => options,
    })
}

/// Open the store's connection pool.
///
/// Every new connection gets the `cosine_similarity` SQL function. An
/// in-memory database is confined to one connection that never expires,
/// since each connection would otherwise see its own empty database.
pub async fn create_pool(
    config: &DatabaseConfig,
    spatial_extension: Option<&str>,
) -> Result<SqlitePool, StorageInitializationError> {
    let options = connect_options(config, spatial_extension)?;

    let pool_options = SqlitePoolOptions::new().after_connect(|conn, _meta| {
        Box::pin(async move { register_similarity_function(conn).await })
    });

    let pool_options = if config.is_in_memory() {
        pool_options
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        pool_options
            .max_connections(config.max_connections)
            .idle_timeout(Duration::from_secs(30))
            .max_lifetime(Duration::from_secs(1800))
    };

    pool_options
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
        .map_err(StorageInitializationError::Connection)
}
