//! Embedding table schema
//!
//! Two layouts share one table name:
//! - spatial: `geometry` is a SpatiaLite GEOMETRY column (SRID 4326) with an
//!   R*Tree spatial index
//! - fallback: `geometry` is plain GeoJSON text
//!
//! The layout a database was created with is recorded in `store_metadata`
//! and must match the negotiated capabilities on every later open.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::domain::errors::StorageInitializationError;
use crate::domain::models::SchemaKind;

pub const EMBEDDINGS_TABLE: &str = "geospatial_embeddings";
pub const SCHEMA_KIND_KEY: &str = "schema_kind";
pub const SRID_WGS84: i32 = 4326;

const CREATE_METADATA: &str = r"
CREATE TABLE IF NOT EXISTS store_metadata (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
)";

const CREATE_FALLBACK_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS geospatial_embeddings (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    source_type TEXT NOT NULL,
    properties TEXT NOT NULL DEFAULT '{}' CHECK (json_valid(properties)),
    geometry TEXT,
    embedding BLOB NOT NULL,
    embedding_model TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
)";

// geometry is added through AddGeometryColumn
const CREATE_SPATIAL_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS geospatial_embeddings (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    source_type TEXT NOT NULL,
    properties TEXT NOT NULL DEFAULT '{}' CHECK (json_valid(properties)),
    embedding BLOB NOT NULL,
    embedding_model TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
)";

const CREATE_INDEXES: [&str; 2] = [
    "CREATE INDEX IF NOT EXISTS idx_geospatial_embeddings_source_type \
     ON geospatial_embeddings(source_type)",
    "CREATE INDEX IF NOT EXISTS idx_geospatial_embeddings_model \
     ON geospatial_embeddings(embedding_model)",
];

/// Create (or verify) the schema for `kind`. Idempotent.
pub async fn create_schema(pool: &SqlitePool, kind: SchemaKind) -> Result<(), StorageInitializationError> {
    execute(pool, "create store_metadata", CREATE_METADATA).await?;
    verify_schema_kind(pool, kind).await?;

    match kind {
        SchemaKind::Fallback => {
            execute(pool, "create embeddings table", CREATE_FALLBACK_TABLE).await?;
        }
        SchemaKind::Spatial => {
            execute(pool, "create embeddings table", CREATE_SPATIAL_TABLE).await?;
            create_spatial_column(pool).await?;
        }
    }

    for statement in CREATE_INDEXES {
        execute(pool, "create indexes", statement).await?;
    }

    sqlx::query("INSERT OR IGNORE INTO store_metadata (key, value) VALUES (?, ?)")
        .bind(SCHEMA_KIND_KEY)
        .bind(kind.as_str())
        .execute(pool)
        .await
        .map_err(schema_error("record schema kind"))?;

    info!(schema = %kind, "embedding schema ready");
    Ok(())
}

/// Schema kind recorded by an earlier open, if any.
pub async fn recorded_schema_kind(pool: &SqlitePool) -> Result<Option<String>, StorageInitializationError> {
    sqlx::query_scalar("SELECT value FROM store_metadata WHERE key = ?")
        .bind(SCHEMA_KIND_KEY)
        .fetch_optional(pool)
        .await
        .map_err(schema_error("read schema kind"))
}

async fn verify_schema_kind(pool: &SqlitePool, kind: SchemaKind) -> Result<(), StorageInitializationError> {
    match recorded_schema_kind(pool).await? {
        Some(existing) if existing != kind.as_str() => Err(StorageInitializationError::SchemaMismatch {
            existing,
            negotiated: kind.to_string(),
        }),
        Some(_) => {
            debug!(schema = %kind, "reopening existing store");
            Ok(())
        }
        None => Ok(()),
    }
}

async fn create_spatial_column(pool: &SqlitePool) -> Result<(), StorageInitializationError> {
    let has_metadata: i64 = sqlx::query_scalar("SELECT CheckSpatialMetaData()")
        .fetch_one(pool)
        .await
        .map_err(schema_error("check spatial metadata"))?;
    if has_metadata == 0 {
        expect_success(pool, "init spatial metadata", "SELECT InitSpatialMetaData(1)").await?;
    }

    let registered: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM geometry_columns \
         WHERE f_table_name = ? AND f_geometry_column = 'geometry'",
    )
    .bind(EMBEDDINGS_TABLE)
    .fetch_one(pool)
    .await
    .map_err(schema_error("inspect geometry columns"))?;

    if registered == 0 {
        let add_column = format!(
            "SELECT AddGeometryColumn('{EMBEDDINGS_TABLE}', 'geometry', {SRID_WGS84}, 'GEOMETRY', 'XY')"
        );
        expect_success(pool, "add geometry column", &add_column).await?;

        let spatial_index = format!("SELECT CreateSpatialIndex('{EMBEDDINGS_TABLE}', 'geometry')");
        expect_success(pool, "create spatial index", &spatial_index).await?;
    }
    Ok(())
}

/// Run a SpatiaLite management function that reports success as 1.
async fn expect_success(
    pool: &SqlitePool,
    step: &'static str,
    sql: &str,
) -> Result<(), StorageInitializationError> {
    let status: i64 = sqlx::query_scalar(sql)
        .fetch_one(pool)
        .await
        .map_err(schema_error(step))?;
    if status == 1 {
        Ok(())
    } else {
        Err(StorageInitializationError::Schema {
            step,
            source: sqlx::Error::Protocol(format!("`{sql}` returned {status}")),
        })
    }
}

async fn execute(pool: &SqlitePool, step: &'static str, sql: &str) -> Result<(), StorageInitializationError> {
    sqlx::query(sql)
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(schema_error(step))
}

fn schema_error(step: &'static str) -> impl FnOnce(sqlx::Error) -> StorageInitializationError {
    move |source| StorageInitializationError::Schema { step, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::DatabaseConfig;
    use crate::infrastructure::database::connection::create_pool;

    #[tokio::test]
    async fn test_fallback_schema_is_idempotent() {
        let pool = create_pool(&DatabaseConfig::in_memory(), None).await.unwrap();
        create_schema(&pool, SchemaKind::Fallback).await.unwrap();
        create_schema(&pool, SchemaKind::Fallback).await.unwrap();

        assert_eq!(
            recorded_schema_kind(&pool).await.unwrap().as_deref(),
            Some("fallback")
        );

        let geometry_type: String = sqlx::query_scalar(
            "SELECT type FROM pragma_table_info('geospatial_embeddings') WHERE name = 'geometry'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(geometry_type, "TEXT");
    }

    #[tokio::test]
    async fn test_properties_must_be_json() {
        let pool = create_pool(&DatabaseConfig::in_memory(), None).await.unwrap();
        create_schema(&pool, SchemaKind::Fallback).await.unwrap();

        let result = sqlx::query(
            "INSERT INTO geospatial_embeddings (id, name, source_type, properties, embedding, embedding_model) \
             VALUES ('a', 'n', 'vector', 'not json', x'', 'm')",
        )
        .execute(&pool)
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_schema_kind_mismatch_is_rejected() {
        let pool = create_pool(&DatabaseConfig::in_memory(), None).await.unwrap();
        create_schema(&pool, SchemaKind::Fallback).await.unwrap();

        let err = create_schema(&pool, SchemaKind::Spatial).await.unwrap_err();
        assert!(matches!(
            err,
            StorageInitializationError::SchemaMismatch { ref existing, .. } if existing == "fallback"
        ));
    }
}
