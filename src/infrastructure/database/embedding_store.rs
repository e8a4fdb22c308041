//! SQLite-backed geospatial embedding store
//!
//! Opening the store negotiates capabilities, opens the pool and creates the
//! schema matching what was negotiated. Similarity is computed inside SQLite
//! by the registered `cosine_similarity` function, so a search is a single
//! statement that filters, ranks and limits in the engine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use super::connection::create_pool;
use super::extensions::SqliteExtensionHost;
use super::schema::create_schema;
use super::utils::{embedding_to_bytes, parse_datetime};
use crate::domain::errors::{
    DomainError, DomainResult, GeometryParseError, StorageInitializationError,
    StorageOperationError,
};
use crate::domain::models::{
    CapabilityState, DatabaseConfig, Geometry, NewEmbeddingRecord, SearchHit, SearchQuery,
    StoreStats,
};
use crate::domain::ports::{EmbeddingRepository, ExtensionHost};
use crate::services::CapabilityNegotiator;

const GEOJSON_TYPES: [&str; 7] = [
    "Point",
    "MultiPoint",
    "LineString",
    "MultiLineString",
    "Polygon",
    "MultiPolygon",
    "GeometryCollection",
];

/// Embedding repository over a SQLite pool, in spatial or fallback layout.
pub struct SqliteEmbeddingStore {
    pool: SqlitePool,
    capabilities: CapabilityState,
    closed: AtomicBool,
}

impl SqliteEmbeddingStore {
    /// Open the store described by `config`, probing the real SQLite library.
    pub async fn initialize(config: &DatabaseConfig) -> Result<Self, StorageInitializationError> {
        let host = SqliteExtensionHost::new(config.spatial.extension.clone());
        Self::initialize_with_host(config, &host).await
    }

    /// Open the store, negotiating capabilities through `host`.
    pub async fn initialize_with_host(
        config: &DatabaseConfig,
        host: &dyn ExtensionHost,
    ) -> Result<Self, StorageInitializationError> {
        let negotiator = CapabilityNegotiator::new(
            host,
            Duration::from_millis(config.capability_retry_delay_ms),
        );
        let capabilities = negotiator.probe_and_configure(config.spatial.enabled).await?;

        let spatial_extension = capabilities
            .spatial_enabled
            .then_some(config.spatial.extension.as_str());
        let pool = create_pool(config, spatial_extension).await?;

        if let Err(e) = create_schema(&pool, capabilities.schema_kind()).await {
            pool.close().await;
            return Err(e);
        }

        info!(
            path = %config.path,
            spatial_enabled = capabilities.spatial_enabled,
            "embedding store initialized"
        );

        Ok(Self {
            pool,
            capabilities,
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self, operation: &'static str) -> DomainResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(query_failed(operation)(sqlx::Error::PoolClosed));
        }
        Ok(())
    }

    /// Reject an embedding whose length differs from stored rows of the same model.
    async fn check_dimension(&self, record: &NewEmbeddingRecord) -> DomainResult<()> {
        let stored_bytes: Option<i64> = sqlx::query_scalar(
            "SELECT length(embedding) FROM geospatial_embeddings \
             WHERE embedding_model = ? AND length(embedding) > 0 LIMIT 1",
        )
        .bind(&record.embedding_model)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed("insert"))?;

        match stored_bytes {
            Some(bytes) if bytes != (record.embedding.len() * 4) as i64 => {
                Err(StorageOperationError::constraint(
                    "insert",
                    format!(
                        "embedding for model '{}' has {} dimensions, stored embeddings have {}",
                        record.embedding_model,
                        record.embedding.len(),
                        bytes / 4
                    ),
                )
                .into())
            }
            _ => Ok(()),
        }
    }

    async fn insert_spatial(
        &self,
        id: Uuid,
        record: &NewEmbeddingRecord,
        properties: &str,
        embedding: &[u8],
    ) -> DomainResult<()> {
        if let Some(geometry) = &record.geometry {
            validate_geojson(geometry)?;
        }

        let mut tx = self.pool.begin().await.map_err(query_failed("insert"))?;

        let row = sqlx::query(
            r"
            INSERT INTO geospatial_embeddings
                (id, name, source_type, properties, geometry, embedding, embedding_model)
            VALUES (?, ?, ?, ?, CastToXY(SetSRID(GeomFromGeoJSON(?), 4326)), ?, ?)
            RETURNING geometry IS NULL AS geometry_missing
            ",
        )
        .bind(id.to_string())
        .bind(&record.name)
        .bind(&record.source_type)
        .bind(properties)
        .bind(record.geometry.as_deref())
        .bind(embedding)
        .bind(&record.embedding_model)
        .fetch_one(&mut *tx)
        .await
        .map_err(query_failed("insert"))?;

        let geometry_missing: bool = row.get("geometry_missing");
        if record.geometry.is_some() && geometry_missing {
            tx.rollback().await.map_err(query_failed("insert"))?;
            return Err(GeometryParseError::new("geometry rejected by the spatial engine").into());
        }

        tx.commit().await.map_err(query_failed("insert"))?;
        Ok(())
    }

    async fn insert_fallback(
        &self,
        id: Uuid,
        record: &NewEmbeddingRecord,
        properties: &str,
        embedding: &[u8],
    ) -> DomainResult<()> {
        sqlx::query(
            r"
            INSERT INTO geospatial_embeddings
                (id, name, source_type, properties, geometry, embedding, embedding_model)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            ",
        )
        .bind(id.to_string())
        .bind(&record.name)
        .bind(&record.source_type)
        .bind(properties)
        .bind(record.geometry.as_deref())
        .bind(embedding)
        .bind(&record.embedding_model)
        .fetch_one(&self.pool)
        .await
        .map_err(query_failed("insert"))?;
        Ok(())
    }

    fn search_sql(&self) -> String {
        let geometry = if self.capabilities.spatial_enabled {
            "AsGeoJSON(e.geometry)"
        } else {
            "e.geometry"
        };
        format!(
            r"
            SELECT id, name, source_type, properties, geometry, embedding_model, created_at, similarity
            FROM (
                SELECT
                    e.rowid AS seq,
                    e.id,
                    e.name,
                    e.source_type,
                    e.properties,
                    {geometry} AS geometry,
                    e.embedding_model,
                    e.created_at,
                    cosine_similarity(e.embedding, ?) AS similarity
                FROM geospatial_embeddings e
                WHERE (? IS NULL OR e.source_type = ?)
            )
            WHERE similarity IS NOT NULL AND similarity >= ?
            ORDER BY similarity DESC, seq ASC
            LIMIT ?
            "
        )
    }
}

#[async_trait]
impl EmbeddingRepository for SqliteEmbeddingStore {
    #[instrument(skip(self, record), fields(name = %record.name, model = %record.embedding_model))]
    async fn insert(&self, record: NewEmbeddingRecord) -> DomainResult<Uuid> {
        self.ensure_open("insert")?;

        for (field, value) in [
            ("name", &record.name),
            ("source_type", &record.source_type),
            ("embedding_model", &record.embedding_model),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::ValidationFailed(format!("{field} cannot be empty")));
            }
        }

        if !record.embedding.is_empty() {
            self.check_dimension(&record).await?;
        }

        let properties = serde_json::to_string(&record.properties)
            .map_err(|e| StorageOperationError::decode("insert", e))?;
        let embedding = embedding_to_bytes(&record.embedding);
        let id = Uuid::new_v4();

        if self.capabilities.spatial_enabled {
            self.insert_spatial(id, &record, &properties, &embedding).await?;
        } else {
            self.insert_fallback(id, &record, &properties, &embedding).await?;
        }

        debug!(%id, "embedding stored");
        Ok(id)
    }

    #[instrument(skip(self, query), fields(k = query.k, source_type = ?query.source_type))]
    async fn search(&self, query: SearchQuery) -> DomainResult<Vec<SearchHit>> {
        self.ensure_open("search")?;
        if query.k == 0 {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(&self.search_sql())
            .bind(embedding_to_bytes(&query.embedding))
            .bind(query.source_type.as_deref())
            .bind(query.source_type.as_deref())
            .bind(f64::from(query.threshold))
            .bind(i64::try_from(query.k).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("search"))?;

        let hits = rows.iter().map(decode_hit).collect::<DomainResult<Vec<_>>>()?;
        debug!(hits = hits.len(), "search completed");
        Ok(hits)
    }

    async fn stats(&self) -> DomainResult<StoreStats> {
        self.ensure_open("stats")?;

        let row = sqlx::query(
            "SELECT COUNT(*) AS total, \
                    COUNT(DISTINCT source_type) AS source_types, \
                    COUNT(DISTINCT embedding_model) AS models \
             FROM geospatial_embeddings",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(query_failed("stats"))?;

        let count = |column: &str| u64::try_from(row.get::<i64, _>(column)).unwrap_or_default();
        Ok(StoreStats {
            total_embeddings: count("total"),
            source_types: count("source_types"),
            models: count("models"),
            spatial_enabled: self.capabilities.spatial_enabled,
        })
    }

    fn capabilities(&self) -> CapabilityState {
        self.capabilities
    }

    async fn close(&self) -> DomainResult<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.pool.close().await;
            info!("embedding store closed");
        }
        Ok(())
    }
}

/// Log a failed statement and wrap it for the caller.
fn query_failed(operation: &'static str) -> impl FnOnce(sqlx::Error) -> DomainError {
    move |source| {
        error!(operation, error = %source, "storage operation failed");
        StorageOperationError::query(operation, source).into()
    }
}

fn decode_hit(row: &SqliteRow) -> DomainResult<SearchHit> {
    let decode = |reason: String| -> DomainError {
        error!(operation = "search", %reason, "undecodable row");
        StorageOperationError::decode("search", reason).into()
    };

    let id: String = row.get("id");
    let properties: String = row.get("properties");
    let created_at: String = row.get("created_at");
    let similarity: f64 = row.get("similarity");

    Ok(SearchHit {
        id: Uuid::parse_str(&id).map_err(|e| decode(format!("id '{id}': {e}")))?,
        name: row.get("name"),
        source_type: row.get("source_type"),
        properties: serde_json::from_str::<Map<String, Value>>(&properties)
            .map_err(|e| decode(format!("properties: {e}")))?,
        geometry: row.get("geometry"),
        similarity: similarity as f32,
        embedding_model: row.get("embedding_model"),
        created_at: parse_datetime(&created_at)
            .map_err(|e| decode(format!("created_at '{created_at}': {e}")))?,
    })
}

/// Parse `text` as a GeoJSON geometry object.
fn validate_geojson(text: &str) -> Result<(), GeometryParseError> {
    let geometry: Geometry =
        serde_json::from_str(text).map_err(|e| GeometryParseError::new(e.to_string()))?;

    if !GEOJSON_TYPES.contains(&geometry.kind.as_str()) {
        return Err(GeometryParseError::new(format!(
            "unknown geometry type '{}'",
            geometry.kind
        )));
    }
    let has_members = if geometry.kind == "GeometryCollection" {
        geometry.extra.get("geometries").is_some_and(Value::is_array)
    } else {
        geometry.coordinates.is_array()
    };
    if !has_members {
        return Err(GeometryParseError::new(format!(
            "{} is missing its coordinates",
            geometry.kind
        )));
    }
    Ok(())
}
