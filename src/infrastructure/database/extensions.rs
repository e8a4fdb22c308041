//! SQLite extension host
//!
//! Probes engine capabilities on throwaway in-memory connections:
//! - install: open a connection, loading the extension library if the
//!   capability needs one
//! - activate: run a smoke query that only succeeds when the capability works
//!
//! Capabilities are properties of the linked library, so a probe connection
//! answers for every connection the pool opens later.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection, SqliteConnection};
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::errors::{CapabilityError, CapabilityPhase};
use crate::domain::models::Capability;
use crate::domain::ports::ExtensionHost;

pub struct SqliteExtensionHost {
    spatial_extension: String,
    probes: Mutex<HashMap<Capability, SqliteConnection>>,
}

impl SqliteExtensionHost {
    /// `spatial_extension` is the library passed to the SQLite loader,
    /// usually `mod_spatialite`.
    pub fn new(spatial_extension: impl Into<String>) -> Self {
        Self {
            spatial_extension: spatial_extension.into(),
            probes: Mutex::new(HashMap::new()),
        }
    }

    fn probe_options(&self, capability: Capability) -> Result<SqliteConnectOptions, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        Ok(match capability {
            Capability::StructuredData => options,
            Capability::SpatialIndex => options.extension(self.spatial_extension.clone()),
        })
    }

    async fn smoke_test(capability: Capability, conn: &mut SqliteConnection) -> Result<(), String> {
        match capability {
            Capability::StructuredData => {
                let valid: i64 = sqlx::query_scalar("SELECT json_valid('{\"probe\": true}')")
                    .fetch_one(&mut *conn)
                    .await
                    .map_err(|e| e.to_string())?;
                if valid == 1 {
                    Ok(())
                } else {
                    Err(format!("json_valid returned {valid}"))
                }
            }
            Capability::SpatialIndex => {
                let version: String = sqlx::query_scalar("SELECT spatialite_version()")
                    .fetch_one(&mut *conn)
                    .await
                    .map_err(|e| e.to_string())?;
                debug!(version, "spatialite responded");
                Ok(())
            }
        }
    }
}

#[async_trait]
impl ExtensionHost for SqliteExtensionHost {
    async fn install(&self, capability: Capability) -> Result<(), CapabilityError> {
        let fail = |reason: String| CapabilityError::new(capability, CapabilityPhase::Install, reason);

        let conn = self
            .probe_options(capability)
            .map_err(|e| fail(e.to_string()))?
            .connect()
            .await
            .map_err(|e| fail(e.to_string()))?;

        if let Some(previous) = self.probes.lock().await.insert(capability, conn) {
            let _ = previous.close().await;
        }
        Ok(())
    }

    async fn activate(&self, capability: Capability) -> Result<(), CapabilityError> {
        let mut probes = self.probes.lock().await;
        let conn = probes.get_mut(&capability).ok_or_else(|| {
            CapabilityError::new(capability, CapabilityPhase::Activate, "capability is not installed")
        })?;

        Self::smoke_test(capability, conn)
            .await
            .map_err(|reason| CapabilityError::new(capability, CapabilityPhase::Activate, reason))
    }

    async fn release(&self) {
        let probes: Vec<_> = self.probes.lock().await.drain().collect();
        for (capability, conn) in probes {
            if let Err(e) = conn.close().await {
                debug!(%capability, error = %e, "failed to close probe connection");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_structured_data_is_available() {
        let host = SqliteExtensionHost::new("mod_spatialite");
        host.install(Capability::StructuredData).await.unwrap();
        host.activate(Capability::StructuredData).await.unwrap();
        host.release().await;
        assert!(host.probes.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_extension_fails_install() {
        let host = SqliteExtensionHost::new("mod_does_not_exist");
        let err = host.install(Capability::SpatialIndex).await.unwrap_err();
        assert_eq!(err.capability, Capability::SpatialIndex);
        assert_eq!(err.phase, CapabilityPhase::Install);
    }

    #[tokio::test]
    async fn test_activate_without_install() {
        let host = SqliteExtensionHost::new("mod_spatialite");
        let err = host.activate(Capability::StructuredData).await.unwrap_err();
        assert_eq!(err.phase, CapabilityPhase::Activate);
    }
}
