//! Implementation of the `geoembed stats` command.

use anyhow::{Context, Result};
use serde::Serialize;

use super::with_service;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{Config, ModelInfo, StoreStats};

#[derive(Debug, Serialize)]
pub struct StatsOutput {
    #[serde(flatten)]
    pub stats: StoreStats,
    pub model_info: ModelInfo,
}

impl CommandOutput for StatsOutput {
    fn to_human(&self) -> String {
        TableFormatter::new().format_stats(&self.stats, &self.model_info)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(config: &Config, json_mode: bool) -> Result<()> {
    let result = with_service(config, |service| async move {
        let stats = service.get_stats().await.context("Failed to read store statistics")?;
        Ok(StatsOutput {
            stats,
            model_info: service.model_info(),
        })
    })
    .await?;

    output(&result, json_mode);
    Ok(())
}
