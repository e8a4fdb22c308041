//! Implementation of the `geoembed insert` command.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::io::AsyncReadExt;

use super::with_service;
use crate::cli::output::progress::create_spinner;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, Feature, InsertReport, DEFAULT_SOURCE_TYPE};
use crate::services::InsertOptions;

#[derive(Args, Debug)]
pub struct InsertArgs {
    /// GeoJSON file: a Feature, FeatureCollection or array of features ("-" reads stdin)
    #[arg(default_value = "-")]
    pub input: PathBuf,

    /// Context template, e.g. "{name} is a {kind}"
    #[arg(short, long)]
    pub template: Option<String>,

    /// Leave coordinates and H3 cell out of the context text
    #[arg(long)]
    pub no_topology: bool,

    /// Source type recorded with every inserted feature
    #[arg(short, long, default_value = DEFAULT_SOURCE_TYPE)]
    pub source_type: String,
}

#[derive(Debug, Serialize)]
pub struct InsertOutput {
    pub success: bool,
    #[serde(flatten)]
    pub report: InsertReport,
}

impl CommandOutput for InsertOutput {
    fn to_human(&self) -> String {
        let noun = if self.report.feature_count == 1 { "feature" } else { "features" };
        let mut lines = vec![format!(
            "Inserted {} {noun} using {} ({} dimensions)",
            self.report.feature_count, self.report.model_info.model, self.report.model_info.embedding_dim
        )];
        for id in &self.report.embedding_ids {
            lines.push(format!("  - {id}"));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: InsertArgs, config: &Config, json_mode: bool) -> Result<()> {
    let raw = read_input(&args.input).await?;
    let features = parse_features(&raw)?;
    if features.is_empty() {
        bail!("No features found in {}", args.input.display());
    }

    let options = InsertOptions {
        template: args.template,
        include_topology: config.context.include_topology && !args.no_topology,
        source_type: args.source_type,
    };

    let spinner = create_spinner(format!("Embedding {} feature(s)", features.len()), json_mode);
    let outcome = with_service(config, |service| {
        let features = features.as_slice();
        let options = &options;
        async move {
            service
                .insert_features(features, options)
                .await
                .context("Failed to insert features")
        }
    })
    .await;
    spinner.finish_and_clear();

    let result = InsertOutput {
        success: true,
        report: outcome?,
    };
    output(&result, json_mode);
    Ok(())
}

async fn read_input(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut raw = String::new();
        tokio::io::stdin()
            .read_to_string(&mut raw)
            .await
            .context("Failed to read GeoJSON from stdin")?;
        Ok(raw)
    } else {
        tokio::fs::read_to_string(input)
            .await
            .with_context(|| format!("Failed to read {}", input.display()))
    }
}

/// Features from a GeoJSON Feature, FeatureCollection, bare geometry or a
/// JSON array of any of those.
pub fn parse_features(raw: &str) -> Result<Vec<Feature>> {
    let value: Value = serde_json::from_str(raw).context("Input is not valid JSON")?;
    let mut features = Vec::new();
    collect_features(value, &mut features)?;
    Ok(features)
}

fn collect_features(value: Value, features: &mut Vec<Feature>) -> Result<()> {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_features(item, features)?;
            }
            Ok(())
        }
        Value::Object(object) => collect_object(object, features),
        other => bail!("Expected a GeoJSON object or array, found {other}"),
    }
}

fn collect_object(mut object: Map<String, Value>, features: &mut Vec<Feature>) -> Result<()> {
    let kind = object.get("type").and_then(Value::as_str).map(str::to_owned);
    match kind.as_deref() {
        Some("FeatureCollection") => match object.remove("features") {
            Some(Value::Array(items)) => {
                for item in items {
                    collect_features(item, features)?;
                }
                Ok(())
            }
            _ => bail!("FeatureCollection has no \"features\" array"),
        },
        Some("Feature") | None => {
            // GeoJSON permits `"properties": null`
            if object.get("properties").is_some_and(Value::is_null) {
                object.remove("properties");
            }
            let feature: Feature = serde_json::from_value(Value::Object(object))
                .context("Invalid GeoJSON feature")?;
            features.push(feature);
            Ok(())
        }
        Some(_) => {
            let geometry = serde_json::from_value(Value::Object(object))
                .context("Invalid GeoJSON geometry")?;
            features.push(Feature::new(Some(geometry), Map::new()));
            Ok(())
        }
    }
}
