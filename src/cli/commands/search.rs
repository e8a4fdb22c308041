//! Implementation of the `geoembed search` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use super::with_service;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{Config, SearchHit};
use crate::services::SearchOptions;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Free-text query
    pub query: String,

    /// Maximum number of results (defaults to search.default_k)
    #[arg(short, long)]
    pub k: Option<usize>,

    /// Only return features of this source type
    #[arg(short, long)]
    pub source_type: Option<String>,

    /// Minimum similarity to include (defaults to search.similarity_threshold)
    #[arg(short, long)]
    pub threshold: Option<f32>,
}

impl From<&SearchArgs> for SearchOptions {
    fn from(args: &SearchArgs) -> Self {
        Self {
            k: args.k,
            source_type: args.source_type.clone(),
            threshold: args.threshold,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchOutput {
    pub query: String,
    pub count: usize,
    pub results: Vec<SearchHit>,
}

impl CommandOutput for SearchOutput {
    fn to_human(&self) -> String {
        if self.results.is_empty() {
            return format!("No features match \"{}\".", self.query);
        }
        let table = TableFormatter::new().format_hits(&self.results);
        let noun = if self.count == 1 { "result" } else { "results" };
        format!("{table}\n\n{} {noun} for \"{}\"", self.count, self.query)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: SearchArgs, config: &Config, json_mode: bool) -> Result<()> {
    let options = SearchOptions::from(&args);
    let query = args.query;

    let results = with_service(config, |service| {
        let query = query.as_str();
        let options = &options;
        async move {
            service
                .search_by_text(query, options)
                .await
                .context("Search failed")
        }
    })
    .await?;

    let result = SearchOutput {
        count: results.len(),
        query,
        results,
    };
    output(&result, json_mode);
    Ok(())
}
