//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::commands::init::InitArgs;
use crate::cli::commands::insert::InsertArgs;
use crate::cli::commands::search::SearchArgs;

#[derive(Parser, Debug)]
#[command(name = "geoembed")]
#[command(about = "geoembed - semantic search over geospatial features", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .geoembed/config.yaml and GEOEMBED_* variables)
    #[arg(short, long, global = true, env = "GEOEMBED_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default .geoembed/config.yaml
    Init(InitArgs),

    /// Embed GeoJSON features and store them
    Insert(InsertArgs),

    /// Find stored features similar to a text query
    Search(SearchArgs),

    /// Show store statistics
    Stats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_search_arguments() {
        let cli = Cli::try_parse_from([
            "geoembed", "--json", "search", "coastal lighthouse", "-k", "3", "--threshold", "0.5",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Search(args) => {
                assert_eq!(args.query, "coastal lighthouse");
                assert_eq!(args.k, Some(3));
                assert_eq!(args.threshold, Some(0.5));
                assert_eq!(args.source_type, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_insert_defaults_to_stdin() {
        let cli = Cli::try_parse_from(["geoembed", "insert", "--no-topology"]).unwrap();
        match cli.command {
            Commands::Insert(args) => {
                assert_eq!(args.input, PathBuf::from("-"));
                assert!(args.no_topology);
                assert_eq!(args.source_type, "vector");
                assert_eq!(args.template, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
