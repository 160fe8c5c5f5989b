//! Command-line arguments for the `nerdmath` tool.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Load NerdMath data into MongoDB and Neo4j and report on it.
#[derive(Parser, Debug)]
#[command(name = "nerdmath")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Environment file to load before reading configuration
    #[arg(long = "env-file", global = true)]
    pub env_file: Option<PathBuf>,

    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Create the schema collections with validators and indexes
    SetupCollections,

    /// Load unit-test and diagnostic problems into `problem`
    LoadProblems {
        /// Unit-test export (defaults to DATA_DIR/단원테스트_full버전.txt)
        #[arg(long)]
        unit_tests: Option<PathBuf>,
        /// Diagnostic export (defaults to DATA_DIR/진단테스트.txt)
        #[arg(long)]
        diagnostics: Option<PathBuf>,
    },

    /// Replace `unit` with the NDJSON unit export
    LoadUnits {
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Replace `concept` with the NDJSON concept export and report on it
    LoadConcepts {
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Load the three dataset files from DATA_DIR
    LoadDatasets {
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Wipe Neo4j and import the concept CSV exports
    RebuildGraph {
        /// Directory holding neo4j_nodes.csv and neo4j_edges.csv
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Required: the rebuild deletes every node
        #[arg(long)]
        yes: bool,
    },

    /// Check MongoDB, Neo4j and OpenAI configuration
    CheckConnections,

    /// Concept counts, degrees and isolated concepts
    GraphReport {
        #[arg(long, default_value_t = 10)]
        top: usize,
        /// Read the CSV exports instead of Neo4j
        #[arg(long)]
        csv: bool,
    },

    /// Prerequisites of one concept
    Prerequisites {
        concept: String,
        #[arg(long)]
        depth: Option<u32>,
        #[arg(long)]
        csv: bool,
    },

    /// Units grouped by grade and chapter, with the concept cross-check
    UnitSummary,

    /// Document counts for every collection
    Stats,

    /// Write recent diagnostic results and learning paths to a JSON file
    Export {
        #[arg(long, default_value = "diagnostic_export.json")]
        out: PathBuf,
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },

    /// Delete diagnostic results and learning paths left by test runs
    Cleanup {
        #[arg(long = "test-id")]
        test_ids: Vec<String>,
        #[arg(long = "path-id")]
        path_ids: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["nerdmath", "stats", "--env-file", ".env.test", "--json"]);
        assert_eq!(cli.command, Command::Stats);
        assert_eq!(cli.env_file, Some(PathBuf::from(".env.test")));
        assert!(cli.json);
    }

    #[test]
    fn test_prerequisites_args() {
        let cli = Cli::parse_from(["nerdmath", "prerequisites", "1.3 정수와 유리수", "--depth", "3"]);
        assert_eq!(
            cli.command,
            Command::Prerequisites {
                concept: "1.3 정수와 유리수".to_string(),
                depth: Some(3),
                csv: false,
            }
        );
    }

    #[test]
    fn test_cleanup_collects_ids() {
        let cli = Cli::parse_from([
            "nerdmath", "cleanup", "--test-id", "t1", "--test-id", "t2", "--path-id", "p1",
        ]);
        match cli.command {
            Command::Cleanup { test_ids, path_ids } => {
                assert_eq!(test_ids, vec!["t1", "t2"]);
                assert_eq!(path_ids, vec!["p1"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_export_defaults() {
        let cli = Cli::parse_from(["nerdmath", "export"]);
        assert_eq!(
            cli.command,
            Command::Export {
                out: PathBuf::from("diagnostic_export.json"),
                limit: 10,
            }
        );
    }
}
