//! Command-line tool producing comparison reports as JSON
//!
//! Reads a measurement dataset and prints either the comparison of two
//! revisions or the warmup series of two trials.

use anyhow::{Context, Result};
use benchcmp::comparer_from_files;
use benchcmp::prelude::CompareRequest;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "compare_reporter")]
#[command(about = "Compare benchmark measurements of two revisions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (ignored when RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path (TOML); environment overrides apply otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct DatasetArgs {
    /// Measurement dataset (JSON)
    #[arg(short, long)]
    dataset: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare a baseline revision against a change revision
    Compare {
        #[command(flatten)]
        source: DatasetArgs,

        /// Project the revisions belong to
        #[arg(short, long)]
        project: i64,

        /// Baseline commit hash or unique prefix
        #[arg(short, long)]
        base: String,

        /// Change commit hash or unique prefix
        #[arg(long)]
        change: String,

        /// Report directory plot references are derived from
        #[arg(short, long)]
        report_id: Option<String>,
    },

    /// Extract per-iteration series of two trials
    Warmup {
        #[command(flatten)]
        source: DatasetArgs,

        #[arg(long)]
        trial1: i64,

        #[arg(long)]
        trial2: i64,

        /// Criteria to extract (comma-separated)
        #[arg(long, value_delimiter = ',', default_value = "total")]
        criteria: Vec<String>,
    },
}

impl Commands {
    fn dataset(&self) -> &PathBuf {
        match self {
            Commands::Compare { source, .. } | Commands::Warmup { source, .. } => &source.dataset,
        }
    }
}

fn default_filter(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    format!(
        "compare_reporter={},benchcmp={},benchcmp_engine={},benchcmp_common={}",
        level, level, level, level
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter(cli.verbose))),
        )
        .with_writer(std::io::stderr)
        .init();

    let dataset = cli.command.dataset();
    let comparer = comparer_from_files(dataset, cli.config.as_deref())
        .with_context(|| format!("failed to load {}", dataset.display()))?;

    let output = match cli.command {
        Commands::Compare {
            project,
            base,
            change,
            report_id,
            ..
        } => {
            let request = CompareRequest {
                project_id: project,
                base,
                change,
                report_id,
            };
            let view = comparer.compare(&request).await.with_context(|| {
                format!("comparison of {}..{} failed", request.base, request.change)
            })?;
            info!("Revision found: {}", view.revision_found());
            serde_json::to_string_pretty(&view)?
        }

        Commands::Warmup {
            trial1,
            trial2,
            criteria,
            ..
        } => {
            let data = comparer
                .warmup(trial1, trial2, &criteria)
                .await
                .with_context(|| {
                    format!("warmup extraction for trials {} and {} failed", trial1, trial2)
                })?;
            serde_json::to_string_pretty(&data)?
        }
    };

    println!("{}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_compare_takes_dataset_after_subcommand() {
        let cli = Cli::try_parse_from([
            "compare_reporter",
            "compare",
            "--dataset",
            "ds.json",
            "--project",
            "1",
            "--base",
            "a",
            "--change",
            "b",
        ])
        .unwrap();

        assert_eq!(cli.command.dataset(), &PathBuf::from("ds.json"));
        match cli.command {
            Commands::Compare {
                project,
                base,
                change,
                report_id,
                ..
            } => {
                assert_eq!(project, 1);
                assert_eq!(base, "a");
                assert_eq!(change, "b");
                assert!(report_id.is_none());
            }
            Commands::Warmup { .. } => panic!("expected compare"),
        }
    }

    #[test]
    fn test_warmup_splits_criteria() {
        let cli = Cli::try_parse_from([
            "compare_reporter",
            "--verbose",
            "warmup",
            "-d",
            "ds.json",
            "--trial1",
            "10",
            "--trial2",
            "11",
            "--criteria",
            "total,GC",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Warmup {
                trial1,
                trial2,
                criteria,
                ..
            } => {
                assert_eq!((trial1, trial2), (10, 11));
                assert_eq!(criteria, vec!["total", "GC"]);
            }
            Commands::Compare { .. } => panic!("expected warmup"),
        }
    }

    #[test]
    fn test_dataset_is_required() {
        let result = Cli::try_parse_from([
            "compare_reporter",
            "warmup",
            "--trial1",
            "10",
            "--trial2",
            "11",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_default_filter_follows_verbosity() {
        assert!(default_filter(true).contains("benchcmp_engine=debug"));
        assert!(default_filter(false).contains("compare_reporter=info"));
    }
}
