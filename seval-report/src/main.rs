//! seval-report - Aggregate exported human-evaluation results
//!
//! Loads evaluator response tables (discovered under the results tree or
//! given explicitly), deduplicates the append-only history, and emits the
//! aggregate report as pretty-printed JSON to stdout or a file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use seval_common::config::{RootFolderResolver, TomlConfig};
use seval_common::layout::EvalLayout;
use seval_report::{discover_tables, load_tables, Aggregator};

#[derive(Parser, Debug)]
#[command(name = "seval-report", about = "Aggregate exported rating tables")]
struct Args {
    /// Evaluation root folder (falls back to SEVAL_ROOT_FOLDER, config file, OS default)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Explicit response tables; skips discovery when given
    #[arg(long = "table")]
    tables: Vec<PathBuf>,

    /// Minimum complete pairs before the paired test is reported for a metric
    #[arg(long)]
    min_pairs: Option<usize>,

    /// Write the JSON report here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting seval-report v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = TomlConfig::load();

    let tables = if args.tables.is_empty() {
        let root = RootFolderResolver::new(args.root.clone()).resolve(&config);
        discover_tables(&EvalLayout::new(root))?
    } else {
        args.tables.clone()
    };
    info!("Aggregating {} table(s)", tables.len());

    let loaded = load_tables(&tables)?;
    if loaded.malformed_row_count > 0 {
        info!("Excluded {} malformed row(s)", loaded.malformed_row_count);
    }

    let min_pairs = args.min_pairs.unwrap_or(config.min_paired_samples);
    let report = Aggregator::new(min_pairs).aggregate(&loaded);
    info!(
        "{} row(s) loaded, {} after deduplication",
        report.total_rows, report.deduplicated_rows
    );

    let json = serde_json::to_string_pretty(&report)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json.as_bytes())
                .with_context(|| format!("writing report to {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
