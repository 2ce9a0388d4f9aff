//! Loading evaluator response tables
//!
//! Row-tolerant by contract: a row that cannot be parsed or that fails
//! validation is excluded and counted, never aborting the table. This also
//! covers reading a table between two appends — a trailing partial line
//! parses as one malformed row at worst, and the well-formed prefix is kept.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use seval_common::error::{Error, Result};
use seval_common::layout::{EvalLayout, RESPONSES_FILE};
use seval_common::record::ResponseRow;

/// All rows read across the given tables, in file append order
#[derive(Debug, Clone, Default)]
pub struct LoadedTables {
    pub rows: Vec<ResponseRow>,
    pub malformed_row_count: usize,
    pub table_count: usize,
}

/// Find every evaluator response table under the results tree
pub fn discover_tables(layout: &EvalLayout) -> Result<Vec<PathBuf>> {
    let results_dir = layout.results_dir();
    let mut tables = Vec::new();
    if results_dir.is_dir() {
        for entry in std::fs::read_dir(&results_dir)? {
            let entry = entry?;
            let table = entry.path().join(RESPONSES_FILE);
            if entry.path().is_dir() && table.is_file() {
                tables.push(table);
            }
        }
    }
    if tables.is_empty() {
        return Err(Error::NoTablesFound(results_dir));
    }
    tables.sort();
    Ok(tables)
}

/// Load and validate every table, accumulating malformed-row counts
pub fn load_tables(paths: &[PathBuf]) -> Result<LoadedTables> {
    let mut loaded = LoadedTables::default();
    for path in paths {
        load_one(path, &mut loaded)?;
    }
    Ok(loaded)
}

fn load_one(path: &Path, loaded: &mut LoadedTables) -> Result<()> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut valid = 0usize;
    let mut malformed = 0usize;
    for record in reader.deserialize::<ResponseRow>() {
        match record {
            Ok(row) if row.is_valid() => {
                loaded.rows.push(row);
                valid += 1;
            }
            Ok(row) => {
                warn!(
                    "Excluding invalid row in {} (evaluator '{}', speaker '{}')",
                    path.display(),
                    row.evaluator_id,
                    row.speaker_id
                );
                malformed += 1;
            }
            Err(e) => {
                warn!("Excluding unparseable row in {}: {}", path.display(), e);
                malformed += 1;
            }
        }
    }
    info!(
        "Loaded {}: {} valid row(s), {} excluded",
        path.display(),
        valid,
        malformed
    );
    loaded.malformed_row_count += malformed;
    loaded.table_count += 1;
    Ok(())
}
