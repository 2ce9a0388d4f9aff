//! seval-report - Results aggregation library and CLI
//!
//! Read side of the SEval human-evaluation tools: loads one or more
//! evaluator response tables, resolves the append-only history down to the
//! latest row per `(evaluator, speaker, item, condition)`, and computes the
//! aggregate report (descriptive statistics, preference rates, paired
//! significance tests).

pub mod dedup;
pub mod loader;
pub mod report;
pub mod stats;

pub use loader::{discover_tables, load_tables, LoadedTables};
pub use report::{AggregateReport, Aggregator, PairedOutcome};
