//! seval-rate - Rating session library and CLI
//!
//! Write side of the SEval human-evaluation tools:
//! - Stimulus catalog resolution (generated audio + sentence pairs + references)
//! - In-progress rating session state (scores, comments, preferences)
//! - Export to durable storage (structured snapshot + append-only table)

pub mod catalog;
pub mod export;
pub mod session;

pub use catalog::StimulusCatalog;
pub use export::{ExportOutcome, ResultsExporter};
pub use session::{RatingSession, SessionSnapshot};
