//! Common error types for SEval
//!
//! Four families share one enum: resolution errors (stimuli cannot be
//! located), validation errors (rejected at the point of mutation, session
//! state unchanged), persistence errors (export failed, caller retries the
//! whole export), and aggregation errors (scoped to the affected table or
//! metric, never aborting a full report).

use std::path::PathBuf;

use thiserror::Error;

use crate::types::Condition;

/// Common result type for SEval operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the SEval tools
#[derive(Error, Debug)]
pub enum Error {
    // === Resolution ===
    /// No reference clip for the speaker after the duration_4 -> duration_10 fallback
    #[error("No reference audio for speaker {speaker_id} (checked {checked:?})")]
    MissingReferenceAudio {
        speaker_id: String,
        checked: Vec<PathBuf>,
    },

    /// Sentence-pairs source not found for a speaker (neither per-speaker nor global)
    #[error("No sentence-pairs file for speaker {speaker_id}")]
    SentencePairsMissing { speaker_id: String },

    /// Sentence-pairs source exists but cannot be parsed
    #[error("Malformed sentence-pairs file {path}: {reason}")]
    SentencePairsMalformed { path: PathBuf, reason: String },

    /// No generated audio directory for the speaker
    #[error("No audio directory for speaker {speaker_id}: {path}")]
    SpeakerAudioMissing { speaker_id: String, path: PathBuf },

    // === Validation ===
    /// Score outside the 1-5 Likert domain
    #[error("Invalid score value {value}: must be an integer in 1..=5")]
    InvalidScoreValue { value: i64 },

    /// Condition not presented for this item (e.g. fine_tuned with no fine-tuned audio)
    #[error("Condition {condition} not presented for item {item_index}")]
    UnknownCondition {
        item_index: usize,
        condition: Condition,
    },

    /// Item index outside the catalog
    #[error("Unknown item index {item_index}")]
    UnknownItem { item_index: usize },

    /// Preference string is not one of the defined categorical values
    #[error("Invalid preference choice '{0}' (expected zero_shot, fine_tuned or no_preference)")]
    InvalidPreference(String),

    /// Metric name is not one of the six rated dimensions
    #[error("Invalid metric '{0}'")]
    InvalidMetric(String),

    /// Condition label is not zero_shot or fine_tuned
    #[error("Invalid condition '{0}'")]
    InvalidCondition(String),

    // === Persistence ===
    /// Evaluator-scoped result directory cannot be created
    #[error("Cannot create evaluator directory {path}: {source}")]
    EvaluatorDirectoryUnwritable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Snapshot was written but the tabular append failed; the export must be retried
    #[error("Partial write: snapshot {snapshot} written but table append failed: {reason}")]
    PartialWriteDetected { snapshot: PathBuf, reason: String },

    // === Aggregation ===
    /// No evaluator tables found under the results tree
    /// (underpowered metrics are not an error; they are carried in the
    /// report as a per-metric outcome)
    #[error("No response tables found under {0}")]
    NoTablesFound(PathBuf),

    // === Passthroughs ===
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
