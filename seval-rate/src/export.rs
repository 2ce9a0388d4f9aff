//! Export of session snapshots to durable storage
//!
//! Two artifacts per export, derived from the same snapshot value:
//! 1. A structured JSON snapshot in a new, uniquely named file under the
//!    evaluator's result directory (never overwrites a prior export).
//! 2. Rows appended to the evaluator's cumulative `responses.csv` (header
//!    written only on creation, prior rows never rewritten).
//!
//! Repeated exports append again; the table is an auditable history and
//! readers resolve duplicates by "most recently appended wins".

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use seval_common::error::{Error, Result};
use seval_common::layout::EvalLayout;
use seval_common::record::ResponseRow;
use seval_common::types::Condition;

use crate::session::{ItemResponse, SessionSnapshot};

/// Where one export landed
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub snapshot_path: PathBuf,
    pub table_path: PathBuf,
    pub rows_appended: usize,
}

/// Writes session snapshots into the evaluator-scoped results subtree
#[derive(Debug, Clone)]
pub struct ResultsExporter {
    layout: EvalLayout,
}

impl ResultsExporter {
    pub fn new(layout: EvalLayout) -> Self {
        Self { layout }
    }

    /// Export one snapshot: write the structured record, then append the
    /// flattened rows.
    ///
    /// If the snapshot file is written but the table append fails, returns
    /// `PartialWriteDetected`; the caller should treat the export as failed
    /// and retry it whole (the orphaned snapshot file is harmless and left
    /// in place).
    pub fn export(&self, snapshot: &SessionSnapshot) -> Result<ExportOutcome> {
        let exported_at = seval_common::time::now();
        let dir = self.layout.evaluator_dir(&snapshot.evaluator_id);
        std::fs::create_dir_all(&dir).map_err(|e| Error::EvaluatorDirectoryUnwritable {
            path: dir.clone(),
            source: e,
        })?;

        let snapshot_path = self.write_snapshot(snapshot, exported_at, &dir)?;
        info!("Wrote snapshot {}", snapshot_path.display());

        if !snapshot.incomplete_items.is_empty() {
            warn!(
                "Exported with {} incomplete item(s): {:?}",
                snapshot.incomplete_items.len(),
                snapshot.incomplete_items
            );
        }

        let rows = rows_from_snapshot(snapshot, exported_at);
        let table_path = self.layout.responses_table(&snapshot.evaluator_id);
        let rows_appended = append_rows(&table_path, &rows).map_err(|e| {
            Error::PartialWriteDetected {
                snapshot: snapshot_path.clone(),
                reason: e.to_string(),
            }
        })?;
        info!(
            "Appended {} row(s) to {}",
            rows_appended,
            table_path.display()
        );

        Ok(ExportOutcome {
            snapshot_path,
            table_path,
            rows_appended,
        })
    }

    /// Write the JSON snapshot into a fresh file; a same-second re-export
    /// gets a `-{n}` suffix rather than overwriting.
    fn write_snapshot(
        &self,
        snapshot: &SessionSnapshot,
        exported_at: DateTime<Utc>,
        dir: &std::path::Path,
    ) -> Result<PathBuf> {
        let stamp = seval_common::time::file_stamp(exported_at);
        for attempt in 0u32.. {
            let name = if attempt == 0 {
                format!("ratings_{stamp}.json")
            } else {
                format!("ratings_{stamp}-{}.json", attempt + 1)
            };
            let path = dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    serde_json::to_writer_pretty(&mut file, snapshot)?;
                    file.write_all(b"\n")?;
                    file.flush()?;
                    return Ok(path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
        unreachable!("suffix loop terminates via return or error")
    }
}

/// Flatten a snapshot into one row per rated `(item, condition)` pair.
///
/// The preference and its comment are carried once per item, on the item's
/// first emitted row (the zero-shot row when that condition is rated,
/// otherwise the fine-tuned row). An item with a
/// preference but no condition ratings still emits one metric-less
/// zero-shot row so the judgment reaches the table.
pub fn rows_from_snapshot(
    snapshot: &SessionSnapshot,
    exported_at: DateTime<Utc>,
) -> Vec<ResponseRow> {
    let mut rows = Vec::new();
    for response in &snapshot.items {
        let mut conditions: Vec<Condition> = response
            .item
            .presented_conditions()
            .into_iter()
            .filter(|c| response.ratings.contains_key(c))
            .collect();
        if conditions.is_empty() && response.preference.is_some() {
            conditions.push(Condition::ZeroShot);
        }
        for (position, condition) in conditions.iter().enumerate() {
            rows.push(build_row(
                snapshot,
                response,
                *condition,
                position == 0,
                exported_at,
            ));
        }
    }
    rows
}

fn build_row(
    snapshot: &SessionSnapshot,
    response: &ItemResponse,
    condition: Condition,
    carries_preference: bool,
    exported_at: DateTime<Utc>,
) -> ResponseRow {
    let rating = response.ratings.get(&condition);
    let preference = response
        .preference
        .as_ref()
        .filter(|_| carries_preference);
    let mut row = ResponseRow {
        evaluator_id: snapshot.evaluator_id.clone(),
        evaluator_name: snapshot.evaluator_name.clone(),
        speaker_id: response.item.speaker_id.clone(),
        item_index: response.item.item_index,
        condition,
        translation_accuracy: None,
        speaker_persona_match: None,
        tone_prosody_match: None,
        naturalness: None,
        pronunciation_intelligibility: None,
        overall: None,
        condition_comment: rating
            .and_then(|r| r.comment.clone())
            .unwrap_or_default(),
        preference: preference.map(|p| p.choice),
        preference_comment: preference
            .and_then(|p| p.comment.clone())
            .unwrap_or_default(),
        source_text_en: response.item.source_text_en.clone(),
        target_text_es: response.item.target_text_es.clone(),
        exported_at,
    };
    if let Some(rating) = rating {
        for (metric, value) in &rating.scores {
            row.set_metric(*metric, Some(*value));
        }
    }
    row
}

/// Append rows to the cumulative table, writing the header only when the
/// file is created. Returns the number of rows appended.
fn append_rows(path: &std::path::Path, rows: &[ResponseRow]) -> Result<usize> {
    let existed = path.exists();
    let file = OpenOptions::new().append(true).create(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(!existed)
        .from_writer(file);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(rows.len())
}
