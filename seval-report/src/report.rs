//! Aggregate report assembly
//!
//! Recomputed on demand from however many response tables exist; the report
//! is never the source of truth. Statistics run over the deduplicated row
//! set (latest row per rated cell); excluded malformed rows and
//! underpowered metrics are carried in the report rather than failing it.
//!
//! Preference-rate policy: only `fine_tuned` judgments count in the
//! numerator; ties (`no_preference`) and `zero_shot` judgments stay in the
//! denominator.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use seval_common::record::ResponseRow;
use seval_common::types::{Condition, Metric, PreferenceChoice};

use crate::dedup::latest_rows;
use crate::loader::LoadedTables;
use crate::stats::{summarize, wilcoxon_signed_rank, PairedTest, SummaryStats};

/// Per-metric means/dispersions, one entry per condition with data
pub type MetricSummary = BTreeMap<Condition, SummaryStats>;

/// Preference rate with its explicit numerator and denominator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceSummary {
    /// Items whose recorded preference is `fine_tuned`
    pub fine_tuned_preferred: usize,
    /// All items with a recorded preference (ties included)
    pub judged_items: usize,
    /// `fine_tuned_preferred / judged_items`; `None` when nothing was judged
    pub rate: Option<f64>,
}

/// Paired-test outcome for one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PairedOutcome {
    Test(PairedTest),
    /// Fewer complete pairs than the configured minimum; no test reported
    InsufficientPairedData { pairs: usize, required: usize },
}

/// Per-speaker slice of the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerBreakdown {
    pub metrics: BTreeMap<Metric, MetricSummary>,
    pub preference: PreferenceSummary,
}

/// The full aggregation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateReport {
    pub generated_at: DateTime<Utc>,
    pub table_count: usize,
    pub total_rows: usize,
    /// Rows remaining after latest-wins deduplication
    pub deduplicated_rows: usize,
    pub malformed_row_count: usize,
    pub metrics: BTreeMap<Metric, MetricSummary>,
    pub preference: PreferenceSummary,
    pub speakers: BTreeMap<String, SpeakerBreakdown>,
    pub paired: BTreeMap<Metric, PairedOutcome>,
}

/// Computes aggregate reports from loaded tables
#[derive(Debug, Clone)]
pub struct Aggregator {
    min_paired_samples: usize,
}

impl Aggregator {
    pub fn new(min_paired_samples: usize) -> Self {
        Self { min_paired_samples }
    }

    pub fn aggregate(&self, loaded: &LoadedTables) -> AggregateReport {
        let rows = latest_rows(&loaded.rows);

        let mut speakers = BTreeMap::new();
        for row in &rows {
            speakers
                .entry(row.speaker_id.clone())
                .or_insert_with(Vec::new)
                .push(row.clone());
        }

        AggregateReport {
            generated_at: seval_common::time::now(),
            table_count: loaded.table_count,
            total_rows: loaded.rows.len(),
            deduplicated_rows: rows.len(),
            malformed_row_count: loaded.malformed_row_count,
            metrics: metric_summaries(&rows),
            preference: preference_summary(&rows),
            speakers: speakers
                .into_iter()
                .map(|(speaker_id, speaker_rows)| {
                    (
                        speaker_id,
                        SpeakerBreakdown {
                            metrics: metric_summaries(&speaker_rows),
                            preference: preference_summary(&speaker_rows),
                        },
                    )
                })
                .collect(),
            paired: self.paired_outcomes(&rows),
        }
    }

    /// Pair zero-shot and fine-tuned values per metric on the same
    /// `(evaluator, speaker, item)` key; items with only one condition
    /// recorded are excluded from the pairing.
    fn paired_outcomes(&self, rows: &[ResponseRow]) -> BTreeMap<Metric, PairedOutcome> {
        type ItemKey = (String, String, usize);
        let mut by_item: BTreeMap<ItemKey, BTreeMap<Condition, &ResponseRow>> = BTreeMap::new();
        for row in rows {
            by_item
                .entry((row.evaluator_id.clone(), row.speaker_id.clone(), row.item_index))
                .or_default()
                .insert(row.condition, row);
        }

        let mut outcomes = BTreeMap::new();
        for metric in Metric::ALL {
            let mut diffs = Vec::new();
            for conditions in by_item.values() {
                let zero_shot = conditions
                    .get(&Condition::ZeroShot)
                    .and_then(|r| r.metric(metric));
                let fine_tuned = conditions
                    .get(&Condition::FineTuned)
                    .and_then(|r| r.metric(metric));
                if let (Some(zs), Some(ft)) = (zero_shot, fine_tuned) {
                    diffs.push(ft as f64 - zs as f64);
                }
            }
            let outcome = if diffs.len() < self.min_paired_samples {
                PairedOutcome::InsufficientPairedData {
                    pairs: diffs.len(),
                    required: self.min_paired_samples,
                }
            } else {
                PairedOutcome::Test(wilcoxon_signed_rank(&diffs))
            };
            outcomes.insert(metric, outcome);
        }
        outcomes
    }
}

fn metric_summaries(rows: &[ResponseRow]) -> BTreeMap<Metric, MetricSummary> {
    let mut summaries = BTreeMap::new();
    for metric in Metric::ALL {
        let mut per_condition: MetricSummary = BTreeMap::new();
        for condition in Condition::ALL {
            let values: Vec<f64> = rows
                .iter()
                .filter(|r| r.condition == condition)
                .filter_map(|r| r.metric(metric))
                .map(f64::from)
                .collect();
            if let Some(stats) = summarize(&values) {
                per_condition.insert(condition, stats);
            }
        }
        if !per_condition.is_empty() {
            summaries.insert(metric, per_condition);
        }
    }
    summaries
}

/// One judgment per `(evaluator, speaker, item)`: exports from different
/// runs may leave the preference on different condition rows of the same
/// item, so preference-bearing rows are resolved per item first, latest
/// export wins (equal timestamps fall back to file order, as in dedup).
fn preference_summary(rows: &[ResponseRow]) -> PreferenceSummary {
    type ItemKey<'a> = (&'a str, &'a str, usize);
    let mut latest: BTreeMap<ItemKey<'_>, &ResponseRow> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.preference.is_some()) {
        let key = (row.evaluator_id.as_str(), row.speaker_id.as_str(), row.item_index);
        match latest.get(&key) {
            Some(existing) if existing.exported_at > row.exported_at => {}
            _ => {
                latest.insert(key, row);
            }
        }
    }
    let judged_items = latest.len();
    let fine_tuned_preferred = latest
        .values()
        .filter(|r| r.preference == Some(PreferenceChoice::FineTuned))
        .count();
    PreferenceSummary {
        fine_tuned_preferred,
        judged_items,
        rate: (judged_items > 0).then(|| fine_tuned_preferred as f64 / judged_items as f64),
    }
}
