//! Latest-wins resolution over the append-only row history
//!
//! Re-exports append new rows for the same `(evaluator, speaker, item,
//! condition)`; statistics must use only the most recently appended one.
//! Ordering is by export timestamp, with input (append) order breaking
//! ties, so two exports inside one clock second still resolve to the later
//! append.

use std::collections::BTreeMap;

use seval_common::record::ResponseRow;
use seval_common::types::Condition;

/// Identity of one rated cell in the history
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RowKey {
    pub evaluator_id: String,
    pub speaker_id: String,
    pub item_index: usize,
    pub condition: Condition,
}

impl RowKey {
    pub fn of(row: &ResponseRow) -> Self {
        Self {
            evaluator_id: row.evaluator_id.clone(),
            speaker_id: row.speaker_id.clone(),
            item_index: row.item_index,
            condition: row.condition,
        }
    }
}

/// Reduce rows (in append order) to the authoritative row per key.
/// Returns rows in deterministic key order.
pub fn latest_rows(rows: &[ResponseRow]) -> Vec<ResponseRow> {
    let mut latest: BTreeMap<RowKey, &ResponseRow> = BTreeMap::new();
    for row in rows {
        let key = RowKey::of(row);
        match latest.get(&key) {
            Some(existing) if existing.exported_at > row.exported_at => {}
            _ => {
                latest.insert(key, row);
            }
        }
    }
    latest.into_values().cloned().collect()
}
