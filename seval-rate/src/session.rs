//! In-progress rating session state
//!
//! One session per evaluator per run. All mutation goes through explicit
//! setters that validate before touching state: a rejected call leaves the
//! session exactly as it was. Items are addressed by their position in the
//! session's ordered item list (catalog order, possibly spanning several
//! speakers); the per-speaker pair index lives on the item itself and is
//! what exported records carry.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use seval_common::error::{Error, Result};
use seval_common::types::{Condition, EvaluationItem, Metric, PreferenceChoice};

/// Ratings collected for one presented condition of one item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionRating {
    /// Metric -> Likert value (1-5); absent until set
    pub scores: BTreeMap<Metric, u8>,
    /// Optional free-text comment on this condition's clip
    pub comment: Option<String>,
}

/// Per-item categorical preference plus optional free text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceJudgment {
    pub choice: PreferenceChoice,
    pub comment: Option<String>,
}

/// Completion state of one item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemCompletion {
    pub item_index: usize,
    pub complete: bool,
    /// (condition, metric) pairs still unset for presented conditions
    pub missing: Vec<(Condition, Metric)>,
}

/// Completion state across the whole session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionStatus {
    pub complete_items: usize,
    pub total_items: usize,
    pub per_item: Vec<ItemCompletion>,
}

impl CompletionStatus {
    pub fn is_complete(&self) -> bool {
        self.complete_items == self.total_items
    }

    /// Indices of items still missing required scores
    pub fn incomplete_items(&self) -> Vec<usize> {
        self.per_item
            .iter()
            .filter(|c| !c.complete)
            .map(|c| c.item_index)
            .collect()
    }
}

/// Everything recorded for one item, as captured in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResponse {
    pub item: EvaluationItem,
    pub ratings: BTreeMap<Condition, ConditionRating>,
    pub preference: Option<PreferenceJudgment>,
}

/// Immutable snapshot of a session at one export instant
///
/// Owns deep copies of the session state; later mutation of the live
/// session cannot affect a snapshot already taken.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub evaluator_id: String,
    pub evaluator_name: String,
    pub taken_at: DateTime<Utc>,
    pub total_items: usize,
    /// Session positions of items missing required scores at capture time
    pub incomplete_items: Vec<usize>,
    pub items: Vec<ItemResponse>,
}

/// Mutable rating state for one evaluator
///
/// Single-writer by construction: the owning front end mutates it
/// synchronously in response to user actions.
#[derive(Debug, Clone)]
pub struct RatingSession {
    session_id: Uuid,
    evaluator_id: String,
    evaluator_name: String,
    items: Vec<EvaluationItem>,
    ratings: BTreeMap<(usize, Condition), ConditionRating>,
    preferences: BTreeMap<usize, PreferenceJudgment>,
}

impl RatingSession {
    /// Create an empty session over the given catalog items
    pub fn new(
        evaluator_id: impl Into<String>,
        evaluator_name: impl Into<String>,
        items: Vec<EvaluationItem>,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            evaluator_id: evaluator_id.into(),
            evaluator_name: evaluator_name.into(),
            items,
            ratings: BTreeMap::new(),
            preferences: BTreeMap::new(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn evaluator_id(&self) -> &str {
        &self.evaluator_id
    }

    pub fn items(&self) -> &[EvaluationItem] {
        &self.items
    }

    pub fn item(&self, item_index: usize) -> Option<&EvaluationItem> {
        self.items.get(item_index)
    }

    fn checked_item(&self, item_index: usize) -> Result<&EvaluationItem> {
        self.items
            .get(item_index)
            .ok_or(Error::UnknownItem { item_index })
    }

    fn checked_presented(&self, item_index: usize, condition: Condition) -> Result<()> {
        if self.checked_item(item_index)?.presents(condition) {
            Ok(())
        } else {
            Err(Error::UnknownCondition {
                item_index,
                condition,
            })
        }
    }

    /// Record one metric score. Rejects values outside 1..=5 and conditions
    /// the catalog did not present for this item; on rejection, prior state
    /// is unchanged.
    pub fn set_score(
        &mut self,
        item_index: usize,
        condition: Condition,
        metric: Metric,
        value: u8,
    ) -> Result<()> {
        self.checked_presented(item_index, condition)?;
        if !(1..=5).contains(&value) {
            return Err(Error::InvalidScoreValue {
                value: value as i64,
            });
        }
        self.ratings
            .entry((item_index, condition))
            .or_default()
            .scores
            .insert(metric, value);
        Ok(())
    }

    /// Read back a recorded score
    pub fn score(&self, item_index: usize, condition: Condition, metric: Metric) -> Option<u8> {
        self.ratings
            .get(&(item_index, condition))
            .and_then(|r| r.scores.get(&metric))
            .copied()
    }

    /// Attach a free-text comment to one presented condition of an item
    pub fn set_comment(
        &mut self,
        item_index: usize,
        condition: Condition,
        comment: impl Into<String>,
    ) -> Result<()> {
        self.checked_presented(item_index, condition)?;
        let comment = comment.into();
        self.ratings
            .entry((item_index, condition))
            .or_default()
            .comment = (!comment.is_empty()).then_some(comment);
        Ok(())
    }

    /// Record the per-item preference judgment (independent of score completeness)
    pub fn set_preference(
        &mut self,
        item_index: usize,
        choice: PreferenceChoice,
        comment: Option<String>,
    ) -> Result<()> {
        self.checked_item(item_index)?;
        self.preferences
            .insert(item_index, PreferenceJudgment { choice, comment });
        Ok(())
    }

    /// Read back the recorded preference for an item
    pub fn preference(&self, item_index: usize) -> Option<&PreferenceJudgment> {
        self.preferences.get(&item_index)
    }

    /// Per-item completeness: an item is complete when every metric is set
    /// for every condition the catalog presented for it
    pub fn completion_status(&self) -> CompletionStatus {
        let mut per_item = Vec::with_capacity(self.items.len());
        for (index, item) in self.items.iter().enumerate() {
            let mut missing = Vec::new();
            for condition in item.presented_conditions() {
                let rating = self.ratings.get(&(index, condition));
                for metric in Metric::ALL {
                    let set = rating.map_or(false, |r| r.scores.contains_key(&metric));
                    if !set {
                        missing.push((condition, metric));
                    }
                }
            }
            per_item.push(ItemCompletion {
                item_index: index,
                complete: missing.is_empty(),
                missing,
            });
        }
        CompletionStatus {
            complete_items: per_item.iter().filter(|c| c.complete).count(),
            total_items: per_item.len(),
            per_item,
        }
    }

    /// Capture an immutable copy of the current state for export
    pub fn snapshot(&self) -> SessionSnapshot {
        let status = self.completion_status();
        let items = self
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let mut ratings = BTreeMap::new();
                for condition in item.presented_conditions() {
                    if let Some(rating) = self.ratings.get(&(index, condition)) {
                        ratings.insert(condition, rating.clone());
                    }
                }
                ItemResponse {
                    item: item.clone(),
                    ratings,
                    preference: self.preferences.get(&index).cloned(),
                }
            })
            .collect();
        SessionSnapshot {
            session_id: self.session_id,
            evaluator_id: self.evaluator_id.clone(),
            evaluator_name: self.evaluator_name.clone(),
            taken_at: seval_common::time::now(),
            total_items: self.items.len(),
            incomplete_items: status.incomplete_items(),
            items,
        }
    }
}
