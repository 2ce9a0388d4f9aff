//! Filesystem layout conventions under the evaluation root folder
//!
//! Everything below the root is addressed by convention, not by lookup:
//!
//! ```text
//! <root>/audio/speaker_{id}/zero_shot_{i}.wav      generated audio
//! <root>/audio/speaker_{id}/fine_tuned_{i}.wav     (optional per item)
//! <root>/audio/speaker_{id}/sentence_pairs.json    per-speaker pairs (optional)
//! <root>/audio/sentence_pairs.json                 global pairs fallback
//! <root>/references/zero_shot/speaker_{id}/duration_{4,10}/source_audio.wav
//! <root>/results/human_eval/evaluator-{id}/ratings_{stamp}.json
//! <root>/results/human_eval/evaluator-{id}/responses.csv
//! ```
//!
//! Evaluator isolation is this namespace convention: each evaluator writes
//! only under its own `evaluator-{id}` subtree, so no cross-evaluator
//! locking is needed.

use std::path::{Path, PathBuf};

use crate::types::Condition;

/// Name of the per-evaluator cumulative response table
pub const RESPONSES_FILE: &str = "responses.csv";

/// Path conventions rooted at the evaluation root folder
#[derive(Debug, Clone)]
pub struct EvalLayout {
    root: PathBuf,
}

impl EvalLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding all generated audio
    pub fn audio_dir(&self) -> PathBuf {
        self.root.join("audio")
    }

    /// Generated-audio directory for one speaker
    pub fn speaker_audio_dir(&self, speaker_id: &str) -> PathBuf {
        self.audio_dir().join(format!("speaker_{speaker_id}"))
    }

    /// Generated clip for one (speaker, item, condition)
    pub fn condition_audio(&self, speaker_id: &str, item_index: usize, condition: Condition) -> PathBuf {
        self.speaker_audio_dir(speaker_id)
            .join(format!("{}_{item_index}.wav", condition.as_str()))
    }

    /// Per-speaker sentence-pairs file (preferred over the global one)
    pub fn speaker_sentence_pairs(&self, speaker_id: &str) -> PathBuf {
        self.speaker_audio_dir(speaker_id).join("sentence_pairs.json")
    }

    /// Global sentence-pairs file
    pub fn global_sentence_pairs(&self) -> PathBuf {
        self.audio_dir().join("sentence_pairs.json")
    }

    /// Speaker reference clips, in fallback order: duration_4 then duration_10
    pub fn reference_candidates(&self, speaker_id: &str) -> Vec<PathBuf> {
        ["duration_4", "duration_10"]
            .iter()
            .map(|duration| {
                self.root
                    .join("references")
                    .join("zero_shot")
                    .join(format!("speaker_{speaker_id}"))
                    .join(duration)
                    .join("source_audio.wav")
            })
            .collect()
    }

    /// Root of all human-evaluation results
    pub fn results_dir(&self) -> PathBuf {
        self.root.join("results").join("human_eval")
    }

    /// Result directory scoped to one evaluator
    pub fn evaluator_dir(&self, evaluator_id: &str) -> PathBuf {
        self.results_dir().join(format!("evaluator-{evaluator_id}"))
    }

    /// Cumulative response table for one evaluator
    pub fn responses_table(&self, evaluator_id: &str) -> PathBuf {
        self.evaluator_dir(evaluator_id).join(RESPONSES_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_audio_naming() {
        let layout = EvalLayout::new("/data");
        assert_eq!(
            layout.condition_audio("1055", 3, Condition::ZeroShot),
            PathBuf::from("/data/audio/speaker_1055/zero_shot_3.wav")
        );
        assert_eq!(
            layout.condition_audio("1055", 3, Condition::FineTuned),
            PathBuf::from("/data/audio/speaker_1055/fine_tuned_3.wav")
        );
    }

    #[test]
    fn test_reference_candidates_order() {
        let layout = EvalLayout::new("/data");
        let candidates = layout.reference_candidates("28165");
        assert_eq!(candidates.len(), 2);
        assert!(candidates[0].ends_with("speaker_28165/duration_4/source_audio.wav"));
        assert!(candidates[1].ends_with("speaker_28165/duration_10/source_audio.wav"));
    }

    #[test]
    fn test_evaluator_paths_are_scoped() {
        let layout = EvalLayout::new("/data");
        let a = layout.responses_table("1");
        let b = layout.responses_table("2");
        assert_ne!(a, b);
        assert!(a.ends_with("evaluator-1/responses.csv"));
    }
}
