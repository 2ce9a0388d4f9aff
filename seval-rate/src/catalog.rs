//! Stimulus catalog resolution
//!
//! Resolves, per speaker, the ordered list of evaluation items from the
//! on-disk conventions in `seval_common::layout`. Read-only: the catalog
//! holds no cache, so a rebuild after restart sees exactly what is on disk.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, warn};

use seval_common::error::{Error, Result};
use seval_common::layout::EvalLayout;
use seval_common::types::{Condition, EvaluationItem};

/// One entry of a sentence-pairs file; both historical formats are accepted:
/// `{"en": "...", "es": "..."}` and `["english", "spanish"]`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PairEntry {
    Keyed { en: String, es: String },
    Listed(Vec<String>),
}

impl PairEntry {
    fn texts(&self) -> Option<(String, String)> {
        match self {
            PairEntry::Keyed { en, es } => Some((en.trim().to_string(), es.trim().to_string())),
            PairEntry::Listed(parts) if parts.len() >= 2 => {
                Some((parts[0].trim().to_string(), parts[1].trim().to_string()))
            }
            PairEntry::Listed(_) => None,
        }
    }
}

/// Resolves evaluation items for speakers from the stimulus tree
#[derive(Debug, Clone)]
pub struct StimulusCatalog {
    layout: EvalLayout,
    max_items_per_speaker: usize,
}

impl StimulusCatalog {
    pub fn new(layout: EvalLayout, max_items_per_speaker: usize) -> Self {
        Self {
            layout,
            max_items_per_speaker,
        }
    }

    /// Enumerate speakers with a generated-audio directory, sorted by id
    pub fn discover_speakers(&self) -> Result<Vec<String>> {
        let audio_dir = self.layout.audio_dir();
        if !audio_dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut speakers = Vec::new();
        for entry in std::fs::read_dir(&audio_dir)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name();
            if let Some(id) = name.to_string_lossy().strip_prefix("speaker_") {
                speakers.push(id.to_string());
            }
        }
        speakers.sort();
        Ok(speakers)
    }

    /// Resolve the ordered evaluation items for one speaker.
    ///
    /// Items are discovered from `zero_shot_{i}.wav` filenames, sorted by
    /// index and truncated to the configured per-speaker maximum. A missing
    /// fine-tuned clip omits that condition for the item; a missing speaker
    /// reference (after the duration_4 -> duration_10 fallback) or an
    /// unusable sentence-pairs source fails the whole speaker.
    pub fn items_for_speaker(&self, speaker_id: &str) -> Result<Vec<EvaluationItem>> {
        let speaker_dir = self.layout.speaker_audio_dir(speaker_id);
        if !speaker_dir.is_dir() {
            return Err(Error::SpeakerAudioMissing {
                speaker_id: speaker_id.to_string(),
                path: speaker_dir,
            });
        }

        let pairs = self.load_sentence_pairs(speaker_id)?;
        let reference = self.resolve_reference(speaker_id)?;

        let mut indices = Vec::new();
        for entry in std::fs::read_dir(&speaker_dir)? {
            let entry = entry?;
            if !entry.path().is_file() {
                continue;
            }
            if let Some(index) = parse_zero_shot_index(&entry.file_name().to_string_lossy()) {
                indices.push(index);
            }
        }
        indices.sort_unstable();
        indices.truncate(self.max_items_per_speaker);

        let mut items = Vec::with_capacity(indices.len());
        for index in indices {
            let fine_tuned = self
                .layout
                .condition_audio(speaker_id, index, Condition::FineTuned);
            let (source_text_en, target_text_es) =
                pairs.get(&index).cloned().unwrap_or_default();
            if source_text_en.is_empty() {
                warn!(
                    "No sentence pair for speaker {} item {}; texts will be blank",
                    speaker_id, index
                );
            }
            items.push(EvaluationItem {
                speaker_id: speaker_id.to_string(),
                item_index: index,
                source_text_en,
                target_text_es,
                reference_audio: reference.clone(),
                zero_shot_audio: self
                    .layout
                    .condition_audio(speaker_id, index, Condition::ZeroShot),
                fine_tuned_audio: fine_tuned.is_file().then_some(fine_tuned),
            });
        }
        debug!("Resolved {} items for speaker {}", items.len(), speaker_id);
        Ok(items)
    }

    /// Load sentence pairs: per-speaker file first, global file as fallback
    fn load_sentence_pairs(&self, speaker_id: &str) -> Result<BTreeMap<usize, (String, String)>> {
        let candidates = [
            self.layout.speaker_sentence_pairs(speaker_id),
            self.layout.global_sentence_pairs(),
        ];
        let Some(path) = candidates.iter().find(|p| p.is_file()) else {
            return Err(Error::SentencePairsMissing {
                speaker_id: speaker_id.to_string(),
            });
        };

        let content = std::fs::read_to_string(path)?;
        let entries: Vec<PairEntry> =
            serde_json::from_str(&content).map_err(|e| Error::SentencePairsMalformed {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        let mut pairs = BTreeMap::new();
        for (index, entry) in entries.iter().enumerate() {
            match entry.texts() {
                Some(texts) => {
                    pairs.insert(index, texts);
                }
                None => {
                    return Err(Error::SentencePairsMalformed {
                        path: path.clone(),
                        reason: format!("entry {index} has fewer than two elements"),
                    });
                }
            }
        }
        Ok(pairs)
    }

    /// Resolve the speaker reference clip, preferring the 4-second cut
    fn resolve_reference(&self, speaker_id: &str) -> Result<PathBuf> {
        let candidates = self.layout.reference_candidates(speaker_id);
        candidates
            .iter()
            .find(|p| p.is_file())
            .cloned()
            .ok_or_else(|| Error::MissingReferenceAudio {
                speaker_id: speaker_id.to_string(),
                checked: candidates,
            })
    }
}

/// Extract the item index from a `zero_shot_{i}.wav` filename
fn parse_zero_shot_index(name: &str) -> Option<usize> {
    name.strip_prefix("zero_shot_")?
        .strip_suffix(".wav")?
        .parse()
        .ok()
}
