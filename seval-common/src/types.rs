//! Shared domain types for the human-evaluation tools
//!
//! Conditions, metrics and preference choices carry stable string forms:
//! the string is both the audio-file naming convention and the label written
//! into exported records, so renaming a variant is a data-format change.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Synthesis condition under comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    ZeroShot,
    FineTuned,
}

impl Condition {
    /// Both conditions, in presentation order
    pub const ALL: [Condition; 2] = [Condition::ZeroShot, Condition::FineTuned];

    /// Stable string form used in filenames and exported records
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::ZeroShot => "zero_shot",
            Condition::FineTuned => "fine_tuned",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Condition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zero_shot" => Ok(Condition::ZeroShot),
            "fine_tuned" => Ok(Condition::FineTuned),
            other => Err(Error::InvalidCondition(other.to_string())),
        }
    }
}

/// One of the six rated dimensions (1-5 Likert scale each)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    TranslationAccuracy,
    SpeakerPersonaMatch,
    ToneProsodyMatch,
    Naturalness,
    PronunciationIntelligibility,
    Overall,
}

impl Metric {
    /// All six metrics, in questionnaire order
    pub const ALL: [Metric; 6] = [
        Metric::TranslationAccuracy,
        Metric::SpeakerPersonaMatch,
        Metric::ToneProsodyMatch,
        Metric::Naturalness,
        Metric::PronunciationIntelligibility,
        Metric::Overall,
    ];

    /// Stable string form used as CSV column name
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::TranslationAccuracy => "translation_accuracy",
            Metric::SpeakerPersonaMatch => "speaker_persona_match",
            Metric::ToneProsodyMatch => "tone_prosody_match",
            Metric::Naturalness => "naturalness",
            Metric::PronunciationIntelligibility => "pronunciation_intelligibility",
            Metric::Overall => "overall",
        }
    }

    /// Human-readable prompt shown by rating front ends
    pub fn label(&self) -> &'static str {
        match self {
            Metric::TranslationAccuracy => {
                "Translation accuracy (meaning preserved from English to Spanish)"
            }
            Metric::SpeakerPersonaMatch => {
                "Persona / speaker match (does it sound like the same speaker?)"
            }
            Metric::ToneProsodyMatch => "Tone / prosody match (matching delivery and emphasis)",
            Metric::Naturalness => "Naturalness (human-like, not robotic/glitchy)",
            Metric::PronunciationIntelligibility => {
                "Pronunciation / intelligibility (clear, correct Spanish)"
            }
            Metric::Overall => "Overall quality",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .iter()
            .find(|m| m.as_str() == s)
            .copied()
            .ok_or_else(|| Error::InvalidMetric(s.to_string()))
    }
}

/// Per-item categorical preference between the two conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceChoice {
    ZeroShot,
    FineTuned,
    NoPreference,
}

impl PreferenceChoice {
    /// Stable string form used in exported records
    pub fn as_str(&self) -> &'static str {
        match self {
            PreferenceChoice::ZeroShot => "zero_shot",
            PreferenceChoice::FineTuned => "fine_tuned",
            PreferenceChoice::NoPreference => "no_preference",
        }
    }
}

impl fmt::Display for PreferenceChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PreferenceChoice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zero_shot" => Ok(PreferenceChoice::ZeroShot),
            "fine_tuned" => Ok(PreferenceChoice::FineTuned),
            "no_preference" => Ok(PreferenceChoice::NoPreference),
            other => Err(Error::InvalidPreference(other.to_string())),
        }
    }
}

/// One (speaker, sentence-pair) evaluation unit, immutable once resolved
/// from the stimulus catalog.
///
/// `fine_tuned_audio` is `None` when the speaker has no fine-tuned clip for
/// this sentence; that condition is then simply not presented for the item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationItem {
    pub speaker_id: String,
    pub item_index: usize,
    /// English source sentence (may be empty when the pairs file lacks it)
    pub source_text_en: String,
    /// Spanish gold sentence
    pub target_text_es: String,
    pub reference_audio: PathBuf,
    pub zero_shot_audio: PathBuf,
    pub fine_tuned_audio: Option<PathBuf>,
}

impl EvaluationItem {
    /// Conditions actually presented for this item
    pub fn presented_conditions(&self) -> Vec<Condition> {
        if self.fine_tuned_audio.is_some() {
            vec![Condition::ZeroShot, Condition::FineTuned]
        } else {
            vec![Condition::ZeroShot]
        }
    }

    /// Whether the given condition is presented for this item
    pub fn presents(&self, condition: Condition) -> bool {
        match condition {
            Condition::ZeroShot => true,
            Condition::FineTuned => self.fine_tuned_audio.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(fine_tuned: bool) -> EvaluationItem {
        EvaluationItem {
            speaker_id: "1055".to_string(),
            item_index: 0,
            source_text_en: "Hello.".to_string(),
            target_text_es: "Hola.".to_string(),
            reference_audio: PathBuf::from("ref.wav"),
            zero_shot_audio: PathBuf::from("zero_shot_0.wav"),
            fine_tuned_audio: fine_tuned.then(|| PathBuf::from("fine_tuned_0.wav")),
        }
    }

    #[test]
    fn test_condition_round_trip() {
        for c in Condition::ALL {
            assert_eq!(c.as_str().parse::<Condition>().unwrap(), c);
        }
        assert!("fine_tune".parse::<Condition>().is_err());
    }

    #[test]
    fn test_metric_round_trip() {
        for m in Metric::ALL {
            assert_eq!(m.as_str().parse::<Metric>().unwrap(), m);
        }
        assert!("accuracy".parse::<Metric>().is_err());
    }

    #[test]
    fn test_preference_round_trip() {
        for p in [
            PreferenceChoice::ZeroShot,
            PreferenceChoice::FineTuned,
            PreferenceChoice::NoPreference,
        ] {
            assert_eq!(p.as_str().parse::<PreferenceChoice>().unwrap(), p);
        }
        assert!("neither".parse::<PreferenceChoice>().is_err());
    }

    #[test]
    fn test_presented_conditions_without_fine_tuned() {
        let it = item(false);
        assert_eq!(it.presented_conditions(), vec![Condition::ZeroShot]);
        assert!(it.presents(Condition::ZeroShot));
        assert!(!it.presents(Condition::FineTuned));
    }

    #[test]
    fn test_presented_conditions_with_fine_tuned() {
        let it = item(true);
        assert_eq!(
            it.presented_conditions(),
            vec![Condition::ZeroShot, Condition::FineTuned]
        );
        assert!(it.presents(Condition::FineTuned));
    }

    #[test]
    fn test_serde_labels_are_snake_case() {
        assert_eq!(
            serde_json::to_string(&Condition::FineTuned).unwrap(),
            "\"fine_tuned\""
        );
        assert_eq!(
            serde_json::to_string(&Metric::SpeakerPersonaMatch).unwrap(),
            "\"speaker_persona_match\""
        );
    }
}
