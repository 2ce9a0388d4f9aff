//! Flattened response record shared by the exporter and the aggregator
//!
//! One `ResponseRow` per rated `(item, condition)` pair. Rows are appended
//! to a per-evaluator cumulative CSV and never rewritten; repeated exports
//! of the same item produce additional rows, and readers take the most
//! recently appended row per `(evaluator, speaker, item, condition)` as
//! authoritative. Field order here is the CSV column order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Condition, Metric, PreferenceChoice};

/// One flattened row of the per-evaluator response table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRow {
    pub evaluator_id: String,
    /// Optional display name; empty when the evaluator gave none
    #[serde(default)]
    pub evaluator_name: String,
    pub speaker_id: String,
    pub item_index: usize,
    pub condition: Condition,
    pub translation_accuracy: Option<u8>,
    pub speaker_persona_match: Option<u8>,
    pub tone_prosody_match: Option<u8>,
    pub naturalness: Option<u8>,
    pub pronunciation_intelligibility: Option<u8>,
    pub overall: Option<u8>,
    /// Free-text comment for this condition's clip
    #[serde(default)]
    pub condition_comment: String,
    /// Per-item preference; populated once per item (on its first row)
    pub preference: Option<PreferenceChoice>,
    #[serde(default)]
    pub preference_comment: String,
    #[serde(default)]
    pub source_text_en: String,
    #[serde(default)]
    pub target_text_es: String,
    /// Timestamp of the export action that appended this row
    pub exported_at: DateTime<Utc>,
}

impl ResponseRow {
    /// Read the value stored for one metric column
    pub fn metric(&self, metric: Metric) -> Option<u8> {
        match metric {
            Metric::TranslationAccuracy => self.translation_accuracy,
            Metric::SpeakerPersonaMatch => self.speaker_persona_match,
            Metric::ToneProsodyMatch => self.tone_prosody_match,
            Metric::Naturalness => self.naturalness,
            Metric::PronunciationIntelligibility => self.pronunciation_intelligibility,
            Metric::Overall => self.overall,
        }
    }

    /// Set the value stored for one metric column
    pub fn set_metric(&mut self, metric: Metric, value: Option<u8>) {
        match metric {
            Metric::TranslationAccuracy => self.translation_accuracy = value,
            Metric::SpeakerPersonaMatch => self.speaker_persona_match = value,
            Metric::ToneProsodyMatch => self.tone_prosody_match = value,
            Metric::Naturalness => self.naturalness = value,
            Metric::PronunciationIntelligibility => self.pronunciation_intelligibility = value,
            Metric::Overall => self.overall = value,
        }
    }

    /// Whether every metric value present is inside the 1-5 Likert domain
    /// and the identifying fields are usable
    pub fn is_valid(&self) -> bool {
        if self.evaluator_id.is_empty() || self.speaker_id.is_empty() {
            return false;
        }
        Metric::ALL
            .iter()
            .filter_map(|m| self.metric(*m))
            .all(|v| (1..=5).contains(&v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row() -> ResponseRow {
        ResponseRow {
            evaluator_id: "1".to_string(),
            evaluator_name: String::new(),
            speaker_id: "1055".to_string(),
            item_index: 0,
            condition: Condition::ZeroShot,
            translation_accuracy: Some(4),
            speaker_persona_match: Some(3),
            tone_prosody_match: Some(3),
            naturalness: Some(5),
            pronunciation_intelligibility: Some(4),
            overall: Some(4),
            condition_comment: String::new(),
            preference: Some(PreferenceChoice::FineTuned),
            preference_comment: String::new(),
            source_text_en: "Hello.".to_string(),
            target_text_es: "Hola.".to_string(),
            exported_at: Utc.with_ymd_and_hms(2026, 8, 30, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_metric_accessors_cover_all_columns() {
        let mut r = row();
        for m in Metric::ALL {
            r.set_metric(m, Some(2));
            assert_eq!(r.metric(m), Some(2));
        }
    }

    #[test]
    fn test_is_valid_rejects_out_of_domain_scores() {
        let mut r = row();
        assert!(r.is_valid());
        r.overall = Some(9);
        assert!(!r.is_valid());
        r.overall = None;
        assert!(r.is_valid());
    }

    #[test]
    fn test_is_valid_rejects_missing_identity() {
        let mut r = row();
        r.speaker_id.clear();
        assert!(!r.is_valid());
    }

    #[test]
    fn test_csv_round_trip() {
        let mut writer = csv::Writer::from_writer(vec![]);
        writer.serialize(row()).unwrap();
        let data = writer.into_inner().unwrap();

        let mut reader = csv::Reader::from_reader(data.as_slice());
        let parsed: ResponseRow = reader.deserialize().next().unwrap().unwrap();
        assert_eq!(parsed, row());
    }

    #[test]
    fn test_csv_empty_fields_deserialize_as_none() {
        let data = "\
evaluator_id,evaluator_name,speaker_id,item_index,condition,translation_accuracy,speaker_persona_match,tone_prosody_match,naturalness,pronunciation_intelligibility,overall,condition_comment,preference,preference_comment,source_text_en,target_text_es,exported_at
1,,1055,0,fine_tuned,,,,,,,,,,,,2026-08-30T12:00:00Z
";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let parsed: ResponseRow = reader.deserialize().next().unwrap().unwrap();
        assert_eq!(parsed.condition, Condition::FineTuned);
        assert_eq!(parsed.translation_accuracy, None);
        assert_eq!(parsed.preference, None);
    }
}
