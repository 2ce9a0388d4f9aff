//! Integration tests for results aggregation
//!
//! Covers:
//! - Latest-wins deduplication feeding the means
//! - Preference-rate policy (ties kept in the denominator, one judgment
//!   per item even when exports split it across condition rows)
//! - Per-metric InsufficientPairedData with other metrics unaffected
//! - Malformed-row tolerance with exact exclusion counts
//! - Table discovery under the results tree

use std::fs;
use std::io::Write;

use chrono::{TimeZone, Utc};
use seval_common::error::Error;
use seval_common::layout::EvalLayout;
use seval_common::record::ResponseRow;
use seval_common::types::{Condition, Metric, PreferenceChoice};
use seval_report::report::PairedOutcome;
use seval_report::{discover_tables, load_tables, Aggregator, LoadedTables};
use tempfile::TempDir;

fn row(
    evaluator: &str,
    speaker: &str,
    item: usize,
    condition: Condition,
    minute: u32,
) -> ResponseRow {
    ResponseRow {
        evaluator_id: evaluator.to_string(),
        evaluator_name: String::new(),
        speaker_id: speaker.to_string(),
        item_index: item,
        condition,
        translation_accuracy: None,
        speaker_persona_match: None,
        tone_prosody_match: None,
        naturalness: None,
        pronunciation_intelligibility: None,
        overall: None,
        condition_comment: String::new(),
        preference: None,
        preference_comment: String::new(),
        source_text_en: String::new(),
        target_text_es: String::new(),
        exported_at: Utc.with_ymd_and_hms(2026, 8, 30, 12, minute, 0).unwrap(),
    }
}

fn loaded(rows: Vec<ResponseRow>) -> LoadedTables {
    LoadedTables {
        rows,
        malformed_row_count: 0,
        table_count: 1,
    }
}

#[test]
fn test_dedup_mean_uses_only_latest_row() {
    // Same (evaluator, speaker, item, condition) exported twice.
    let mut early = row("1", "1055", 0, Condition::ZeroShot, 0);
    early.overall = Some(1);
    let mut late = row("1", "1055", 0, Condition::ZeroShot, 30);
    late.overall = Some(5);

    let report = Aggregator::new(5).aggregate(&loaded(vec![early, late]));
    assert_eq!(report.total_rows, 2);
    assert_eq!(report.deduplicated_rows, 1);

    let stats = &report.metrics[&Metric::Overall][&Condition::ZeroShot];
    assert_eq!(stats.n, 1);
    assert_eq!(stats.mean, 5.0);
}

#[test]
fn test_preference_rate_ties_stay_in_denominator() {
    // 3 speakers x 5 items: [ft, ft, zs, none, ft] each.
    let prefs = [
        PreferenceChoice::FineTuned,
        PreferenceChoice::FineTuned,
        PreferenceChoice::ZeroShot,
        PreferenceChoice::NoPreference,
        PreferenceChoice::FineTuned,
    ];
    let mut rows = Vec::new();
    for speaker in ["1055", "124992", "28165"] {
        for (item, pref) in prefs.iter().enumerate() {
            let mut r = row("1", speaker, item, Condition::ZeroShot, 0);
            r.overall = Some(3);
            r.preference = Some(*pref);
            rows.push(r);
        }
    }

    let report = Aggregator::new(5).aggregate(&loaded(rows));
    assert_eq!(report.preference.judged_items, 15);
    assert_eq!(report.preference.fine_tuned_preferred, 9);
    assert_eq!(report.preference.rate, Some(9.0 / 15.0));

    for breakdown in report.speakers.values() {
        assert_eq!(breakdown.preference.judged_items, 5);
        assert_eq!(breakdown.preference.fine_tuned_preferred, 3);
    }
}

#[test]
fn test_preference_counted_once_per_item_across_runs() {
    // Two exports of the same item left the preference on different
    // condition rows; the item must still count once, latest export wins.
    let mut ft = row("1", "1055", 0, Condition::FineTuned, 0);
    ft.overall = Some(4);
    ft.preference = Some(PreferenceChoice::FineTuned);
    let mut zs = row("1", "1055", 0, Condition::ZeroShot, 30);
    zs.overall = Some(2);
    zs.preference = Some(PreferenceChoice::NoPreference);

    let report = Aggregator::new(5).aggregate(&loaded(vec![ft, zs]));
    assert_eq!(report.preference.judged_items, 1);
    assert_eq!(report.preference.fine_tuned_preferred, 0);
    assert_eq!(report.preference.rate, Some(0.0));
}

#[test]
fn test_underpowered_metric_reports_insufficient_without_affecting_others() {
    let mut rows = Vec::new();
    for item in 0..5 {
        let mut zs = row("1", "1055", item, Condition::ZeroShot, 0);
        zs.overall = Some(2);
        // naturalness only rated on the first two items
        if item < 2 {
            zs.naturalness = Some(3);
        }
        let mut ft = row("1", "1055", item, Condition::FineTuned, 0);
        ft.overall = Some(4);
        if item < 2 {
            ft.naturalness = Some(3);
        }
        rows.push(zs);
        rows.push(ft);
    }
    // An item with no fine-tuned counterpart never joins the pairing.
    let mut unpaired = row("1", "1055", 9, Condition::ZeroShot, 0);
    unpaired.overall = Some(1);
    unpaired.naturalness = Some(1);
    rows.push(unpaired);

    let report = Aggregator::new(3).aggregate(&loaded(rows));

    match &report.paired[&Metric::Overall] {
        PairedOutcome::Test(test) => {
            assert_eq!(test.n_pairs, 5);
            assert_eq!(test.n_nonzero, 5);
            assert!(test.p_value < 0.05);
        }
        other => panic!("expected a test for overall, got {other:?}"),
    }
    assert_eq!(
        report.paired[&Metric::Naturalness],
        PairedOutcome::InsufficientPairedData {
            pairs: 2,
            required: 3
        }
    );
}

#[test]
fn test_malformed_rows_excluded_and_counted() {
    let tmp = TempDir::new().unwrap();
    let table = tmp.path().join("responses.csv");

    let mut writer = csv::Writer::from_path(&table).unwrap();
    for item in 0..10 {
        let mut r = row("1", "1055", item, Condition::ZeroShot, 0);
        r.overall = Some(3);
        writer.serialize(r).unwrap();
    }
    // One row with an out-of-domain score, parseable but invalid.
    let mut bad_score = row("1", "1055", 10, Condition::ZeroShot, 0);
    bad_score.overall = Some(9);
    writer.serialize(bad_score).unwrap();
    writer.flush().unwrap();
    drop(writer);

    // One structurally broken trailing line (as left by an interrupted append).
    let mut file = fs::OpenOptions::new().append(true).open(&table).unwrap();
    writeln!(file, "1,,1055,not-a-number").unwrap();

    let loaded = load_tables(&[table]).unwrap();
    assert_eq!(loaded.malformed_row_count, 2);
    assert_eq!(loaded.rows.len(), 10);

    let report = Aggregator::new(5).aggregate(&loaded);
    assert_eq!(report.malformed_row_count, 2);
    let stats = &report.metrics[&Metric::Overall][&Condition::ZeroShot];
    assert_eq!(stats.n, 10);
    assert_eq!(stats.mean, 3.0);
}

#[test]
fn test_discover_tables_finds_evaluator_subtrees() {
    let tmp = TempDir::new().unwrap();
    let layout = EvalLayout::new(tmp.path());
    for evaluator in ["1", "2"] {
        fs::create_dir_all(layout.evaluator_dir(evaluator)).unwrap();
        fs::write(layout.responses_table(evaluator), "evaluator_id\n").unwrap();
    }
    // A stray directory without a table is skipped.
    fs::create_dir_all(layout.results_dir().join("evaluator-empty")).unwrap();

    let tables = discover_tables(&layout).unwrap();
    assert_eq!(tables.len(), 2);
}

#[test]
fn test_discover_tables_empty_tree_fails() {
    let tmp = TempDir::new().unwrap();
    let layout = EvalLayout::new(tmp.path());
    assert!(matches!(
        discover_tables(&layout),
        Err(Error::NoTablesFound(_))
    ));
}

#[test]
fn test_stats_split_per_condition_and_speaker() {
    let mut rows = Vec::new();
    for (speaker, zs, ft) in [("1055", 2, 4), ("28165", 3, 5)] {
        let mut a = row("1", speaker, 0, Condition::ZeroShot, 0);
        a.overall = Some(zs);
        let mut b = row("1", speaker, 0, Condition::FineTuned, 0);
        b.overall = Some(ft);
        rows.push(a);
        rows.push(b);
    }

    let report = Aggregator::new(5).aggregate(&loaded(rows));
    let overall = &report.metrics[&Metric::Overall];
    assert_eq!(overall[&Condition::ZeroShot].mean, 2.5);
    assert_eq!(overall[&Condition::FineTuned].mean, 4.5);

    let speaker = &report.speakers["28165"].metrics[&Metric::Overall];
    assert_eq!(speaker[&Condition::ZeroShot].mean, 3.0);
    assert_eq!(speaker[&Condition::FineTuned].mean, 5.0);
}
