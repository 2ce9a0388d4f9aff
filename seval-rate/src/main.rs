//! seval-rate - Interactive rating front end
//!
//! Builds the stimulus catalog for the selected speakers, owns one rating
//! session for the evaluator, and drives a line-based prompt loop: show an
//! item, record scores/comments/preference, navigate, export. Session state
//! lives for the whole process; export can be run any number of times and
//! each run appends to the evaluator's own results subtree.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use seval_common::config::{RootFolderInitializer, RootFolderResolver, TomlConfig};
use seval_common::layout::EvalLayout;
use seval_common::types::{Condition, EvaluationItem, Metric, PreferenceChoice};
use seval_rate::{RatingSession, ResultsExporter, StimulusCatalog};

#[derive(Parser, Debug)]
#[command(name = "seval-rate", about = "Rate EN->ES speech translation outputs")]
struct Args {
    /// Evaluation root folder (falls back to SEVAL_ROOT_FOLDER, config file, OS default)
    #[arg(long)]
    root: Option<std::path::PathBuf>,

    /// Evaluator identifier (scopes the result directory)
    #[arg(long)]
    evaluator: String,

    /// Optional evaluator display name
    #[arg(long, default_value = "")]
    name: String,

    /// Comma-separated speaker ids; defaults to config, then to discovery
    #[arg(long, value_delimiter = ',')]
    speakers: Vec<String>,

    /// Override the per-speaker item limit
    #[arg(long)]
    max_items: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting seval-rate v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = TomlConfig::load();

    let root = RootFolderResolver::new(args.root.clone()).resolve(&config);
    RootFolderInitializer::new(root.clone()).ensure_directory_exists()?;
    let layout = EvalLayout::new(root);

    let max_items = args.max_items.unwrap_or(config.max_items_per_speaker);
    let catalog = StimulusCatalog::new(layout.clone(), max_items);

    let speakers = if !args.speakers.is_empty() {
        args.speakers.clone()
    } else if !config.speakers.is_empty() {
        config.speakers.clone()
    } else {
        catalog.discover_speakers()?
    };
    anyhow::ensure!(
        !speakers.is_empty(),
        "No speakers given and none discovered under {}",
        layout.audio_dir().display()
    );

    let mut items: Vec<EvaluationItem> = Vec::new();
    for speaker in &speakers {
        match catalog.items_for_speaker(speaker) {
            Ok(mut speaker_items) => items.append(&mut speaker_items),
            // A speaker failing to resolve aborts only that speaker
            Err(e) => warn!("Skipping speaker {}: {}", speaker, e),
        }
    }
    anyhow::ensure!(!items.is_empty(), "No evaluation items resolved");
    info!("{} items across {} speaker(s)", items.len(), speakers.len());

    let session = RatingSession::new(args.evaluator.clone(), args.name.clone(), items);
    let exporter = ResultsExporter::new(layout);

    let stdin = std::io::stdin();
    run_loop(session, exporter, &mut stdin.lock(), &mut std::io::stdout())
}

/// The prompt loop, separated from `main` so tests can drive it with a
/// scripted reader/writer.
fn run_loop(
    mut session: RatingSession,
    exporter: ResultsExporter,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    let mut current = 0usize;
    show_item(&session, current, out)?;
    loop {
        write!(out, "seval[{}/{}]> ", current + 1, session.items().len())?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line).context("reading command")? == 0 {
            return Ok(()); // EOF
        }
        let words: Vec<&str> = line.split_whitespace().collect();
        let result = match words.as_slice() {
            [] => Ok(()),
            ["quit"] | ["q"] => return Ok(()),
            ["help"] | ["h"] => print_help(out),
            ["show"] => show_item(&session, current, out),
            ["status"] => print_status(&session, out),
            ["next"] | ["n"] => {
                let target = current as i64 + 1;
                move_to(&session, &mut current, target, out)
            }
            ["prev"] | ["p"] => {
                let target = current as i64 - 1;
                move_to(&session, &mut current, target, out)
            }
            ["goto", n] => match n.parse::<i64>() {
                Ok(n) => move_to(&session, &mut current, n - 1, out),
                Err(_) => print_line(out, "goto takes an item number"),
            },
            ["score", condition, metric, value] => {
                set_score(&mut session, current, condition, metric, value, out)
            }
            ["comment", condition, rest @ ..] => {
                let text = rest.join(" ");
                set_comment(&mut session, current, condition, &text, out)
            }
            ["pref", choice, rest @ ..] => {
                let text = rest.join(" ");
                set_preference(&mut session, current, choice, &text, out)
            }
            ["export"] => export(&session, &exporter, out),
            _ => print_line(out, "Unknown command; try 'help'"),
        };
        if let Err(e) = result {
            writeln!(out, "error: {e}")?;
        }
    }
}

fn print_line(out: &mut impl Write, text: &str) -> Result<()> {
    writeln!(out, "{text}")?;
    Ok(())
}

fn print_help(out: &mut impl Write) -> Result<()> {
    writeln!(
        out,
        "Commands:\n  \
         show                         redisplay the current item\n  \
         score <cond> <metric> <1-5>  record a score (cond: zs|ft)\n  \
         comment <cond> <text>        comment on one condition's clip\n  \
         pref <zs|ft|none> [text]     record the per-item preference\n  \
         next / prev / goto <n>       navigate items\n  \
         status                       completion overview\n  \
         export                       write snapshot + table rows\n  \
         quit"
    )?;
    Ok(())
}

fn parse_condition(s: &str) -> Result<Condition> {
    match s {
        "zs" => Ok(Condition::ZeroShot),
        "ft" => Ok(Condition::FineTuned),
        other => Ok(other.parse()?),
    }
}

fn parse_metric(s: &str) -> Result<Metric> {
    // Accept a 1-based questionnaire position as shorthand
    if let Ok(position) = s.parse::<usize>() {
        if (1..=Metric::ALL.len()).contains(&position) {
            return Ok(Metric::ALL[position - 1]);
        }
    }
    Ok(s.parse()?)
}

fn show_item(session: &RatingSession, index: usize, out: &mut impl Write) -> Result<()> {
    let Some(item) = session.item(index) else {
        return print_line(out, "No such item");
    };
    writeln!(
        out,
        "\nItem {} — speaker {} pair {}",
        index + 1,
        item.speaker_id,
        item.item_index
    )?;
    writeln!(out, "  EN: {}", item.source_text_en)?;
    writeln!(out, "  ES: {}", item.target_text_es)?;
    writeln!(out, "  reference: {}", item.reference_audio.display())?;
    for condition in item.presented_conditions() {
        let audio = match condition {
            Condition::ZeroShot => Some(&item.zero_shot_audio),
            Condition::FineTuned => item.fine_tuned_audio.as_ref(),
        };
        if let Some(audio) = audio {
            writeln!(out, "  {}: {}", condition, audio.display())?;
        }
        for metric in Metric::ALL {
            if let Some(value) = session.score(index, condition, metric) {
                writeln!(out, "    {metric} = {value}")?;
            }
        }
    }
    if let Some(pref) = session.preference(index) {
        writeln!(out, "  preference: {}", pref.choice)?;
    }
    Ok(())
}

fn print_status(session: &RatingSession, out: &mut impl Write) -> Result<()> {
    let status = session.completion_status();
    writeln!(
        out,
        "Completed items: {} / {}",
        status.complete_items, status.total_items
    )?;
    for completion in &status.per_item {
        if !completion.complete {
            writeln!(
                out,
                "  item {}: {} score(s) missing",
                completion.item_index + 1,
                completion.missing.len()
            )?;
        }
    }
    Ok(())
}

fn move_to(
    session: &RatingSession,
    current: &mut usize,
    target: i64,
    out: &mut impl Write,
) -> Result<()> {
    let last = session.items().len() as i64 - 1;
    *current = target.clamp(0, last) as usize;
    show_item(session, *current, out)
}

fn set_score(
    session: &mut RatingSession,
    current: usize,
    condition: &str,
    metric: &str,
    value: &str,
    out: &mut impl Write,
) -> Result<()> {
    let condition = parse_condition(condition)?;
    let metric = parse_metric(metric)?;
    let Ok(value) = value.parse::<u8>() else {
        return print_line(out, &format!("'{value}' is not a score; use 1-5"));
    };
    session.set_score(current, condition, metric, value)?;
    writeln!(out, "{condition} {metric} = {value}")?;
    Ok(())
}

fn set_comment(
    session: &mut RatingSession,
    current: usize,
    condition: &str,
    text: &str,
    out: &mut impl Write,
) -> Result<()> {
    let condition = parse_condition(condition)?;
    session.set_comment(current, condition, text)?;
    print_line(out, "noted")
}

fn set_preference(
    session: &mut RatingSession,
    current: usize,
    choice: &str,
    comment: &str,
    out: &mut impl Write,
) -> Result<()> {
    let choice = match choice {
        "zs" => PreferenceChoice::ZeroShot,
        "ft" => PreferenceChoice::FineTuned,
        "none" => PreferenceChoice::NoPreference,
        other => other.parse()?,
    };
    let comment = (!comment.is_empty()).then(|| comment.to_string());
    session.set_preference(current, choice, comment)?;
    print_line(out, "preference recorded")
}

fn export(
    session: &RatingSession,
    exporter: &ResultsExporter,
    out: &mut impl Write,
) -> Result<()> {
    let snapshot = session.snapshot();
    if !snapshot.incomplete_items.is_empty() {
        writeln!(
            out,
            "Warning: {} item(s) incomplete; exporting anyway (marked in the record)",
            snapshot.incomplete_items.len()
        )?;
    }
    let outcome = exporter.export(&snapshot)?;
    writeln!(
        out,
        "Exported:\n  {}\n  {} (+{} rows)",
        outcome.snapshot_path.display(),
        outcome.table_path.display(),
        outcome.rows_appended
    )?;
    Ok(())
}
