use crate::render::{render_inspection, render_summary};
use chrono::{DateTime, Utc};
use clap::Args;
use cohort_rank::ingest::load_path;
use cohort_rank::pipeline::{
    classify_subjects, merge_records, select_identity_field, Pipeline, PipelineOutput,
};
use cohort_rank::{AppError, PipelineSettings};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct RankArgs {
    /// Score sheet to rank (.json array of objects or headed .csv)
    #[arg(long)]
    pub(crate) scores: PathBuf,
    /// Optional roster supplying names, classes and grades
    #[arg(long)]
    pub(crate) roster: Option<PathBuf>,
    /// Write the JSON report here instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Print a plain-text digest instead of the JSON report
    #[arg(long)]
    pub(crate) summary: bool,
}

#[derive(Args, Debug)]
pub(crate) struct InspectArgs {
    /// Score sheet to inspect
    #[arg(long)]
    pub(crate) scores: PathBuf,
}

/// JSON document emitted by `rank`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RankReport {
    pub(crate) generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub(crate) output: PipelineOutput,
}

pub(crate) async fn build_report(
    scores: &Path,
    roster: Option<&Path>,
    settings: PipelineSettings,
) -> Result<RankReport, AppError> {
    let raw = load_path(scores)?;
    let roster = match roster {
        Some(path) => load_path(path)?,
        None => Vec::new(),
    };

    let output = Pipeline::new(settings).run(&raw, &roster).await?;
    Ok(RankReport {
        generated_at: Utc::now(),
        output,
    })
}

pub(crate) async fn run_rank(args: RankArgs, settings: PipelineSettings) -> Result<(), AppError> {
    let RankArgs {
        scores,
        roster,
        output,
        summary,
    } = args;

    let report = build_report(&scores, roster.as_deref(), settings).await?;

    if summary {
        print!("{}", render_summary(&report.output));
        return Ok(());
    }

    let json = serde_json::to_string_pretty(&report)?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)?;
            info!(
                path = %path.display(),
                records = report.output.records.len(),
                "report written"
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }

    Ok(())
}

pub(crate) fn run_inspect(args: InspectArgs, settings: &PipelineSettings) -> Result<(), AppError> {
    let raw = load_path(&args.scores)?;
    let identity_field = select_identity_field(&raw)?;
    let merged = merge_records(&raw, &[], &identity_field)?;
    let classification = match merged.first() {
        Some(first) => classify_subjects(first, &identity_field, &settings.rebasing_keywords),
        None => Default::default(),
    };

    print!(
        "{}",
        render_inspection(raw.len(), &identity_field, &classification)
    );
    Ok(())
}
