//! Score inference and ranking over schema-free student records.
//!
//! Stages run in a fixed order, each producing a new value from the previous
//! stage's output: identity inference, roster merge, subject classification,
//! scoring, combination classification, ranking.

mod combinations;
mod inference;
mod merger;
mod normalizer;
mod patterns;
mod ranking;
mod record;
mod scoring;

#[cfg(test)]
mod tests;

pub use combinations::{
    classify_combinations, populated_definitions, CombinationDefinition, SubjectCode,
};
pub use inference::{classify_subjects, select_identity_field, SubjectClassification};
pub use merger::{merge_records, MergedRecord};
pub use normalizer::{canonical_class, canonical_combination, UNCLASSIFIED};
pub use ranking::{rank_records, rank_scope, RankKey, RankMetric, RankScope, RankTable};
pub use record::{records_from_json, FieldValue, Record};
pub use scoring::{
    score_record, score_records, subject_ranges, ScoreCard, SubjectRange, ASSIGNED_CEILING,
    ASSIGNED_FLOOR, DECLARED_TOTAL_TOLERANCE,
};

use crate::config::PipelineSettings;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no records to process")]
    EmptyInput,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("record {index} is not a flat mapping: {reason}")]
    InvalidRecordShape { index: usize, reason: String },
}

/// A merged record with every field the later stages derived for it.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub merged: MergedRecord,
    pub scores: ScoreCard,
    pub combinations: BTreeSet<String>,
    pub ranks: RankTable,
}

impl EnrichedRecord {
    pub fn rank(&self, scope: RankScope, metric: RankMetric) -> Option<u32> {
        self.ranks.get(scope, metric)
    }
}

/// Output names written by scoring, classification and ranking. Raw fields
/// with these names are dropped from the flattened record.
fn is_derived_field(field: &str) -> bool {
    matches!(field, "rawTotal" | "assignedTotal" | "combinations")
        || field.starts_with("assigned_")
        || field.starts_with("rank_")
}

impl Serialize for EnrichedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        self.merged.write_entries(&mut map, is_derived_field)?;
        self.scores.write_entries(&mut map)?;
        map.serialize_entry("combinations", &self.combinations)?;
        self.ranks.write_entries(&mut map)?;
        map.end()
    }
}

/// Result of one run, handed to whatever renders it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutput {
    pub identity_field: String,
    pub classification: SubjectClassification,
    /// Definitions with at least one member, in configuration order.
    pub combinations: Vec<CombinationDefinition>,
    pub records: Vec<EnrichedRecord>,
}

/// Runs the full inference-and-ranking pipeline with one set of settings.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(settings: PipelineSettings) -> Self {
        Self { settings }
    }

    pub async fn run(
        &self,
        raw: &[Record],
        roster: &[Record],
    ) -> Result<PipelineOutput, PipelineError> {
        if raw.is_empty() {
            return Err(PipelineError::EmptyInput);
        }

        let identity_field = select_identity_field(raw)?;
        info!(
            records = raw.len(),
            roster = roster.len(),
            identity_field = identity_field.as_str(),
            "starting ranking pipeline"
        );

        let merged = merge_records(raw, roster, &identity_field)?;
        let classification = match merged.first() {
            Some(first) => {
                classify_subjects(first, &identity_field, &self.settings.rebasing_keywords)
            }
            None => SubjectClassification::default(),
        };

        let cards = score_records(&merged, &classification, self.settings.batch_size).await;
        let memberships = classify_combinations(
            &merged,
            &classification,
            &self.settings.combinations,
            &self.settings.subject_codes,
        );
        let ranks = rank_records(
            &merged,
            &cards,
            &memberships,
            &classification,
            &self.settings.combinations,
        );
        let combinations = populated_definitions(&self.settings.combinations, &memberships);

        let records: Vec<EnrichedRecord> = merged
            .into_iter()
            .zip(cards)
            .zip(memberships)
            .zip(ranks)
            .map(|(((merged, scores), combinations), ranks)| EnrichedRecord {
                merged,
                scores,
                combinations,
                ranks,
            })
            .collect();

        info!(
            records = records.len(),
            subjects = classification.subjects.len(),
            rebasing = classification.rebasing_subjects.len(),
            combinations = combinations.len(),
            "ranking pipeline finished"
        );

        Ok(PipelineOutput {
            identity_field,
            classification,
            combinations,
            records,
        })
    }
}

/// Runs the pipeline with default settings.
pub async fn run_pipeline(
    raw: &[Record],
    roster: &[Record],
) -> Result<PipelineOutput, PipelineError> {
    Pipeline::default().run(raw, roster).await
}
