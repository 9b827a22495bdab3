use super::inference::SubjectClassification;
use super::merger::MergedRecord;
use super::patterns;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use tracing::debug;

/// A declared total within this distance of the computed sum is trusted.
pub const DECLARED_TOTAL_TOLERANCE: f64 = 2.0;
pub const ASSIGNED_FLOOR: f64 = 40.0;
pub const ASSIGNED_CEILING: f64 = 100.0;

/// Totals and rebased scores for one record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScoreCard {
    /// Sum of every subject, before reconciliation with a declared total.
    pub calculated_total: f64,
    pub raw_total: f64,
    pub assigned_total: f64,
    /// Rebasing subject to assigned score, in classification order.
    pub assigned: IndexMap<String, f64>,
}

impl ScoreCard {
    pub fn assigned_score(&self, subject: &str) -> Option<f64> {
        self.assigned.get(subject).copied()
    }

    pub(crate) fn write_entries<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error> {
        map.serialize_entry("rawTotal", &self.raw_total)?;
        map.serialize_entry("assignedTotal", &self.assigned_total)?;
        for (subject, score) in &self.assigned {
            map.serialize_entry(&format!("assigned_{subject}"), score)?;
        }
        Ok(())
    }
}

impl Serialize for ScoreCard {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        self.write_entries(&mut map)?;
        map.end()
    }
}

/// Cohort-wide range of one rebasing subject.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubjectRange {
    pub min: f64,
    pub max: f64,
}

impl SubjectRange {
    /// Linear map of `[min, max]` onto `[40, 100]`, rounded half up. A
    /// degenerate range leaves the score unchanged.
    pub fn rebase(&self, score: f64) -> f64 {
        if self.max == self.min {
            return score;
        }
        let scaled = ASSIGNED_FLOOR
            + (score - self.min) * (ASSIGNED_CEILING - ASSIGNED_FLOOR) / (self.max - self.min);
        (scaled + 0.5).floor()
    }
}

/// Min and max of each rebasing subject over the whole cohort. Missing or
/// non-numeric values count as 0.
pub fn subject_ranges(
    records: &[MergedRecord],
    classification: &SubjectClassification,
) -> HashMap<String, SubjectRange> {
    classification
        .rebasing_subjects
        .iter()
        .filter_map(|subject| {
            let mut values = records
                .iter()
                .map(|record| record.raw().value(subject).number_or_zero());
            let first = values.next()?;
            let range = values.fold(
                SubjectRange {
                    min: first,
                    max: first,
                },
                |range, value| SubjectRange {
                    min: range.min.min(value),
                    max: range.max.max(value),
                },
            );
            Some((subject.clone(), range))
        })
        .collect()
}

/// Scores every record in batches of `batch_size`, yielding to the runtime
/// between batches. Ranges are computed over the full cohort first, so batch
/// boundaries never change a result.
pub async fn score_records(
    records: &[MergedRecord],
    classification: &SubjectClassification,
    batch_size: usize,
) -> Vec<ScoreCard> {
    let ranges = subject_ranges(records, classification);
    let batch_size = batch_size.max(1);
    let batch_count = records.len().div_ceil(batch_size);
    let mut cards = Vec::with_capacity(records.len());

    for (batch_index, batch) in records.chunks(batch_size).enumerate() {
        cards.extend(
            batch
                .iter()
                .map(|record| score_record(record, classification, &ranges)),
        );
        debug!(
            batch = batch_index + 1,
            batches = batch_count,
            scored = cards.len(),
            "scored batch"
        );
        if batch_index + 1 < batch_count {
            tokio::task::yield_now().await;
        }
    }

    cards
}

pub fn score_record(
    record: &MergedRecord,
    classification: &SubjectClassification,
    ranges: &HashMap<String, SubjectRange>,
) -> ScoreCard {
    let raw = record.raw();
    let calculated_total: f64 = classification
        .subjects
        .iter()
        .map(|subject| raw.value(subject).number_or_zero())
        .sum();

    let declared_total = raw
        .iter()
        .find(|(field, _)| patterns::is_declared_total(field))
        .and_then(|(_, value)| value.as_number());

    let raw_total = match declared_total {
        Some(declared) if (declared - calculated_total).abs() <= DECLARED_TOTAL_TOLERANCE => {
            declared
        }
        _ => calculated_total,
    };

    if classification.rebasing_subjects.is_empty() {
        return ScoreCard {
            calculated_total,
            raw_total,
            assigned_total: raw_total,
            assigned: IndexMap::new(),
        };
    }

    let mut assigned = IndexMap::with_capacity(classification.rebasing_subjects.len());
    let mut raw_rebasing_sum = 0.0;
    let mut assigned_sum = 0.0;
    for subject in &classification.rebasing_subjects {
        let score = raw.value(subject).number_or_zero();
        let rebased = ranges
            .get(subject)
            .map(|range| range.rebase(score))
            .unwrap_or(score);
        raw_rebasing_sum += score;
        assigned_sum += rebased;
        assigned.insert(subject.clone(), rebased);
    }

    ScoreCard {
        calculated_total,
        raw_total,
        assigned_total: raw_total - raw_rebasing_sum + assigned_sum,
        assigned,
    }
}
