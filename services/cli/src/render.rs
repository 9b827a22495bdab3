use cohort_rank::pipeline::{PipelineOutput, RankMetric, RankScope, SubjectClassification};
use std::fmt::Write;

const TOP_OF_COHORT: usize = 5;

fn join_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "none".to_string()
    } else {
        values.join(", ")
    }
}

pub(crate) fn render_inspection(
    records: usize,
    identity_field: &str,
    classification: &SubjectClassification,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Records: {records}");
    let _ = writeln!(out, "Identity field: {identity_field}");
    let _ = writeln!(out, "Subjects: {}", join_or_none(&classification.subjects));
    let _ = writeln!(
        out,
        "- rebasing: {}",
        join_or_none(&classification.rebasing_subjects)
    );
    let _ = writeln!(out, "- other: {}", join_or_none(&classification.other_subjects));
    out
}

pub(crate) fn render_summary(output: &PipelineOutput) -> String {
    let mut out = render_inspection(
        output.records.len(),
        &output.identity_field,
        &output.classification,
    );

    if output.combinations.is_empty() {
        let _ = writeln!(out, "\nCombinations: none");
    } else {
        let _ = writeln!(out, "\nCombinations");
        for definition in &output.combinations {
            let members = output
                .records
                .iter()
                .filter(|record| record.combinations.contains(&definition.label))
                .count();
            let _ = writeln!(out, "- {}: {} students", definition.label, members);
        }
    }

    let mut ranked: Vec<_> = output
        .records
        .iter()
        .filter_map(|record| {
            record
                .rank(RankScope::Cohort, RankMetric::AssignedTotal)
                .map(|rank| (rank, record))
        })
        .collect();
    ranked.sort_by_key(|(rank, _)| *rank);

    let _ = writeln!(out, "\nTop of cohort (by assigned total)");
    for (rank, record) in ranked.into_iter().take(TOP_OF_COHORT) {
        let _ = writeln!(
            out,
            "{:>3}. {} ({}, {}) raw {:.0} | assigned {:.0}",
            rank,
            record.merged.name,
            record.merged.id,
            record.merged.class,
            record.scores.raw_total,
            record.scores.assigned_total
        );
    }

    out
}
