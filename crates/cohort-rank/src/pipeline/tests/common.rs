use crate::config::PipelineSettings;
use crate::pipeline::{FieldValue, Pipeline, PipelineOutput, Record};

pub(super) fn record(pairs: &[(&str, FieldValue)]) -> Record {
    pairs.iter().cloned().collect()
}

pub(super) fn student(id: &str, class: &str, scores: &[(&str, f64)]) -> Record {
    let mut record = Record::new();
    record.insert("考号", id);
    record.insert("姓名", format!("学生{id}"));
    record.insert("班级", class);
    for (subject, score) in scores {
        record.insert(*subject, *score);
    }
    record
}

/// Six-subject cohort across two classes. Chemistry spans 40..100 so its
/// rebased values equal its raw values.
pub(super) fn mixed_cohort() -> Vec<Record> {
    vec![
        student(
            "1001",
            "高一(1)班",
            &[("语文", 100.0), ("数学", 120.0), ("物理", 80.0), ("化学", 100.0), ("生物", 90.0)],
        ),
        student(
            "1002",
            "高一(1)班",
            &[("语文", 90.0), ("数学", 110.0), ("物理", 70.0), ("化学", 70.0), ("生物", 60.0)],
        ),
        student(
            "1003",
            "高一(2)班",
            &[("语文", 95.0), ("数学", 100.0), ("物理", 0.0), ("化学", 40.0), ("生物", 30.0)],
        ),
    ]
}

pub(super) fn settings_with_batch(batch_size: usize) -> PipelineSettings {
    PipelineSettings {
        batch_size,
        ..PipelineSettings::default()
    }
}

pub(super) async fn run(raw: &[Record], roster: &[Record]) -> PipelineOutput {
    Pipeline::default()
        .run(raw, roster)
        .await
        .expect("pipeline runs")
}

pub(super) fn by_id<'a>(output: &'a PipelineOutput, id: &str) -> &'a crate::pipeline::EnrichedRecord {
    output
        .records
        .iter()
        .find(|record| record.merged.id == id)
        .expect("record present")
}
