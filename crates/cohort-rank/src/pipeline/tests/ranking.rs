use super::common::*;
use crate::pipeline::{RankMetric, RankScope};

#[tokio::test]
async fn class_ranks_are_independent_of_cohort_ranks() {
    let raw = vec![
        student("1", "高一(1)班", &[("数学", 100.0)]),
        student("2", "高一(1)班", &[("数学", 90.0)]),
        student("3", "高一(2)班", &[("数学", 95.0)]),
        student("4", "高一（2）班", &[("数学", 60.0)]),
    ];

    let output = run(&raw, &[]).await;

    let cohort: Vec<_> = ["1", "2", "3", "4"]
        .iter()
        .map(|id| by_id(&output, id).rank(RankScope::Cohort, RankMetric::RawTotal))
        .collect();
    assert_eq!(cohort, vec![Some(1), Some(3), Some(2), Some(4)]);

    let class: Vec<_> = ["1", "2", "3", "4"]
        .iter()
        .map(|id| by_id(&output, id).rank(RankScope::Class, RankMetric::RawTotal))
        .collect();
    assert_eq!(class, vec![Some(1), Some(2), Some(1), Some(2)]);
}

#[tokio::test]
async fn ties_share_a_rank_in_every_scope() {
    let raw = vec![
        student("1", "1班", &[("语文", 90.0)]),
        student("2", "1班", &[("语文", 90.0)]),
        student("3", "1班", &[("语文", 80.0)]),
    ];

    let output = run(&raw, &[]).await;

    for (id, expected) in [("1", 1), ("2", 1), ("3", 3)] {
        let record = by_id(&output, id);
        assert_eq!(record.rank(RankScope::Cohort, RankMetric::RawTotal), Some(expected));
        assert_eq!(record.rank(RankScope::Class, RankMetric::RawTotal), Some(expected));
        assert_eq!(
            record.rank(RankScope::Cohort, RankMetric::Subject("语文".into())),
            Some(expected)
        );
    }
}

#[tokio::test]
async fn combination_ranks_cover_only_members() {
    let raw = vec![
        student(
            "1",
            "1班",
            &[("物理", 90.0), ("化学", 90.0), ("生物", 90.0)],
        ),
        student(
            "2",
            "2班",
            &[("物理", 80.0), ("化学", 80.0), ("生物", 80.0)],
        ),
        student(
            "3",
            "2班",
            &[("物理", 100.0), ("化学", 100.0), ("生物", 0.0)],
        ),
        student(
            "4",
            "2班",
            &[("物理", 70.0), ("化学", 70.0), ("生物", 70.0)],
        ),
    ];

    let output = run(&raw, &[]).await;
    let combo = || RankScope::CombinationCohort("物化生".into());
    let combo_class = || RankScope::CombinationClass("物化生".into());

    assert_eq!(by_id(&output, "1").rank(combo(), RankMetric::RawTotal), Some(1));
    assert_eq!(by_id(&output, "2").rank(combo(), RankMetric::RawTotal), Some(2));
    assert_eq!(by_id(&output, "4").rank(combo(), RankMetric::RawTotal), Some(3));
    assert_eq!(by_id(&output, "3").rank(combo(), RankMetric::RawTotal), None);

    assert_eq!(
        by_id(&output, "2").rank(combo_class(), RankMetric::AssignedTotal),
        Some(1)
    );
    assert_eq!(
        by_id(&output, "4").rank(combo_class(), RankMetric::AssignedTotal),
        Some(2)
    );
    assert_eq!(
        by_id(&output, "1").rank(combo_class(), RankMetric::AssignedTotal),
        Some(1)
    );
    assert_eq!(
        by_id(&output, "3").rank(RankScope::Class, RankMetric::RawTotal),
        Some(3)
    );
}

#[tokio::test]
async fn every_subject_and_assigned_score_is_ranked() {
    let output = run(&mixed_cohort(), &[]).await;
    let record = by_id(&output, "1002");

    for subject in &output.classification.subjects {
        assert!(record
            .rank(RankScope::Cohort, RankMetric::Subject(subject.clone()))
            .is_some());
        assert!(record
            .rank(RankScope::Class, RankMetric::Subject(subject.clone()))
            .is_some());
    }
    for subject in &output.classification.rebasing_subjects {
        assert!(record
            .rank(RankScope::Cohort, RankMetric::Assigned(subject.clone()))
            .is_some());
    }
    assert_eq!(
        record.rank(RankScope::Cohort, RankMetric::Assigned("语文".into())),
        None
    );
}
