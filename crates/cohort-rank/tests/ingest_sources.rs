use cohort_rank::ingest::{load_path, IngestError};
use cohort_rank::pipeline::{run_pipeline, RankMetric, RankScope};
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).expect("create input file");
    file.write_all(contents.as_bytes()).expect("write input file");
    path
}

#[tokio::test]
async fn csv_scores_and_json_roster_rank_together() {
    let dir = TempDir::new().expect("temp dir");
    let scores = write_file(
        &dir,
        "scores.csv",
        "考号,语文,数学,化学\n1001,100,120,95\n1002,90,130,60\n1003,95,100,\n",
    );
    let roster = write_file(
        &dir,
        "roster.JSON",
        r#"[
            {"学号": "x", "考号": "1001", "姓名": "张三", "班级": "高二（1）班"},
            {"学号": "y", "考号": "1002", "姓名": "李四", "班级": "高二（1）班"},
            {"学号": "z", "考号": "1003", "姓名": "王五", "班级": "高二（2）班"}
        ]"#,
    );

    let raw = load_path(&scores).expect("scores load");
    let roster = load_path(&roster).expect("roster loads");
    let output = run_pipeline(&raw, &roster).await.expect("pipeline runs");

    assert_eq!(output.identity_field, "考号");
    let names: Vec<_> = output
        .records
        .iter()
        .map(|record| record.merged.name.as_str())
        .collect();
    assert_eq!(names, vec!["张三", "李四", "王五"]);

    let first = &output.records[0];
    assert_eq!(first.merged.class, "1班");
    assert_eq!(first.scores.raw_total, 315.0);
    assert_eq!(first.scores.assigned_score("化学"), Some(100.0));
    assert_eq!(first.rank(RankScope::Cohort, RankMetric::RawTotal), Some(1));

    let absent = &output.records[2];
    assert_eq!(absent.scores.assigned_score("化学"), Some(40.0));
    assert_eq!(absent.rank(RankScope::Class, RankMetric::RawTotal), Some(1));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = TempDir::new().expect("temp dir");
    let err = load_path(dir.path().join("absent.csv")).expect_err("missing file");
    assert!(matches!(err, IngestError::Io(_)));
}

#[test]
fn json_scalar_document_is_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_file(&dir, "scores.json", "42");
    let err = load_path(&path).expect_err("scalar rejected");
    assert!(matches!(err, IngestError::NotAList(_)));
}

#[tokio::test]
async fn zero_padded_csv_ids_join_a_text_roster() {
    let dir = TempDir::new().expect("temp dir");
    let scores = write_file(&dir, "scores.csv", "考号,数学\n0012,90\n0013,80\n");
    let roster = write_file(
        &dir,
        "roster.json",
        r#"[{"考号": "0012", "姓名": "张三"}, {"考号": "0013", "姓名": "李四"}]"#,
    );

    let raw = load_path(&scores).expect("scores load");
    let roster = load_path(&roster).expect("roster loads");
    let output = run_pipeline(&raw, &roster).await.expect("pipeline runs");

    assert_eq!(output.records[0].merged.id, "0012");
    assert_eq!(output.records[0].merged.name, "张三");
    assert_eq!(output.records[1].merged.name, "李四");
    assert_eq!(output.records[0].scores.raw_total, 90.0);
}

#[tokio::test]
async fn long_numeric_ids_stay_distinct_and_unscored() {
    let dir = TempDir::new().expect("temp dir");
    let scores = write_file(
        &dir,
        "scores.csv",
        "身份证号,语文\n110101200501011234,90\n110101200501011235,80\n",
    );

    let raw = load_path(&scores).expect("scores load");
    let output = run_pipeline(&raw, &[]).await.expect("pipeline runs");

    assert_eq!(output.identity_field, "身份证号");
    assert_eq!(output.classification.subjects, vec!["语文"]);
    let ids: Vec<_> = output
        .records
        .iter()
        .map(|record| record.merged.id.as_str())
        .collect();
    assert_eq!(ids, vec!["110101200501011234", "110101200501011235"]);
}
