//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn gradeview() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("gradeview").unwrap()
}

#[test]
fn review_prints_table_and_total() {
    gradeview()
        .arg("review")
        .arg("--submission")
        .arg("../../fixtures/submission-basic.json")
        .assert()
        .success()
        .stdout(predicate::str::contains("Submission 500"))
        .stdout(predicate::str::contains("fill_blank"))
        .stdout(predicate::str::contains("Total: 5.5 / 14 (39.3%)"))
        .stdout(predicate::str::contains(
            "[Q1] Water boils at [90] degrees and freezes at [0].",
        ));
}

#[test]
fn review_with_config_file() {
    gradeview()
        .arg("review")
        .arg("--submission")
        .arg("../../fixtures/submission-basic.json")
        .arg("--config")
        .arg("../../fixtures/gradeview.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 pending"));
}

#[test]
fn review_json_includes_connectors() {
    let output = gradeview()
        .arg("review")
        .arg("--submission")
        .arg("../../fixtures/submission-basic.json")
        .arg("--boxes")
        .arg("../../fixtures/boxes.json")
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["submission_id"], 500);
    assert_eq!(json["score"]["total_score"], 5.5);
    assert_eq!(json["questions"].as_array().unwrap().len(), 6);
    assert_eq!(json["questions"][0]["reconciled"]["variant"], "fill_blank");

    let connectors = json["connectors"]["3"].as_array().unwrap();
    assert_eq!(connectors.len(), 2);
    assert_eq!(connectors[0]["exit_point"]["x"], 120.0);
    assert_eq!(connectors[0]["entry_point"]["y"], 80.0);
}

#[test]
fn review_markdown() {
    gradeview()
        .arg("review")
        .arg("--submission")
        .arg("../../fixtures/submission-basic.json")
        .arg("--format")
        .arg("markdown")
        .assert()
        .success()
        .stdout(predicate::str::contains("**Submission 500:**"))
        .stdout(predicate::str::contains("| 6 | open_long | manual | pending / 5 |"));
}

#[test]
fn review_reports_warnings() {
    gradeview()
        .arg("review")
        .arg("--submission")
        .arg("../../fixtures/submission-broken.json")
        .assert()
        .success()
        .stdout(predicate::str::contains("Warnings:"))
        .stdout(predicate::str::contains("placeholder [B9] matches no blank"))
        .stdout(predicate::str::contains("unknown blank 77"));
}

#[test]
fn review_flags_out_of_range_teacher_score() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("submission.json");
    std::fs::write(
        &path,
        r#"{
            "id": 9,
            "questions": [{"id": 1, "question_type": "open_short", "points": 5}],
            "answers": [{"id": 10, "question": 1, "is_correct": null,
                         "text_answer": "Evaporation", "teacher_score": 6}]
        }"#,
    )
    .unwrap();

    gradeview()
        .arg("review")
        .arg("--submission")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("score 6 out of range"))
        .stdout(predicate::str::contains("pending / 5"));
}

#[test]
fn review_missing_config_fails() {
    gradeview()
        .arg("review")
        .arg("--submission")
        .arg("../../fixtures/submission-basic.json")
        .arg("--config")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn grade_emits_payload() {
    let output = gradeview()
        .arg("grade")
        .arg("--submission")
        .arg("../../fixtures/submission-basic.json")
        .arg("--scores")
        .arg("../../fixtures/scores.toml")
        .output()
        .unwrap();
    assert!(output.status.success());

    let payload: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(payload["status"], "graded");
    assert_eq!(payload["total_score"], 9.5);
    assert_eq!(payload["manual_score"], 4.0);
    assert_eq!(
        payload["teacher_feedback"],
        "Good work overall, review the boiling point."
    );
    assert!(payload["graded_at"].is_string());
}

#[test]
fn grade_feedback_flag_overrides_sheet() {
    gradeview()
        .arg("grade")
        .arg("--submission")
        .arg("../../fixtures/submission-basic.json")
        .arg("--scores")
        .arg("../../fixtures/scores.toml")
        .arg("--feedback")
        .arg("See me after class")
        .assert()
        .success()
        .stdout(predicate::str::contains("See me after class"));
}

#[test]
fn grade_rejects_out_of_range_scores() {
    gradeview()
        .arg("grade")
        .arg("--submission")
        .arg("../../fixtures/submission-basic.json")
        .arg("--scores")
        .arg("../../fixtures/scores-out-of-range.toml")
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("outside the allowed range 0..=5"))
        .stderr(predicate::str::contains("answer 104 is auto-graded"))
        .stderr(predicate::str::contains("2 invalid score entries"));
}

#[test]
fn validate_clean_submission() {
    gradeview()
        .arg("validate")
        .arg("--submission")
        .arg("../../fixtures/submission-basic.json")
        .assert()
        .success()
        .stdout(predicate::str::contains("6 questions, 6 answers"))
        .stdout(predicate::str::contains("Submission valid."));
}

#[test]
fn validate_reports_problems() {
    gradeview()
        .arg("validate")
        .arg("--submission")
        .arg("../../fixtures/submission-broken.json")
        .assert()
        .success()
        .stdout(predicate::str::contains("duplicate blank ID: 5"))
        .stdout(predicate::str::contains("not a permutation"))
        .stdout(predicate::str::contains("matching question has no matching pairs"))
        .stdout(predicate::str::contains("unknown question 9"))
        .stdout(predicate::str::contains("2 answers submitted"));
}

#[test]
fn validate_malformed_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, "{ \"id\": ").unwrap();

    gradeview()
        .arg("validate")
        .arg("--submission")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse submission JSON"));
}

#[test]
fn validate_nonexistent_file() {
    gradeview()
        .arg("validate")
        .arg("--submission")
        .arg("nonexistent.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}
