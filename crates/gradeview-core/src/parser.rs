//! Submission, score sheet and config loading.
//!
//! Loads grading-submission exports (JSON), grader score sheets (TOML) and the
//! review config, and checks a submission for authoring problems.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::engine::ReviewConfig;
use crate::model::{Id, Question, QuestionType, Submission};
use crate::scoring::ScoreEntry;

/// Parse a submission export from a JSON file.
pub fn load_submission(path: &Path) -> Result<Submission> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read submission file: {}", path.display()))?;

    parse_submission_str(&content, path)
}

/// Parse a submission export from a JSON string (useful for testing).
pub fn parse_submission_str(content: &str, source_path: &Path) -> Result<Submission> {
    serde_json::from_str(content)
        .with_context(|| format!("failed to parse submission JSON: {}", source_path.display()))
}

/// Intermediate TOML structure for score sheets.
#[derive(Debug, Deserialize)]
struct TomlScoreSheet {
    #[serde(default)]
    feedback: Option<String>,
    #[serde(default)]
    entries: Vec<ScoreEntry>,
}

/// Grader input for one submission.
#[derive(Debug, Clone, Default)]
pub struct ScoreSheet {
    pub feedback: Option<String>,
    pub entries: Vec<ScoreEntry>,
}

/// Load a score sheet from a TOML file.
pub fn load_score_sheet(path: &Path) -> Result<ScoreSheet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read score sheet: {}", path.display()))?;
    parse_score_sheet_str(&content, path)
}

pub fn parse_score_sheet_str(content: &str, source_path: &Path) -> Result<ScoreSheet> {
    let parsed: TomlScoreSheet = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;
    Ok(ScoreSheet {
        feedback: parsed.feedback,
        entries: parsed.entries,
    })
}

/// Load config from an explicit path, `gradeview.toml` in the current
/// directory, or defaults, in that order.
///
/// Environment variable override: `GRADEVIEW_PARALLELISM`.
pub fn load_config_from(path: Option<&Path>) -> Result<ReviewConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => Some(PathBuf::from("gradeview.toml")).filter(|p| p.exists()),
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<ReviewConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ReviewConfig::default(),
    };

    if let Ok(value) = std::env::var("GRADEVIEW_PARALLELISM") {
        config.parallelism = value
            .trim()
            .parse()
            .with_context(|| format!("invalid GRADEVIEW_PARALLELISM: {value:?}"))?;
    }
    anyhow::ensure!(config.parallelism >= 1, "parallelism must be at least 1");

    Ok(config)
}

/// A warning from submission validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<Id>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn question(id: Id, message: impl Into<String>) -> Self {
        Self {
            question_id: Some(id),
            message: message.into(),
        }
    }
}

fn missing_substructure(question: &Question) -> Option<&'static str> {
    match question.question_type {
        t if t.uses_choices() && question.choices.is_empty() => Some("choices"),
        QuestionType::FillBlank if question.blanks.is_empty() => Some("blanks"),
        QuestionType::Ordering if question.ordering_items.is_empty() => Some("ordering items"),
        QuestionType::Matching if question.matching_pairs.is_empty() => Some("matching pairs"),
        _ => None,
    }
}

/// Validate a submission for common authoring and export issues.
pub fn validate_submission(submission: &Submission) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    // Check for duplicate question IDs
    let mut seen_questions = HashSet::new();
    for question in &submission.questions {
        if !seen_questions.insert(question.id) {
            warnings.push(ValidationWarning::question(
                question.id,
                format!("duplicate question ID: {}", question.id),
            ));
        }
    }

    for question in &submission.questions {
        if let Some(expected) = missing_substructure(question) {
            warnings.push(ValidationWarning::question(
                question.id,
                format!("{} question has no {expected}", question.question_type),
            ));
        }

        if question.points < 0.0 {
            warnings.push(ValidationWarning::question(
                question.id,
                "points must not be negative",
            ));
        }

        let mut blank_ids = HashSet::new();
        for blank in &question.blanks {
            if !blank_ids.insert(blank.id) {
                warnings.push(ValidationWarning::question(
                    question.id,
                    format!("duplicate blank ID: {}", blank.id),
                ));
            }
        }

        if !question.ordering_items.is_empty() {
            let mut positions: Vec<u32> = question
                .ordering_items
                .iter()
                .map(|i| i.correct_position)
                .collect();
            positions.sort_unstable();
            let expected: Vec<u32> = (1..=positions.len() as u32).collect();
            if positions != expected {
                warnings.push(ValidationWarning::question(
                    question.id,
                    format!("correct positions {positions:?} are not a permutation of 1..={}", expected.len()),
                ));
            }
        }
    }

    // Check answers against their questions
    let mut answers_per_question: HashMap<Id, usize> = HashMap::new();
    for answer in &submission.answers {
        let Some(question) = submission.question(answer.question) else {
            warnings.push(ValidationWarning {
                question_id: None,
                message: format!(
                    "answer {} references unknown question {}",
                    answer.id, answer.question
                ),
            });
            continue;
        };
        *answers_per_question.entry(question.id).or_default() += 1;

        let manual = question.question_type.is_manually_graded();
        if manual != answer.is_manually_graded() {
            warnings.push(ValidationWarning::question(
                question.id,
                format!(
                    "answer {}: is_correct is {} but {} is {}",
                    answer.id,
                    if answer.is_manually_graded() { "null" } else { "set" },
                    question.question_type,
                    if manual { "manually graded" } else { "auto-graded" }
                ),
            ));
        }

        if let Some(score) = answer.teacher_score {
            if !(0.0..=question.points).contains(&score) {
                warnings.push(ValidationWarning::question(
                    question.id,
                    format!(
                        "answer {}: teacher score {score} outside 0..={}",
                        answer.id, question.points
                    ),
                ));
            }
        }
    }

    let mut duplicated: Vec<_> = answers_per_question
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .collect();
    duplicated.sort_unstable();
    for (question_id, count) in duplicated {
        warnings.push(ValidationWarning::question(
            question_id,
            format!("{count} answers submitted; only the lowest answer ID is scored"),
        ));
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUBMISSION_JSON: &str = r#"{
        "id": 42,
        "questions": [
            {
                "id": 1,
                "question_type": "fill_blank",
                "question_text": "Water boils at [B1] degrees",
                "points": 5,
                "blanks": [
                    {"id": 5, "order": 1, "options": [
                        {"id": 9, "option_text": "100", "is_correct": true},
                        {"id": 10, "option_text": "90", "is_correct": false}
                    ]}
                ]
            },
            {
                "id": 2,
                "question_type": "open_long",
                "question_text": "Explain",
                "points": "5.00"
            }
        ],
        "answers": [
            {"id": 11, "question": 1, "is_correct": false, "points_earned": 0,
             "blank_selections": [{"blank": 5, "selected_option": 10}]},
            {"id": 12, "question": 2, "is_correct": null, "points_earned": 0,
             "text_answer": "Because"}
        ]
    }"#;

    #[test]
    fn parse_valid_submission() {
        let submission = parse_submission_str(SUBMISSION_JSON, Path::new("test.json")).unwrap();
        assert_eq!(submission.id, 42);
        assert_eq!(submission.questions.len(), 2);
        assert_eq!(submission.answers[0].blank_selections[0].selected_option, Some(10));
        assert!(validate_submission(&submission).is_empty());
    }

    #[test]
    fn parse_malformed_json() {
        let result = parse_submission_str("{ not json", Path::new("bad.json"));
        assert!(result.is_err());
    }

    #[test]
    fn validate_reports_authoring_problems() {
        let mut submission =
            parse_submission_str(SUBMISSION_JSON, Path::new("test.json")).unwrap();
        let blank = submission.questions[0].blanks[0].clone();
        submission.questions[0].blanks.push(blank);
        submission.answers[1].is_correct = Some(true);
        submission.answers[1].teacher_score = Some(8.0);

        let warnings = validate_submission(&submission);
        assert!(warnings.iter().any(|w| w.message.contains("duplicate blank")));
        assert!(warnings.iter().any(|w| w.message.contains("is_correct is set")));
        assert!(warnings.iter().any(|w| w.message.contains("teacher score 8")));
    }

    #[test]
    fn validate_ordering_permutation() {
        let json = r#"{
            "id": 1,
            "questions": [{
                "id": 3, "question_type": "ordering", "points": 1,
                "ordering_items": [
                    {"id": 1, "text": "a", "correct_position": 1},
                    {"id": 2, "text": "b", "correct_position": 3}
                ]
            }]
        }"#;
        let submission = parse_submission_str(json, Path::new("t.json")).unwrap();
        let warnings = validate_submission(&submission);
        assert!(warnings.iter().any(|w| w.message.contains("not a permutation")));
    }

    #[test]
    fn validate_missing_substructure_and_duplicates() {
        let json = r#"{
            "id": 1,
            "questions": [{"id": 3, "question_type": "matching", "points": 1}],
            "answers": [
                {"id": 1, "question": 3, "is_correct": false},
                {"id": 2, "question": 3, "is_correct": false},
                {"id": 3, "question": 8, "is_correct": false}
            ]
        }"#;
        let submission = parse_submission_str(json, Path::new("t.json")).unwrap();
        let warnings = validate_submission(&submission);
        assert!(warnings.iter().any(|w| w.message.contains("no matching pairs")));
        assert!(warnings.iter().any(|w| w.message.contains("2 answers submitted")));
        assert!(warnings.iter().any(|w| w.message.contains("unknown question 8")));
    }

    #[test]
    fn parse_score_sheet() {
        let toml = r#"
feedback = "Solid work"

[[entries]]
answer_id = 12
teacher_score = 4
teacher_feedback = "Good explanation"

[[entries]]
answer_id = 11
teacher_feedback = "Check the boiling point"
"#;
        let sheet = parse_score_sheet_str(toml, Path::new("scores.toml")).unwrap();
        assert_eq!(sheet.feedback.as_deref(), Some("Solid work"));
        assert_eq!(sheet.entries.len(), 2);
        assert_eq!(sheet.entries[0].teacher_score, Some(4.0));
        assert_eq!(sheet.entries[1].teacher_score, None);
    }

    #[test]
    fn load_submission_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("submission.json");
        std::fs::write(&path, SUBMISSION_JSON).unwrap();

        let submission = load_submission(&path).unwrap();
        assert_eq!(submission.id, 42);
        assert!(load_submission(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn config_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gradeview.toml");
        std::fs::write(&path, "unanswered_placeholder = \"...\"\n").unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.unanswered_placeholder, "...");
        assert_eq!(config.correct_answer_separator, " / ");
        assert!(load_config_from(Some(&dir.path().join("nope.toml"))).is_err());
    }
}
