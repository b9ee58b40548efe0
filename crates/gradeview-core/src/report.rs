//! Write-side grade payload and review summaries.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::SubmissionReview;
use crate::model::{Id, SubmissionStatus};
use crate::scoring::GradingMode;

/// What the grade collaborator receives when grading is finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradePayload {
    pub submission_id: Id,
    pub total_score: f64,
    pub max_score: f64,
    pub percentage: Option<f64>,
    /// Sum of teacher scores, present when the submission has manual answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_feedback: Option<String>,
    pub answers: Vec<AnswerGrade>,
    pub status: SubmissionStatus,
    pub graded_at: DateTime<Utc>,
}

/// Per-answer grading fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerGrade {
    pub answer_id: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_feedback: Option<String>,
}

impl GradePayload {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize grade payload")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("failed to parse grade payload JSON")
    }
}

fn format_percentage(percentage: Option<f64>) -> String {
    percentage.map_or_else(|| "n/a".to_string(), |p| format!("{p:.1}%"))
}

impl SubmissionReview {
    /// Format the score breakdown as markdown.
    pub fn to_markdown(&self) -> String {
        let score = &self.score;
        let mut md = String::new();

        md.push_str(&format!(
            "**Submission {}:** {} / {} ({})\n\n",
            self.submission_id,
            score.total_score,
            score.max_score,
            format_percentage(score.percentage)
        ));

        md.push_str("| Question | Type | Mode | Points | Correct | Incorrect | Unanswered |\n");
        md.push_str("|----------|------|------|--------|---------|-----------|------------|\n");
        for q in &self.questions {
            let line = score.lines.iter().find(|l| l.question_id == q.question_id);
            let points = match line {
                Some(l) if l.pending => format!("pending / {}", l.max_points),
                Some(l) => format!("{} / {}", l.earned, l.max_points),
                None => format!("- / {}", q.points),
            };
            let mode = match line.map(|l| l.mode) {
                Some(GradingMode::Auto) => "auto",
                Some(GradingMode::Manual) => "manual",
                None => "-",
            };
            let (correct, incorrect, unanswered) = q.reconciled.tally();
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} |\n",
                q.question_id, q.question_type, mode, points, correct, incorrect, unanswered
            ));
        }

        if !self.warnings.is_empty() {
            md.push_str("\n### Warnings\n\n");
            for w in &self.warnings {
                md.push_str(&format!("- {w}\n"));
            }
        }

        md
    }

    /// Returns true if any answer still waits for a teacher score.
    pub fn has_pending(&self) -> bool {
        self.score.pending_manual > 0
    }
}
