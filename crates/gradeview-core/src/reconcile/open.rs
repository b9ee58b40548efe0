//! Short and long open-text answers.

use serde::{Deserialize, Serialize};

use crate::model::{Answer, Question};
use crate::scoring::validate_teacher_score;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenReview {
    /// Trimmed answer text; `None` when nothing was written.
    pub response: Option<String>,
    pub teacher_score: Option<f64>,
    pub teacher_feedback: Option<String>,
    /// No usable teacher score: none recorded, or the stored one is out of range.
    pub pending: bool,
    /// The stored teacher score falls outside `[0, points]` and is not counted.
    pub score_out_of_range: bool,
}

pub(crate) fn reconcile(question: &Question, answer: Option<&Answer>) -> OpenReview {
    let response = answer
        .and_then(|a| a.text_answer.as_deref())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);
    let teacher_score = answer.and_then(|a| a.teacher_score);
    let accepted = match (answer, teacher_score) {
        (Some(a), Some(score)) => {
            validate_teacher_score(a.id, score, question.points.max(0.0)).ok()
        }
        _ => None,
    };

    OpenReview {
        response,
        teacher_score,
        teacher_feedback: answer.and_then(|a| a.teacher_feedback.clone()),
        pending: accepted.is_none(),
        score_out_of_range: teacher_score.is_some() && accepted.is_none(),
    }
}
