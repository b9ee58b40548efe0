//! Score aggregation and manual score entry.
//!
//! Auto-graded answers contribute their stored `points_earned`. Manually
//! graded answers (`is_correct == None`) contribute the teacher score when one
//! is recorded and in range, and nothing while grading is pending.
//!
//! Amounts are summed as whole hundredths of a point so the total does not
//! depend on the order answers are listed in.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GradingError;
use crate::model::{Answer, Id, Question, Submission, SubmissionStatus};
use crate::report::{AnswerGrade, GradePayload};

/// How an answer's points were determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradingMode {
    Auto,
    Manual,
}

/// The contribution of one answer to the total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreLine {
    pub answer_id: Id,
    pub question_id: Id,
    pub max_points: f64,
    pub earned: f64,
    pub mode: GradingMode,
    /// Manual answer without a usable teacher score.
    pub pending: bool,
}

/// Totals for one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub total_score: f64,
    pub max_score: f64,
    /// `None` when the questions are worth nothing.
    pub percentage: Option<f64>,
    pub auto_score: f64,
    pub manual_score: f64,
    pub pending_manual: usize,
    pub lines: Vec<ScoreLine>,
}

fn to_hundredths(points: f64) -> i64 {
    (points * 100.0).round() as i64
}

fn from_hundredths(hundredths: i64) -> f64 {
    hundredths as f64 / 100.0
}

/// Check a teacher-entered score against `[0, max]`.
pub fn validate_teacher_score(answer_id: Id, score: f64, max: f64) -> Result<f64, GradingError> {
    if score.is_finite() && (0.0..=max).contains(&score) {
        Ok(score)
    } else {
        Err(GradingError::OutOfRangeScore {
            answer_id,
            score,
            max,
        })
    }
}

/// Score a single answer against its question.
pub fn score_answer(question: &Question, answer: &Answer) -> ScoreLine {
    let max = question.points.max(0.0);

    if answer.is_manually_graded() {
        let accepted = answer
            .teacher_score
            .and_then(|s| match validate_teacher_score(answer.id, s, max) {
                Ok(score) => Some(score),
                Err(e) => {
                    tracing::warn!("ignoring stored teacher score: {e}");
                    None
                }
            });
        return ScoreLine {
            answer_id: answer.id,
            question_id: question.id,
            max_points: max,
            earned: accepted.unwrap_or(0.0),
            mode: GradingMode::Manual,
            pending: accepted.is_none(),
        };
    }

    let earned = answer.points_earned;
    let clamped = earned.clamp(0.0, max);
    if clamped != earned {
        tracing::warn!(
            answer_id = answer.id,
            earned,
            max,
            "auto-graded points outside question range, clamping"
        );
    }
    ScoreLine {
        answer_id: answer.id,
        question_id: question.id,
        max_points: max,
        earned: clamped,
        mode: GradingMode::Auto,
        pending: false,
    }
}

/// Fold all answers of a submission into a total and percentage.
///
/// The maximum runs over every question, answered or not. When a question
/// has several answers, the one with the lowest id counts. Answers to unknown
/// questions are ignored.
pub fn aggregate(questions: &[Question], answers: &[Answer]) -> ScoreSummary {
    let mut by_question: BTreeMap<Id, &Answer> = BTreeMap::new();
    for answer in answers {
        if !questions.iter().any(|q| q.id == answer.question) {
            tracing::warn!(
                answer_id = answer.id,
                question_id = answer.question,
                "answer references unknown question, not scored"
            );
            continue;
        }
        by_question
            .entry(answer.question)
            .and_modify(|kept| {
                if answer.id < kept.id {
                    *kept = answer;
                }
            })
            .or_insert(answer);
    }

    let mut lines = Vec::new();
    let (mut auto, mut manual, mut max) = (0i64, 0i64, 0i64);
    let mut pending_manual = 0;

    for question in questions {
        max += to_hundredths(question.points.max(0.0));
        let Some(answer) = by_question.get(&question.id) else {
            continue;
        };
        let line = score_answer(question, answer);
        match line.mode {
            GradingMode::Auto => auto += to_hundredths(line.earned),
            GradingMode::Manual => manual += to_hundredths(line.earned),
        }
        if line.pending {
            pending_manual += 1;
        }
        lines.push(line);
    }

    let total = auto + manual;
    let percentage = if max > 0 {
        Some((total as f64 * 100.0 / max as f64).clamp(0.0, 100.0))
    } else {
        None
    };

    ScoreSummary {
        total_score: from_hundredths(total),
        max_score: from_hundredths(max),
        percentage,
        auto_score: from_hundredths(auto),
        manual_score: from_hundredths(manual),
        pending_manual,
        lines,
    }
}

/// One grader entry for an answer, as read from a score sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub answer_id: Id,
    #[serde(default, with = "crate::model::decimal::option")]
    pub teacher_score: Option<f64>,
    #[serde(default)]
    pub teacher_feedback: Option<String>,
}

/// Manual grading over one submission.
///
/// Every entry is validated before it touches the submission; a rejected
/// entry leaves the sheet exactly as it was.
#[derive(Debug, Clone)]
pub struct GradingSheet {
    submission: Submission,
    overall_feedback: Option<String>,
}

impl GradingSheet {
    pub fn new(submission: Submission) -> Self {
        let overall_feedback = submission.teacher_feedback.clone();
        Self {
            submission,
            overall_feedback,
        }
    }

    pub fn submission(&self) -> &Submission {
        &self.submission
    }

    fn max_points_for(&self, answer_id: Id) -> Result<(usize, f64), GradingError> {
        let index = self
            .submission
            .answers
            .iter()
            .position(|a| a.id == answer_id)
            .ok_or(GradingError::UnknownAnswer(answer_id))?;
        let answer = &self.submission.answers[index];
        let question = self
            .submission
            .question(answer.question)
            .ok_or(GradingError::UnknownAnswer(answer_id))?;
        Ok((index, question.points.max(0.0)))
    }

    fn check_score(&self, answer_id: Id, score: f64) -> Result<(usize, f64), GradingError> {
        let (index, max) = self.max_points_for(answer_id)?;
        if !self.submission.answers[index].is_manually_graded() {
            return Err(GradingError::NotManuallyGraded(answer_id));
        }
        validate_teacher_score(answer_id, score, max).map(|s| (index, s))
    }

    /// Record a teacher score for a manually graded answer.
    pub fn enter_score(&mut self, answer_id: Id, score: f64) -> Result<(), GradingError> {
        let (index, score) = self.check_score(answer_id, score)?;
        self.submission.answers[index].teacher_score = Some(score);
        Ok(())
    }

    /// Return a manually graded answer to the pending state.
    pub fn clear_score(&mut self, answer_id: Id) -> Result<(), GradingError> {
        let (index, _) = self.max_points_for(answer_id)?;
        self.submission.answers[index].teacher_score = None;
        Ok(())
    }

    /// Attach feedback to any answer.
    pub fn enter_feedback(
        &mut self,
        answer_id: Id,
        feedback: impl Into<String>,
    ) -> Result<(), GradingError> {
        let (index, _) = self.max_points_for(answer_id)?;
        let feedback = feedback.into();
        self.submission.answers[index].teacher_feedback =
            (!feedback.trim().is_empty()).then_some(feedback);
        Ok(())
    }

    pub fn set_overall_feedback(&mut self, feedback: impl Into<String>) {
        let feedback = feedback.into();
        self.overall_feedback = (!feedback.trim().is_empty()).then_some(feedback);
    }

    /// Apply a batch of entries, all or nothing.
    ///
    /// Returns every validation error found; nothing is applied if any entry
    /// is invalid.
    pub fn apply_entries(&mut self, entries: &[ScoreEntry]) -> Result<(), Vec<GradingError>> {
        let errors: Vec<GradingError> = entries
            .iter()
            .filter_map(|entry| match entry.teacher_score {
                Some(score) => self.check_score(entry.answer_id, score).err(),
                None => self.max_points_for(entry.answer_id).err(),
            })
            .collect();
        if !errors.is_empty() {
            return Err(errors);
        }

        for entry in entries {
            if let Some(score) = entry.teacher_score {
                self.enter_score(entry.answer_id, score)
                    .map_err(|e| vec![e])?;
            }
            if let Some(feedback) = &entry.teacher_feedback {
                self.enter_feedback(entry.answer_id, feedback.as_str())
                    .map_err(|e| vec![e])?;
            }
        }
        Ok(())
    }

    pub fn summary(&self) -> ScoreSummary {
        aggregate(&self.submission.questions, &self.submission.answers)
    }

    /// Close grading and build the payload for the grade collaborator.
    pub fn finish(self) -> GradePayload {
        self.finish_at(Utc::now())
    }

    pub fn finish_at(self, graded_at: DateTime<Utc>) -> GradePayload {
        let summary = self.summary();
        let has_manual = self
            .submission
            .answers
            .iter()
            .any(Answer::is_manually_graded);

        GradePayload {
            submission_id: self.submission.id,
            total_score: summary.total_score,
            max_score: summary.max_score,
            percentage: summary.percentage,
            manual_score: has_manual.then_some(summary.manual_score),
            teacher_feedback: self.overall_feedback,
            answers: self
                .submission
                .answers
                .iter()
                .map(|a| AnswerGrade {
                    answer_id: a.id,
                    teacher_score: a.teacher_score,
                    teacher_feedback: a.teacher_feedback.clone(),
                })
                .collect(),
            status: SubmissionStatus::Graded,
            graded_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionType;

    fn question(id: Id, question_type: QuestionType, points: f64) -> Question {
        Question {
            id,
            question_type,
            question_text: String::new(),
            points,
            choices: vec![],
            blanks: vec![],
            ordering_items: vec![],
            matching_pairs: vec![],
        }
    }

    fn auto(id: Id, question: Id, earned: f64) -> Answer {
        let mut a = Answer::new(id, question);
        a.is_correct = Some(earned > 0.0);
        a.points_earned = earned;
        a
    }

    fn manual(id: Id, question: Id, score: Option<f64>) -> Answer {
        let mut a = Answer::new(id, question);
        a.teacher_score = score;
        a
    }

    fn submission() -> Submission {
        Submission {
            id: 100,
            student: None,
            status: SubmissionStatus::Submitted,
            questions: vec![
                question(1, QuestionType::QcmSingle, 5.0),
                question(2, QuestionType::OpenLong, 5.0),
            ],
            answers: vec![auto(10, 1, 3.0), manual(20, 2, None)],
            teacher_feedback: None,
        }
    }

    #[test]
    fn auto_plus_manual() {
        let questions = submission().questions;
        let summary = aggregate(&questions, &[auto(10, 1, 3.0), manual(20, 2, Some(4.0))]);
        assert_eq!(summary.total_score, 7.0);
        assert_eq!(summary.max_score, 10.0);
        assert_eq!(summary.percentage, Some(70.0));
        assert_eq!(summary.auto_score, 3.0);
        assert_eq!(summary.manual_score, 4.0);
        assert_eq!(summary.pending_manual, 0);
    }

    #[test]
    fn pending_manual_counts_zero() {
        let s = submission();
        let summary = aggregate(&s.questions, &s.answers);
        assert_eq!(summary.total_score, 3.0);
        assert_eq!(summary.pending_manual, 1);
        assert!(summary.lines[1].pending);
    }

    #[test]
    fn stored_out_of_range_teacher_score_is_pending() {
        let s = submission();
        let summary = aggregate(&s.questions, &[manual(20, 2, Some(6.0))]);
        assert_eq!(summary.total_score, 0.0);
        assert_eq!(summary.pending_manual, 1);
    }

    #[test]
    fn zero_point_assessment_has_no_percentage() {
        let questions = [question(1, QuestionType::OpenShort, 0.0)];
        let summary = aggregate(&questions, &[manual(1, 1, None)]);
        assert_eq!(summary.percentage, None);
    }

    #[test]
    fn unanswered_questions_still_count_towards_max() {
        let s = submission();
        let summary = aggregate(&s.questions, &[auto(10, 1, 5.0)]);
        assert_eq!(summary.max_score, 10.0);
        assert_eq!(summary.percentage, Some(50.0));
    }

    #[test]
    fn auto_points_are_clamped() {
        let questions = [question(1, QuestionType::Ordering, 2.0)];
        let summary = aggregate(&questions, &[auto(1, 1, 3.5)]);
        assert_eq!(summary.total_score, 2.0);
    }

    #[test]
    fn duplicate_answers_keep_lowest_id() {
        let questions = [question(1, QuestionType::TrueFalse, 1.0)];
        let a = aggregate(&questions, &[auto(9, 1, 0.0), auto(4, 1, 1.0)]);
        let b = aggregate(&questions, &[auto(4, 1, 1.0), auto(9, 1, 0.0)]);
        assert_eq!(a.total_score, 1.0);
        assert_eq!(a, b);
    }

    #[test]
    fn enter_score_rejects_out_of_range() {
        let mut sheet = GradingSheet::new(submission());
        let err = sheet.enter_score(20, 6.0).unwrap_err();
        assert_eq!(
            err,
            GradingError::OutOfRangeScore {
                answer_id: 20,
                score: 6.0,
                max: 5.0
            }
        );
        assert_eq!(sheet.submission().answer(20).unwrap().teacher_score, None);
        assert_eq!(sheet.summary().total_score, 3.0);

        sheet.enter_score(20, 4.0).unwrap();
        assert_eq!(sheet.summary().total_score, 7.0);
    }

    #[test]
    fn enter_score_rejects_nan_and_negative() {
        let mut sheet = GradingSheet::new(submission());
        assert!(sheet.enter_score(20, f64::NAN).is_err());
        assert!(sheet.enter_score(20, -0.5).is_err());
    }

    #[test]
    fn enter_score_on_auto_answer_is_refused() {
        let mut sheet = GradingSheet::new(submission());
        assert_eq!(
            sheet.enter_score(10, 1.0),
            Err(GradingError::NotManuallyGraded(10))
        );
        assert_eq!(sheet.enter_score(99, 1.0), Err(GradingError::UnknownAnswer(99)));
    }

    #[test]
    fn apply_entries_is_all_or_nothing() {
        let mut sheet = GradingSheet::new(submission());
        let entries = [
            ScoreEntry {
                answer_id: 10,
                teacher_score: None,
                teacher_feedback: Some("Good".into()),
            },
            ScoreEntry {
                answer_id: 20,
                teacher_score: Some(9.0),
                teacher_feedback: None,
            },
        ];
        let errors = sheet.apply_entries(&entries).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(sheet.submission().answer(10).unwrap().teacher_feedback.is_none());
    }

    #[test]
    fn finish_builds_graded_payload() {
        let mut sheet = GradingSheet::new(submission());
        sheet.enter_score(20, 4.5).unwrap();
        sheet.enter_feedback(20, "Clear reasoning").unwrap();
        sheet.set_overall_feedback("Well done");
        let payload = sheet.finish();
        assert_eq!(payload.status, SubmissionStatus::Graded);
        assert_eq!(payload.total_score, 7.5);
        assert_eq!(payload.manual_score, Some(4.5));
        assert_eq!(payload.teacher_feedback.as_deref(), Some("Well done"));
        assert_eq!(payload.answers.len(), 2);
        assert_eq!(
            payload.answers[1].teacher_feedback.as_deref(),
            Some("Clear reasoning")
        );
    }
}
