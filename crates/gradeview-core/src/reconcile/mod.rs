//! Per-variant reconcilers.
//!
//! Each submodule turns a (question schema, submitted answer) pair into a
//! normalized view where every checkable unit is `correct`, `incorrect` or
//! `unanswered`. [`reconcile`] is the only place that looks at the question
//! type tag.

pub mod choice;
pub mod fill_blank;
pub mod matching;
pub mod open;
pub mod ordering;

use serde::Serialize;

use crate::engine::ReviewConfig;
use crate::error::ReconcileWarning;
use crate::model::{Answer, ElementState, Question, QuestionType};

pub use choice::{ChoiceReview, ChoiceView};
pub use fill_blank::{BlankView, FillBlankReview};
pub use matching::{MatchingReview, RightSlot};
pub use open::OpenReview;
pub use ordering::{OrderingReview, OrderingRow};

/// The normalized view of one answer, by variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum Reconciled {
    Choice(ChoiceReview),
    Open(OpenReview),
    FillBlank(FillBlankReview),
    Ordering(OrderingReview),
    Matching(MatchingReview),
}

impl Reconciled {
    pub fn warnings(&self) -> &[ReconcileWarning] {
        match self {
            Reconciled::Choice(r) => &r.warnings,
            Reconciled::Open(_) => &[],
            Reconciled::FillBlank(r) => &r.warnings,
            Reconciled::Ordering(r) => &r.warnings,
            Reconciled::Matching(r) => &r.warnings,
        }
    }

    /// Counts of (correct, incorrect, unanswered) units. Open answers only
    /// count when nothing was written.
    pub fn tally(&self) -> (usize, usize, usize) {
        let states: Vec<ElementState> = match self {
            Reconciled::Choice(r) => r
                .choices
                .iter()
                .filter(|c| c.selected || c.missed)
                .map(|c| if c.missed { ElementState::Unanswered } else { c.state })
                .collect(),
            Reconciled::Open(r) if r.response.is_none() => vec![ElementState::Unanswered],
            Reconciled::Open(_) => vec![],
            Reconciled::FillBlank(r) => r.submitted.values().map(|v| v.state).collect(),
            Reconciled::Ordering(r) => r.rows.iter().map(|row| row.state).collect(),
            Reconciled::Matching(r) => r.left.values().copied().collect(),
        };

        states.iter().fold((0, 0, 0), |(c, i, u), s| match s {
            ElementState::Correct => (c + 1, i, u),
            ElementState::Incorrect => (c, i + 1, u),
            ElementState::Unanswered => (c, i, u + 1),
        })
    }
}

/// Reconcile one question against its answer, if any.
///
/// A missing answer reconciles exactly like an empty one.
pub fn reconcile(question: &Question, answer: Option<&Answer>, config: &ReviewConfig) -> Reconciled {
    let empty = Answer::new(0, question.id);
    let submitted = answer.unwrap_or(&empty);

    match question.question_type {
        QuestionType::QcmSingle | QuestionType::QcmMultiple | QuestionType::TrueFalse => {
            Reconciled::Choice(choice::reconcile(
                question,
                &submitted.selected_choices,
                submitted.is_correct,
            ))
        }
        QuestionType::OpenShort | QuestionType::OpenLong => {
            Reconciled::Open(open::reconcile(question, answer))
        }
        QuestionType::FillBlank => Reconciled::FillBlank(fill_blank::reconcile(
            question,
            &submitted.blank_selections,
            &config.unanswered_placeholder,
            &config.correct_answer_separator,
        )),
        QuestionType::Ordering => Reconciled::Ordering(ordering::reconcile(
            question,
            &submitted.ordering_selections,
        )),
        QuestionType::Matching => Reconciled::Matching(matching::reconcile(
            question,
            &submitted.matching_selections,
        )),
    }
}
