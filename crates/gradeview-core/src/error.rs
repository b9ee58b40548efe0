//! Error and warning types.
//!
//! Two families live here. [`GradingError`] is the hard kind: it is raised when
//! a grader enters something that must be corrected before the submission can
//! be aggregated. [`ReconcileWarning`] is the soft kind: malformed authoring or
//! dangling references degrade to an "unanswered" view and are reported
//! alongside the review instead of aborting it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Id;

/// Errors surfaced to the grader when manual grading input is invalid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradingError {
    /// A teacher score outside `[0, max]` (or not a finite number).
    #[error("score {score} for answer {answer_id} is outside the allowed range 0..={max}")]
    OutOfRangeScore { answer_id: Id, score: f64, max: f64 },

    /// The answer id is not part of the submission being graded.
    #[error("answer {0} does not belong to this submission")]
    UnknownAnswer(Id),

    /// A score was entered for an answer whose points are computed automatically.
    #[error("answer {0} is auto-graded; only feedback can be entered")]
    NotManuallyGraded(Id),
}

impl GradingError {
    /// Returns the answer the error is about.
    pub fn answer_id(&self) -> Id {
        match self {
            GradingError::OutOfRangeScore { answer_id, .. } => *answer_id,
            GradingError::UnknownAnswer(id) | GradingError::NotManuallyGraded(id) => *id,
        }
    }
}

/// Which schema collection a dangling reference pointed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Question,
    Choice,
    Blank,
    Option,
    OrderingItem,
    MatchingPair,
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReferenceKind::Question => "question",
            ReferenceKind::Choice => "choice",
            ReferenceKind::Blank => "blank",
            ReferenceKind::Option => "option",
            ReferenceKind::OrderingItem => "ordering item",
            ReferenceKind::MatchingPair => "matching pair",
        };
        f.write_str(name)
    }
}

/// Non-fatal problems found while reconciling an answer.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconcileWarning {
    /// A selection references an id absent from the question schema.
    #[error("question {question_id}: selection references unknown {reference} {id}")]
    MissingReference {
        question_id: Id,
        reference: ReferenceKind,
        id: Id,
    },

    /// A `[token]` placeholder matched no blank and was kept as literal text.
    #[error("question {question_id}: placeholder [{token}] matches no blank")]
    UnresolvedToken { question_id: Id, token: String },

    /// The sub-structure the question type needs is absent.
    #[error("question {question_id}: no {expected} defined for this question type")]
    IncompleteData {
        question_id: Id,
        expected: String,
    },

    /// More than one selection targets the same schema element; the first wins.
    #[error("question {question_id}: {reference} {id} selected more than once")]
    DuplicateReference {
        question_id: Id,
        reference: ReferenceKind,
        id: Id,
    },
}
