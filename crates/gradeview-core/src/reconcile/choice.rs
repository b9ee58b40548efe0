//! Single, multiple and true/false choice reconciliation.

use serde::{Deserialize, Serialize};

use crate::error::{ReconcileWarning, ReferenceKind};
use crate::model::{Choice, ElementState, Id, Question};

/// One schema choice as the learner left it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceView {
    pub choice_id: Id,
    pub text: String,
    pub selected: bool,
    pub is_correct: bool,
    /// A correct choice the learner did not pick.
    pub missed: bool,
    pub state: ElementState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceReview {
    pub choices: Vec<ChoiceView>,
    /// The submission-time verdict for the whole answer.
    pub answer_correct: Option<bool>,
    pub warnings: Vec<ReconcileWarning>,
}

pub(crate) fn reconcile(
    question: &Question,
    selected: &[Choice],
    answer_correct: Option<bool>,
) -> ChoiceReview {
    let mut warnings = Vec::new();
    if question.choices.is_empty() {
        warnings.push(ReconcileWarning::IncompleteData {
            question_id: question.id,
            expected: "choices".into(),
        });
    }

    for choice in selected {
        if !question.choices.iter().any(|c| c.id == choice.id) {
            tracing::warn!(
                question_id = question.id,
                choice = choice.id,
                "selected choice is not part of the question"
            );
            warnings.push(ReconcileWarning::MissingReference {
                question_id: question.id,
                reference: ReferenceKind::Choice,
                id: choice.id,
            });
        }
    }

    let choices = question
        .choices
        .iter()
        .map(|c| {
            let picked = selected.iter().any(|s| s.id == c.id);
            ChoiceView {
                choice_id: c.id,
                text: c.choice_text.clone(),
                selected: picked,
                is_correct: c.is_correct,
                missed: c.is_correct && !picked,
                state: ElementState::from_selection(picked, c.is_correct),
            }
        })
        .collect();

    ChoiceReview {
        choices,
        answer_correct,
        warnings,
    }
}
