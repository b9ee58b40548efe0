//! Fill-in-the-blank reconciliation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ReconcileWarning, ReferenceKind};
use crate::model::{Blank, BlankSelection, ElementState, Id, Question};
use crate::tokens::{resolve_placeholders, ResolvedProse, Segment};

/// What to show in place of one blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlankView {
    pub display_text: String,
    pub state: ElementState,
}

/// Reconciled view of a fill-in-the-blank answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillBlankReview {
    pub prose: ResolvedProse,
    /// What the learner picked, keyed by blank id.
    pub submitted: BTreeMap<Id, BlankView>,
    /// The canonical answers, keyed by blank id.
    pub correct: BTreeMap<Id, BlankView>,
    pub warnings: Vec<ReconcileWarning>,
}

/// Resolve each blank's selection into display text and state.
///
/// Every blank of the schema gets exactly one entry. Selections pointing at
/// unknown blanks or options are reported and otherwise ignored.
pub fn resolve_blank_answers(
    question_id: Id,
    blanks: &[Blank],
    selections: &[BlankSelection],
    placeholder: &str,
) -> (BTreeMap<Id, BlankView>, Vec<ReconcileWarning>) {
    let mut views: BTreeMap<Id, BlankView> = blanks
        .iter()
        .map(|b| {
            (
                b.id,
                BlankView {
                    display_text: placeholder.to_string(),
                    state: ElementState::Unanswered,
                },
            )
        })
        .collect();
    let mut warnings = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for selection in selections {
        let Some(blank) = blanks.iter().find(|b| b.id == selection.blank) else {
            tracing::warn!(
                question_id,
                blank = selection.blank,
                "blank selection references unknown blank"
            );
            warnings.push(ReconcileWarning::MissingReference {
                question_id,
                reference: ReferenceKind::Blank,
                id: selection.blank,
            });
            continue;
        };

        if !seen.insert(blank.id) {
            warnings.push(ReconcileWarning::DuplicateReference {
                question_id,
                reference: ReferenceKind::Blank,
                id: blank.id,
            });
            continue;
        }

        let Some(option_id) = selection.selected_option else {
            continue;
        };

        match blank.option(option_id) {
            Some(option) => {
                views.insert(
                    blank.id,
                    BlankView {
                        display_text: option.option_text.clone(),
                        state: ElementState::from_selection(true, option.is_correct),
                    },
                );
            }
            None => {
                tracing::warn!(
                    question_id,
                    blank = blank.id,
                    option = option_id,
                    "blank selection references unknown option"
                );
                warnings.push(ReconcileWarning::MissingReference {
                    question_id,
                    reference: ReferenceKind::Option,
                    id: option_id,
                });
            }
        }
    }

    (views, warnings)
}

/// The canonical answer for every blank: all correct option texts joined.
pub fn correct_answer_map(blanks: &[Blank], separator: &str) -> BTreeMap<Id, BlankView> {
    blanks
        .iter()
        .map(|b| {
            let display_text = b
                .options
                .iter()
                .filter(|o| o.is_correct)
                .map(|o| o.option_text.as_str())
                .collect::<Vec<_>>()
                .join(separator);
            (
                b.id,
                BlankView {
                    display_text,
                    state: ElementState::Correct,
                },
            )
        })
        .collect()
}

/// Flatten resolved prose into one line, each blank rendered as `[text]`.
///
/// Inline blanks replace their token in place. Blanks appended after the
/// prose are separated from what precedes them by a space.
pub fn render_prose(
    prose: &ResolvedProse,
    views: &BTreeMap<Id, BlankView>,
    placeholder: &str,
) -> String {
    let mut out = String::new();
    for (index, segment) in prose.segments.iter().enumerate() {
        match segment {
            Segment::Text { text } => out.push_str(text),
            Segment::Blank { blank_id } => {
                let appended = index >= prose.appended_from;
                if appended && !out.is_empty() && !out.ends_with(char::is_whitespace) {
                    out.push(' ');
                }
                let text = views
                    .get(blank_id)
                    .map_or(placeholder, |v| v.display_text.as_str());
                out.push('[');
                out.push_str(text);
                out.push(']');
            }
        }
    }
    out
}

pub(crate) fn reconcile(
    question: &Question,
    selections: &[BlankSelection],
    placeholder: &str,
    separator: &str,
) -> FillBlankReview {
    let mut warnings = Vec::new();
    if question.blanks.is_empty() {
        warnings.push(ReconcileWarning::IncompleteData {
            question_id: question.id,
            expected: "blanks".into(),
        });
    }

    let prose = resolve_placeholders(&question.question_text, &question.blanks);
    warnings.extend(
        prose
            .unresolved_tokens
            .iter()
            .map(|token| ReconcileWarning::UnresolvedToken {
                question_id: question.id,
                token: token.clone(),
            }),
    );

    let (submitted, selection_warnings) =
        resolve_blank_answers(question.id, &question.blanks, selections, placeholder);
    warnings.extend(selection_warnings);

    FillBlankReview {
        prose,
        submitted,
        correct: correct_answer_map(&question.blanks, separator),
        warnings,
    }
}
