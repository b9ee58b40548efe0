//! Matching reconciliation.
//!
//! Left and right columns are coloured independently: the left map is keyed by
//! the left pair id, the right map by the right pair id that was *selected*.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ReconcileWarning, ReferenceKind};
use crate::model::{ElementState, Id, MatchingPair, MatchingSelection, Question};

/// One entry of the right-hand pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RightSlot {
    pub pair_id: Id,
    pub text: String,
}

/// Reconciled view of a matching answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingReview {
    /// State of every left element, keyed by pair id.
    pub left: BTreeMap<Id, ElementState>,
    /// State of every right slot some left element points at.
    pub right: BTreeMap<Id, ElementState>,
    /// All right texts, detached from their pairing.
    pub right_pool: Vec<RightSlot>,
    /// Selections that survived reference checks, for connector layout.
    pub links: Vec<MatchingSelection>,
    pub warnings: Vec<ReconcileWarning>,
}

/// The right-hand rendering pool, sorted by text then id.
pub fn right_pool(pairs: &[MatchingPair]) -> Vec<RightSlot> {
    let mut pool: Vec<RightSlot> = pairs
        .iter()
        .map(|p| RightSlot {
            pair_id: p.id,
            text: p.right_text.clone(),
        })
        .collect();
    pool.sort_by(|a, b| {
        a.text
            .to_lowercase()
            .cmp(&b.text.to_lowercase())
            .then(a.pair_id.cmp(&b.pair_id))
    });
    pool
}

/// Compute left and right status maps.
pub fn column_states(
    question_id: Id,
    pairs: &[MatchingPair],
    selections: &[MatchingSelection],
) -> MatchingReview {
    let known = |id: Id| pairs.iter().any(|p| p.id == id);

    let mut left: BTreeMap<Id, ElementState> = pairs
        .iter()
        .map(|p| (p.id, ElementState::Unanswered))
        .collect();
    let mut right: BTreeMap<Id, ElementState> = BTreeMap::new();
    let mut links = Vec::new();
    let mut warnings = Vec::new();
    let mut seen_left = std::collections::HashSet::new();

    for selection in selections {
        if !known(selection.left_pair) {
            tracing::warn!(
                question_id,
                pair = selection.left_pair,
                "matching selection references unknown left pair"
            );
            warnings.push(ReconcileWarning::MissingReference {
                question_id,
                reference: ReferenceKind::MatchingPair,
                id: selection.left_pair,
            });
            continue;
        }
        if !seen_left.insert(selection.left_pair) {
            warnings.push(ReconcileWarning::DuplicateReference {
                question_id,
                reference: ReferenceKind::MatchingPair,
                id: selection.left_pair,
            });
            continue;
        }

        let Some(right_id) = selection.selected_right_pair else {
            continue;
        };
        if !known(right_id) {
            tracing::warn!(
                question_id,
                pair = right_id,
                "matching selection references unknown right pair"
            );
            warnings.push(ReconcileWarning::MissingReference {
                question_id,
                reference: ReferenceKind::MatchingPair,
                id: right_id,
            });
            continue;
        }

        let state = ElementState::from_selection(true, selection.is_correct);
        left.insert(selection.left_pair, state);
        right
            .entry(right_id)
            .and_modify(|existing| {
                if state == ElementState::Incorrect {
                    *existing = ElementState::Incorrect;
                }
            })
            .or_insert(state);
        links.push(selection.clone());
    }

    MatchingReview {
        left,
        right,
        right_pool: right_pool(pairs),
        links,
        warnings,
    }
}

pub(crate) fn reconcile(question: &Question, selections: &[MatchingSelection]) -> MatchingReview {
    let mut review = column_states(question.id, &question.matching_pairs, selections);
    if question.matching_pairs.is_empty() {
        review.warnings.insert(
            0,
            ReconcileWarning::IncompleteData {
                question_id: question.id,
                expected: "matching pairs".into(),
            },
        );
    }
    review
}
