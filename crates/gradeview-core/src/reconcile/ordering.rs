//! Ordering reconciliation.
//!
//! Correctness flags come from the submission and are never recomputed here.

use serde::{Deserialize, Serialize};

use crate::error::{ReconcileWarning, ReferenceKind};
use crate::model::{ElementState, Id, OrderingItem, OrderingSelection, Question};

/// One ordering item with where it was placed and where it belongs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderingRow {
    pub item_id: Id,
    pub text: String,
    pub selected_position: Option<u32>,
    pub is_correct: bool,
    pub correct_position: u32,
    pub state: ElementState,
}

/// Reconciled view of an ordering answer. `rows` follow schema order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderingReview {
    pub rows: Vec<OrderingRow>,
    pub warnings: Vec<ReconcileWarning>,
}

impl OrderingReview {
    pub fn submitted_order(&self) -> Vec<&OrderingRow> {
        submitted_order(&self.rows)
    }

    pub fn correct_order(&self) -> Vec<&OrderingRow> {
        correct_order(&self.rows)
    }
}

/// Build one row per item from the submitted selections.
pub fn build_rows(
    question_id: Id,
    items: &[OrderingItem],
    selections: &[OrderingSelection],
) -> (Vec<OrderingRow>, Vec<ReconcileWarning>) {
    let mut warnings = Vec::new();

    for selection in selections {
        if !items.iter().any(|i| i.id == selection.item) {
            tracing::warn!(
                question_id,
                item = selection.item,
                "ordering selection references unknown item"
            );
            warnings.push(ReconcileWarning::MissingReference {
                question_id,
                reference: ReferenceKind::OrderingItem,
                id: selection.item,
            });
        }
    }

    let rows = items
        .iter()
        .map(|item| {
            let mut matching = selections.iter().filter(|s| s.item == item.id);
            let selection = matching.next();
            if matching.next().is_some() {
                warnings.push(ReconcileWarning::DuplicateReference {
                    question_id,
                    reference: ReferenceKind::OrderingItem,
                    id: item.id,
                });
            }

            // An unplaced item cannot be correct, whatever flag was stored.
            let selected_position = selection.and_then(|s| s.selected_position);
            let is_correct =
                selected_position.is_some() && selection.is_some_and(|s| s.is_correct);
            OrderingRow {
                item_id: item.id,
                text: item.text.clone(),
                selected_position,
                is_correct,
                correct_position: item.correct_position,
                state: ElementState::from_selection(selected_position.is_some(), is_correct),
            }
        })
        .collect();

    (rows, warnings)
}

/// Rows ascending by submitted position; unplaced items go last.
pub fn submitted_order(rows: &[OrderingRow]) -> Vec<&OrderingRow> {
    let mut view: Vec<&OrderingRow> = rows.iter().collect();
    view.sort_by_key(|r| (r.selected_position.is_none(), r.selected_position, r.item_id));
    view
}

/// Rows ascending by correct position.
pub fn correct_order(rows: &[OrderingRow]) -> Vec<&OrderingRow> {
    let mut view: Vec<&OrderingRow> = rows.iter().collect();
    view.sort_by_key(|r| (r.correct_position, r.item_id));
    view
}

pub(crate) fn reconcile(question: &Question, selections: &[OrderingSelection]) -> OrderingReview {
    let (rows, mut warnings) = build_rows(question.id, &question.ordering_items, selections);
    if question.ordering_items.is_empty() {
        warnings.insert(
            0,
            ReconcileWarning::IncompleteData {
                question_id: question.id,
                expected: "ordering items".into(),
            },
        );
    }
    OrderingReview { rows, warnings }
}
