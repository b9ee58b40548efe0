//! Connector layout for matching reviews.
//!
//! Given where the host rendered each left and right element, compute one
//! line per linked pair from the right-middle edge of the left box to the
//! left-middle edge of the right box. The layout is a pure function of its
//! inputs; call it again whenever the host reports new positions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{ElementState, Id, MatchingSelection};
use crate::traits::BoxProvider;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// An axis-aligned box in host coordinates (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right_mid(&self) -> Point {
        Point {
            x: self.x + self.width,
            y: self.y + self.height / 2.0,
        }
    }

    pub fn left_mid(&self) -> Point {
        Point {
            x: self.x,
            y: self.y + self.height / 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Left,
    Right,
}

/// A line between a linked left/right pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub left_pair: Id,
    pub right_pair: Id,
    pub exit_point: Point,
    pub entry_point: Point,
    pub state: ElementState,
}

impl Connector {
    /// The same connector expressed relative to `origin`.
    pub fn relative_to(&self, origin: Point) -> Self {
        let shift = |p: Point| Point {
            x: p.x - origin.x,
            y: p.y - origin.y,
        };
        Self {
            exit_point: shift(self.exit_point),
            entry_point: shift(self.entry_point),
            ..*self
        }
    }
}

/// Measured element boxes, as reported by a host in one pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxSnapshot {
    #[serde(default)]
    pub left: BTreeMap<Id, Rect>,
    #[serde(default)]
    pub right: BTreeMap<Id, Rect>,
}

impl BoxProvider for BoxSnapshot {
    fn bounding_box(&self, column: Column, pair_id: Id) -> Option<Rect> {
        match column {
            Column::Left => self.left.get(&pair_id).copied(),
            Column::Right => self.right.get(&pair_id).copied(),
        }
    }
}

/// Compute one connector per selection with a right-hand target.
///
/// Selections whose boxes are not currently rendered are skipped.
pub fn layout_connectors<P>(selections: &[MatchingSelection], boxes: &P) -> Vec<Connector>
where
    P: BoxProvider + ?Sized,
{
    selections
        .iter()
        .filter_map(|selection| {
            let right_pair = selection.selected_right_pair?;
            let left_box = boxes.bounding_box(Column::Left, selection.left_pair);
            let right_box = boxes.bounding_box(Column::Right, right_pair);
            let (Some(left_box), Some(right_box)) = (left_box, right_box) else {
                tracing::debug!(
                    left = selection.left_pair,
                    right = right_pair,
                    "no measured box for linked pair, skipping connector"
                );
                return None;
            };
            Some(Connector {
                left_pair: selection.left_pair,
                right_pair,
                exit_point: left_box.right_mid(),
                entry_point: right_box.left_mid(),
                state: ElementState::from_selection(true, selection.is_correct),
            })
        })
        .collect()
}
