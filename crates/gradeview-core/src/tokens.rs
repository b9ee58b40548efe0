//! Placeholder resolution for fill-in-the-blank prose.
//!
//! Question prose refers to its blanks with bracketed tokens such as
//! `"Water boils at [B1] degrees"`. A token is bound to a blank by, in order:
//!
//! 1. case-insensitive match against the blank's `label`,
//! 2. an integer token equal to the blank's `order`,
//! 3. case-insensitive match against the synthetic label `B{order}`.
//!
//! Tokens that bind to nothing stay in the output as literal text. Blanks no
//! token refers to are appended after the prose, once each, in `order`.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::{Blank, Id};

/// One piece of resolved prose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    Text { text: String },
    Blank { blank_id: Id },
}

impl Segment {
    fn text(s: &str) -> Self {
        Segment::Text {
            text: s.to_string(),
        }
    }
}

/// Resolved prose plus the tokens that could not be bound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedProse {
    pub segments: Vec<Segment>,
    pub unresolved_tokens: Vec<String>,
    /// Index of the first segment appended after the prose; blanks from
    /// there on were not referenced by any token.
    #[serde(default)]
    pub appended_from: usize,
}

impl ResolvedProse {
    /// Blank ids in the order they appear.
    pub fn blank_ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.segments.iter().filter_map(|s| match s {
            Segment::Blank { blank_id } => Some(*blank_id),
            Segment::Text { .. } => None,
        })
    }
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[([^\[\]]+)\]").expect("placeholder pattern is valid"))
}

/// Find the blank a token refers to.
pub fn match_token<'a>(token: &str, blanks: &'a [Blank]) -> Option<&'a Blank> {
    let token = token.trim();
    let folded = token.to_lowercase();

    let by_label = blanks.iter().find(|b| {
        b.label
            .as_deref()
            .is_some_and(|label| label.trim().to_lowercase() == folded)
    });
    if by_label.is_some() {
        return by_label;
    }

    if let Ok(order) = token.parse::<u32>() {
        if let Some(blank) = blanks.iter().find(|b| b.order == order) {
            return Some(blank);
        }
    }

    blanks
        .iter()
        .find(|b| b.synthetic_label().to_lowercase() == folded)
}

/// Split `prose` into text and blank segments.
pub fn resolve_placeholders(prose: &str, blanks: &[Blank]) -> ResolvedProse {
    let mut sorted: Vec<&Blank> = blanks.iter().collect();
    sorted.sort_by_key(|b| (b.order, b.id));
    let ordered: Vec<Blank> = sorted.into_iter().cloned().collect();

    let mut segments = Vec::new();
    let mut unresolved_tokens = Vec::new();
    let mut referenced = BTreeSet::new();
    let mut cursor = 0;

    for caps in token_pattern().captures_iter(prose) {
        let Some(whole) = caps.get(0) else { continue };
        let token = caps.get(1).map_or("", |m| m.as_str());

        if whole.start() > cursor {
            segments.push(Segment::text(&prose[cursor..whole.start()]));
        }

        match match_token(token, &ordered) {
            Some(blank) => {
                referenced.insert(blank.id);
                segments.push(Segment::Blank { blank_id: blank.id });
            }
            None => {
                tracing::debug!("placeholder [{token}] matches no blank, keeping as text");
                unresolved_tokens.push(token.to_string());
                segments.push(Segment::text(whole.as_str()));
            }
        }
        cursor = whole.end();
    }

    if cursor < prose.len() {
        segments.push(Segment::text(&prose[cursor..]));
    }

    let mut segments = merge_text(segments);
    let appended_from = segments.len();
    for blank in &ordered {
        if referenced.insert(blank.id) {
            segments.push(Segment::Blank { blank_id: blank.id });
        }
    }

    ResolvedProse {
        segments,
        unresolved_tokens,
        appended_from,
    }
}

/// Join neighbouring text segments left behind by unresolved tokens.
fn merge_text(segments: Vec<Segment>) -> Vec<Segment> {
    let mut merged: Vec<Segment> = Vec::with_capacity(segments.len());
    for segment in segments {
        if let Segment::Text { text } = &segment {
            if let Some(Segment::Text { text: prev }) = merged.last_mut() {
                prev.push_str(text);
                continue;
            }
        }
        merged.push(segment);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(id: Id, order: u32, label: Option<&str>) -> Blank {
        Blank {
            id,
            label: label.map(str::to_string),
            order,
            options: vec![],
        }
    }

    fn text(s: &str) -> Segment {
        Segment::Text {
            text: s.to_string(),
        }
    }

    #[test]
    fn synthetic_label_binds_blank() {
        let resolved = resolve_placeholders("Water boils at [B1] degrees", &[blank(5, 1, None)]);
        assert_eq!(
            resolved.segments,
            vec![
                text("Water boils at "),
                Segment::Blank { blank_id: 5 },
                text(" degrees"),
            ]
        );
        assert!(resolved.unresolved_tokens.is_empty());
    }

    #[test]
    fn label_beats_numeric_order() {
        // Blank 2 is labelled "1", blank 1 has order 1: the label wins.
        let blanks = [blank(1, 1, None), blank(2, 2, Some("1"))];
        assert_eq!(match_token("1", &blanks).map(|b| b.id), Some(2));
    }

    #[test]
    fn label_match_is_case_insensitive() {
        let blanks = [blank(7, 1, Some("Capital"))];
        let resolved = resolve_placeholders("[capital] is Paris", &blanks);
        assert_eq!(resolved.segments[0], Segment::Blank { blank_id: 7 });
    }

    #[test]
    fn accented_label_matches_across_case() {
        let blanks = [blank(1, 1, Some("Été"))];
        let resolved = resolve_placeholders("En [ÉTÉ] il fait chaud", &blanks);
        assert_eq!(
            resolved.segments,
            vec![
                text("En "),
                Segment::Blank { blank_id: 1 },
                text(" il fait chaud"),
            ]
        );
        assert!(resolved.unresolved_tokens.is_empty());
    }

    #[test]
    fn numeric_token_matches_order() {
        let blanks = [blank(10, 1, None), blank(11, 2, None)];
        let resolved = resolve_placeholders("[2] then [1]", &blanks);
        assert_eq!(resolved.blank_ids().collect::<Vec<_>>(), vec![11, 10]);
    }

    #[test]
    fn unresolved_token_kept_as_literal_text() {
        let resolved = resolve_placeholders("See [figure] and [B1].", &[blank(3, 1, None)]);
        assert_eq!(
            resolved.segments,
            vec![
                text("See [figure] and "),
                Segment::Blank { blank_id: 3 },
                text("."),
            ]
        );
        assert_eq!(resolved.unresolved_tokens, vec!["figure".to_string()]);
    }

    #[test]
    fn unreferenced_blanks_are_appended_in_order() {
        let blanks = [blank(30, 3, None), blank(10, 1, None), blank(20, 2, None)];
        let resolved = resolve_placeholders("Only [B2] here", &blanks);
        assert_eq!(resolved.blank_ids().collect::<Vec<_>>(), vec![20, 10, 30]);
    }

    #[test]
    fn prose_without_tokens_keeps_text_and_appends_blanks() {
        let resolved = resolve_placeholders("No placeholders", &[blank(1, 1, None)]);
        assert_eq!(
            resolved.segments,
            vec![text("No placeholders"), Segment::Blank { blank_id: 1 }]
        );
        assert_eq!(resolved.appended_from, 1);
    }

    #[test]
    fn empty_prose_and_no_blanks() {
        let resolved = resolve_placeholders("", &[]);
        assert!(resolved.segments.is_empty());
    }

    #[test]
    fn repeated_token_renders_twice_but_is_not_appended() {
        let resolved = resolve_placeholders("[B1] and again [B1]", &[blank(4, 1, None)]);
        assert_eq!(resolved.blank_ids().collect::<Vec<_>>(), vec![4, 4]);
    }
}
