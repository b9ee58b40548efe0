//! Core data model types for gradeview.
//!
//! These mirror the read-side shape of a grading submission export: the
//! question schema as authored, and what the learner submitted for each
//! question. Both are plain data; nothing in this crate mutates a question,
//! and answers are only changed through [`crate::scoring::GradingSheet`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier used for every schema and submission entity.
pub type Id = u64;

/// The eight wire tags a question can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    QcmSingle,
    QcmMultiple,
    TrueFalse,
    OpenShort,
    OpenLong,
    FillBlank,
    Ordering,
    Matching,
}

impl QuestionType {
    /// Open-ended variants need a human to score them.
    pub fn is_manually_graded(self) -> bool {
        matches!(self, QuestionType::OpenShort | QuestionType::OpenLong)
    }

    /// Whether correctness is decided by comparing against the schema alone.
    pub fn is_auto_gradable(self) -> bool {
        !self.is_manually_graded()
    }

    /// Whether the variant is answered by picking from `choices`.
    pub fn uses_choices(self) -> bool {
        matches!(
            self,
            QuestionType::QcmSingle | QuestionType::QcmMultiple | QuestionType::TrueFalse
        )
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::QcmSingle => write!(f, "qcm_single"),
            QuestionType::QcmMultiple => write!(f, "qcm_multiple"),
            QuestionType::TrueFalse => write!(f, "true_false"),
            QuestionType::OpenShort => write!(f, "open_short"),
            QuestionType::OpenLong => write!(f, "open_long"),
            QuestionType::FillBlank => write!(f, "fill_blank"),
            QuestionType::Ordering => write!(f, "ordering"),
            QuestionType::Matching => write!(f, "matching"),
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "qcm_single" | "single" => Ok(QuestionType::QcmSingle),
            "qcm_multiple" | "multiple" => Ok(QuestionType::QcmMultiple),
            "true_false" | "tf" => Ok(QuestionType::TrueFalse),
            "open_short" => Ok(QuestionType::OpenShort),
            "open_long" => Ok(QuestionType::OpenLong),
            "fill_blank" => Ok(QuestionType::FillBlank),
            "ordering" => Ok(QuestionType::Ordering),
            "matching" => Ok(QuestionType::Matching),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// One selectable answer of a choice-style question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub id: Id,
    pub choice_text: String,
    #[serde(default)]
    pub is_correct: bool,
}

/// A candidate value for a [`Blank`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlankOption {
    pub id: Id,
    pub option_text: String,
    #[serde(default)]
    pub is_correct: bool,
}

/// A gap in fill-in-the-blank prose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blank {
    pub id: Id,
    /// Author-facing name, matched case-insensitively against `[token]`s.
    #[serde(default)]
    pub label: Option<String>,
    pub order: u32,
    #[serde(default)]
    pub options: Vec<BlankOption>,
}

impl Blank {
    /// The synthetic label `B{order}` every blank answers to.
    pub fn synthetic_label(&self) -> String {
        format!("B{}", self.order)
    }

    pub fn option(&self, id: Id) -> Option<&BlankOption> {
        self.options.iter().find(|o| o.id == id)
    }
}

/// An element to be put in sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderingItem {
    pub id: Id,
    pub text: String,
    /// 1-based; the positions of a question's items form a permutation.
    pub correct_position: u32,
}

/// A left/right pair. Left and right share the pair id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingPair {
    pub id: Id,
    pub left_text: String,
    pub right_text: String,
}

/// One assessment item as authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: Id,
    pub question_type: QuestionType,
    #[serde(default)]
    pub question_text: String,
    #[serde(with = "decimal")]
    pub points: f64,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub blanks: Vec<Blank>,
    #[serde(default)]
    pub ordering_items: Vec<OrderingItem>,
    #[serde(default)]
    pub matching_pairs: Vec<MatchingPair>,
}

/// What was picked for one blank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlankSelection {
    pub blank: Id,
    #[serde(default)]
    pub selected_option: Option<Id>,
}

/// Where the learner placed one ordering item. `is_correct` is decided at
/// submission time and trusted as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderingSelection {
    pub item: Id,
    #[serde(default)]
    pub selected_position: Option<u32>,
    #[serde(default)]
    pub is_correct: bool,
}

/// Which right slot a left element was linked to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingSelection {
    pub left_pair: Id,
    #[serde(default)]
    pub selected_right_pair: Option<Id>,
    #[serde(default)]
    pub is_correct: bool,
}

/// A learner's answer to one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: Id,
    /// The question this answers.
    pub question: Id,
    #[serde(default)]
    pub text_answer: Option<String>,
    #[serde(default)]
    pub selected_choices: Vec<Choice>,
    #[serde(default)]
    pub blank_selections: Vec<BlankSelection>,
    #[serde(default)]
    pub ordering_selections: Vec<OrderingSelection>,
    #[serde(default)]
    pub matching_selections: Vec<MatchingSelection>,
    /// `None` marks a manually graded answer.
    #[serde(default)]
    pub is_correct: Option<bool>,
    #[serde(default, with = "decimal")]
    pub points_earned: f64,
    #[serde(default)]
    pub teacher_feedback: Option<String>,
    #[serde(default, with = "decimal::option")]
    pub teacher_score: Option<f64>,
}

impl Answer {
    /// An empty answer to `question`, as created at submission time.
    pub fn new(id: Id, question: Id) -> Self {
        Self {
            id,
            question,
            text_answer: None,
            selected_choices: Vec::new(),
            blank_selections: Vec::new(),
            ordering_selections: Vec::new(),
            matching_selections: Vec::new(),
            is_correct: None,
            points_earned: 0.0,
            teacher_feedback: None,
            teacher_score: None,
        }
    }

    pub fn is_manually_graded(&self) -> bool {
        self.is_correct.is_none()
    }
}

/// Lifecycle of a submission on the grading side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    InProgress,
    #[default]
    Submitted,
    Graded,
}

/// Everything a grader needs to review one learner's attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: Id,
    #[serde(default)]
    pub student: Option<String>,
    #[serde(default)]
    pub status: SubmissionStatus,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub answers: Vec<Answer>,
    #[serde(default)]
    pub teacher_feedback: Option<String>,
}

impl Submission {
    pub fn question(&self, id: Id) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn answer(&self, id: Id) -> Option<&Answer> {
        self.answers.iter().find(|a| a.id == id)
    }

    /// The answer that counts for `question_id`: the lowest id when a
    /// question was answered more than once.
    pub fn answer_for(&self, question_id: Id) -> Option<&Answer> {
        self.answers
            .iter()
            .filter(|a| a.question == question_id)
            .min_by_key(|a| a.id)
    }
}

/// Normalized correctness of one checkable unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementState {
    Correct,
    Incorrect,
    Unanswered,
}

impl ElementState {
    /// `Unanswered` when nothing was selected, otherwise the correctness flag.
    pub fn from_selection(answered: bool, is_correct: bool) -> Self {
        match (answered, is_correct) {
            (false, _) => ElementState::Unanswered,
            (true, true) => ElementState::Correct,
            (true, false) => ElementState::Incorrect,
        }
    }
}

impl fmt::Display for ElementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementState::Correct => write!(f, "correct"),
            ElementState::Incorrect => write!(f, "incorrect"),
            ElementState::Unanswered => write!(f, "unanswered"),
        }
    }
}

/// Point amounts arrive either as JSON numbers or as decimal strings ("2.50").
pub(crate) mod decimal {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    fn parse<E: Error>(raw: Raw) -> Result<f64, E> {
        let value = match raw {
            Raw::Number(n) => n,
            Raw::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| E::custom(format!("invalid decimal: {s:?}")))?,
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(E::custom("decimal must be finite"))
        }
    }

    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(*value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        parse(Raw::deserialize(deserializer)?)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(v) => serializer.serialize_some(v),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<Raw>::deserialize(deserializer)?
                .map(parse)
                .transpose()
        }
    }
}
