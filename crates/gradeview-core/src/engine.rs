//! Submission review orchestrator.
//!
//! Pairs every question of a submission with its answer, reconciles each pair
//! and folds the scores. Questions are independent of each other, so the
//! concurrent path fans them out over the blocking pool; the aggregate runs
//! once every question is back.

use std::sync::Arc;

use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::error::{ReconcileWarning, ReferenceKind};
use crate::geometry::{layout_connectors, Connector};
use crate::model::{Answer, Id, Question, QuestionType, Submission};
use crate::reconcile::fill_blank::render_prose;
use crate::reconcile::{reconcile, Reconciled};
use crate::scoring::{aggregate, ScoreSummary};
use crate::traits::BoxProvider;

/// Configuration for the review engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Shown in place of a blank nobody filled.
    pub unanswered_placeholder: String,
    /// Joins the texts of several correct options of one blank.
    pub correct_answer_separator: String,
    /// Maximum questions reconciled at once on the concurrent path.
    pub parallelism: usize,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            unanswered_placeholder: "____".to_string(),
            correct_answer_separator: " / ".to_string(),
            parallelism: 4,
        }
    }
}

/// The reconciled view of one question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionReview {
    pub question_id: Id,
    pub question_type: QuestionType,
    pub points: f64,
    pub answer_id: Option<Id>,
    pub reconciled: Reconciled,
    /// Fill-blank prose with the learner's picks substituted in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rendered_prose: Option<String>,
}

impl QuestionReview {
    /// Connectors for a matching review; empty for every other variant.
    pub fn connectors<P>(&self, boxes: &P) -> Vec<Connector>
    where
        P: BoxProvider + ?Sized,
    {
        match &self.reconciled {
            Reconciled::Matching(review) => layout_connectors(&review.links, boxes),
            _ => Vec::new(),
        }
    }
}

/// The reconciled view of a whole submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionReview {
    pub submission_id: Id,
    pub questions: Vec<QuestionReview>,
    pub score: ScoreSummary,
    pub warnings: Vec<ReconcileWarning>,
}

/// Reconcile one question with the given config.
pub fn review_question(
    config: &ReviewConfig,
    question: &Question,
    answer: Option<&Answer>,
) -> QuestionReview {
    let reconciled = reconcile(question, answer, config);
    let rendered_prose = match &reconciled {
        Reconciled::FillBlank(review) => Some(render_prose(
            &review.prose,
            &review.submitted,
            &config.unanswered_placeholder,
        )),
        _ => None,
    };

    QuestionReview {
        question_id: question.id,
        question_type: question.question_type,
        points: question.points,
        answer_id: answer.map(|a| a.id),
        reconciled,
        rendered_prose,
    }
}

/// The central review engine.
#[derive(Debug, Clone, Default)]
pub struct ReviewEngine {
    config: ReviewConfig,
}

impl ReviewEngine {
    pub fn new(config: ReviewConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    pub fn review_question(&self, question: &Question, answer: Option<&Answer>) -> QuestionReview {
        review_question(&self.config, question, answer)
    }

    /// Review every question of a submission, one after another.
    pub fn review_submission(&self, submission: &Submission) -> SubmissionReview {
        let questions = submission
            .questions
            .iter()
            .map(|q| self.review_question(q, submission.answer_for(q.id)))
            .collect();
        assemble(submission, questions)
    }

    /// Review a submission with questions reconciled in parallel.
    ///
    /// At most `parallelism` questions are in flight. The result is the same
    /// as [`ReviewEngine::review_submission`].
    pub async fn review_submission_concurrent(
        &self,
        submission: Arc<Submission>,
    ) -> Result<SubmissionReview> {
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));
        let mut futures = FuturesUnordered::new();

        for (index, question) in submission.questions.iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let submission = Arc::clone(&submission);
            let config = self.config.clone();
            let question_id = question.id;

            futures.push(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| anyhow::anyhow!("semaphore closed"))?;

                let review = tokio::task::spawn_blocking(move || {
                    let question = &submission.questions[index];
                    review_question(&config, question, submission.answer_for(question.id))
                })
                .await
                .with_context(|| format!("reconciling question {question_id} failed"))?;

                Ok::<_, anyhow::Error>((index, review))
            });
        }

        let mut reviews = Vec::with_capacity(futures.len());
        while let Some(result) = futures.next().await {
            reviews.push(result?);
        }
        reviews.sort_by_key(|(index, _)| *index);

        let questions = reviews.into_iter().map(|(_, review)| review).collect();
        Ok(assemble(&submission, questions))
    }
}

fn assemble(submission: &Submission, questions: Vec<QuestionReview>) -> SubmissionReview {
    let mut warnings: Vec<ReconcileWarning> = questions
        .iter()
        .flat_map(|q| q.reconciled.warnings().iter().cloned())
        .collect();

    for answer in &submission.answers {
        if submission.question(answer.question).is_none() {
            warnings.push(ReconcileWarning::MissingReference {
                question_id: answer.question,
                reference: ReferenceKind::Question,
                id: answer.question,
            });
        }
    }

    let score = aggregate(&submission.questions, &submission.answers);
    tracing::info!(
        submission_id = submission.id,
        total = score.total_score,
        max = score.max_score,
        pending = score.pending_manual,
        "submission reviewed"
    );

    SubmissionReview {
        submission_id: submission.id,
        questions,
        score,
        warnings,
    }
}
