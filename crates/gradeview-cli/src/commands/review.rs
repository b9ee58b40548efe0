//! The `gradeview review` command.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use gradeview_core::engine::{ReviewEngine, SubmissionReview};
use gradeview_core::geometry::{BoxSnapshot, Connector};
use gradeview_core::model::Id;
use gradeview_core::parser;
use gradeview_core::reconcile::Reconciled;

#[derive(Serialize)]
struct ReviewOutput<'a> {
    #[serde(flatten)]
    review: &'a SubmissionReview,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    connectors: BTreeMap<Id, Vec<Connector>>,
}

fn load_boxes(path: &Path) -> Result<BoxSnapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read boxes file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse boxes JSON: {}", path.display()))
}

pub async fn execute(
    submission_path: PathBuf,
    config_path: Option<PathBuf>,
    boxes_path: Option<PathBuf>,
    format: String,
) -> Result<()> {
    let config = parser::load_config_from(config_path.as_deref())?;
    let submission = parser::load_submission(&submission_path)?;
    let boxes = boxes_path.as_deref().map(load_boxes).transpose()?;

    tracing::info!(
        submission_id = submission.id,
        questions = submission.questions.len(),
        parallelism = config.parallelism,
        "reviewing submission"
    );

    let engine = ReviewEngine::new(config);
    let review = engine
        .review_submission_concurrent(Arc::new(submission))
        .await?;

    let connectors: BTreeMap<Id, Vec<Connector>> = match &boxes {
        Some(boxes) => review
            .questions
            .iter()
            .map(|q| (q.question_id, q.connectors(boxes)))
            .filter(|(_, c)| !c.is_empty())
            .collect(),
        None => BTreeMap::new(),
    };

    match format.as_str() {
        "json" => {
            let output = ReviewOutput {
                review: &review,
                connectors,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        "markdown" | "md" => {
            println!("{}", review.to_markdown());
        }
        _ => print_text(&review, &connectors, &engine.config().unanswered_placeholder),
    }

    Ok(())
}

fn detail(reconciled: &Reconciled, placeholder: &str) -> String {
    match reconciled {
        Reconciled::Choice(r) => r
            .choices
            .iter()
            .filter(|c| c.selected)
            .map(|c| format!("{} ({})", c.text, c.state))
            .collect::<Vec<_>>()
            .join(", "),
        Reconciled::Open(r) => match (&r.response, r.teacher_score) {
            (None, _) => "not provided".to_string(),
            (Some(_), Some(score)) if r.score_out_of_range => {
                format!("score {score} out of range, awaiting teacher score")
            }
            (Some(_), Some(score)) => format!("scored {score}"),
            (Some(_), None) => "awaiting teacher score".to_string(),
        },
        Reconciled::FillBlank(r) => {
            let key = r
                .correct
                .values()
                .map(|v| {
                    if v.display_text.is_empty() {
                        placeholder.to_string()
                    } else {
                        v.display_text.clone()
                    }
                })
                .collect::<Vec<_>>()
                .join(" | ");
            format!("key: {key}")
        }
        Reconciled::Ordering(r) => r
            .submitted_order()
            .iter()
            .map(|row| row.text.as_str())
            .collect::<Vec<_>>()
            .join(" > "),
        Reconciled::Matching(r) => format!("{} link(s)", r.links.len()),
    }
}

fn print_text(
    review: &SubmissionReview,
    connectors: &BTreeMap<Id, Vec<Connector>>,
    placeholder: &str,
) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec![
        "Question",
        "Type",
        "Points",
        "Correct",
        "Incorrect",
        "Unanswered",
        "Detail",
    ]);

    for q in &review.questions {
        let line = review
            .score
            .lines
            .iter()
            .find(|l| l.question_id == q.question_id);
        let points = match line {
            Some(l) if l.pending => format!("pending / {}", l.max_points),
            Some(l) => format!("{} / {}", l.earned, l.max_points),
            None => format!("- / {}", q.points),
        };
        let (correct, incorrect, unanswered) = q.reconciled.tally();
        table.add_row(vec![
            Cell::new(q.question_id),
            Cell::new(q.question_type),
            Cell::new(points),
            Cell::new(correct),
            Cell::new(incorrect),
            Cell::new(unanswered),
            Cell::new(detail(&q.reconciled, placeholder)),
        ]);
    }

    println!("Submission {}", review.submission_id);
    println!("{table}");

    let score = &review.score;
    let percentage = score
        .percentage
        .map_or_else(|| "n/a".to_string(), |p| format!("{p:.1}%"));
    println!(
        "\nTotal: {} / {} ({percentage})",
        score.total_score, score.max_score
    );
    println!(
        "  auto {}, manual {}, {} pending",
        score.auto_score, score.manual_score, score.pending_manual
    );

    for q in &review.questions {
        if let Some(prose) = &q.rendered_prose {
            println!("\n[Q{}] {prose}", q.question_id);
        }
    }

    for (question_id, lines) in connectors {
        println!("\nConnectors for Q{question_id}:");
        for c in lines {
            println!(
                "  {} -> {} ({:.1},{:.1}) -> ({:.1},{:.1}) {}",
                c.left_pair,
                c.right_pair,
                c.exit_point.x,
                c.exit_point.y,
                c.entry_point.x,
                c.entry_point.y,
                c.state
            );
        }
    }

    if !review.warnings.is_empty() {
        println!("\nWarnings:");
        for w in &review.warnings {
            println!("  {w}");
        }
    }
}
