//! The `gradeview grade` command.

use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;

use gradeview_core::parser;
use gradeview_core::report::GradePayload;
use gradeview_core::scoring::GradingSheet;
use gradeview_core::traits::GradeSink;

/// Writes the grade payload to stdout as JSON.
struct StdoutSink;

#[async_trait]
impl GradeSink for StdoutSink {
    fn name(&self) -> &str {
        "stdout"
    }

    async fn submit(&self, payload: &GradePayload) -> Result<()> {
        println!("{}", payload.to_json()?);
        Ok(())
    }
}

pub async fn execute(
    submission_path: PathBuf,
    scores_path: PathBuf,
    feedback: Option<String>,
) -> Result<()> {
    let submission = parser::load_submission(&submission_path)?;
    let sheet_input = parser::load_score_sheet(&scores_path)?;

    let mut sheet = GradingSheet::new(submission);
    if let Err(errors) = sheet.apply_entries(&sheet_input.entries) {
        for e in &errors {
            eprintln!("  [answer {}] {e}", e.answer_id());
        }
        anyhow::bail!(
            "{} invalid score entr{}; nothing was applied",
            errors.len(),
            if errors.len() == 1 { "y" } else { "ies" }
        );
    }

    if let Some(text) = feedback.or(sheet_input.feedback) {
        sheet.set_overall_feedback(text);
    }

    let summary = sheet.summary();
    if summary.pending_manual > 0 {
        tracing::warn!(
            pending = summary.pending_manual,
            "finishing with manual answers still ungraded"
        );
    }

    let payload = sheet.finish();
    let sink = StdoutSink;
    tracing::info!(
        submission_id = payload.submission_id,
        total = payload.total_score,
        sink = sink.name(),
        "submitting grade"
    );
    sink.submit(&payload).await
}
