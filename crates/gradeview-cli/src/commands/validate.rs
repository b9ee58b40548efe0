//! The `gradeview validate` command.

use std::path::PathBuf;

use anyhow::Result;

pub fn execute(submission_path: PathBuf) -> Result<()> {
    let submission = gradeview_core::parser::load_submission(&submission_path)?;

    println!(
        "Submission {}: {} questions, {} answers",
        submission.id,
        submission.questions.len(),
        submission.answers.len()
    );

    let warnings = gradeview_core::parser::validate_submission(&submission);
    for w in &warnings {
        let prefix = w
            .question_id
            .map(|id| format!("  [Q{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Submission valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
