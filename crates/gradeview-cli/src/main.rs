//! gradeview CLI: offline review and grading of submission exports.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "gradeview", version, about = "Assessment answer review and scoring")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile every answer of a submission and print the review
    Review {
        /// Submission export (JSON)
        #[arg(long)]
        submission: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Measured matching boxes (JSON) for connector layout
        #[arg(long)]
        boxes: Option<PathBuf>,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Apply manual scores and emit the grade payload
    Grade {
        /// Submission export (JSON)
        #[arg(long)]
        submission: PathBuf,

        /// Score sheet (TOML)
        #[arg(long)]
        scores: PathBuf,

        /// Overall feedback, overrides the score sheet
        #[arg(long)]
        feedback: Option<String>,
    },

    /// Check a submission export for authoring problems
    Validate {
        /// Submission export (JSON)
        #[arg(long)]
        submission: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "gradeview=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Review {
            submission,
            config,
            boxes,
            format,
        } => commands::review::execute(submission, config, boxes, format).await,
        Commands::Grade {
            submission,
            scores,
            feedback,
        } => commands::grade::execute(submission, scores, feedback).await,
        Commands::Validate { submission } => commands::validate::execute(submission),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
