//! gradeview-core: answer reconciliation and score aggregation.
//!
//! This crate defines the submission data model, the per-variant reconcilers
//! that line a learner's answer up against the question schema, and the
//! scoring logic that folds answers into a total.

pub mod engine;
pub mod error;
pub mod geometry;
pub mod model;
pub mod parser;
pub mod reconcile;
pub mod report;
pub mod scoring;
pub mod tokens;
pub mod traits;
