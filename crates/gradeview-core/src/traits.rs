//! Seams to the host application.
//!
//! The core never measures the screen and never writes grades anywhere. The
//! host supplies element positions through [`BoxProvider`] and receives the
//! finished grade through [`GradeSink`].

use std::sync::Mutex;

use async_trait::async_trait;

use crate::geometry::{Column, Rect};
use crate::model::Id;
use crate::report::GradePayload;

// ---------------------------------------------------------------------------
// Element measurement
// ---------------------------------------------------------------------------

/// Supplies the current bounding box of a rendered matching element.
pub trait BoxProvider {
    /// The box of the element for `pair_id` in `column`, if it is rendered.
    fn bounding_box(&self, column: Column, pair_id: Id) -> Option<Rect>;
}

impl<F> BoxProvider for F
where
    F: Fn(Column, Id) -> Option<Rect>,
{
    fn bounding_box(&self, column: Column, pair_id: Id) -> Option<Rect> {
        self(column, pair_id)
    }
}

// ---------------------------------------------------------------------------
// Grade persistence
// ---------------------------------------------------------------------------

/// Receives finished grades.
#[async_trait]
pub trait GradeSink: Send + Sync {
    /// Human-readable sink name (e.g. "stdout").
    fn name(&self) -> &str;

    /// Deliver a grade payload.
    async fn submit(&self, payload: &GradePayload) -> anyhow::Result<()>;
}

/// Keeps every submitted payload in memory.
#[derive(Default)]
pub struct MemorySink {
    received: Mutex<Vec<GradePayload>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payloads received so far, oldest first.
    ///
    /// A poisoned lock still yields what was stored before the panic.
    pub fn received(&self) -> Vec<GradePayload> {
        match self.received.lock() {
            Ok(received) => received.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl GradeSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn submit(&self, payload: &GradePayload) -> anyhow::Result<()> {
        self.received
            .lock()
            .map_err(|_| anyhow::anyhow!("memory sink lock poisoned"))?
            .push(payload.clone());
        Ok(())
    }
}
