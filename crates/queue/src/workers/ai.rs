//! AI task worker.

use apalis::prelude::*;
use engage_core::{AiTaskOutcome, AiTaskService};
use tracing::debug;

use super::{is_valid, settle};
use crate::jobs::{AiJob, queues};

/// Context for the AI worker.
#[derive(Clone)]
pub struct AiContext {
    pub service: AiTaskService,
}

impl AiContext {
    /// Create a new AI context.
    #[must_use]
    pub const fn new(service: AiTaskService) -> Self {
        Self { service }
    }
}

/// Generate a title or summary. Best effort: nothing here is retried except
/// a failed write to the store.
pub async fn ai_worker(job: AiJob, ctx: Data<AiContext>) -> Result<(), Error> {
    if !is_valid(queues::AI, &job) {
        return Ok(());
    }

    match ctx.service.run(job.note_id, job.task).await {
        Ok(AiTaskOutcome::Applied(_)) => Ok(()),
        Ok(outcome) => {
            debug!(note_id = job.note_id, task = %job.task, ?outcome, "AI task produced nothing");
            Ok(())
        }
        Err(e) => settle(queues::AI, None, job.note_id, e),
    }
}
