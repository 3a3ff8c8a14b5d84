//! History worker.

use apalis::prelude::*;
use engage_core::HistoryService;
use tracing::debug;

use super::{is_valid, settle};
use crate::jobs::{HistoryJob, queues};

/// Context for the history worker.
#[derive(Clone)]
pub struct HistoryContext {
    pub service: HistoryService,
}

impl HistoryContext {
    /// Create a new history context.
    #[must_use]
    pub const fn new(service: HistoryService) -> Self {
        Self { service }
    }
}

/// Persist a note view.
pub async fn history_worker(job: HistoryJob, ctx: Data<HistoryContext>) -> Result<(), Error> {
    if !is_valid(queues::HISTORY, &job) {
        return Ok(());
    }

    match ctx.service.record(job.user_id, job.note_id).await {
        Ok(()) => {
            debug!(user_id = job.user_id, note_id = job.note_id, "Recorded view");
            Ok(())
        }
        Err(e) => settle(queues::HISTORY, Some(job.user_id), job.note_id, e),
    }
}
