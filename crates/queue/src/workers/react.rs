//! Reaction worker.

use apalis::prelude::*;
use engage_core::ReactionService;
use engage_db::repositories::ReactionToggle;
use tracing::{debug, info};

use super::{is_valid, settle};
use crate::jobs::{ReactJob, queues};

/// Context for the reaction worker.
#[derive(Clone)]
pub struct ReactContext {
    pub service: ReactionService,
}

impl ReactContext {
    /// Create a new reaction context.
    #[must_use]
    pub const fn new(service: ReactionService) -> Self {
        Self { service }
    }
}

/// Toggle a reaction.
pub async fn react_worker(job: ReactJob, ctx: Data<ReactContext>) -> Result<(), Error> {
    if !is_valid(queues::REACT, &job) {
        return Ok(());
    }

    let (user_id, note_id) = (job.user_id, job.note_id);
    match ctx.service.toggle(user_id, note_id, &job.emoji).await {
        Ok(ReactionToggle::Conflict) => {
            debug!(user_id, note_id, "Reaction raced a duplicate, acknowledged");
            Ok(())
        }
        Ok(outcome) => {
            info!(user_id, note_id, emoji = %job.emoji, ?outcome, "Applied reaction");
            Ok(())
        }
        Err(e) => settle(queues::REACT, Some(user_id), note_id, e),
    }
}
