//! Favorite worker.

use apalis::prelude::*;
use engage_core::FavoriteService;
use tracing::{debug, info};

use super::{is_valid, settle};
use crate::jobs::{FavoriteJob, queues};

/// Context for the favorite worker.
#[derive(Clone)]
pub struct FavoriteContext {
    pub service: FavoriteService,
}

impl FavoriteContext {
    /// Create a new favorite context.
    #[must_use]
    pub const fn new(service: FavoriteService) -> Self {
        Self { service }
    }
}

/// Apply a favorite change.
pub async fn favorite_worker(job: FavoriteJob, ctx: Data<FavoriteContext>) -> Result<(), Error> {
    if !is_valid(queues::FAVORITE, &job) {
        return Ok(());
    }

    match ctx.service.apply(job.user_id, job.note_id, job.action).await {
        Ok(true) => {
            info!(user_id = job.user_id, note_id = job.note_id, action = %job.action, "Applied favorite");
            Ok(())
        }
        Ok(false) => {
            debug!(user_id = job.user_id, note_id = job.note_id, "Favorite replay ignored");
            Ok(())
        }
        Err(e) => settle(queues::FAVORITE, Some(job.user_id), job.note_id, e),
    }
}
