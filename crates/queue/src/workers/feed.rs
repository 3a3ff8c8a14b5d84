//! Feed fan-out worker.

use apalis::prelude::*;
use engage_core::FeedService;
use tracing::debug;

use super::{is_valid, settle};
use crate::jobs::{FeedJob, queues};

/// Context for the feed worker.
#[derive(Clone)]
pub struct FeedContext {
    pub service: FeedService,
}

impl FeedContext {
    /// Create a new feed context.
    #[must_use]
    pub const fn new(service: FeedService) -> Self {
        Self { service }
    }
}

/// Fan a note out to follower timelines.
pub async fn feed_worker(job: FeedJob, ctx: Data<FeedContext>) -> Result<(), Error> {
    if !is_valid(queues::FEED, &job) {
        return Ok(());
    }

    match ctx.service.fan_out(job.author_id, job.note_id).await {
        Ok(summary) => {
            debug!(
                author_id = job.author_id,
                note_id = job.note_id,
                post_time = %job.post_time,
                delivered = summary.delivered,
                "Fan-out finished"
            );
            Ok(())
        }
        Err(e) => settle(queues::FEED, None, job.note_id, e),
    }
}
