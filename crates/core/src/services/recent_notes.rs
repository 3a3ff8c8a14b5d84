//! Recently viewed notes.
//!
//! The newest views of each user live in a capped sorted set; the durable
//! copy is written by the history worker. A cold set is rebuilt from the
//! store on first read.

use super::publisher::EngagementPublisherService;
use chrono::Utc;
use engage_common::{AppResult, Cache, config::CacheConfig};
use engage_db::repositories::NoteHistoryRepository;
use std::time::Duration;
use tracing::{debug, warn};

/// Records and reads recently viewed notes.
#[derive(Clone)]
pub struct RecentNotesService {
    history: NoteHistoryRepository,
    cache: Cache,
    publisher: EngagementPublisherService,
    keep: i64,
    ttl: Duration,
}

impl RecentNotesService {
    /// Create a new recent notes service.
    #[must_use]
    pub fn new(
        history: NoteHistoryRepository,
        cache: Cache,
        publisher: EngagementPublisherService,
        config: &CacheConfig,
    ) -> Self {
        Self {
            history,
            cache,
            publisher,
            keep: config.recent_views.max(1),
            ttl: Duration::from_secs(config.recent_views_ttl_secs.unsigned_abs()),
        }
    }

    /// Move the note to the top of the user's recent views and enqueue the
    /// durable history update.
    pub async fn record_view(&self, user_id: i64, note_id: i64) -> AppResult<()> {
        let now = Utc::now().timestamp();
        if let Err(e) = self
            .cache
            .record_recent_view(user_id, note_id, now, self.keep, self.ttl)
            .await
        {
            warn!(error = %e, user_id, note_id, "Recent views cache update skipped");
        }

        self.publisher.publish_history(user_id, note_id).await
    }

    /// Ids of the user's most recently viewed notes, newest first.
    pub async fn recent_note_ids(&self, user_id: i64) -> AppResult<Vec<i64>> {
        match self.cache.recent_views(user_id, self.keep).await {
            Ok(ids) if !ids.is_empty() => return Ok(ids),
            Ok(_) => debug!(user_id, "Recent views cache cold, rebuilding"),
            Err(e) => warn!(error = %e, user_id, "Recent views cache unavailable, rebuilding"),
        }

        let entries = self.history.find_recent(user_id, self.keep.unsigned_abs()).await?;
        let pairs: Vec<(i64, i64)> = entries
            .iter()
            .map(|entry| (entry.note_id, entry.viewed_at.timestamp()))
            .collect();

        if let Err(e) = self.cache.warm_recent_views(user_id, &pairs, self.ttl).await {
            warn!(error = %e, user_id, "Recent views cache warm-up skipped");
        }

        Ok(pairs.into_iter().map(|(note_id, _)| note_id).collect())
    }
}
