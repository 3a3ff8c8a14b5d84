//! Following timeline reads.

use engage_common::{AppResult, Cache};
use engage_db::{entities::note, repositories::NoteRepository};
use tracing::{debug, warn};

/// Reads follower timelines, cache first.
#[derive(Clone)]
pub struct TimelineService {
    notes: NoteRepository,
    cache: Cache,
}

impl TimelineService {
    /// Create a new timeline service.
    #[must_use]
    pub const fn new(notes: NoteRepository, cache: Cache) -> Self {
        Self { notes, cache }
    }

    /// A page of the user's following timeline, newest first.
    ///
    /// Served from the cached list when it has entries for the page;
    /// an empty, evicted or unreachable list falls back to the store.
    pub async fn following_timeline(
        &self,
        user_id: i64,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<note::Model>> {
        match self
            .cache
            .timeline(user_id, offset as i64, limit as i64)
            .await
        {
            Ok(ids) if !ids.is_empty() => {
                debug!(user_id, count = ids.len(), "Timeline served from cache");
                return self.notes.find_by_ids(&ids).await;
            }
            Ok(_) => debug!(user_id, "Timeline cache empty, reading from store"),
            Err(e) => warn!(error = %e, user_id, "Timeline cache unavailable, reading from store"),
        }

        self.notes
            .find_following_timeline(user_id, offset, limit)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::test_support::{note_model, offline_cache};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_unavailable_cache_falls_back_to_store() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![note_model(8, 2), note_model(7, 3)]])
                .into_connection(),
        );
        let service = TimelineService::new(NoteRepository::new(db.clone()), offline_cache());

        let page = service.following_timeline(1, 0, 20).await.unwrap();
        assert_eq!(page.iter().map(|n| n.id).collect::<Vec<_>>(), vec![8, 7]);
        drop(service);

        let log = format!("{:?}", Arc::try_unwrap(db).unwrap().into_transaction_log());
        assert!(log.contains("following"));
        assert!(log.contains("is_private"));
    }
}
