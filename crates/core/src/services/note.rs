//! Read-through note cache.

use engage_common::{AppResult, Cache, cache::keys};
use engage_db::{entities::note, repositories::NoteRepository};
use std::time::Duration;

/// Serves notes from the cache, loading and caching on a miss.
#[derive(Clone)]
pub struct NoteCacheService {
    notes: NoteRepository,
    cache: Cache,
    ttl: Duration,
}

impl NoteCacheService {
    /// Create a new note cache service. Entries live for about `ttl`.
    #[must_use]
    pub const fn new(notes: NoteRepository, cache: Cache, ttl: Duration) -> Self {
        Self { notes, cache, ttl }
    }

    /// Get a note, from the cache when present.
    pub async fn cached_note(&self, note_id: i64) -> AppResult<note::Model> {
        let key = keys::note(note_id);
        if let Some(note) = self.cache.get_json::<note::Model>(&key).await {
            return Ok(note);
        }

        let note = self.notes.get_by_id(note_id).await?;
        self.cache.set_json_with_jitter(&key, &note, self.ttl).await;
        Ok(note)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::test_support::{note_model, offline_cache};
    use engage_common::AppError;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_miss_loads_from_store() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![note_model(9, 1)]])
                .into_connection(),
        );
        let service = NoteCacheService::new(
            NoteRepository::new(db),
            offline_cache(),
            Duration::from_secs(600),
        );

        let note = service.cached_note(9).await.unwrap();
        assert_eq!(note.id, 9);
        assert_eq!(note.content, "eggs, milk, bread");
    }

    #[tokio::test]
    async fn test_missing_note_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<note::Model>::new()])
                .into_connection(),
        );
        let service = NoteCacheService::new(
            NoteRepository::new(db),
            offline_cache(),
            Duration::from_secs(600),
        );

        let err = service.cached_note(9).await.unwrap_err();
        assert!(matches!(err, AppError::NoteNotFound(9)));
    }
}
