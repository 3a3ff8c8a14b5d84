//! Engagement intents.
//!
//! The synchronous side of the engine: validates a user's intent, clears
//! the cache entries the caller would otherwise read stale, and hands the
//! actual write to a worker queue. Nothing here touches engagement state in
//! the store.

use super::ai_task::AiTask;
use super::favorite::FavoriteAction;
use super::publisher::EngagementPublisherService;
use super::recent_notes::RecentNotesService;
use engage_common::{AppError, AppResult, Cache, cache::keys};
use engage_db::entities::note;
use tracing::{debug, info};

/// Upper bound on the length of a reaction, in characters.
pub const MAX_REACTION_CHARS: usize = 64;

/// Publishes engagement intents for the API layer.
#[derive(Clone)]
pub struct EngagementService {
    publisher: EngagementPublisherService,
    cache: Cache,
    recent_notes: RecentNotesService,
    ai_enabled: bool,
}

impl EngagementService {
    /// Create a new engagement service.
    #[must_use]
    pub fn new(
        publisher: EngagementPublisherService,
        cache: Cache,
        recent_notes: RecentNotesService,
        ai_enabled: bool,
    ) -> Self {
        Self {
            publisher,
            cache,
            recent_notes,
            ai_enabled,
        }
    }

    /// Reject the call when the user exceeded `limit` calls of `action`
    /// within `window_secs`.
    pub async fn check_rate_limit(
        &self,
        user_id: i64,
        action: &str,
        limit: i64,
        window_secs: i64,
    ) -> AppResult<()> {
        let key = keys::rate_limit(user_id, action);
        if self.cache.allow_request(&key, limit, window_secs).await {
            Ok(())
        } else {
            debug!(user_id, action, "Rate limit exceeded");
            Err(AppError::RateLimited)
        }
    }

    /// Favorite a note.
    pub async fn favorite(&self, user_id: i64, note_id: i64) -> AppResult<()> {
        self.change_favorite(user_id, note_id, FavoriteAction::Add).await
    }

    /// Remove a favorite.
    pub async fn unfavorite(&self, user_id: i64, note_id: i64) -> AppResult<()> {
        self.change_favorite(user_id, note_id, FavoriteAction::Remove)
            .await
    }

    async fn change_favorite(
        &self,
        user_id: i64,
        note_id: i64,
        action: FavoriteAction,
    ) -> AppResult<()> {
        self.cache
            .del_many(&[keys::note(note_id), keys::user_favorites(user_id)])
            .await;
        self.publisher
            .publish_favorite(user_id, note_id, action)
            .await
    }

    /// Toggle a reaction.
    pub async fn react(&self, user_id: i64, note_id: i64, emoji: &str) -> AppResult<()> {
        let emoji = emoji.trim();
        if emoji.is_empty() {
            return Err(AppError::Validation("Reaction must not be empty".to_string()));
        }
        if emoji.chars().count() > MAX_REACTION_CHARS {
            return Err(AppError::Validation(format!(
                "Reaction must be at most {MAX_REACTION_CHARS} characters"
            )));
        }

        self.publisher.publish_reaction(user_id, note_id, emoji).await
    }

    /// Record a note view.
    pub async fn record_view(&self, user_id: i64, note_id: i64) -> AppResult<()> {
        self.recent_notes.record_view(user_id, note_id).await
    }

    /// Follow-up work for a freshly created note.
    ///
    /// Clears the author's cached listings, fans public notes out to
    /// followers and, when enabled, asks for a missing title or summary.
    pub async fn note_created(&self, note: &note::Model) -> AppResult<()> {
        let cleared = self
            .cache
            .del_by_pattern(&keys::user_notes_pattern(note.user_id))
            .await;
        debug!(user_id = note.user_id, cleared, "Cleared note listings");

        if !note.is_private {
            self.publisher
                .publish_feed(note.user_id, note.id, note.created_at.into())
                .await?;
        }

        if self.ai_enabled {
            if note.title.is_none() {
                self.publisher
                    .publish_ai_task(note.id, AiTask::GenerateTitle)
                    .await?;
            }
            if note.summary.is_none() {
                self.publisher
                    .publish_ai_task(note.id, AiTask::GenerateSummary)
                    .await?;
            }
        }

        info!(note_id = note.id, user_id = note.user_id, "Published note follow-up");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::test_support::{Published, RecordingPublisher, note_model, offline_cache};
    use engage_common::config::CacheConfig;
    use engage_db::repositories::NoteHistoryRepository;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn service(publisher: RecordingPublisher, ai_enabled: bool) -> EngagementService {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let publisher: EngagementPublisherService = Arc::new(publisher);
        let recent_notes = RecentNotesService::new(
            NoteHistoryRepository::new(db),
            offline_cache(),
            publisher.clone(),
            &CacheConfig::default(),
        );
        EngagementService::new(publisher, offline_cache(), recent_notes, ai_enabled)
    }

    #[tokio::test]
    async fn test_favorite_and_unfavorite_enqueue() {
        let publisher = RecordingPublisher::default();
        let service = service(publisher.clone(), false);

        service.favorite(1, 10).await.unwrap();
        service.unfavorite(1, 10).await.unwrap();

        assert_eq!(
            publisher.calls(),
            vec![
                Published::Favorite(1, 10, FavoriteAction::Add),
                Published::Favorite(1, 10, FavoriteAction::Remove),
            ]
        );
    }

    #[tokio::test]
    async fn test_enqueue_failure_is_a_queue_error() {
        let service = service(RecordingPublisher::failing(), false);

        let err = service.favorite(1, 10).await.unwrap_err();
        assert!(matches!(err, AppError::Queue(_)));
        assert_eq!(err.status_code().as_u16(), 500);
    }

    #[tokio::test]
    async fn test_react_validates_emoji() {
        let publisher = RecordingPublisher::default();
        let service = service(publisher.clone(), false);

        assert!(matches!(
            service.react(1, 10, "  ").await.unwrap_err(),
            AppError::Validation(_)
        ));
        assert!(matches!(
            service.react(1, 10, &"x".repeat(65)).await.unwrap_err(),
            AppError::Validation(_)
        ));

        service.react(1, 10, " 🔥 ").await.unwrap();
        assert_eq!(
            publisher.calls(),
            vec![Published::Reaction(1, 10, "🔥".to_string())]
        );
    }

    #[tokio::test]
    async fn test_public_note_fans_out_and_requests_missing_fields() {
        let publisher = RecordingPublisher::default();
        let service = service(publisher.clone(), true);
        let mut note = note_model(5, 2);
        note.title = None;

        service.note_created(&note).await.unwrap();

        assert_eq!(
            publisher.calls(),
            vec![
                Published::Feed(2, 5),
                Published::AiTask(5, AiTask::GenerateTitle),
            ]
        );
    }

    #[tokio::test]
    async fn test_private_note_skips_fan_out() {
        let publisher = RecordingPublisher::default();
        let service = service(publisher.clone(), false);
        let mut note = note_model(5, 2);
        note.is_private = true;
        note.title = None;
        note.summary = None;

        service.note_created(&note).await.unwrap();
        assert!(publisher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_allows_when_cache_is_down() {
        let service = service(RecordingPublisher::default(), false);
        service.check_rate_limit(1, "react", 1, 60).await.unwrap();
        service.check_rate_limit(1, "react", 1, 60).await.unwrap();
    }
}
