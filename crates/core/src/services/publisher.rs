//! Engagement publisher.
//!
//! Services publish engagement intents through this trait without depending
//! on the queue crate, which provides the Redis-backed implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use engage_common::AppResult;
use std::sync::Arc;

use super::ai_task::AiTask;
use super::favorite::FavoriteAction;

/// Trait for publishing engagement intents to the worker queues.
#[async_trait]
pub trait EngagementPublisher: Send + Sync {
    /// Enqueue a favorite change.
    async fn publish_favorite(
        &self,
        user_id: i64,
        note_id: i64,
        action: FavoriteAction,
    ) -> AppResult<()>;

    /// Enqueue a reaction toggle.
    async fn publish_reaction(&self, user_id: i64, note_id: i64, emoji: &str) -> AppResult<()>;

    /// Enqueue a history update.
    async fn publish_history(&self, user_id: i64, note_id: i64) -> AppResult<()>;

    /// Enqueue a feed fan-out for a new public note.
    async fn publish_feed(
        &self,
        author_id: i64,
        note_id: i64,
        post_time: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Enqueue a title or summary generation task.
    async fn publish_ai_task(&self, note_id: i64, task: AiTask) -> AppResult<()>;
}

/// Shared engagement publisher handle.
pub type EngagementPublisherService = Arc<dyn EngagementPublisher>;

/// Publisher that drops everything, for tests and tooling.
#[derive(Clone, Default)]
pub struct NoOpEngagementPublisher;

#[async_trait]
impl EngagementPublisher for NoOpEngagementPublisher {
    async fn publish_favorite(
        &self,
        _user_id: i64,
        _note_id: i64,
        _action: FavoriteAction,
    ) -> AppResult<()> {
        Ok(())
    }

    async fn publish_reaction(&self, _user_id: i64, _note_id: i64, _emoji: &str) -> AppResult<()> {
        Ok(())
    }

    async fn publish_history(&self, _user_id: i64, _note_id: i64) -> AppResult<()> {
        Ok(())
    }

    async fn publish_feed(
        &self,
        _author_id: i64,
        _note_id: i64,
        _post_time: DateTime<Utc>,
    ) -> AppResult<()> {
        Ok(())
    }

    async fn publish_ai_task(&self, _note_id: i64, _task: AiTask) -> AppResult<()> {
        Ok(())
    }
}
