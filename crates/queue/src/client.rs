//! Queue client.
//!
//! Owns one Redis-backed job storage per queue and publishes engagement
//! intents onto them. Each queue lives under its own namespace, so the
//! five queues never share keys.

use apalis::prelude::*;
use apalis_redis::RedisStorage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use engage_common::{AppError, AppResult};
use engage_core::{AiTask, EngagementPublisher, FavoriteAction};
use redis::aio::ConnectionManager;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info};

use crate::jobs::{AiJob, FavoriteJob, FeedJob, HistoryJob, ReactJob, queues};

fn storage<T: Serialize + DeserializeOwned>(conn: ConnectionManager, queue: &str) -> RedisStorage<T> {
    RedisStorage::new_with_config(conn, apalis_redis::Config::default().set_namespace(queue))
}

fn enqueue_error(queue: &str, err: impl std::fmt::Display) -> AppError {
    AppError::Queue(format!("Failed to enqueue on {queue}: {err}"))
}

/// Publishes jobs onto the five engagement queues.
#[derive(Clone)]
pub struct QueueClient {
    favorites: RedisStorage<FavoriteJob>,
    reactions: RedisStorage<ReactJob>,
    history: RedisStorage<HistoryJob>,
    feed: RedisStorage<FeedJob>,
    ai: RedisStorage<AiJob>,
}

impl QueueClient {
    /// Connect to Redis and declare every queue.
    pub async fn connect(redis_url: &str) -> AppResult<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| AppError::Queue(format!("Invalid Redis URL: {e}")))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Queue(format!("Failed to connect to Redis: {e}")))?;

        let queues = Self::declare(conn);
        info!(queues = ?queues::ALL, "Declared job queues");
        Ok(queues)
    }

    /// Declare every queue on an existing connection.
    #[must_use]
    pub fn declare(conn: ConnectionManager) -> Self {
        Self {
            favorites: storage(conn.clone(), queues::FAVORITE),
            reactions: storage(conn.clone(), queues::REACT),
            history: storage(conn.clone(), queues::HISTORY),
            feed: storage(conn.clone(), queues::FEED),
            ai: storage(conn, queues::AI),
        }
    }

    /// Storage backing `favorite_queue`.
    #[must_use]
    pub fn favorite_storage(&self) -> RedisStorage<FavoriteJob> {
        self.favorites.clone()
    }

    /// Storage backing `react_queue`.
    #[must_use]
    pub fn react_storage(&self) -> RedisStorage<ReactJob> {
        self.reactions.clone()
    }

    /// Storage backing `history_queue`.
    #[must_use]
    pub fn history_storage(&self) -> RedisStorage<HistoryJob> {
        self.history.clone()
    }

    /// Storage backing `feed_queue`.
    #[must_use]
    pub fn feed_storage(&self) -> RedisStorage<FeedJob> {
        self.feed.clone()
    }

    /// Storage backing `ai_queue`.
    #[must_use]
    pub fn ai_storage(&self) -> RedisStorage<AiJob> {
        self.ai.clone()
    }

    /// Enqueue a favorite job.
    pub async fn push_favorite(&self, job: FavoriteJob) -> AppResult<()> {
        self.favorites
            .clone()
            .push(job)
            .await
            .map_err(|e| enqueue_error(queues::FAVORITE, e))?;
        Ok(())
    }

    /// Enqueue a reaction job.
    pub async fn push_react(&self, job: ReactJob) -> AppResult<()> {
        self.reactions
            .clone()
            .push(job)
            .await
            .map_err(|e| enqueue_error(queues::REACT, e))?;
        Ok(())
    }

    /// Enqueue a history job.
    pub async fn push_history(&self, job: HistoryJob) -> AppResult<()> {
        self.history
            .clone()
            .push(job)
            .await
            .map_err(|e| enqueue_error(queues::HISTORY, e))?;
        Ok(())
    }

    /// Enqueue a feed job.
    pub async fn push_feed(&self, job: FeedJob) -> AppResult<()> {
        self.feed
            .clone()
            .push(job)
            .await
            .map_err(|e| enqueue_error(queues::FEED, e))?;
        Ok(())
    }

    /// Enqueue an AI job.
    pub async fn push_ai(&self, job: AiJob) -> AppResult<()> {
        self.ai
            .clone()
            .push(job)
            .await
            .map_err(|e| enqueue_error(queues::AI, e))?;
        Ok(())
    }
}

#[async_trait]
impl EngagementPublisher for QueueClient {
    async fn publish_favorite(
        &self,
        user_id: i64,
        note_id: i64,
        action: FavoriteAction,
    ) -> AppResult<()> {
        self.push_favorite(FavoriteJob::new(user_id, note_id, action))
            .await?;
        debug!(user_id, note_id, %action, queue = queues::FAVORITE, "Queued favorite");
        Ok(())
    }

    async fn publish_reaction(&self, user_id: i64, note_id: i64, emoji: &str) -> AppResult<()> {
        self.push_react(ReactJob::new(user_id, note_id, emoji.to_string()))
            .await?;
        debug!(user_id, note_id, emoji, queue = queues::REACT, "Queued reaction");
        Ok(())
    }

    async fn publish_history(&self, user_id: i64, note_id: i64) -> AppResult<()> {
        self.push_history(HistoryJob::new(user_id, note_id)).await?;
        debug!(user_id, note_id, queue = queues::HISTORY, "Queued history");
        Ok(())
    }

    async fn publish_feed(
        &self,
        author_id: i64,
        note_id: i64,
        post_time: DateTime<Utc>,
    ) -> AppResult<()> {
        self.push_feed(FeedJob::new(author_id, note_id, post_time))
            .await?;
        debug!(author_id, note_id, queue = queues::FEED, "Queued fan-out");
        Ok(())
    }

    async fn publish_ai_task(&self, note_id: i64, task: AiTask) -> AppResult<()> {
        self.push_ai(AiJob::new(note_id, task)).await?;
        debug!(note_id, %task, queue = queues::AI, "Queued AI task");
        Ok(())
    }
}
