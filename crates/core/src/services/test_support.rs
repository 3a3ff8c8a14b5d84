//! Shared fixtures for service tests.

use super::ai_task::AiTask;
use super::favorite::FavoriteAction;
use super::publisher::EngagementPublisher;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use engage_common::{AppError, AppResult, Cache};
use engage_db::entities::note;
use fred::clients::Client as RedisClient;
use fred::types::config::Config as RedisClientConfig;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A cache whose client was never connected; every command fails or times out.
pub fn offline_cache() -> Cache {
    let client = RedisClient::new(RedisClientConfig::default(), None, None, None);
    Cache::new(Arc::new(client)).with_command_timeout(Duration::from_millis(50))
}

pub fn note_model(id: i64, user_id: i64) -> note::Model {
    note::Model {
        id,
        user_id,
        title: Some("Groceries".to_string()),
        content: "eggs, milk, bread".to_string(),
        summary: Some("A shopping list".to_string()),
        is_private: false,
        favorite_count: 0,
        reaction_counts: json!({}),
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

/// One call received by [`RecordingPublisher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Published {
    Favorite(i64, i64, FavoriteAction),
    Reaction(i64, i64, String),
    History(i64, i64),
    Feed(i64, i64),
    AiTask(i64, AiTask),
}

#[derive(Clone, Default)]
pub struct RecordingPublisher {
    pub calls: Arc<Mutex<Vec<Published>>>,
    pub fail: bool,
}

impl RecordingPublisher {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Published> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Published) -> AppResult<()> {
        if self.fail {
            return Err(AppError::Queue("broker unavailable".to_string()));
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

#[async_trait]
impl EngagementPublisher for RecordingPublisher {
    async fn publish_favorite(
        &self,
        user_id: i64,
        note_id: i64,
        action: FavoriteAction,
    ) -> AppResult<()> {
        self.record(Published::Favorite(user_id, note_id, action))
    }

    async fn publish_reaction(&self, user_id: i64, note_id: i64, emoji: &str) -> AppResult<()> {
        self.record(Published::Reaction(user_id, note_id, emoji.to_string()))
    }

    async fn publish_history(&self, user_id: i64, note_id: i64) -> AppResult<()> {
        self.record(Published::History(user_id, note_id))
    }

    async fn publish_feed(
        &self,
        author_id: i64,
        note_id: i64,
        _post_time: DateTime<Utc>,
    ) -> AppResult<()> {
        self.record(Published::Feed(author_id, note_id))
    }

    async fn publish_ai_task(&self, note_id: i64, task: AiTask) -> AppResult<()> {
        self.record(Published::AiTask(note_id, task))
    }
}
