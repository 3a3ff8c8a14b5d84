//! Redis cache and rate-limit facade.
//!
//! Everything that touches the cache store goes through [`Cache`]:
//!
//! - read-through entity caching with jittered TTL
//! - cursor based pattern invalidation (`SCAN` + pipelined `DEL`)
//! - capped per-user timelines (lists) and recently viewed sets (sorted sets)
//! - an atomic fixed-window rate limiter implemented as a Lua script
//! - a token blacklist
//!
//! Plain cache reads and writes degrade instead of failing: an unreachable
//! store reads as a miss, writes are skipped, the rate limiter allows.
//! Timeline and recency helpers return [`CacheError`] so callers can choose
//! a relational fallback.

use crate::config::RedisConfig;
use crate::error::AppError;
use fred::clients::Client as RedisClient;
use fred::interfaces::{ClientLike, KeysInterface, ListInterface, LuaInterface, SortedSetsInterface};
use fred::types::config::{Config as RedisClientConfig, ReconnectPolicy};
use fred::types::scan::Scanner;
use fred::types::{Expiration, Key, Value};
use futures::TryStreamExt;
use rand::Rng;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Keys fetched per `SCAN` round trip during pattern deletes.
pub const SCAN_BATCH_SIZE: u32 = 100;

/// Jitter applied to TTLs, as a fraction of the base (1/5 = 20%).
const JITTER_DIVISOR: i64 = 5;

/// Jittered TTLs never drop below this.
const MIN_TTL_SECS: i64 = 1;

const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(2);

/// `INCR` the counter and start the window on the first hit.
const RATE_LIMIT_SCRIPT: &str = r"
local current = redis.call('INCR', KEYS[1])
if current == 1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return current
";

/// Cache key builders.
pub mod keys {
    /// Cached note body.
    #[must_use]
    pub fn note(note_id: i64) -> String {
        format!("note:{note_id}")
    }

    /// A user's note listing.
    #[must_use]
    pub fn user_notes(user_id: i64) -> String {
        format!("notes:user:{user_id}")
    }

    /// A user's note listing filtered by tag.
    #[must_use]
    pub fn user_notes_by_tag(user_id: i64, tag_id: i64) -> String {
        format!("notes:user:{user_id}:tag:{tag_id}")
    }

    /// Pattern matching every note listing of a user, tagged or not.
    #[must_use]
    pub fn user_notes_pattern(user_id: i64) -> String {
        format!("notes:user:{user_id}*")
    }

    /// A user's favorited notes listing.
    #[must_use]
    pub fn user_favorites(user_id: i64) -> String {
        format!("notes:favorites:{user_id}")
    }

    /// A user's tag list.
    #[must_use]
    pub fn user_tags(user_id: i64) -> String {
        format!("tags:user:{user_id}")
    }

    /// A single tag.
    #[must_use]
    pub fn tag(tag_id: i64) -> String {
        format!("tag:{tag_id}")
    }

    /// A user's session.
    #[must_use]
    pub fn user_session(user_id: i64) -> String {
        format!("user:session:{user_id}")
    }

    /// A user's recently viewed notes (sorted set scored by view time).
    #[must_use]
    pub fn user_history(user_id: i64) -> String {
        format!("user:history:{user_id}")
    }

    /// A user's following timeline (newest first list).
    #[must_use]
    pub fn timeline(user_id: i64) -> String {
        format!("timeline:user:{user_id}")
    }

    /// Rate limit counter for one user and action.
    #[must_use]
    pub fn rate_limit(user_id: i64, action: &str) -> String {
        format!("rate:limit:{user_id}:{action}")
    }

    /// Revoked token marker.
    #[must_use]
    pub fn token_blacklist(jti: &str) -> String {
        format!("blacklist:{jti}")
    }
}

/// Cache error type.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(String),

    #[error("Redis command timed out after {0:?}")]
    Timeout(Duration),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<fred::error::Error> for CacheError {
    fn from(err: fred::error::Error) -> Self {
        Self::Redis(err.to_string())
    }
}

impl From<CacheError> for AppError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Serialization(msg) => Self::Internal(msg),
            other => Self::Redis(other.to_string()),
        }
    }
}

/// Pick a TTL uniformly from `base ± 20%`, never below one second.
///
/// Spreading expirations keeps keys written together from expiring together.
pub fn jittered_ttl<R: Rng + ?Sized>(base: Duration, rng: &mut R) -> Duration {
    let base_secs = i64::try_from(base.as_secs()).unwrap_or(i64::MAX);
    let spread = base_secs / JITTER_DIVISOR;
    let offset = if spread > 0 {
        rng.gen_range(-spread..=spread)
    } else {
        0
    };
    let secs = base_secs.saturating_add(offset).max(MIN_TTL_SECS);
    Duration::from_secs(secs.unsigned_abs())
}

fn parse_ids(raw: Vec<String>) -> Vec<i64> {
    raw.into_iter().filter_map(|s| s.parse().ok()).collect()
}

fn ttl_secs(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX).max(MIN_TTL_SECS)
}

/// Cache and rate-limit facade over a shared Redis client.
#[derive(Clone)]
pub struct Cache {
    redis: Arc<RedisClient>,
    command_timeout: Duration,
}

impl Cache {
    /// Wrap an already connected client.
    #[must_use]
    pub const fn new(redis: Arc<RedisClient>) -> Self {
        Self {
            redis,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// Override the per-command timeout.
    #[must_use]
    pub const fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Connect a new client with exponential reconnect backoff.
    pub async fn connect(config: &RedisConfig) -> Result<Self, CacheError> {
        let redis_config = RedisClientConfig::from_url(&config.url)?;
        let policy = ReconnectPolicy::new_exponential(0, 100, 30_000, 2);
        let client = RedisClient::new(redis_config, None, None, Some(policy));
        client.init().await?;

        Ok(Self::new(Arc::new(client)).with_command_timeout(config.command_timeout()))
    }

    /// The underlying client.
    #[must_use]
    pub const fn client(&self) -> &Arc<RedisClient> {
        &self.redis
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, CacheError>
    where
        F: Future<Output = Result<T, fred::error::Error>>,
    {
        match tokio::time::timeout(self.command_timeout, fut).await {
            Ok(result) => result.map_err(CacheError::from),
            Err(_) => Err(CacheError::Timeout(self.command_timeout)),
        }
    }

    // === Key/value ===

    /// Read a string value. Errors read as a miss.
    pub async fn get(&self, key: &str) -> Option<String> {
        match self.bounded(self.redis.get::<Option<String>, _>(key)).await {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, key = %key, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// Read and decode a JSON value. Undecodable entries read as a miss.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(key = %key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(error = %e, key = %key, "Discarding undecodable cache entry");
                None
            }
        }
    }

    /// Store a value with a TTL jittered around `base_ttl`. Errors are logged.
    pub async fn set_with_jitter(&self, key: &str, value: &str, base_ttl: Duration) {
        let ttl = jittered_ttl(base_ttl, &mut rand::thread_rng());
        let result = self
            .bounded(self.redis.set::<(), _, _>(
                key,
                value,
                Some(Expiration::EX(ttl_secs(ttl))),
                None,
                false,
            ))
            .await;

        if let Err(e) = result {
            warn!(error = %e, key = %key, "Cache write skipped");
        }
    }

    /// Encode a value as JSON and store it with a jittered TTL.
    pub async fn set_json_with_jitter<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        base_ttl: Duration,
    ) {
        match serde_json::to_string(value) {
            Ok(json) => self.set_with_jitter(key, &json, base_ttl).await,
            Err(e) => warn!(error = %e, key = %key, "Cache value not serializable"),
        }
    }

    /// Delete a key. Errors are logged.
    pub async fn del(&self, key: &str) {
        if let Err(e) = self.bounded(self.redis.del::<(), _>(key)).await {
            warn!(error = %e, key = %key, "Cache delete failed");
        }
    }

    /// Delete several keys in one command. Errors are logged.
    pub async fn del_many(&self, keys: &[String]) {
        if keys.is_empty() {
            return;
        }
        let batch: Vec<Key> = keys.iter().map(|k| Key::from(k.as_str())).collect();
        if let Err(e) = self.bounded(self.redis.del::<(), _>(batch)).await {
            warn!(error = %e, count = keys.len(), "Cache delete failed");
        }
    }

    /// Delete every key matching `pattern` and return how many were found.
    ///
    /// Walks the keyspace with `SCAN` in batches of [`SCAN_BATCH_SIZE`]; each
    /// batch is deleted with one pipeline. Stops at the first error.
    pub async fn del_by_pattern(&self, pattern: &str) -> usize {
        match self.try_del_by_pattern(pattern).await {
            Ok(deleted) => {
                debug!(pattern = %pattern, deleted, "Cleared cache by pattern");
                deleted
            }
            Err(e) => {
                warn!(error = %e, pattern = %pattern, "Pattern delete aborted");
                0
            }
        }
    }

    async fn try_del_by_pattern(&self, pattern: &str) -> Result<usize, CacheError> {
        let mut pages = pin!(self.redis.scan(pattern, Some(SCAN_BATCH_SIZE), None));
        let mut deleted = 0;

        while let Some(mut page) = self.bounded(pages.try_next()).await? {
            let batch = page.take_results().unwrap_or_default();
            if !batch.is_empty() {
                let count = batch.len();
                self.bounded(async {
                    let pipeline = self.redis.pipeline();
                    for key in batch {
                        let _: () = pipeline.del(key).await?;
                    }
                    pipeline.all::<Vec<Value>>().await
                })
                .await?;
                deleted += count;
            }
            page.next();
        }

        Ok(deleted)
    }

    // === Rate limiting ===

    /// Fixed-window rate limit check.
    ///
    /// The counter is incremented and, on the first hit of a window, given
    /// a `window_secs` expiry in a single script call. Allowed while the
    /// count stays within `limit`. Errors allow the request.
    pub async fn allow_request(&self, key: &str, limit: i64, window_secs: i64) -> bool {
        match self.try_allow_request(key, limit, window_secs).await {
            Ok(allowed) => allowed,
            Err(e) => {
                warn!(error = %e, key = %key, "Rate limiter unavailable, allowing request");
                true
            }
        }
    }

    /// Fallible form of [`Cache::allow_request`].
    pub async fn try_allow_request(
        &self,
        key: &str,
        limit: i64,
        window_secs: i64,
    ) -> Result<bool, CacheError> {
        let count: i64 = self
            .bounded(self.redis.eval::<i64, _, _, _>(
                RATE_LIMIT_SCRIPT,
                vec![key.to_string()],
                vec![window_secs],
            ))
            .await?;

        Ok(count <= limit)
    }

    // === Timelines ===

    /// Prepend `note_id` to each follower's timeline and cap it at `max_len`.
    ///
    /// One pipeline for the whole slice.
    pub async fn push_to_timelines(
        &self,
        follower_ids: &[i64],
        note_id: i64,
        max_len: i64,
    ) -> Result<(), CacheError> {
        if follower_ids.is_empty() {
            return Ok(());
        }

        self.bounded(async {
            let pipeline = self.redis.pipeline();
            for follower_id in follower_ids {
                let key = keys::timeline(*follower_id);
                let _: () = pipeline.lpush(key.as_str(), note_id).await?;
                let _: () = pipeline.ltrim(key.as_str(), 0, max_len - 1).await?;
            }
            pipeline.all::<Vec<Value>>().await
        })
        .await?;

        Ok(())
    }

    /// Read a page of a user's timeline, newest first.
    pub async fn timeline(
        &self,
        user_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<i64>, CacheError> {
        if limit <= 0 {
            return Ok(Vec::new());
        }
        let raw: Vec<String> = self
            .bounded(
                self.redis
                    .lrange(keys::timeline(user_id), offset, offset + limit - 1),
            )
            .await?;
        Ok(parse_ids(raw))
    }

    // === Recently viewed ===

    /// Move `note_id` to the top of the user's recently viewed set.
    ///
    /// Keeps the newest `keep` entries and refreshes the set's expiry.
    #[allow(clippy::cast_precision_loss)] // unix seconds fit in an f64 mantissa
    pub async fn record_recent_view(
        &self,
        user_id: i64,
        note_id: i64,
        viewed_at: i64,
        keep: i64,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let key = keys::user_history(user_id);
        self.bounded(async {
            let pipeline = self.redis.pipeline();
            let _: () = pipeline.zrem(key.as_str(), note_id).await?;
            let _: () = pipeline
                .zadd(key.as_str(), None, None, false, false, (viewed_at as f64, note_id))
                .await?;
            let _: () = pipeline.zremrangebyrank(key.as_str(), 0, -(keep + 1)).await?;
            let _: () = pipeline.expire(key.as_str(), ttl_secs(ttl), None).await?;
            pipeline.all::<Vec<Value>>().await
        })
        .await?;
        Ok(())
    }

    /// Note ids from the recently viewed set, most recent first.
    pub async fn recent_views(&self, user_id: i64, count: i64) -> Result<Vec<i64>, CacheError> {
        if count <= 0 {
            return Ok(Vec::new());
        }
        let raw: Vec<String> = self
            .bounded(
                self.redis
                    .zrevrange(keys::user_history(user_id), 0, count - 1, false),
            )
            .await?;
        Ok(parse_ids(raw))
    }

    /// Rebuild the recently viewed set from `(note_id, viewed_at)` pairs.
    #[allow(clippy::cast_precision_loss)] // unix seconds fit in an f64 mantissa
    pub async fn warm_recent_views(
        &self,
        user_id: i64,
        entries: &[(i64, i64)],
        ttl: Duration,
    ) -> Result<(), CacheError> {
        if entries.is_empty() {
            return Ok(());
        }
        let key = keys::user_history(user_id);
        let members: Vec<(f64, i64)> = entries
            .iter()
            .map(|(note_id, viewed_at)| (*viewed_at as f64, *note_id))
            .collect();

        self.bounded(async {
            let pipeline = self.redis.pipeline();
            let _: () = pipeline
                .zadd(key.as_str(), None, None, false, false, members)
                .await?;
            let _: () = pipeline.expire(key.as_str(), ttl_secs(ttl), None).await?;
            pipeline.all::<Vec<Value>>().await
        })
        .await?;
        Ok(())
    }

    // === Tokens ===

    /// Mark a token id as revoked until `ttl` elapses.
    pub async fn blacklist_token(&self, jti: &str, ttl: Duration) -> Result<(), CacheError> {
        self.bounded(self.redis.set::<(), _, _>(
            keys::token_blacklist(jti),
            "1",
            Some(Expiration::EX(ttl_secs(ttl))),
            None,
            false,
        ))
        .await
    }

    /// Whether a token id was revoked. Errors read as "not revoked".
    pub async fn is_token_blacklisted(&self, jti: &str) -> bool {
        match self
            .bounded(self.redis.exists::<i64, _>(keys::token_blacklist(jti)))
            .await
        {
            Ok(found) => found > 0,
            Err(e) => {
                warn!(error = %e, "Blacklist check failed, treating token as valid");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn jitter_stays_within_twenty_percent() {
        let mut rng = StdRng::seed_from_u64(7);
        let base = Duration::from_secs(600);
        let mut seen_below = false;
        let mut seen_above = false;

        for _ in 0..10_000 {
            let ttl = jittered_ttl(base, &mut rng).as_secs();
            assert!((480..=720).contains(&ttl), "ttl {ttl} out of range");
            seen_below |= ttl < 600;
            seen_above |= ttl > 600;
        }

        assert!(seen_below && seen_above);
    }

    #[test]
    fn jitter_never_goes_below_one_second() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(jittered_ttl(Duration::ZERO, &mut rng), Duration::from_secs(1));
        assert_eq!(
            jittered_ttl(Duration::from_secs(1), &mut rng),
            Duration::from_secs(1)
        );
        for _ in 0..1_000 {
            assert!(jittered_ttl(Duration::from_secs(5), &mut rng) >= Duration::from_secs(4));
        }
    }

    #[test]
    fn key_layout() {
        assert_eq!(keys::note(42), "note:42");
        assert_eq!(keys::user_notes_by_tag(3, 9), "notes:user:3:tag:9");
        assert_eq!(keys::user_notes_pattern(3), "notes:user:3*");
        assert_eq!(keys::user_favorites(3), "notes:favorites:3");
        assert_eq!(keys::user_history(3), "user:history:3");
        assert_eq!(keys::timeline(3), "timeline:user:3");
        assert_eq!(keys::rate_limit(3, "create_note"), "rate:limit:3:create_note");
        assert_eq!(keys::token_blacklist("abc"), "blacklist:abc");
    }

    #[test]
    fn unparseable_ids_are_skipped() {
        let raw = vec!["1".to_string(), "x".to_string(), "3".to_string()];
        assert_eq!(parse_ids(raw), vec![1, 3]);
    }

    #[test]
    fn cache_errors_map_to_server_errors() {
        let err: AppError = CacheError::Timeout(Duration::from_secs(2)).into();
        assert!(matches!(err, AppError::Redis(_)));
    }
}
