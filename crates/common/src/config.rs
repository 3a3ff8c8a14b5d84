//! Application configuration.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Redis configuration.
    pub redis: RedisConfig,
    /// Queue and worker configuration.
    #[serde(default)]
    pub queue: QueueConfig,
    /// Cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Text generation configuration.
    #[serde(default)]
    pub ai: AiConfig,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Run pending migrations on startup.
    #[serde(default = "default_true")]
    pub migrate_on_startup: bool,
}

/// Redis configuration.
///
/// The same instance backs the cache and the job queues.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL.
    pub url: String,
    /// Upper bound for a single cache command, in milliseconds.
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
}

/// Queue and worker configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Followers loaded per page during feed fan-out.
    #[serde(default = "default_fanout_page_size")]
    pub fanout_page_size: u64,
    /// Maximum length of a follower timeline.
    #[serde(default = "default_timeline_max_len")]
    pub timeline_max_len: i64,
    /// Seconds the monitor waits for in-flight jobs on shutdown.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

/// Cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Base TTL for cached notes, in seconds.
    #[serde(default = "default_note_ttl_secs")]
    pub note_ttl_secs: u64,
    /// Number of entries kept in a user's recently viewed set.
    #[serde(default = "default_recent_views")]
    pub recent_views: i64,
    /// Lifetime of a user's recently viewed set, in seconds.
    #[serde(default = "default_recent_views_ttl_secs")]
    pub recent_views_ttl_secs: i64,
}

/// OpenAI-compatible text generation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Whether title and summary tasks are enqueued at all.
    #[serde(default)]
    pub enabled: bool,
    /// API base URL, without the `/chat/completions` suffix.
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,
    /// Bearer token.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model name.
    #[serde(default = "default_ai_model")]
    pub model: String,
    /// Request timeout in seconds.
    #[serde(default = "default_ai_timeout_secs")]
    pub timeout_secs: u64,
    /// Input is truncated to this many characters before sending.
    #[serde(default = "default_ai_max_input_chars")]
    pub max_input_chars: usize,
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_true() -> bool {
    true
}

const fn default_command_timeout_ms() -> u64 {
    2_000
}

const fn default_fanout_page_size() -> u64 {
    1_000
}

const fn default_timeline_max_len() -> i64 {
    500
}

const fn default_shutdown_timeout_secs() -> u64 {
    30
}

const fn default_note_ttl_secs() -> u64 {
    600
}

const fn default_recent_views() -> i64 {
    5
}

const fn default_recent_views_ttl_secs() -> i64 {
    30 * 24 * 60 * 60
}

fn default_ai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_ai_model() -> String {
    "gpt-4o-mini".to_string()
}

const fn default_ai_timeout_secs() -> u64 {
    30
}

const fn default_ai_max_input_chars() -> usize {
    2_000
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            fanout_page_size: default_fanout_page_size(),
            timeline_max_len: default_timeline_max_len(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            note_ttl_secs: default_note_ttl_secs(),
            recent_views: default_recent_views(),
            recent_views_ttl_secs: default_recent_views_ttl_secs(),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_ai_base_url(),
            api_key: None,
            model: default_ai_model(),
            timeout_secs: default_ai_timeout_secs(),
            max_input_chars: default_ai_max_input_chars(),
        }
    }
}

impl RedisConfig {
    /// Command timeout as a [`Duration`].
    #[must_use]
    pub const fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

impl CacheConfig {
    /// Base note TTL as a [`Duration`].
    #[must_use]
    pub const fn note_ttl(&self) -> Duration {
        Duration::from_secs(self.note_ttl_secs)
    }
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `ENGAGE_ENV`)
    /// 4. Environment variables with `ENGAGE__` prefix, e.g. `ENGAGE__REDIS__URL`
    pub fn load() -> Result<Self, config::ConfigError> {
        let _ = dotenvy::dotenv();
        let env = std::env::var("ENGAGE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("ENGAGE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("ENGAGE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
