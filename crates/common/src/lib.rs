//! Common utilities and shared types for notes-engage.
//!
//! This crate provides foundational components used across all notes-engage crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Cache**: Redis cache and rate-limit facade via [`Cache`], plus the
//!   key layout in [`cache::keys`]
//!
//! # Example
//!
//! ```no_run
//! use engage_common::{AppResult, Cache, Config, cache::keys};
//!
//! async fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let cache = Cache::connect(&config.redis).await?;
//!     if !cache.allow_request(&keys::rate_limit(1, "create_note"), 5, 60).await {
//!         return Err(engage_common::AppError::RateLimited);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{Cache, CacheError, jittered_ttl};
pub use config::Config;
pub use error::{AppError, AppResult};
