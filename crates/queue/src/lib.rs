//! Job queues for notes-engage.
//!
//! This crate moves engagement writes off the request path:
//!
//! - **Jobs**: one message type per queue (favorite, react, history, feed, ai)
//! - **Client**: Redis-backed storages and the [`EngagementPublisher`] impl
//! - **Workers**: decode, validate, apply, acknowledge
//! - **Monitor**: runs every worker until shutdown
//!
//! [`EngagementPublisher`]: engage_core::EngagementPublisher

pub mod client;
pub mod jobs;
pub mod monitor;
pub mod workers;

pub use client::QueueClient;
pub use jobs::*;
pub use monitor::{MAX_ATTEMPTS, WorkerContexts, build_monitor, run_workers};
pub use workers::*;
