//! Worker monitor.
//!
//! Runs one worker per queue under a single apalis monitor. Shutdown is
//! driven by an external signal; in-flight jobs get `shutdown_timeout` to
//! finish before the monitor returns.

use apalis::layers::retry::RetryPolicy;
use apalis::prelude::*;
use engage_common::{AppError, AppResult};
use std::future::Future;
use std::time::Duration;
use tracing::info;

use crate::client::QueueClient;
use crate::jobs::queues;
use crate::workers::{
    AiContext, FavoriteContext, FeedContext, HistoryContext, ReactContext, ai_worker,
    favorite_worker, feed_worker, history_worker, react_worker,
};

/// Attempts per job before the runtime gives up on transient failures.
pub const MAX_ATTEMPTS: usize = 5;

/// Contexts for every worker.
#[derive(Clone)]
pub struct WorkerContexts {
    pub favorite: FavoriteContext,
    pub react: ReactContext,
    pub history: HistoryContext,
    pub feed: FeedContext,
    pub ai: AiContext,
}

/// Build a monitor with every worker registered.
#[must_use]
pub fn build_monitor(
    queues: &QueueClient,
    contexts: WorkerContexts,
    shutdown_timeout: Duration,
) -> Monitor {
    Monitor::new()
        .register(
            WorkerBuilder::new(queues::FAVORITE)
                .retry(RetryPolicy::retries(MAX_ATTEMPTS))
                .enable_tracing()
                .data(contexts.favorite)
                .backend(queues.favorite_storage())
                .build_fn(favorite_worker),
        )
        .register(
            WorkerBuilder::new(queues::REACT)
                .retry(RetryPolicy::retries(MAX_ATTEMPTS))
                .enable_tracing()
                .data(contexts.react)
                .backend(queues.react_storage())
                .build_fn(react_worker),
        )
        .register(
            WorkerBuilder::new(queues::HISTORY)
                .retry(RetryPolicy::retries(MAX_ATTEMPTS))
                .enable_tracing()
                .data(contexts.history)
                .backend(queues.history_storage())
                .build_fn(history_worker),
        )
        .register(
            WorkerBuilder::new(queues::FEED)
                .retry(RetryPolicy::retries(MAX_ATTEMPTS))
                .enable_tracing()
                .data(contexts.feed)
                .backend(queues.feed_storage())
                .build_fn(feed_worker),
        )
        .register(
            WorkerBuilder::new(queues::AI)
                .retry(RetryPolicy::retries(MAX_ATTEMPTS))
                .enable_tracing()
                .data(contexts.ai)
                .backend(queues.ai_storage())
                .build_fn(ai_worker),
        )
        .shutdown_timeout(shutdown_timeout)
}

/// Run every worker until `shutdown` resolves.
pub async fn run_workers<S>(
    queues: &QueueClient,
    contexts: WorkerContexts,
    shutdown_timeout: Duration,
    shutdown: S,
) -> AppResult<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    info!(queues = ?queues::ALL, "Starting workers");

    build_monitor(queues, contexts, shutdown_timeout)
        .run_with_signal(async move {
            shutdown.await;
            info!("Stopping workers");
            Ok(())
        })
        .await
        .map_err(|e| AppError::Queue(format!("Worker monitor failed: {e}")))?;

    info!("Workers stopped");
    Ok(())
}
