//! notes-engage worker entry point.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use engage_common::{Cache, Config};
use engage_core::{
    AiTaskService, FavoriteService, FeedService, HistoryService, OpenAiTextGenerator,
    ReactionService, TextGenerator,
};
use engage_db::repositories::{
    FollowingRepository, NoteFavoriteRepository, NoteHistoryRepository, NoteRepository,
    ReactionRepository,
};
use engage_queue::{
    AiContext, FavoriteContext, FeedContext, HistoryContext, QueueClient, ReactContext,
    WorkerContexts, run_workers,
};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

fn init_tracing() {
    let json = std::env::var("ENGAGE_LOG_FORMAT").is_ok_and(|format| format == "json");
    let fmt_layer = if json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "engage=debug".into()),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    info!("Starting notes-engage workers...");

    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Connect to database
    let db = Arc::new(
        engage_db::init(&config)
            .await
            .context("Failed to connect to database")?,
    );
    info!("Connected to database");

    if config.database.migrate_on_startup {
        info!("Running database migrations...");
        engage_db::migrate(&db).await.context("Migrations failed")?;
        info!("Migrations completed");
    }

    // Connect to Redis: one client for the cache, one connection for the queues
    let cache = Cache::connect(&config.redis)
        .await
        .context("Failed to connect cache to Redis")?;
    let queues = QueueClient::connect(&config.redis.url)
        .await
        .context("Failed to connect job queues to Redis")?;
    info!("Connected to Redis");

    let generator: Arc<dyn TextGenerator> = Arc::new(
        OpenAiTextGenerator::new(&config.ai).context("Failed to set up text generator")?,
    );

    // Initialize repositories
    let note_repo = NoteRepository::new(db.clone());
    let favorite_repo = NoteFavoriteRepository::new(db.clone());
    let reaction_repo = ReactionRepository::new(db.clone());
    let history_repo = NoteHistoryRepository::new(db.clone());
    let following_repo = FollowingRepository::new(db);

    let contexts = WorkerContexts {
        favorite: FavoriteContext::new(FavoriteService::new(favorite_repo, cache.clone())),
        react: ReactContext::new(ReactionService::new(reaction_repo, cache.clone())),
        history: HistoryContext::new(HistoryService::new(history_repo)),
        feed: FeedContext::new(FeedService::new(
            following_repo,
            cache.clone(),
            config.queue.fanout_page_size,
            config.queue.timeline_max_len,
        )),
        ai: AiContext::new(AiTaskService::new(note_repo, generator, cache)),
    };

    run_workers(
        &queues,
        contexts,
        Duration::from_secs(config.queue.shutdown_timeout_secs),
        shutdown_signal(),
    )
    .await?;

    info!("Shutdown complete");
    Ok(())
}
