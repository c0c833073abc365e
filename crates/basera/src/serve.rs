// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `basera serve` command implementation.
//!
//! Starts the scheduled task loop with the bot reply pipeline wired in:
//! SQLite storage, the answer service client, the in-process realtime hub,
//! and the optional notification and profile directory collaborators.
//! Supports graceful shutdown via signal handlers.

use std::sync::Arc;
use std::time::Duration;

use basera_answer::AnswerClient;
use basera_chat::ChatService;
use basera_chat::reply::BotReplyHandler;
use basera_config::BaseraConfig;
use basera_core::{BaseraError, Notifier};
use basera_directory::DirectoryClient;
use basera_notify::NotifyClient;
use basera_realtime::RealtimeHub;
use basera_scheduler::registry::HandlerRegistry;
use basera_scheduler::{Scheduler, shutdown};
use basera_storage::Database;
use tracing::{debug, info};

/// Runs the `basera serve` command.
///
/// Opens the database, wires the reply pipeline into the handler registry,
/// recovers tasks stranded by a previous crash, and enters the scheduler
/// loop until a shutdown signal arrives.
pub async fn run_serve(config: BaseraConfig) -> Result<(), BaseraError> {
    // Initialize tracing subscriber.
    init_tracing(&config.service.log_level);

    info!("starting basera serve");

    // Open storage and apply pending migrations.
    let db = Database::open(&config.storage.database_path, config.storage.wal_mode).await?;
    info!(path = config.storage.database_path.as_str(), "database ready");

    // Profile directory is optional; without it chat lists fall back to
    // id-only profiles.
    let chats = match config.directory.base_url.as_deref() {
        Some(base_url) => {
            let directory = DirectoryClient::new(base_url.to_string())?;
            info!(base_url, "profile directory enabled");
            ChatService::new(db.clone()).with_directory(Arc::new(directory))
        }
        None => {
            debug!("profile directory not configured");
            ChatService::new(db.clone())
        }
    };
    let chats = Arc::new(chats);

    let answer = Arc::new(AnswerClient::new(
        config.answer.base_url.clone(),
        Duration::from_secs(config.answer.timeout_secs),
    )?);
    info!(
        base_url = config.answer.base_url.as_str(),
        timeout_secs = config.answer.timeout_secs,
        "answer client ready"
    );

    // Notifications are best-effort and can be switched off entirely.
    let notifier: Option<Arc<dyn Notifier>> = if config.notify.enabled {
        let client = NotifyClient::new(config.notify.base_url.clone())?;
        info!(
            base_url = config.notify.base_url.as_str(),
            "notification client ready"
        );
        Some(Arc::new(client))
    } else {
        info!("notifications disabled by configuration");
        None
    };

    let hub = Arc::new(RealtimeHub::new());

    let reply_handler = BotReplyHandler::new(
        chats,
        answer,
        hub,
        notifier,
        config.answer.language.clone(),
    );

    let mut registry = HandlerRegistry::new();
    registry.register(Arc::new(reply_handler));

    let scheduler = Scheduler::new(
        db.clone(),
        registry,
        Duration::from_secs(config.scheduler.poll_interval_secs),
    );

    // Crash recovery: tasks stuck in processing from a previous run are
    // failed before the loop starts.
    let recovered = scheduler.recover_stale().await?;
    if recovered > 0 {
        info!(count = recovered, "stale processing tasks marked failed");
    }

    // Install signal handler.
    let cancel = shutdown::install_signal_handler();

    if config.scheduler.enabled {
        info!(
            poll_interval_secs = config.scheduler.poll_interval_secs,
            "scheduler running"
        );
        scheduler.run(cancel).await?;
    } else {
        info!("scheduler disabled by configuration; waiting for shutdown signal");
        cancel.cancelled().await;
    }

    db.close().await?;
    info!("basera serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("basera={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
