// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `basera task` command implementations.
//!
//! Operator-facing task queue actions. `enqueue-reply` is also the manual
//! recovery path for a failed bot reply: failed tasks are never retried
//! automatically, so an operator enqueues a fresh task instead.

use basera_config::BaseraConfig;
use basera_core::types::{BotReplyPayload, now_rfc3339};
use basera_core::{BaseraError, TaskType};
use basera_storage::Database;
use basera_storage::queries::tasks;

/// Enqueue a bot reply task for `chat_id`, due at `at` (RFC 3339) or now.
pub async fn run_enqueue_reply(
    config: &BaseraConfig,
    chat_id: &str,
    at: Option<&str>,
) -> Result<(), BaseraError> {
    if chat_id.trim().is_empty() {
        return Err(BaseraError::InvalidPayload("chat_id is empty".to_string()));
    }

    // Stored timestamps compare lexicographically, so a caller-supplied
    // instant is normalized to the same UTC millisecond format the rest of
    // the system writes.
    let run_at = match at {
        Some(raw) => chrono::DateTime::parse_from_rfc3339(raw)
            .map_err(|e| BaseraError::InvalidPayload(format!("--at is not RFC 3339: {e}")))?
            .with_timezone(&chrono::Utc)
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string(),
        None => now_rfc3339(),
    };

    let payload = serde_json::to_string(&BotReplyPayload {
        chat_id: chat_id.to_string(),
    })
    .map_err(|e| BaseraError::Internal(format!("payload serialization failed: {e}")))?;

    let db = Database::open(&config.storage.database_path, config.storage.wal_mode).await?;
    let task = tasks::enqueue(&db, TaskType::BotReply, &run_at, &payload).await?;
    db.close().await?;

    println!("enqueued task {} (due {})", task.id, task.run_at);
    Ok(())
}
