// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Polling task scheduler.
//!
//! [`Scheduler`] drives the task queue: a fixed-interval loop where each
//! tick claims at most one due task, dispatches it to the handler registered
//! for its type, and records the terminal status on the task row. Task
//! failures never escape the tick; only task-queue I/O errors propagate.

pub mod registry;
pub mod shutdown;

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use basera_core::BaseraError;
use basera_core::types::{TaskTransition, now_rfc3339};
use basera_storage::Database;
use basera_storage::queries::tasks;

pub use registry::HandlerRegistry;

/// What a single scheduler pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// A previous tick is still in flight; nothing was examined.
    Skipped,
    /// No task was due.
    Idle,
    /// One task was dispatched; its terminal status is on the task row.
    Dispatched { task_id: String },
}

/// Fixed-interval, single-flight task poller.
pub struct Scheduler {
    db: Database,
    registry: HandlerRegistry,
    poll_interval: Duration,
    tick_guard: tokio::sync::Mutex<()>,
}

impl Scheduler {
    pub fn new(db: Database, registry: HandlerRegistry, poll_interval: Duration) -> Self {
        Self {
            db,
            registry,
            poll_interval,
            tick_guard: tokio::sync::Mutex::new(()),
        }
    }

    /// Fail every task left in `processing` by a previous run.
    ///
    /// Called once before the loop starts. Returns the number recovered.
    pub async fn recover_stale(&self) -> Result<usize, BaseraError> {
        let recovered = tasks::recover_stale(&self.db, "interrupted by restart").await?;
        if recovered > 0 {
            warn!(recovered, "failed stale processing tasks from previous run");
        }
        Ok(recovered)
    }

    /// One scheduler pass: claim and run at most one due task.
    ///
    /// The single-flight guard is scoped to this call, so it is released on
    /// every exit path. A tick that finds the guard held skips entirely
    /// rather than waiting.
    pub async fn tick(&self) -> Result<TickOutcome, BaseraError> {
        let Ok(_guard) = self.tick_guard.try_lock() else {
            debug!("previous tick still in flight; skipping");
            return Ok(TickOutcome::Skipped);
        };

        let Some(task) = tasks::next_due(&self.db, &now_rfc3339()).await? else {
            return Ok(TickOutcome::Idle);
        };

        tasks::transition(&self.db, &task.id, &TaskTransition::Processing).await?;
        debug!(task_id = %task.id, task_type = %task.task_type, "task dispatched");

        let outcome = match self.registry.get(task.task_type) {
            Some(handler) => handler.handle(&task).await,
            None => Err(BaseraError::Config(format!(
                "no handler registered for task type {}",
                task.task_type
            ))),
        };

        match outcome {
            Ok(()) => {
                tasks::transition(&self.db, &task.id, &TaskTransition::Completed).await?;
                info!(task_id = %task.id, task_type = %task.task_type, "task completed");
            }
            Err(e) => {
                let message = e.to_string();
                tasks::transition(
                    &self.db,
                    &task.id,
                    &TaskTransition::Failed {
                        message: message.clone(),
                    },
                )
                .await?;
                warn!(task_id = %task.id, task_type = %task.task_type, error = %message, "task failed");
            }
        }

        Ok(TickOutcome::Dispatched { task_id: task.id })
    }

    /// Drive the scheduler until cancelled.
    ///
    /// Returns `Ok(())` on cancellation. A task-queue I/O error ends the
    /// loop and propagates; task failures do not.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), BaseraError> {
        let mut interval = tokio::time::interval(self.poll_interval);
        // The first tick of a tokio interval fires immediately; consume it
        // so polling starts one full interval after startup.
        interval.tick().await;

        info!(poll_interval_secs = self.poll_interval.as_secs(), "scheduler loop started");
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick().await?;
                }
                _ = cancel.cancelled() => {
                    info!("scheduler loop stopped");
                    return Ok(());
                }
            }
        }
    }
}
