// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduled task queue operations.

use basera_core::BaseraError;
use basera_core::types::now_rfc3339;
use rusqlite::params;

use crate::database::Database;
use crate::models::{ScheduledTask, TaskStatus, TaskTransition, TaskType};

fn map_task_row(row: &rusqlite::Row<'_>) -> Result<ScheduledTask, rusqlite::Error> {
    let task_type: String = row.get(1)?;
    let status: String = row.get(4)?;
    Ok(ScheduledTask {
        id: row.get(0)?,
        task_type: super::enum_col(1, &task_type)?,
        run_at: row.get(2)?,
        payload: row.get(3)?,
        status: super::enum_col(4, &status)?,
        is_active: row.get(5)?,
        started_at: row.get(6)?,
        completed_at: row.get(7)?,
        failed_at: row.get(8)?,
        last_run_at: row.get(9)?,
        error_message: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

/// Enqueue a new task, due at `run_at`.
///
/// No deduplication: two enqueues with the same type and payload yield two
/// independent rows.
pub async fn enqueue(
    db: &Database,
    task_type: TaskType,
    run_at: &str,
    payload: &str,
) -> Result<ScheduledTask, BaseraError> {
    let now = now_rfc3339();
    let task = ScheduledTask {
        id: uuid::Uuid::new_v4().to_string(),
        task_type,
        run_at: run_at.to_string(),
        payload: payload.to_string(),
        status: TaskStatus::Pending,
        is_active: true,
        started_at: None,
        completed_at: None,
        failed_at: None,
        last_run_at: None,
        error_message: None,
        created_at: now.clone(),
        updated_at: now,
    };

    let row = task.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO scheduled_tasks
                 (id, task_type, run_at, payload, status, is_active, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    row.id,
                    row.task_type.to_string(),
                    row.run_at,
                    row.payload,
                    row.status.to_string(),
                    row.is_active,
                    row.created_at,
                    row.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    Ok(task)
}

/// The single next due task: pending, active, and `run_at <= now`.
///
/// Ordered by `run_at`, then id as a deterministic tie-break. Returns `None`
/// when nothing is due.
pub async fn next_due(db: &Database, now: &str) -> Result<Option<ScheduledTask>, BaseraError> {
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, task_type, run_at, payload, status, is_active, started_at,
                        completed_at, failed_at, last_run_at, error_message,
                        created_at, updated_at
                 FROM scheduled_tasks
                 WHERE status = 'pending' AND is_active = 1 AND run_at <= ?1
                 ORDER BY run_at ASC, id ASC
                 LIMIT 1",
            )?;
            match stmt.query_row(params![now], map_task_row) {
                Ok(task) => Ok(Some(task)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Apply a status transition to exactly one task.
///
/// Every variant stamps `updated_at`. `Processing` records `started_at` and
/// `last_run_at`; `Completed` records `completed_at`; `Failed` records
/// `failed_at` and the error message. Errors if no task has the given id.
pub async fn transition(
    db: &Database,
    id: &str,
    transition: &TaskTransition,
) -> Result<(), BaseraError> {
    let id = id.to_string();
    let transition = transition.clone();
    let now = now_rfc3339();
    db.connection()
        .call(move |conn| {
            let changed = match &transition {
                TaskTransition::Processing => conn.execute(
                    "UPDATE scheduled_tasks
                     SET status = 'processing', started_at = ?2, last_run_at = ?2, updated_at = ?2
                     WHERE id = ?1",
                    params![id, now],
                )?,
                TaskTransition::Completed => conn.execute(
                    "UPDATE scheduled_tasks
                     SET status = 'completed', completed_at = ?2, updated_at = ?2
                     WHERE id = ?1",
                    params![id, now],
                )?,
                TaskTransition::Failed { message } => conn.execute(
                    "UPDATE scheduled_tasks
                     SET status = 'failed', failed_at = ?2, error_message = ?3, updated_at = ?2
                     WHERE id = ?1",
                    params![id, now, message],
                )?,
            };
            if changed == 0 {
                return Err(rusqlite::Error::QueryReturnedNoRows);
            }
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch a task by id.
pub async fn get(db: &Database, id: &str) -> Result<Option<ScheduledTask>, BaseraError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, task_type, run_at, payload, status, is_active, started_at,
                        completed_at, failed_at, last_run_at, error_message,
                        created_at, updated_at
                 FROM scheduled_tasks
                 WHERE id = ?1",
            )?;
            match stmt.query_row(params![id], map_task_row) {
                Ok(task) => Ok(Some(task)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Soft-enable or disable a task without deleting it.
///
/// Deactivated tasks keep their row and status but are never selected by
/// [`next_due`].
pub async fn set_active(db: &Database, id: &str, active: bool) -> Result<(), BaseraError> {
    let id = id.to_string();
    let now = now_rfc3339();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE scheduled_tasks SET is_active = ?2, updated_at = ?3 WHERE id = ?1",
                params![id, active, now],
            )?;
            if changed == 0 {
                return Err(rusqlite::Error::QueryReturnedNoRows);
            }
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fail every task still in `processing` from a previous run, stamping the
/// given error message. Returns the number of tasks failed.
///
/// Called once at startup. `failed` is terminal, so recovered tasks surface
/// for inspection and manual re-enqueue rather than re-running.
pub async fn recover_stale(db: &Database, message: &str) -> Result<usize, BaseraError> {
    let message = message.to_string();
    let now = now_rfc3339();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE scheduled_tasks
                 SET status = 'failed', failed_at = ?1, error_message = ?2, updated_at = ?1
                 WHERE status = 'processing'",
                params![now, message],
            )?;
            Ok(changed)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
