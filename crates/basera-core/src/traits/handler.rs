// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Task handler trait dispatched by the scheduler loop.

use async_trait::async_trait;

use crate::error::BaseraError;
use crate::types::{ScheduledTask, TaskType};

/// A handler for one task type, registered with the scheduler's handler
/// registry.
///
/// Returning `Ok(())` marks the task `completed`; returning an error marks it
/// `failed` with the error's message. Handlers must treat no-op conditions
/// (nothing to do) as success, not failure.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// The task type this handler serves.
    fn task_type(&self) -> TaskType;

    /// Execute one task to completion.
    async fn handle(&self, task: &ScheduledTask) -> Result<(), BaseraError>;
}
