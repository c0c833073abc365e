// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Task handler registry.
//!
//! Dispatch is data-driven: the scheduler looks a task's type up here and
//! never matches on task types itself, so adding a task type means
//! registering a handler, not editing the loop.

use std::collections::HashMap;
use std::sync::Arc;

use basera_core::traits::TaskHandler;
use basera_core::types::TaskType;

/// Maps task types to their handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<TaskType, Arc<dyn TaskHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under the type it reports. Replaces any previous
    /// handler for that type.
    pub fn register(&mut self, handler: Arc<dyn TaskHandler>) {
        self.handlers.insert(handler.task_type(), handler);
    }

    /// The handler for a task type, if one is registered.
    pub fn get(&self, task_type: TaskType) -> Option<Arc<dyn TaskHandler>> {
        self.handlers.get(&task_type).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
