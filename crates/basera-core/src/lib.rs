// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Basera conversation backend.
//!
//! This crate provides the domain types, the workspace error enum, and the
//! collaborator trait definitions used throughout the Basera workspace. The
//! scheduler, chat pipeline, and storage layer all speak in terms of these
//! types; external services are only ever seen through the traits.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::BaseraError;
pub use types::{
    Chat, ChatMessage, ChatSummary, ContentBlock, MessageRole, MessageStatus, ScheduledTask,
    TaskStatus, TaskTransition, TaskType,
};

// Re-export all collaborator traits at crate root.
pub use traits::{AnswerProvider, Notifier, ProfileDirectory, RealtimePublisher, TaskHandler};
