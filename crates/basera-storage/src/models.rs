// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `basera-core::types` for use across
//! service boundaries. This module re-exports them for convenience within
//! the storage crate, plus one storage-local projection for chat listings.

pub use basera_core::types::{
    Chat, ChatMessage, MessageRole, MessageStatus, MessageSummary, ScheduledTask, TaskStatus,
    TaskTransition, TaskType,
};

/// One row in a per-user chat listing: the chat joined with the caller's
/// unread counter and the last message, ordered by chat recency.
///
/// Profile lookup for the other participant happens a layer up; storage
/// only knows user ids.
#[derive(Debug, Clone)]
pub struct ChatListEntry {
    pub chat_id: String,
    pub participants: Vec<String>,
    pub unread_count: i64,
    pub last_message: Option<MessageSummary>,
    pub updated_at: String,
}
