// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Basera workspace.
//!
//! Timestamps are RFC3339 UTC strings with millisecond precision
//! (`2026-03-01T12:00:00.000Z`), matching what SQLite's
//! `strftime('%Y-%m-%dT%H:%M:%fZ', 'now')` produces so that Rust-side and
//! SQL-side timestamps stay lexicographically comparable.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Format the current UTC instant as an RFC3339 string with millisecond precision.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

// --- Task types ---

/// The closed set of schedulable task types.
///
/// Dispatch is keyed on this enum via the handler registry, so adding a task
/// type means adding a variant and registering a handler, never editing the
/// scheduler loop.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum TaskType {
    #[strum(serialize = "BOT_REPLY")]
    #[serde(rename = "BOT_REPLY")]
    BotReply,
}

/// Lifecycle status of a scheduled task.
///
/// Transitions: `pending -> processing -> completed | failed`. Both
/// `completed` and `failed` are terminal; `processing` is never re-entered.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// A durable, time-scheduled unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub id: String,
    pub task_type: TaskType,
    /// Instant after which the task becomes eligible for execution.
    pub run_at: String,
    /// Opaque, task-type-specific JSON. For `BOT_REPLY` this is a
    /// [`BotReplyPayload`].
    pub payload: String,
    pub status: TaskStatus,
    /// Deactivated tasks are never selected by the scheduler (soft disable
    /// without deletion).
    pub is_active: bool,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub failed_at: Option<String>,
    pub last_run_at: Option<String>,
    /// Set iff `status` is `failed`.
    pub error_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A status transition applied to exactly one task.
///
/// Each variant carries everything the corresponding transition records, so
/// the storage layer can never set a terminal status without its timestamp,
/// nor `failed` without an error message.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskTransition {
    /// `pending -> processing`; records `started_at` and `last_run_at`.
    Processing,
    /// `processing -> completed`; records `completed_at`.
    Completed,
    /// `processing -> failed`; records `failed_at` and `error_message`.
    Failed { message: String },
}

impl TaskTransition {
    /// The status this transition lands on.
    pub fn status(&self) -> TaskStatus {
        match self {
            TaskTransition::Processing => TaskStatus::Processing,
            TaskTransition::Completed => TaskStatus::Completed,
            TaskTransition::Failed { .. } => TaskStatus::Failed,
        }
    }
}

/// Payload carried by `BOT_REPLY` tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotReplyPayload {
    pub chat_id: String,
}

// --- Chat types ---

/// Compute the canonical, order-independent fingerprint for a participant set.
///
/// Participant ids are sorted and joined with `_`. The result uniquely
/// identifies a chat for a given unordered participant set and is immutable
/// after chat creation.
pub fn participants_key(participants: &[String]) -> String {
    let mut ids: Vec<&str> = participants.iter().map(String::as_str).collect();
    ids.sort_unstable();
    ids.join("_")
}

/// A two-or-more-party conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: String,
    pub participants: Vec<String>,
    /// See [`participants_key`]. UNIQUE in storage; the source of truth for
    /// "one chat per unordered participant set".
    pub participants_key: String,
    pub last_message_id: Option<String>,
    /// Participant id -> unread message count.
    pub unread_counts: HashMap<String, i64>,
    pub created_at: String,
    pub updated_at: String,
}

/// One entry in a user's chat list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSummary {
    pub chat_id: String,
    pub other_participant: UserProfile,
    pub last_message: Option<MessageSummary>,
    /// The listing user's unread count for this chat.
    pub unread_count: i64,
    pub updated_at: String,
}

/// Condensed view of a message for chat lists and notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSummary {
    pub id: String,
    pub from: String,
    pub role: MessageRole,
    pub text: String,
    pub created_at: String,
}

// --- Message types ---

/// Author role of a chat message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// Advisory delivery status of a chat message.
///
/// Nothing in this backend moves a message past `sent`; read receipts are an
/// external concern.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sent,
    Delivered,
    Read,
}

/// One typed unit of rich message content.
///
/// The bot collaborator may emit block types this backend does not know yet;
/// those deserialize to [`ContentBlock::Unknown`] instead of failing the
/// whole response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    List {
        items: Vec<String>,
    },
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Image {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    Code {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
        code: String,
    },
    LinkCard {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

/// The text of the first `text` block, if any.
///
/// This is how a message's flat `text` field is derived from structured
/// content.
pub fn first_text_block(content: &[ContentBlock]) -> Option<&str> {
    content.iter().find_map(|block| match block {
        ContentBlock::Text { text } => Some(text.as_str()),
        _ => None,
    })
}

/// A persisted chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub chat_id: String,
    /// Sender participant id.
    pub from: String,
    /// Recipient participant id.
    pub to: String,
    pub role: MessageRole,
    /// Flat display string derived from `content`; used by search and
    /// notification summaries.
    pub text: String,
    /// Ordered rich content blocks. `text` is a derived view of this.
    pub content: Vec<ContentBlock>,
    /// Correlates the message to the upstream bot conversation session.
    /// Defaults to the chat id.
    pub session_id: String,
    /// Opaque embedded payloads (file references).
    pub attachments: Vec<serde_json::Value>,
    /// Opaque embedded payloads (denormalized lead summaries).
    pub lead_cards: Vec<serde_json::Value>,
    pub status: MessageStatus,
    /// Participants who soft-deleted this message from their own view.
    /// Checked at read time; never a physical delete.
    pub is_deleted_for: Vec<String>,
    pub created_at: String,
}

impl ChatMessage {
    /// Condense to the summary view used in chat lists.
    pub fn summary(&self) -> MessageSummary {
        MessageSummary {
            id: self.id.clone(),
            from: self.from.clone(),
            role: self.role,
            text: self.text.clone(),
            created_at: self.created_at.clone(),
        }
    }
}

// --- Collaborator types ---

/// Public profile of a marketplace user, as served by the directory
/// collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl UserProfile {
    /// Fallback profile when the directory is unconfigured or unavailable.
    pub fn id_only(user_id: &str) -> Self {
        Self {
            id: user_id.to_string(),
            name: user_id.to_string(),
            avatar_url: None,
        }
    }
}

/// Channel name for a user's private event stream.
pub fn user_channel(user_id: &str) -> String {
    format!("user:{user_id}")
}

/// Channel name for a chat's event stream.
pub fn chat_channel(chat_id: &str) -> String {
    format!("chat:{chat_id}")
}

/// An event published over the real-time transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeEvent {
    /// Event kind, e.g. `message:new`.
    pub event: String,
    pub chat_id: String,
    pub message: ChatMessage,
}

impl RealtimeEvent {
    /// Wrap a freshly persisted message as a `message:new` event.
    pub fn new_message(message: ChatMessage) -> Self {
        Self {
            event: "message:new".to_string(),
            chat_id: message.chat_id.clone(),
            message,
        }
    }
}

/// A notification record to be created via the notification collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    pub user_id: String,
    /// Always `"message"` for chat notifications.
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub priority: String,
    /// The chat the notification refers to.
    pub related_entity: String,
    pub activity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}
