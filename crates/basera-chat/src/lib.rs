// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat and message services for the Basera conversation backend.
//!
//! [`ChatService`] is the one write path for chats and messages: callers
//! never touch storage rows directly. [`reply::BotReplyHandler`] builds the
//! automated assistant turn on top of it.

pub mod reply;

use std::sync::Arc;

use tracing::warn;

use basera_core::error::BaseraError;
use basera_core::traits::ProfileDirectory;
use basera_core::types::{Chat, ChatMessage, ChatSummary, UserProfile};
use basera_storage::Database;
use basera_storage::queries::{chats, messages};

/// Chat registry and message store, backed by SQLite.
///
/// Cheap to clone; all clones share one database handle. The profile
/// directory is optional: without it, chat listings carry id-only profiles.
#[derive(Clone)]
pub struct ChatService {
    db: Database,
    directory: Option<Arc<dyn ProfileDirectory>>,
}

impl ChatService {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            directory: None,
        }
    }

    /// Resolve other participants' public profiles through `directory` when
    /// listing chats.
    pub fn with_directory(mut self, directory: Arc<dyn ProfileDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Find or create the chat for a participant set.
    ///
    /// The participant list is normalized first (sorted, de-duplicated), so
    /// any ordering and accidental repeats of the same set land on the same
    /// chat. Safe under concurrent calls for the same set: the storage-level
    /// uniqueness constraint picks one winner and every caller gets that
    /// winner's row.
    pub async fn get_or_create(&self, participants: &[String]) -> Result<Chat, BaseraError> {
        let normalized = normalize_participants(participants)?;
        let candidate_id = uuid::Uuid::new_v4().to_string();
        chats::create_or_fetch(&self.db, &candidate_id, &normalized).await
    }

    /// Fetch a chat by id, with its unread counters.
    pub async fn get_chat(&self, chat_id: &str) -> Result<Option<Chat>, BaseraError> {
        chats::get(&self.db, chat_id).await
    }

    /// Persist a message and record it on its chat.
    ///
    /// The chat's last-message pointer moves to this message and the
    /// recipient's unread counter goes up by one. Fails if the chat does
    /// not exist.
    pub async fn append_message(&self, message: &ChatMessage) -> Result<(), BaseraError> {
        messages::insert(&self.db, message).await?;
        chats::apply_new_message(&self.db, &message.chat_id, &message.id, &message.to).await
    }

    /// Fetch one message by id.
    pub async fn get_message(&self, message_id: &str) -> Result<Option<ChatMessage>, BaseraError> {
        messages::get(&self.db, message_id).await
    }

    /// Full message history of a chat, oldest first.
    pub async fn list_messages(&self, chat_id: &str) -> Result<Vec<ChatMessage>, BaseraError> {
        messages::list(&self.db, chat_id).await
    }

    /// Message history as one viewer sees it: entries that viewer
    /// soft-deleted are filtered out.
    pub async fn list_messages_for(
        &self,
        chat_id: &str,
        viewer_id: &str,
    ) -> Result<Vec<ChatMessage>, BaseraError> {
        messages::list_for(&self.db, chat_id, viewer_id).await
    }

    /// Reset one participant's unread counter to zero.
    pub async fn mark_read(&self, chat_id: &str, user_id: &str) -> Result<(), BaseraError> {
        chats::reset_unread(&self.db, chat_id, user_id).await
    }

    /// Hide a message from one viewer. The other participant's view is
    /// untouched; nothing is physically deleted.
    pub async fn delete_for(&self, message_id: &str, viewer_id: &str) -> Result<(), BaseraError> {
        messages::mark_deleted_for(&self.db, message_id, viewer_id).await
    }

    /// The chats a user participates in, most recently active first.
    ///
    /// Each entry carries the other participant's public profile, the last
    /// message summary, and the caller's unread count. Profile resolution
    /// never fails the listing: lookup errors degrade to id-only profiles.
    pub async fn list_chats_for(&self, user_id: &str) -> Result<Vec<ChatSummary>, BaseraError> {
        let entries = chats::list_for(&self.db, user_id).await?;
        let mut summaries = Vec::with_capacity(entries.len());
        for entry in entries {
            let other_id = entry
                .participants
                .iter()
                .find(|p| p.as_str() != user_id)
                .cloned()
                .unwrap_or_else(|| user_id.to_string());
            summaries.push(ChatSummary {
                chat_id: entry.chat_id,
                other_participant: self.resolve_profile(&other_id).await,
                last_message: entry.last_message,
                unread_count: entry.unread_count,
                updated_at: entry.updated_at,
            });
        }
        Ok(summaries)
    }

    async fn resolve_profile(&self, user_id: &str) -> UserProfile {
        let Some(directory) = &self.directory else {
            return UserProfile::id_only(user_id);
        };
        match directory.get_profile(user_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => UserProfile::id_only(user_id),
            Err(e) => {
                warn!(user_id, error = %e, "profile lookup failed; falling back to id-only");
                UserProfile::id_only(user_id)
            }
        }
    }
}

/// Sort, de-duplicate, and validate a participant list.
///
/// A chat needs at least two distinct, non-empty participant ids.
fn normalize_participants(participants: &[String]) -> Result<Vec<String>, BaseraError> {
    if participants.iter().any(|p| p.trim().is_empty()) {
        return Err(BaseraError::InvalidPayload(
            "participant ids must be non-empty".into(),
        ));
    }
    let mut normalized = participants.to_vec();
    normalized.sort_unstable();
    normalized.dedup();
    if normalized.len() < 2 {
        return Err(BaseraError::InvalidPayload(format!(
            "a chat needs at least two distinct participants, got {}",
            normalized.len()
        )));
    }
    Ok(normalized)
}
