// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The bot reply task handler.
//!
//! Registered for [`TaskType::BotReply`]. Takes a chat id from the task
//! payload, asks the bot collaborator for a reply to the chat's last user
//! message, persists the assistant turn, pushes it to connected clients, and
//! fires a best-effort notification.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use basera_core::error::BaseraError;
use basera_core::traits::{AnswerProvider, Notifier, RealtimePublisher, TaskHandler};
use basera_core::types::{
    BotReplyPayload, ChatMessage, MessageRole, MessageStatus, NotificationRequest, RealtimeEvent,
    ScheduledTask, TaskType, chat_channel, first_text_block, now_rfc3339, user_channel,
};

use crate::ChatService;

/// Notification bodies carry at most this many characters of the reply.
const NOTIFY_BODY_CHARS: usize = 140;

/// Builds the automated assistant turn for a chat.
///
/// The persisted assistant message is the authoritative side effect; the
/// real-time publishes and the notification are best-effort and never fail
/// the task once the message is stored. Without a notifier the notification
/// step is skipped entirely.
pub struct BotReplyHandler {
    chats: Arc<ChatService>,
    answer: Arc<dyn AnswerProvider>,
    realtime: Arc<dyn RealtimePublisher>,
    notifier: Option<Arc<dyn Notifier>>,
    language: String,
}

impl BotReplyHandler {
    pub fn new(
        chats: Arc<ChatService>,
        answer: Arc<dyn AnswerProvider>,
        realtime: Arc<dyn RealtimePublisher>,
        notifier: Option<Arc<dyn Notifier>>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            chats,
            answer,
            realtime,
            notifier,
            language: language.into(),
        }
    }

    /// Push the reply to the recipient's personal channel and the chat's
    /// room channel. At-most-once; failures are logged and swallowed.
    async fn publish_reply(&self, reply: &ChatMessage) {
        let event = RealtimeEvent::new_message(reply.clone());
        for channel in [user_channel(&reply.to), chat_channel(&reply.chat_id)] {
            if let Err(e) = self.realtime.publish(&channel, &event).await {
                warn!(channel = %channel, error = %e, "realtime publish failed");
            }
        }
    }

    /// Dispatch the recipient's notification on a separate task so the
    /// handler never waits on the notification collaborator.
    fn spawn_notification(&self, reply: &ChatMessage) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        let notifier = Arc::clone(notifier);
        let request = NotificationRequest {
            user_id: reply.to.clone(),
            kind: "message".to_string(),
            title: "New message".to_string(),
            message: truncate_chars(&reply.text, NOTIFY_BODY_CHARS),
            priority: "normal".to_string(),
            related_entity: reply.chat_id.clone(),
            activity: "bot_reply".to_string(),
            metadata: Some(serde_json::json!({
                "chatId": reply.chat_id,
                "messageId": reply.id,
            })),
        };
        let chat_id = reply.chat_id.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.create(request).await {
                warn!(chat_id = %chat_id, error = %e, "bot reply notification failed");
            }
        });
    }
}

#[async_trait]
impl TaskHandler for BotReplyHandler {
    fn task_type(&self) -> TaskType {
        TaskType::BotReply
    }

    async fn handle(&self, task: &ScheduledTask) -> Result<(), BaseraError> {
        let payload: BotReplyPayload = serde_json::from_str(&task.payload)
            .map_err(|e| BaseraError::InvalidPayload(format!("bot reply payload: {e}")))?;
        if payload.chat_id.trim().is_empty() {
            return Err(BaseraError::InvalidPayload("chat_id is empty".into()));
        }
        let chat = self
            .chats
            .get_chat(&payload.chat_id)
            .await?
            .ok_or_else(|| {
                BaseraError::InvalidPayload(format!("chat {} not found", payload.chat_id))
            })?;

        // A reply only makes sense when the most recent turn is the user's.
        let Some(last_id) = chat.last_message_id.as_deref() else {
            debug!(chat_id = %chat.id, "chat has no messages; nothing to reply to");
            return Ok(());
        };
        let last = self.chats.get_message(last_id).await?.ok_or_else(|| {
            BaseraError::Internal(format!("chat {} last message {last_id} is missing", chat.id))
        })?;
        if last.role != MessageRole::User {
            debug!(chat_id = %chat.id, role = %last.role, "last turn is not the user's; skipping");
            return Ok(());
        }

        // The assistant-side participant is whoever the user wrote to; the
        // chat id doubles as the collaborator's session correlator.
        let content = self
            .answer
            .answer(&last.text, &last.to, &self.language, &chat.id)
            .await?;
        if content.is_empty() {
            info!(chat_id = %chat.id, "bot had nothing to say");
            return Ok(());
        }

        let text = first_text_block(&content).unwrap_or_default().to_string();
        let reply = ChatMessage {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id: chat.id.clone(),
            from: last.to.clone(),
            to: last.from.clone(),
            role: MessageRole::Assistant,
            text,
            content,
            session_id: chat.id.clone(),
            attachments: Vec::new(),
            lead_cards: Vec::new(),
            status: MessageStatus::Sent,
            is_deleted_for: Vec::new(),
            created_at: now_rfc3339(),
        };
        self.chats.append_message(&reply).await?;
        info!(chat_id = %chat.id, message_id = %reply.id, "assistant reply persisted");

        self.publish_reply(&reply).await;
        self.spawn_notification(&reply);
        Ok(())
    }
}

/// First `max` characters of `s`, on char boundaries.
fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
