// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end harness for the scheduler/bot-reply pipeline.
//!
//! `PipelineHarness` assembles the full stack over a temp SQLite database:
//! chat service, handler registry, scheduler, in-process realtime hub, and
//! mock answer/notification collaborators. Tests seed chats and tasks, drive
//! ticks, and assert on storage and captured side effects.

use std::sync::Arc;
use std::time::Duration;

use basera_chat::ChatService;
use basera_chat::reply::BotReplyHandler;
use basera_core::error::BaseraError;
use basera_core::types::{
    BotReplyPayload, Chat, ChatMessage, ContentBlock, MessageRole, MessageStatus, ScheduledTask,
    TaskType, now_rfc3339,
};
use basera_realtime::RealtimeHub;
use basera_scheduler::registry::HandlerRegistry;
use basera_scheduler::{Scheduler, TickOutcome};
use basera_storage::Database;
use basera_storage::queries::tasks;

use crate::mocks::{MockAnswer, MockNotifier};

/// Builder for a [`PipelineHarness`] with configurable mock behavior.
pub struct PipelineHarnessBuilder {
    replies: Vec<Vec<ContentBlock>>,
    answer_delay: Option<Duration>,
    poll_interval: Duration,
}

impl PipelineHarnessBuilder {
    fn new() -> Self {
        Self {
            replies: Vec::new(),
            answer_delay: None,
            poll_interval: Duration::from_millis(50),
        }
    }

    /// Pre-load the mock answer collaborator's script.
    pub fn with_replies(mut self, replies: Vec<Vec<ContentBlock>>) -> Self {
        self.replies = replies;
        self
    }

    /// Make every answer call take this long (for overlap tests).
    pub fn with_answer_delay(mut self, delay: Duration) -> Self {
        self.answer_delay = Some(delay);
        self
    }

    /// Scheduler poll interval for `run`-driven tests.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Build the harness, creating the temp database and wiring the stack.
    pub async fn build(self) -> Result<PipelineHarness, BaseraError> {
        let temp_dir = tempfile::TempDir::new()
            .map_err(|e| BaseraError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("pipeline.db");
        let db_path = db_path.to_string_lossy().to_string();
        let db = Database::open(&db_path, true).await?;

        let mut answer = MockAnswer::with_replies(self.replies);
        if let Some(delay) = self.answer_delay {
            answer = answer.with_delay(delay);
        }
        let answer = Arc::new(answer);
        let notifier = Arc::new(MockNotifier::new());
        let hub = Arc::new(RealtimeHub::new());
        let chats = Arc::new(ChatService::new(db.clone()));

        let handler = BotReplyHandler::new(
            chats.clone(),
            answer.clone(),
            hub.clone(),
            Some(notifier.clone()),
            "en",
        );
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(handler));
        let scheduler = Scheduler::new(db.clone(), registry, self.poll_interval);

        Ok(PipelineHarness {
            answer,
            notifier,
            hub,
            chats,
            scheduler,
            db,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete pipeline environment over a temp database.
pub struct PipelineHarness {
    /// The scripted bot-answer collaborator.
    pub answer: Arc<MockAnswer>,
    /// The recording notification collaborator.
    pub notifier: Arc<MockNotifier>,
    /// The real in-process realtime hub; subscribe to observe pushes.
    pub hub: Arc<RealtimeHub>,
    /// The chat service over the temp database.
    pub chats: Arc<ChatService>,
    /// The scheduler with the bot-reply handler registered.
    pub scheduler: Scheduler,
    /// Direct database handle for storage-level assertions.
    pub db: Database,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl PipelineHarness {
    pub fn builder() -> PipelineHarnessBuilder {
        PipelineHarnessBuilder::new()
    }

    /// Harness with default settings and an empty answer script.
    pub async fn new() -> Result<Self, BaseraError> {
        Self::builder().build().await
    }

    /// Create (or fetch) the chat between two participants.
    pub async fn seed_chat(&self, a: &str, b: &str) -> Result<Chat, BaseraError> {
        self.chats
            .get_or_create(&[a.to_string(), b.to_string()])
            .await
    }

    /// Append a user message to a chat, as the inbound send path would.
    pub async fn seed_user_message(
        &self,
        chat_id: &str,
        from: &str,
        to: &str,
        text: &str,
    ) -> Result<ChatMessage, BaseraError> {
        let message = ChatMessage {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id: chat_id.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            role: MessageRole::User,
            text: text.to_string(),
            content: vec![ContentBlock::Text {
                text: text.to_string(),
            }],
            session_id: chat_id.to_string(),
            attachments: Vec::new(),
            lead_cards: Vec::new(),
            status: MessageStatus::Sent,
            is_deleted_for: Vec::new(),
            created_at: now_rfc3339(),
        };
        self.chats.append_message(&message).await?;
        Ok(message)
    }

    /// Enqueue a bot-reply task for a chat, due at `run_at`.
    pub async fn enqueue_reply(
        &self,
        chat_id: &str,
        run_at: &str,
    ) -> Result<ScheduledTask, BaseraError> {
        let payload = serde_json::to_string(&BotReplyPayload {
            chat_id: chat_id.to_string(),
        })
        .map_err(|e| BaseraError::Internal(format!("payload encoding: {e}")))?;
        tasks::enqueue(&self.db, TaskType::BotReply, run_at, &payload).await
    }

    /// Run one scheduler tick.
    pub async fn tick(&self) -> Result<TickOutcome, BaseraError> {
        self.scheduler.tick().await
    }

    /// Fetch a task's current row.
    pub async fn task(&self, id: &str) -> Result<Option<ScheduledTask>, BaseraError> {
        tasks::get(&self.db, id).await
    }

    /// Checkpoint and close the database.
    pub async fn close(self) -> Result<(), BaseraError> {
        self.db.close().await
    }
}
