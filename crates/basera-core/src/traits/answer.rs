// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bot answer collaborator trait.

use async_trait::async_trait;

use crate::error::BaseraError;
use crate::types::ContentBlock;

/// The external bot/AI answering service.
///
/// The collaborator keeps its own conversational memory per `session_id`
/// (the chat id), so this interface is a stateless question/answer call from
/// the backend's point of view.
#[async_trait]
pub trait AnswerProvider: Send + Sync {
    /// Ask the bot for a reply to the latest user message.
    ///
    /// An empty content list is a valid response meaning "nothing to say";
    /// callers treat it as a no-op, not an error.
    async fn answer(
        &self,
        question: &str,
        broker_id: &str,
        language: &str,
        session_id: &str,
    ) -> Result<Vec<ContentBlock>, BaseraError>;
}
