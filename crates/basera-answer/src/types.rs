// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the bot answer service.

use basera_core::types::ContentBlock;
use serde::{Deserialize, Serialize};

/// Request body for `POST /answer`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    pub question: String,
    pub broker_id: String,
    pub language: String,
    /// Conversation correlation id; the chat id in this backend.
    pub session_id: String,
}

/// Response body for `POST /answer`.
///
/// `content` may be empty or absent; both mean the bot chose not to answer.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

/// Error body the answer service returns on non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct AnswerErrorResponse {
    pub error: String,
}
