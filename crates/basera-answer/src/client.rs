// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the bot answer service.
//!
//! Provides [`AnswerClient`], the production [`AnswerProvider`]. One request
//! per question, no retry: the scheduler's task queue owns failure handling,
//! and a failed `BOT_REPLY` task is terminal.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::debug;

use basera_core::BaseraError;
use basera_core::traits::AnswerProvider;
use basera_core::types::ContentBlock;

use crate::types::{AnswerErrorResponse, AnswerRequest, AnswerResponse};

/// HTTP client for the answer service.
///
/// Bot answers routinely take minutes; the configured timeout bounds the
/// whole request.
#[derive(Debug, Clone)]
pub struct AnswerClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl AnswerClient {
    /// Creates a new answer service client.
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, BaseraError> {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| BaseraError::Collaborator {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl AnswerProvider for AnswerClient {
    async fn answer(
        &self,
        question: &str,
        broker_id: &str,
        language: &str,
        session_id: &str,
    ) -> Result<Vec<ContentBlock>, BaseraError> {
        let request = AnswerRequest {
            question: question.to_string(),
            broker_id: broker_id.to_string(),
            language: language.to_string(),
            session_id: session_id.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/answer", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BaseraError::Timeout {
                        duration: self.timeout,
                    }
                } else {
                    BaseraError::Collaborator {
                        message: format!("answer request failed: {e}"),
                        source: Some(Box::new(e)),
                    }
                }
            })?;

        let status = response.status();
        debug!(status = %status, session_id, "answer response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if let Ok(api_err) = serde_json::from_str::<AnswerErrorResponse>(&body) {
                format!("answer service error ({status}): {}", api_err.error)
            } else {
                format!("answer service returned {status}: {body}")
            };
            return Err(BaseraError::Collaborator {
                message,
                source: None,
            });
        }

        let body = response.text().await.map_err(|e| BaseraError::Collaborator {
            message: format!("failed to read answer body: {e}"),
            source: Some(Box::new(e)),
        })?;
        let parsed: AnswerResponse =
            serde_json::from_str(&body).map_err(|e| BaseraError::Collaborator {
                message: format!("failed to parse answer body: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(parsed.content)
    }
}
