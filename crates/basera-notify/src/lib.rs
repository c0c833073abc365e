// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the notification service.
//!
//! Notifications are fire-and-forget from the pipeline's point of view: the
//! caller logs a failure and moves on, so this client makes exactly one
//! attempt per notification.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::debug;

use basera_core::BaseraError;
use basera_core::traits::Notifier;
use basera_core::types::NotificationRequest;

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the notification service.
#[derive(Debug, Clone)]
pub struct NotifyClient {
    client: reqwest::Client,
    base_url: String,
}

impl NotifyClient {
    /// Creates a new notification service client.
    pub fn new(base_url: String) -> Result<Self, BaseraError> {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(NOTIFY_TIMEOUT)
            .build()
            .map_err(|e| BaseraError::Collaborator {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
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
impl Notifier for NotifyClient {
    async fn create(&self, request: NotificationRequest) -> Result<(), BaseraError> {
        let response = self
            .client
            .post(format!("{}/notifications", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| BaseraError::Collaborator {
                message: format!("notification request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, user_id = %request.user_id, "notification response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BaseraError::Collaborator {
                message: format!("notification service returned {status}: {body}"),
                source: None,
            });
        }
        Ok(())
    }
}
