// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the user profile directory.
//!
//! Chat listings decorate each entry with the other participant's public
//! profile. The directory is optional; callers fall back to an id-only
//! profile when it is unconfigured or a lookup fails.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use basera_core::BaseraError;
use basera_core::traits::ProfileDirectory;
use basera_core::types::UserProfile;

const DIRECTORY_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the profile directory.
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    client: reqwest::Client,
    base_url: String,
}

impl DirectoryClient {
    /// Creates a new profile directory client.
    pub fn new(base_url: String) -> Result<Self, BaseraError> {
        let client = reqwest::Client::builder()
            .timeout(DIRECTORY_TIMEOUT)
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
impl ProfileDirectory for DirectoryClient {
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, BaseraError> {
        let response = self
            .client
            .get(format!("{}/profiles/{user_id}", self.base_url))
            .send()
            .await
            .map_err(|e| BaseraError::Collaborator {
                message: format!("profile request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, user_id, "profile response received");

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BaseraError::Collaborator {
                message: format!("profile directory returned {status}: {body}"),
                source: None,
            });
        }

        let profile = response
            .json::<UserProfile>()
            .await
            .map_err(|e| BaseraError::Collaborator {
                message: format!("failed to parse profile body: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Some(profile))
    }
}
