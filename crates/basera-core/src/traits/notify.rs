// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification collaborator trait.

use async_trait::async_trait;

use crate::error::BaseraError;
use crate::types::NotificationRequest;

/// The notification fan-out service.
///
/// Persists a notification record and best-effort delivers email/SMS/push
/// per user preference. Callers in this backend use it fire-and-forget:
/// failures are logged at the call site and never escalate.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Create a notification for a user.
    async fn create(&self, request: NotificationRequest) -> Result<(), BaseraError>;
}
