// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Real-time transport trait.

use async_trait::async_trait;

use crate::error::BaseraError;
use crate::types::RealtimeEvent;

/// Publish/subscribe transport pushing events to connected client sessions.
///
/// Delivery is at-most-once: no acknowledgement, no retry, no buffering for
/// absent subscribers. Missed pushes are caught up through the message read
/// path.
#[async_trait]
pub trait RealtimePublisher: Send + Sync {
    /// Publish an event to one channel (`user:<id>` or `chat:<id>`).
    async fn publish(&self, channel: &str, event: &RealtimeEvent) -> Result<(), BaseraError>;
}
