// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process real-time event hub.
//!
//! [`RealtimeHub`] fans events out to named channels (`user:<id>`,
//! `chat:<id>`). Delivery is best-effort and at-most-once: a subscriber that
//! is slow or gone is dropped, never retried, and a channel with no
//! subscribers swallows the event. Publishing therefore cannot fail the
//! pipeline that calls it.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;

use basera_core::BaseraError;
use basera_core::traits::RealtimePublisher;
use basera_core::types::RealtimeEvent;

struct ChannelSubscriber {
    id: u64,
    tx: mpsc::UnboundedSender<RealtimeEvent>,
}

/// Fan-out hub keyed by channel name.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
#[derive(Default)]
pub struct RealtimeHub {
    channels: DashMap<String, Vec<ChannelSubscriber>>,
    next_id: AtomicU64,
}

/// A live subscription to one channel.
///
/// Dropping the receiver ends the subscription; the hub prunes the dead
/// sender on the next publish to that channel.
pub struct Subscription {
    pub channel: String,
    pub id: u64,
    pub rx: mpsc::UnboundedReceiver<RealtimeEvent>,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a channel. Events published after this call are
    /// delivered; there is no replay of earlier events.
    pub fn subscribe(&self, channel: &str) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.channels
            .entry(channel.to_string())
            .or_default()
            .push(ChannelSubscriber { id, tx });
        Subscription {
            channel: channel.to_string(),
            id,
            rx,
        }
    }

    /// Remove one subscriber from a channel.
    pub fn unsubscribe(&self, channel: &str, id: u64) {
        if let Some(mut subscribers) = self.channels.get_mut(channel) {
            subscribers.retain(|s| s.id != id);
        }
    }

    /// Deliver an event to every live subscriber of `channel`, pruning
    /// subscribers whose receiver is gone. Returns the delivery count.
    pub fn deliver(&self, channel: &str, event: &RealtimeEvent) -> usize {
        let Some(mut subscribers) = self.channels.get_mut(channel) else {
            return 0;
        };
        let mut delivered = 0;
        subscribers.retain(|s| match s.tx.send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(_) => false,
        });
        delivered
    }

    /// Number of live subscriptions on a channel, for tests and diagnostics.
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels.get(channel).map_or(0, |s| s.len())
    }
}

#[async_trait]
impl RealtimePublisher for RealtimeHub {
    async fn publish(&self, channel: &str, event: &RealtimeEvent) -> Result<(), BaseraError> {
        let delivered = self.deliver(channel, event);
        debug!(channel, event = %event.event, delivered, "realtime publish");
        Ok(())
    }
}
