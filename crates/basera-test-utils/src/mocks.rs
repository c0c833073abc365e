// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock collaborators for deterministic testing.
//!
//! Each mock implements one collaborator trait with scripted outcomes and
//! captured inputs, so pipeline tests run without external services.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use basera_core::error::BaseraError;
use basera_core::traits::{AnswerProvider, Notifier, RealtimePublisher};
use basera_core::types::{ContentBlock, NotificationRequest, RealtimeEvent};

/// One recorded call to [`MockAnswer`].
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerCall {
    pub question: String,
    pub broker_id: String,
    pub language: String,
    pub session_id: String,
}

/// A mock bot-answer collaborator with scripted outcomes.
///
/// Outcomes are popped from a FIFO queue; an empty queue yields a single
/// default text block. Every call is recorded for assertion.
pub struct MockAnswer {
    replies: Arc<Mutex<VecDeque<Result<Vec<ContentBlock>, BaseraError>>>>,
    calls: Arc<Mutex<Vec<AnswerCall>>>,
    delay: Option<Duration>,
}

impl MockAnswer {
    /// Create a mock with an empty script.
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    /// Create a mock pre-loaded with successful replies.
    pub fn with_replies(replies: Vec<Vec<ContentBlock>>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().map(Ok).collect())),
            calls: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    /// Sleep this long inside every `answer` call before responding.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Append a successful reply to the script.
    pub async fn add_reply(&self, blocks: Vec<ContentBlock>) {
        self.replies.lock().await.push_back(Ok(blocks));
    }

    /// Append a failure to the script.
    pub async fn add_failure(&self, error: BaseraError) {
        self.replies.lock().await.push_back(Err(error));
    }

    /// Every call made so far, in order.
    pub async fn calls(&self) -> Vec<AnswerCall> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

impl Default for MockAnswer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnswerProvider for MockAnswer {
    async fn answer(
        &self,
        question: &str,
        broker_id: &str,
        language: &str,
        session_id: &str,
    ) -> Result<Vec<ContentBlock>, BaseraError> {
        self.calls.lock().await.push(AnswerCall {
            question: question.to_string(),
            broker_id: broker_id.to_string(),
            language: language.to_string(),
            session_id: session_id.to_string(),
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.replies.lock().await.pop_front().unwrap_or_else(|| {
            Ok(vec![ContentBlock::Text {
                text: "mock reply".to_string(),
            }])
        })
    }
}

/// A mock notification collaborator that records instead of delivering.
///
/// The failing variant still records the request before refusing it, so
/// tests can observe the attempt.
pub struct MockNotifier {
    requests: Arc<Mutex<Vec<NotificationRequest>>>,
    arrived: Arc<Notify>,
    failing: bool,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            arrived: Arc::new(Notify::new()),
            failing: false,
        }
    }

    /// A notifier whose every `create` call fails after recording.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }

    /// Every request received so far.
    pub async fn requests(&self) -> Vec<NotificationRequest> {
        self.requests.lock().await.clone()
    }

    /// Wait until at least `count` requests have arrived, then return them.
    ///
    /// Notifications are dispatched on spawned tasks, so tests need a
    /// rendezvous. On timeout this returns whatever has arrived and the
    /// caller's assertion reports the shortfall.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> Vec<NotificationRequest> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            {
                let requests = self.requests.lock().await;
                if requests.len() >= count {
                    return requests.clone();
                }
            }
            if tokio::time::timeout_at(deadline, self.arrived.notified())
                .await
                .is_err()
            {
                return self.requests.lock().await.clone();
            }
        }
    }
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn create(&self, request: NotificationRequest) -> Result<(), BaseraError> {
        self.requests.lock().await.push(request);
        self.arrived.notify_one();
        if self.failing {
            return Err(BaseraError::Collaborator {
                message: "notification service refused the request".to_string(),
                source: None,
            });
        }
        Ok(())
    }
}

/// A real-time publisher that captures `(channel, event)` pairs.
///
/// For tests that care about live delivery semantics, use the real
/// `basera-realtime` hub with subscriptions instead.
pub struct CapturePublisher {
    published: Arc<Mutex<Vec<(String, RealtimeEvent)>>>,
    failing: bool,
}

impl CapturePublisher {
    pub fn new() -> Self {
        Self {
            published: Arc::new(Mutex::new(Vec::new())),
            failing: false,
        }
    }

    /// A publisher whose every `publish` call fails without capturing.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }

    /// Every published `(channel, event)` pair, in order.
    pub async fn published(&self) -> Vec<(String, RealtimeEvent)> {
        self.published.lock().await.clone()
    }

    /// Just the channel names, in publish order.
    pub async fn channels(&self) -> Vec<String> {
        self.published
            .lock()
            .await
            .iter()
            .map(|(channel, _)| channel.clone())
            .collect()
    }
}

impl Default for CapturePublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RealtimePublisher for CapturePublisher {
    async fn publish(&self, channel: &str, event: &RealtimeEvent) -> Result<(), BaseraError> {
        if self.failing {
            return Err(BaseraError::Collaborator {
                message: "realtime transport unavailable".to_string(),
                source: None,
            });
        }
        self.published
            .lock()
            .await
            .push((channel.to_string(), event.clone()));
        Ok(())
    }
}
