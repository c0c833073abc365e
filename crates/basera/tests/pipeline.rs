// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end integration tests for the scheduler and bot reply pipeline.
//!
//! Each test creates an isolated PipelineHarness with temp SQLite, mock
//! collaborators, and the real scheduler, chat service, and realtime hub.
//! Tests are independent and order-insensitive.

use std::time::Duration;

use basera_core::types::{
    ContentBlock, MessageRole, TaskStatus, chat_channel, user_channel,
};
use basera_scheduler::TickOutcome;
use basera_test_utils::PipelineHarness;

/// A run_at safely in the past for any clock.
const DUE: &str = "2000-01-01T00:00:00.000Z";

fn text_reply(text: &str) -> Vec<ContentBlock> {
    vec![ContentBlock::Text { text: text.into() }]
}

// ---- Reply dispatch: the happy path ----

#[tokio::test]
async fn due_reply_task_completes_and_appends_assistant_message() {
    let harness = PipelineHarness::builder()
        .with_replies(vec![text_reply("2 BHK options in Agra coming up.")])
        .build()
        .await
        .unwrap();

    let chat = harness.seed_chat("buyer-1", "broker-1").await.unwrap();
    harness
        .seed_user_message(&chat.id, "buyer-1", "broker-1", "Show me 2BHK in Agra")
        .await
        .unwrap();
    let task = harness.enqueue_reply(&chat.id, DUE).await.unwrap();

    let outcome = harness.tick().await.unwrap();
    assert!(matches!(outcome, TickOutcome::Dispatched { .. }));

    let task = harness.task(&task.id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert!(task.completed_at.is_some());
    assert!(task.error_message.is_none());

    let messages = harness.chats.list_messages(&chat.id).await.unwrap();
    assert_eq!(messages.len(), 2);
    let reply = &messages[1];
    assert_eq!(reply.role, MessageRole::Assistant);
    assert_eq!(reply.from, "broker-1");
    assert_eq!(reply.to, "buyer-1");
    assert_eq!(reply.text, "2 BHK options in Agra coming up.");

    // Chat pointer moved to the reply, and only the recipient's unread
    // counter was bumped.
    let chat = harness.chats.get_chat(&chat.id).await.unwrap().unwrap();
    assert_eq!(chat.last_message_id.as_deref(), Some(reply.id.as_str()));
    assert_eq!(chat.unread_counts.get("buyer-1"), Some(&1));

    // The question reached the answer collaborator with chat-scoped session
    // and the broker as context.
    let calls = harness.answer.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].question, "Show me 2BHK in Agra");
    assert_eq!(calls[0].broker_id, "broker-1");
    assert_eq!(calls[0].session_id, chat.id);

    harness.close().await.unwrap();
}

#[tokio::test]
async fn reply_is_pushed_to_user_and_chat_channels() {
    let harness = PipelineHarness::builder()
        .with_replies(vec![text_reply("Here are the listings.")])
        .build()
        .await
        .unwrap();

    let chat = harness.seed_chat("buyer-1", "broker-1").await.unwrap();
    harness
        .seed_user_message(&chat.id, "buyer-1", "broker-1", "Anything near the river?")
        .await
        .unwrap();

    let mut user_sub = harness.hub.subscribe(&user_channel("buyer-1"));
    let mut chat_sub = harness.hub.subscribe(&chat_channel(&chat.id));

    harness.enqueue_reply(&chat.id, DUE).await.unwrap();
    harness.tick().await.unwrap();

    let pushed = user_sub.rx.recv().await.unwrap();
    assert_eq!(pushed.event, "message:new");
    assert_eq!(pushed.chat_id, chat.id);
    assert_eq!(pushed.message.text, "Here are the listings.");

    let pushed = chat_sub.rx.recv().await.unwrap();
    assert_eq!(pushed.message.role, MessageRole::Assistant);

    harness.close().await.unwrap();
}

#[tokio::test]
async fn reply_triggers_a_notification_for_the_recipient() {
    let harness = PipelineHarness::builder()
        .with_replies(vec![text_reply("Shortlist sent.")])
        .build()
        .await
        .unwrap();

    let chat = harness.seed_chat("buyer-1", "broker-1").await.unwrap();
    harness
        .seed_user_message(&chat.id, "buyer-1", "broker-1", "Send the shortlist")
        .await
        .unwrap();
    harness.enqueue_reply(&chat.id, DUE).await.unwrap();
    harness.tick().await.unwrap();

    // The notification is spawned off the handler path; wait for it.
    let requests = harness
        .notifier
        .wait_for(1, Duration::from_secs(1))
        .await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].user_id, "buyer-1");
    assert_eq!(requests[0].title, "New message");
    assert_eq!(requests[0].message, "Shortlist sent.");
    assert_eq!(requests[0].activity, "bot_reply");

    harness.close().await.unwrap();
}

// ---- Empty answer: quiet no-op ----

#[tokio::test]
async fn empty_answer_completes_without_touching_the_chat() {
    let harness = PipelineHarness::builder()
        .with_replies(vec![Vec::new()])
        .build()
        .await
        .unwrap();

    let chat = harness.seed_chat("buyer-1", "broker-1").await.unwrap();
    harness
        .seed_user_message(&chat.id, "buyer-1", "broker-1", "Hello?")
        .await
        .unwrap();
    let before = harness.chats.get_chat(&chat.id).await.unwrap().unwrap();
    let task = harness.enqueue_reply(&chat.id, DUE).await.unwrap();

    harness.tick().await.unwrap();

    let task = harness.task(&task.id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Completed);

    let messages = harness.chats.list_messages(&chat.id).await.unwrap();
    assert_eq!(messages.len(), 1, "no assistant message for an empty answer");
    let after = harness.chats.get_chat(&chat.id).await.unwrap().unwrap();
    assert_eq!(after.last_message_id, before.last_message_id);
    assert_eq!(after.unread_counts, before.unread_counts);
    assert!(harness.notifier.requests().await.is_empty());

    harness.close().await.unwrap();
}

// ---- Collaborator failure: task fails, chat untouched ----

#[tokio::test]
async fn answer_timeout_fails_the_task_and_leaves_the_chat_untouched() {
    let harness = PipelineHarness::new().await.unwrap();
    harness
        .answer
        .add_failure(basera_core::BaseraError::Timeout {
            duration: Duration::from_secs(150),
        })
        .await;

    let chat = harness.seed_chat("buyer-1", "broker-1").await.unwrap();
    harness
        .seed_user_message(&chat.id, "buyer-1", "broker-1", "Still there?")
        .await
        .unwrap();
    let task = harness.enqueue_reply(&chat.id, DUE).await.unwrap();

    harness.tick().await.unwrap();

    let task = harness.task(&task.id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert!(task.failed_at.is_some());
    let message = task.error_message.expect("failed task records its error");
    assert!(message.contains("timed out"), "got: {message}");

    assert_eq!(harness.chats.list_messages(&chat.id).await.unwrap().len(), 1);
    assert!(harness.notifier.requests().await.is_empty());

    harness.close().await.unwrap();
}

#[tokio::test]
async fn failed_task_is_never_picked_up_again() {
    let harness = PipelineHarness::new().await.unwrap();
    harness
        .answer
        .add_failure(basera_core::BaseraError::Timeout {
            duration: Duration::from_secs(150),
        })
        .await;

    let chat = harness.seed_chat("buyer-1", "broker-1").await.unwrap();
    harness
        .seed_user_message(&chat.id, "buyer-1", "broker-1", "ping")
        .await
        .unwrap();
    harness.enqueue_reply(&chat.id, DUE).await.unwrap();

    harness.tick().await.unwrap();
    // Failed is terminal; the next tick finds nothing due.
    let outcome = harness.tick().await.unwrap();
    assert!(matches!(outcome, TickOutcome::Idle));

    harness.close().await.unwrap();
}

// ---- Chat identity ----

#[tokio::test]
async fn get_or_create_returns_one_chat_per_participant_set() {
    let harness = PipelineHarness::new().await.unwrap();

    let first = harness.seed_chat("u1", "u2").await.unwrap();
    let second = harness.seed_chat("u2", "u1").await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(first.participants_key, "u1_u2");

    harness.close().await.unwrap();
}

#[tokio::test]
async fn concurrent_get_or_create_leaves_exactly_one_row() {
    let harness = PipelineHarness::new().await.unwrap();

    let forward: [String; 2] = ["u1".into(), "u2".into()];
    let reverse: [String; 2] = ["u2".into(), "u1".into()];
    let (a, b) = tokio::join!(
        harness.chats.get_or_create(&forward),
        harness.chats.get_or_create(&reverse),
    );
    let a = a.unwrap();
    let b = b.unwrap();
    assert_eq!(a.id, b.id);
    assert_eq!(a.participants_key, "u1_u2");

    // Exactly one row: each participant's chat list holds just this chat.
    for user in ["u1", "u2"] {
        let listing = harness.chats.list_chats_for(user).await.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].chat_id, a.id);
    }

    harness.close().await.unwrap();
}

// ---- Single-flight dispatch ----

#[tokio::test]
async fn overlapping_ticks_never_dispatch_a_second_task() {
    let harness = PipelineHarness::builder()
        .with_replies(vec![
            text_reply("first reply"),
            text_reply("second reply"),
        ])
        .with_answer_delay(Duration::from_millis(200))
        .build()
        .await
        .unwrap();

    let chat = harness.seed_chat("buyer-1", "broker-1").await.unwrap();
    harness
        .seed_user_message(&chat.id, "buyer-1", "broker-1", "first question")
        .await
        .unwrap();
    let t1 = harness.enqueue_reply(&chat.id, DUE).await.unwrap();
    let t2 = harness.enqueue_reply(&chat.id, DUE).await.unwrap();

    // The first tick holds the guard for the full answer delay; the second
    // starts halfway through and must skip instead of dispatching t2.
    let slow_tick = harness.tick();
    let overlapping_tick = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        harness.tick().await
    };
    let (first, overlapped) = tokio::join!(slow_tick, overlapping_tick);

    assert!(matches!(overlapped.unwrap(), TickOutcome::Skipped));
    let first = first.unwrap();
    assert!(matches!(first, TickOutcome::Dispatched { ref task_id } if *task_id == t1.id));

    // With the guard released, the next tick picks up the second task.
    let next = harness.tick().await.unwrap();
    assert!(matches!(next, TickOutcome::Dispatched { ref task_id } if *task_id == t2.id));

    assert_eq!(
        harness.task(&t1.id).await.unwrap().unwrap().status,
        TaskStatus::Completed
    );
    assert_eq!(
        harness.task(&t2.id).await.unwrap().unwrap().status,
        TaskStatus::Completed
    );

    harness.close().await.unwrap();
}

// ---- No self-reply ----

#[tokio::test]
async fn assistant_last_message_produces_no_new_reply() {
    let harness = PipelineHarness::builder()
        .with_replies(vec![text_reply("only reply")])
        .build()
        .await
        .unwrap();

    let chat = harness.seed_chat("buyer-1", "broker-1").await.unwrap();
    harness
        .seed_user_message(&chat.id, "buyer-1", "broker-1", "question")
        .await
        .unwrap();
    harness.enqueue_reply(&chat.id, DUE).await.unwrap();
    harness.tick().await.unwrap();
    assert_eq!(harness.chats.list_messages(&chat.id).await.unwrap().len(), 2);

    // The chat now ends with the assistant's reply. A second task completes
    // without producing anything.
    let before = harness.chats.get_chat(&chat.id).await.unwrap().unwrap();
    let second = harness.enqueue_reply(&chat.id, DUE).await.unwrap();
    harness.tick().await.unwrap();

    let second = harness.task(&second.id).await.unwrap().unwrap();
    assert_eq!(second.status, TaskStatus::Completed);
    assert_eq!(harness.chats.list_messages(&chat.id).await.unwrap().len(), 2);
    let after = harness.chats.get_chat(&chat.id).await.unwrap().unwrap();
    assert_eq!(after.last_message_id, before.last_message_id);
    assert_eq!(after.unread_counts, before.unread_counts);
    assert_eq!(harness.answer.call_count().await, 1, "no second answer call");

    harness.close().await.unwrap();
}

// ---- Task state machine totality ----

#[tokio::test]
async fn every_final_status_carries_its_timestamp_and_error_pairing() {
    let harness = PipelineHarness::builder()
        .with_replies(vec![text_reply("done")])
        .build()
        .await
        .unwrap();
    harness
        .answer
        .add_failure(basera_core::BaseraError::Collaborator {
            message: "bot service unavailable".to_string(),
            source: None,
        })
        .await;

    let chat1 = harness.seed_chat("buyer-1", "broker-1").await.unwrap();
    harness
        .seed_user_message(&chat1.id, "buyer-1", "broker-1", "first")
        .await
        .unwrap();
    let completed = harness.enqueue_reply(&chat1.id, DUE).await.unwrap();
    harness.tick().await.unwrap();

    let chat2 = harness.seed_chat("buyer-2", "broker-1").await.unwrap();
    harness
        .seed_user_message(&chat2.id, "buyer-2", "broker-1", "second")
        .await
        .unwrap();
    let failed = harness.enqueue_reply(&chat2.id, DUE).await.unwrap();
    harness.tick().await.unwrap();

    let completed = harness.task(&completed.id).await.unwrap().unwrap();
    assert_eq!(completed.status, TaskStatus::Completed);
    assert!(completed.started_at.is_some());
    assert!(completed.completed_at.is_some());
    assert!(completed.failed_at.is_none());
    assert!(completed.error_message.is_none());

    let failed = harness.task(&failed.id).await.unwrap().unwrap();
    assert_eq!(failed.status, TaskStatus::Failed);
    assert!(failed.started_at.is_some());
    assert!(failed.failed_at.is_some());
    assert!(failed.completed_at.is_none());
    assert!(failed.error_message.as_deref().is_some_and(|m| !m.is_empty()));

    harness.close().await.unwrap();
}

// ---- Unread monotonicity ----

#[tokio::test]
async fn n_replies_with_no_reads_bump_unread_by_exactly_n() {
    let harness = PipelineHarness::builder()
        .with_replies(vec![
            text_reply("reply one"),
            text_reply("reply two"),
            text_reply("reply three"),
        ])
        .build()
        .await
        .unwrap();

    let chat = harness.seed_chat("buyer-1", "broker-1").await.unwrap();

    for question in ["first", "second", "third"] {
        harness
            .seed_user_message(&chat.id, "buyer-1", "broker-1", question)
            .await
            .unwrap();
        harness.enqueue_reply(&chat.id, DUE).await.unwrap();
        harness.tick().await.unwrap();
    }

    let chat = harness.chats.get_chat(&chat.id).await.unwrap().unwrap();
    assert_eq!(chat.unread_counts.get("buyer-1"), Some(&3));

    harness.close().await.unwrap();
}

// ---- Harness isolation ----

#[tokio::test]
async fn harnesses_are_completely_independent() {
    let h1 = PipelineHarness::builder()
        .with_replies(vec![text_reply("h1 reply")])
        .build()
        .await
        .unwrap();
    let h2 = PipelineHarness::builder()
        .with_replies(vec![text_reply("h2 reply")])
        .build()
        .await
        .unwrap();

    let c1 = h1.seed_chat("buyer-1", "broker-1").await.unwrap();
    let c2 = h2.seed_chat("buyer-1", "broker-1").await.unwrap();
    assert_ne!(c1.id, c2.id);

    h1.seed_user_message(&c1.id, "buyer-1", "broker-1", "to h1")
        .await
        .unwrap();
    h1.enqueue_reply(&c1.id, DUE).await.unwrap();
    h1.tick().await.unwrap();

    assert_eq!(h1.chats.list_messages(&c1.id).await.unwrap().len(), 2);
    assert_eq!(h2.chats.list_messages(&c2.id).await.unwrap().len(), 0);

    h1.close().await.unwrap();
    h2.close().await.unwrap();
}
