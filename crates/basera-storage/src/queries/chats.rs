// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat thread operations: race-safe creation, unread counters, listings.

use std::collections::HashMap;

use basera_core::BaseraError;
use basera_core::types::{now_rfc3339, participants_key};
use rusqlite::params;

use crate::database::Database;
use crate::models::{Chat, ChatListEntry, MessageSummary};

fn load_chat(conn: &rusqlite::Connection, chat_id: &str) -> Result<Chat, rusqlite::Error> {
    let (id, participants, key, last_message_id, created_at, updated_at) = conn.query_row(
        "SELECT id, participants, participants_key, last_message_id, created_at, updated_at
         FROM chats WHERE id = ?1",
        params![chat_id],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        },
    )?;
    let participants: Vec<String> = super::json_col(1, &participants)?;

    let mut unread_counts = HashMap::new();
    let mut stmt = conn.prepare("SELECT user_id, count FROM chat_unreads WHERE chat_id = ?1")?;
    let rows = stmt.query_map(params![chat_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;
    for row in rows {
        let (user_id, count) = row?;
        unread_counts.insert(user_id, count);
    }

    Ok(Chat {
        id,
        participants,
        participants_key: key,
        last_message_id,
        unread_counts,
        created_at,
        updated_at,
    })
}

/// Insert a chat for the given participant set, or return the existing one.
///
/// Creation races resolve on the UNIQUE `participants_key` constraint: the
/// loser's insert is a no-op and both callers observe the winner's row, so
/// `candidate_id` only sticks when this call actually creates the chat.
/// Unread counters are seeded at zero for every participant.
pub async fn create_or_fetch(
    db: &Database,
    candidate_id: &str,
    participants: &[String],
) -> Result<Chat, BaseraError> {
    let key = participants_key(participants);
    let candidate_id = candidate_id.to_string();
    let participants = participants.to_vec();
    let now = now_rfc3339();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO chats (id, participants, participants_key, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)
                 ON CONFLICT (participants_key) DO NOTHING",
                params![candidate_id, super::json_param(&participants)?, key, now],
            )?;
            // Winner or loser, the row for this key exists now.
            let chat_id: String = tx.query_row(
                "SELECT id FROM chats WHERE participants_key = ?1",
                params![key],
                |row| row.get(0),
            )?;
            for user_id in &participants {
                tx.execute(
                    "INSERT INTO chat_unreads (chat_id, user_id, count) VALUES (?1, ?2, 0)
                     ON CONFLICT (chat_id, user_id) DO NOTHING",
                    params![chat_id, user_id],
                )?;
            }
            let chat = load_chat(&tx, &chat_id)?;
            tx.commit()?;
            Ok(chat)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch a chat by id, with its unread counters.
pub async fn get(db: &Database, chat_id: &str) -> Result<Option<Chat>, BaseraError> {
    let chat_id = chat_id.to_string();
    db.connection()
        .call(move |conn| match load_chat(conn, &chat_id) {
            Ok(chat) => Ok(Some(chat)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Record a freshly inserted message on its chat.
///
/// One transaction: the last-message pointer, the chat's `updated_at`, and
/// the recipient's unread counter land together. The counter bump is a
/// single-statement upsert, so concurrent senders can never lose an
/// increment. Errors if the chat does not exist.
pub async fn apply_new_message(
    db: &Database,
    chat_id: &str,
    message_id: &str,
    recipient_id: &str,
) -> Result<(), BaseraError> {
    let chat_id = chat_id.to_string();
    let message_id = message_id.to_string();
    let recipient_id = recipient_id.to_string();
    let now = now_rfc3339();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE chats SET last_message_id = ?2, updated_at = ?3 WHERE id = ?1",
                params![chat_id, message_id, now],
            )?;
            if changed == 0 {
                return Err(rusqlite::Error::QueryReturnedNoRows);
            }
            tx.execute(
                "INSERT INTO chat_unreads (chat_id, user_id, count) VALUES (?1, ?2, 1)
                 ON CONFLICT (chat_id, user_id) DO UPDATE SET count = count + 1",
                params![chat_id, recipient_id],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Zero one participant's unread counter. A no-op for unknown pairs.
pub async fn reset_unread(db: &Database, chat_id: &str, user_id: &str) -> Result<(), BaseraError> {
    let chat_id = chat_id.to_string();
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE chat_unreads SET count = 0 WHERE chat_id = ?1 AND user_id = ?2",
                params![chat_id, user_id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All chats the user participates in, most recently updated first, each
/// joined with that user's unread count and the chat's last message.
///
/// Membership comes from `chat_unreads`, which holds one row per
/// (chat, participant) from creation.
pub async fn list_for(db: &Database, user_id: &str) -> Result<Vec<ChatListEntry>, BaseraError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.participants, cu.count, c.updated_at,
                        m.id, m.sender_id, m.role, m.text, m.created_at
                 FROM chats c
                 JOIN chat_unreads cu ON cu.chat_id = c.id AND cu.user_id = ?1
                 LEFT JOIN chat_messages m ON m.id = c.last_message_id
                 ORDER BY c.updated_at DESC, c.id ASC",
            )?;
            let rows = stmt.query_map(params![user_id], |row| {
                let participants: String = row.get(1)?;
                let last_message = match row.get::<_, Option<String>>(4)? {
                    Some(id) => {
                        let role: String = row.get(6)?;
                        Some(MessageSummary {
                            id,
                            from: row.get(5)?,
                            role: super::enum_col(6, &role)?,
                            text: row.get(7)?,
                            created_at: row.get(8)?,
                        })
                    }
                    None => None,
                };
                Ok(ChatListEntry {
                    chat_id: row.get(0)?,
                    participants: super::json_col(1, &participants)?,
                    unread_count: row.get(2)?,
                    last_message,
                    updated_at: row.get(3)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::messages;
    use basera_core::types::{ChatMessage, MessageRole, MessageStatus};
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap(), true).await.unwrap();
        (db, dir)
    }

    fn two(a: &str, b: &str) -> Vec<String> {
        vec![a.to_string(), b.to_string()]
    }

    fn message(id: &str, chat_id: &str, from: &str, to: &str, text: &str) -> ChatMessage {
        ChatMessage {
            id: id.to_string(),
            chat_id: chat_id.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            role: MessageRole::User,
            text: text.to_string(),
            content: vec![],
            session_id: chat_id.to_string(),
            attachments: vec![],
            lead_cards: vec![],
            status: MessageStatus::Sent,
            is_deleted_for: vec![],
            created_at: now_rfc3339(),
        }
    }

    #[tokio::test]
    async fn create_seeds_zero_unreads() {
        let (db, _dir) = setup_db().await;
        let chat = create_or_fetch(&db, "chat-1", &two("u1", "u2")).await.unwrap();
        assert_eq!(chat.id, "chat-1");
        assert_eq!(chat.participants_key, "u1_u2");
        assert_eq!(chat.unread_counts.get("u1"), Some(&0));
        assert_eq!(chat.unread_counts.get("u2"), Some(&0));
        assert!(chat.last_message_id.is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn conflicting_create_returns_winner() {
        let (db, _dir) = setup_db().await;
        let first = create_or_fetch(&db, "chat-1", &two("u1", "u2")).await.unwrap();
        // Same pair in the opposite order resolves to the same chat.
        let second = create_or_fetch(&db, "chat-2", &two("u2", "u1")).await.unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.participants_key, first.participants_key);

        let count: i64 = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT COUNT(*) FROM chats", [], |row| row.get(0))
            })
            .await
            .unwrap();
        assert_eq!(count, 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn apply_new_message_moves_pointer_and_bumps_unread() {
        let (db, _dir) = setup_db().await;
        let chat = create_or_fetch(&db, "chat-1", &two("u1", "u2")).await.unwrap();

        let m = message("m1", &chat.id, "u1", "u2", "hello");
        messages::insert(&db, &m).await.unwrap();
        apply_new_message(&db, &chat.id, &m.id, &m.to).await.unwrap();

        let chat = get(&db, "chat-1").await.unwrap().unwrap();
        assert_eq!(chat.last_message_id.as_deref(), Some("m1"));
        assert_eq!(chat.unread_counts.get("u2"), Some(&1));
        assert_eq!(chat.unread_counts.get("u1"), Some(&0));

        let m2 = message("m2", &chat.id, "u1", "u2", "again");
        messages::insert(&db, &m2).await.unwrap();
        apply_new_message(&db, &chat.id, &m2.id, &m2.to).await.unwrap();

        let chat = get(&db, "chat-1").await.unwrap().unwrap();
        assert_eq!(chat.last_message_id.as_deref(), Some("m2"));
        assert_eq!(chat.unread_counts.get("u2"), Some(&2));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn apply_new_message_unknown_chat_errors() {
        let (db, _dir) = setup_db().await;
        let result = apply_new_message(&db, "ghost", "m1", "u2").await;
        assert!(result.is_err());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reset_unread_zeroes_only_that_user() {
        let (db, _dir) = setup_db().await;
        let chat = create_or_fetch(&db, "chat-1", &two("u1", "u2")).await.unwrap();

        for id in ["m1", "m2"] {
            let m = message(id, &chat.id, "u1", "u2", "ping");
            messages::insert(&db, &m).await.unwrap();
            apply_new_message(&db, &chat.id, &m.id, "u2").await.unwrap();
        }
        let m = message("m3", &chat.id, "u2", "u1", "pong");
        messages::insert(&db, &m).await.unwrap();
        apply_new_message(&db, &chat.id, "m3", "u1").await.unwrap();

        reset_unread(&db, &chat.id, "u2").await.unwrap();

        let chat = get(&db, "chat-1").await.unwrap().unwrap();
        assert_eq!(chat.unread_counts.get("u2"), Some(&0));
        assert_eq!(chat.unread_counts.get("u1"), Some(&1));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_for_orders_by_recency_and_scopes_to_member() {
        let (db, _dir) = setup_db().await;
        let a = create_or_fetch(&db, "chat-a", &two("u1", "u2")).await.unwrap();
        let b = create_or_fetch(&db, "chat-b", &two("u1", "u3")).await.unwrap();

        // Touch chat A after B's creation so it sorts first.
        let m = message("m1", &a.id, "u2", "u1", "newest");
        messages::insert(&db, &m).await.unwrap();
        apply_new_message(&db, &a.id, "m1", "u1").await.unwrap();

        let listing = list_for(&db, "u1").await.unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].chat_id, a.id);
        assert_eq!(listing[0].unread_count, 1);
        let last = listing[0].last_message.as_ref().unwrap();
        assert_eq!(last.text, "newest");
        assert_eq!(last.from, "u2");
        assert_eq!(listing[1].chat_id, b.id);
        assert!(listing[1].last_message.is_none());

        // u2 participates in one chat; u4 in none.
        assert_eq!(list_for(&db, "u2").await.unwrap().len(), 1);
        assert!(list_for(&db, "u4").await.unwrap().is_empty());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_missing_chat_returns_none() {
        let (db, _dir) = setup_db().await;
        assert!(get(&db, "nope").await.unwrap().is_none());
        db.close().await.unwrap();
    }
}
