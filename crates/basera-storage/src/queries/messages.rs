// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat message operations.
//!
//! Messages are append-only. "Deleting" a message hides it from one viewer
//! via `is_deleted_for`; the row itself is never removed.

use basera_core::BaseraError;
use rusqlite::params;

use crate::database::Database;
use crate::models::ChatMessage;

fn map_message_row(row: &rusqlite::Row<'_>) -> Result<ChatMessage, rusqlite::Error> {
    let role: String = row.get(4)?;
    let content: String = row.get(6)?;
    let attachments: String = row.get(8)?;
    let lead_cards: String = row.get(9)?;
    let status: String = row.get(10)?;
    let is_deleted_for: String = row.get(11)?;
    Ok(ChatMessage {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        from: row.get(2)?,
        to: row.get(3)?,
        role: super::enum_col(4, &role)?,
        text: row.get(5)?,
        content: super::json_col(6, &content)?,
        session_id: row.get(7)?,
        attachments: super::json_col(8, &attachments)?,
        lead_cards: super::json_col(9, &lead_cards)?,
        status: super::enum_col(10, &status)?,
        is_deleted_for: super::json_col(11, &is_deleted_for)?,
        created_at: row.get(12)?,
    })
}

const MESSAGE_SELECT: &str = "SELECT id, chat_id, sender_id, recipient_id, role, text, content,
        session_id, attachments, lead_cards, status, is_deleted_for, created_at
 FROM chat_messages";

/// Insert a fully formed message row.
pub async fn insert(db: &Database, message: &ChatMessage) -> Result<(), BaseraError> {
    let m = message.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO chat_messages
                 (id, chat_id, sender_id, recipient_id, role, text, content, session_id,
                  attachments, lead_cards, status, is_deleted_for, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    m.id,
                    m.chat_id,
                    m.from,
                    m.to,
                    m.role.to_string(),
                    m.text,
                    super::json_param(&m.content)?,
                    m.session_id,
                    super::json_param(&m.attachments)?,
                    super::json_param(&m.lead_cards)?,
                    m.status.to_string(),
                    super::json_param(&m.is_deleted_for)?,
                    m.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch a message by id.
pub async fn get(db: &Database, id: &str) -> Result<Option<ChatMessage>, BaseraError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!("{MESSAGE_SELECT} WHERE id = ?1"))?;
            match stmt.query_row(params![id], map_message_row) {
                Ok(message) => Ok(Some(message)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All messages in a chat, oldest first. Same-timestamp messages keep
/// insertion order.
pub async fn list(db: &Database, chat_id: &str) -> Result<Vec<ChatMessage>, BaseraError> {
    let chat_id = chat_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{MESSAGE_SELECT} WHERE chat_id = ?1 ORDER BY created_at ASC, rowid ASC"
            ))?;
            let rows = stmt.query_map(params![chat_id], map_message_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Messages in a chat as one viewer sees them: entries the viewer
/// soft-deleted are filtered out at read time.
pub async fn list_for(
    db: &Database,
    chat_id: &str,
    viewer_id: &str,
) -> Result<Vec<ChatMessage>, BaseraError> {
    let all = list(db, chat_id).await?;
    Ok(all
        .into_iter()
        .filter(|m| !m.is_deleted_for.iter().any(|v| v == viewer_id))
        .collect())
}

/// Hide a message from one viewer. Idempotent. Errors if the message does
/// not exist.
pub async fn mark_deleted_for(
    db: &Database,
    message_id: &str,
    viewer_id: &str,
) -> Result<(), BaseraError> {
    let message_id = message_id.to_string();
    let viewer_id = viewer_id.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let raw: String = tx.query_row(
                "SELECT is_deleted_for FROM chat_messages WHERE id = ?1",
                params![message_id],
                |row| row.get(0),
            )?;
            let mut hidden: Vec<String> = super::json_col(0, &raw)?;
            if !hidden.contains(&viewer_id) {
                hidden.push(viewer_id);
                tx.execute(
                    "UPDATE chat_messages SET is_deleted_for = ?2 WHERE id = ?1",
                    params![message_id, super::json_param(&hidden)?],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::chats;
    use basera_core::types::{ContentBlock, MessageRole, MessageStatus, now_rfc3339};
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap(), true).await.unwrap();
        (db, dir)
    }

    async fn seed_chat(db: &Database) -> String {
        let chat = chats::create_or_fetch(db, "chat-1", &["u1".into(), "u2".into()])
            .await
            .unwrap();
        chat.id
    }

    fn message(id: &str, chat_id: &str, text: &str, created_at: &str) -> ChatMessage {
        ChatMessage {
            id: id.to_string(),
            chat_id: chat_id.to_string(),
            from: "u1".to_string(),
            to: "u2".to_string(),
            role: MessageRole::User,
            text: text.to_string(),
            content: vec![ContentBlock::Text {
                text: text.to_string(),
            }],
            session_id: chat_id.to_string(),
            attachments: vec![],
            lead_cards: vec![],
            status: MessageStatus::Sent,
            is_deleted_for: vec![],
            created_at: created_at.to_string(),
        }
    }

    #[tokio::test]
    async fn insert_then_get_round_trips_rich_fields() {
        let (db, _dir) = setup_db().await;
        let chat_id = seed_chat(&db).await;

        let mut m = message("m1", &chat_id, "see these", &now_rfc3339());
        m.content.push(ContentBlock::Image {
            url: "https://img.example/1.jpg".into(),
            caption: Some("living room".into()),
        });
        m.attachments = vec![serde_json::json!({"file": "floorplan.pdf"})];
        m.lead_cards = vec![serde_json::json!({"leadId": "L-42", "budget": 4_500_000})];
        insert(&db, &m).await.unwrap();

        let loaded = get(&db, "m1").await.unwrap().unwrap();
        assert_eq!(loaded, m);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_returns_oldest_first() {
        let (db, _dir) = setup_db().await;
        let chat_id = seed_chat(&db).await;

        insert(&db, &message("m2", &chat_id, "second", "2026-03-01T10:00:01.000Z"))
            .await
            .unwrap();
        insert(&db, &message("m1", &chat_id, "first", "2026-03-01T10:00:00.000Z"))
            .await
            .unwrap();

        let listed = list(&db, &chat_id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, "m1");
        assert_eq!(listed[1].id, "m2");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn soft_delete_hides_only_for_that_viewer() {
        let (db, _dir) = setup_db().await;
        let chat_id = seed_chat(&db).await;

        insert(&db, &message("m1", &chat_id, "one", "2026-03-01T10:00:00.000Z"))
            .await
            .unwrap();
        insert(&db, &message("m2", &chat_id, "two", "2026-03-01T10:00:01.000Z"))
            .await
            .unwrap();

        mark_deleted_for(&db, "m1", "u1").await.unwrap();
        mark_deleted_for(&db, "m1", "u1").await.unwrap(); // idempotent

        let for_u1 = list_for(&db, &chat_id, "u1").await.unwrap();
        assert_eq!(for_u1.len(), 1);
        assert_eq!(for_u1[0].id, "m2");

        let for_u2 = list_for(&db, &chat_id, "u2").await.unwrap();
        assert_eq!(for_u2.len(), 2);

        // The row itself survives.
        let raw = get(&db, "m1").await.unwrap().unwrap();
        assert_eq!(raw.is_deleted_for, vec!["u1".to_string()]);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn mark_deleted_on_missing_message_errors() {
        let (db, _dir) = setup_db().await;
        assert!(mark_deleted_for(&db, "ghost", "u1").await.is_err());
        db.close().await.unwrap();
    }
}
