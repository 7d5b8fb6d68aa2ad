//! Persistence for chat messages.
//!
//! Every call runs on the blocking pool, so a slow disk never stalls other
//! connections' event handling.

use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;

use crate::chat::ChatMessage;
use crate::db::DbPool;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database lock poisoned")]
    Lock,
    #[error("storage task aborted")]
    Join,
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

/// Insert a message row. The caller has already stamped id and timestamp.
pub async fn insert_message(db: &DbPool, msg: &ChatMessage) -> Result<(), StoreError> {
    let db = db.clone();
    let msg = msg.clone();

    tokio::task::spawn_blocking(move || {
        let conn = db.lock().map_err(|_| StoreError::Lock)?;
        conn.execute(
            "INSERT INTO messages (id, sender, recipient, message, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                msg.id,
                msg.sender,
                msg.recipient,
                msg.message,
                msg.timestamp.timestamp_millis()
            ],
        )?;
        Ok(())
    })
    .await
    .map_err(|_| StoreError::Join)?
}

/// Full transcript between two identities, oldest first.
/// Matches rows where (sender, recipient) is (a, b) in either order. The id
/// tiebreak keeps equal-millisecond messages in insert order (UUIDv7 ids are
/// time-sortable).
pub async fn transcript_between(
    db: &DbPool,
    a: &str,
    b: &str,
) -> Result<Vec<ChatMessage>, StoreError> {
    let db = db.clone();
    let a = a.to_string();
    let b = b.to_string();

    tokio::task::spawn_blocking(move || {
        let conn = db.lock().map_err(|_| StoreError::Lock)?;
        let mut stmt = conn.prepare(
            "SELECT id, sender, recipient, message, timestamp FROM messages
             WHERE (sender = ?1 AND recipient = ?2) OR (sender = ?2 AND recipient = ?1)
             ORDER BY timestamp ASC, id ASC",
        )?;

        let messages = stmt
            .query_map(rusqlite::params![a, b], |row| {
                Ok(ChatMessage {
                    id: row.get(0)?,
                    sender: row.get(1)?,
                    recipient: row.get(2)?,
                    message: row.get(3)?,
                    timestamp: millis_to_datetime(row.get(4)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(messages)
    })
    .await
    .map_err(|_| StoreError::Join)?
}

fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn test_db() -> DbPool {
        let mut conn = rusqlite::Connection::open_in_memory().expect("open in-memory db");
        crate::db::migrations::migrations()
            .to_latest(&mut conn)
            .expect("run migrations");
        Arc::new(Mutex::new(conn))
    }

    fn message(id: &str, sender: &str, recipient: &str, body: &str, millis: i64) -> ChatMessage {
        ChatMessage {
            id: id.to_string(),
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            message: body.to_string(),
            timestamp: Utc.timestamp_millis_opt(millis).unwrap(),
        }
    }

    #[tokio::test]
    async fn transcript_includes_both_directions_only() {
        let db = test_db();
        insert_message(&db, &message("m1", "alice@x.com", "bob@x.com", "hi", 1000))
            .await
            .unwrap();
        insert_message(&db, &message("m2", "bob@x.com", "alice@x.com", "hello", 2000))
            .await
            .unwrap();
        insert_message(&db, &message("m3", "carol@x.com", "alice@x.com", "hey", 3000))
            .await
            .unwrap();

        let transcript = transcript_between(&db, "alice@x.com", "bob@x.com")
            .await
            .unwrap();
        assert_eq!(transcript.len(), 2);
        assert!(transcript.iter().all(|m| m.sender != "carol@x.com"));

        // Same pair queried from the other side yields the same transcript
        let mirrored = transcript_between(&db, "bob@x.com", "alice@x.com")
            .await
            .unwrap();
        assert_eq!(mirrored.len(), 2);
    }

    #[tokio::test]
    async fn transcript_sorts_ascending_with_id_tiebreak() {
        let db = test_db();
        // Inserted out of order; two rows share a timestamp
        insert_message(&db, &message("b", "alice@x.com", "bob@x.com", "second", 2000))
            .await
            .unwrap();
        insert_message(&db, &message("a", "bob@x.com", "alice@x.com", "first", 1000))
            .await
            .unwrap();
        insert_message(&db, &message("c", "alice@x.com", "bob@x.com", "third", 2000))
            .await
            .unwrap();

        let transcript = transcript_between(&db, "bob@x.com", "alice@x.com")
            .await
            .unwrap();
        let bodies: Vec<&str> = transcript.iter().map(|m| m.message.as_str()).collect();
        assert_eq!(bodies, ["first", "second", "third"]);
    }
}
