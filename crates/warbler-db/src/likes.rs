use std::collections::HashSet;

use crate::messages::authored_from_row;
use crate::models::AuthoredMessage;
use crate::{Database, Result};

impl Database {
    /// Toggle a like: removes it if present, inserts it if not.
    /// Returns `true` when the like was added.
    pub fn toggle_like(&self, user_id: i64, message_id: i64) -> Result<bool> {
        self.with_tx(|tx| {
            let removed = tx.execute(
                "DELETE FROM likes WHERE user_id = ?1 AND message_id = ?2",
                [user_id, message_id],
            )?;
            if removed > 0 {
                return Ok(false);
            }

            tx.execute(
                "INSERT INTO likes (user_id, message_id) VALUES (?1, ?2)",
                [user_id, message_id],
            )?;
            Ok(true)
        })
    }

    pub fn has_liked(&self, user_id: i64, message_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT EXISTS (SELECT 1 FROM likes WHERE user_id = ?1 AND message_id = ?2)",
                [user_id, message_id],
                |row| row.get(0),
            )?)
        })
    }

    /// Messages `user_id` has liked, most recently liked first.
    pub fn liked_messages(&self, user_id: i64) -> Result<Vec<AuthoredMessage>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.text, m.timestamp, m.user_id, u.username, u.image_url
                 FROM likes l
                 JOIN messages m ON m.id = l.message_id
                 JOIN users u ON u.id = m.user_id
                 WHERE l.user_id = ?1
                 ORDER BY l.id DESC",
            )?;
            let rows = stmt
                .query_map([user_id], authored_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Ids of every message `user_id` has liked, for marking feeds.
    pub fn liked_message_ids(&self, user_id: i64) -> Result<HashSet<i64>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT message_id FROM likes WHERE user_id = ?1")?;
            let ids = stmt
                .query_map([user_id], |row| row.get(0))?
                .collect::<std::result::Result<HashSet<i64>, _>>()?;
            Ok(ids)
        })
    }
}
