use rusqlite::{Connection, OptionalExtension, Row, types::Type};

use crate::models::{AuthoredMessage, MessageRow, NewMessage, parse_timestamp};
use crate::{Database, Result};

const AUTHORED_SELECT: &str = "SELECT m.id, m.text, m.timestamp, m.user_id, u.username, u.image_url
     FROM messages m
     JOIN users u ON u.id = m.user_id";

impl Database {
    /// Stores a message. A `user_id` with no matching user fails with
    /// [`crate::DbError::Integrity`], as does text longer than
    /// [`crate::models::MAX_MESSAGE_LEN`].
    pub fn insert_message(&self, new: &NewMessage<'_>) -> Result<MessageRow> {
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO messages (id, text, user_id) VALUES (?1, ?2, ?3)",
                rusqlite::params![new.id, new.text, new.user_id],
            )?;
            let id = tx.last_insert_rowid();
            query_message(tx, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows.into())
        })
    }

    pub fn get_message(&self, id: i64) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| query_message(conn, id))
    }

    pub fn get_message_with_author(&self, id: i64) -> Result<Option<AuthoredMessage>> {
        self.with_conn(|conn| {
            let sql = format!("{AUTHORED_SELECT} WHERE m.id = ?1");
            Ok(conn.query_row(&sql, [id], authored_from_row).optional()?)
        })
    }

    pub fn delete_message(&self, id: i64) -> Result<bool> {
        self.with_tx(|tx| Ok(tx.execute("DELETE FROM messages WHERE id = ?1", [id])? > 0))
    }

    /// Messages written by `user_id`, newest first.
    pub fn user_messages(&self, user_id: i64, limit: u32) -> Result<Vec<AuthoredMessage>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{AUTHORED_SELECT}
                 WHERE m.user_id = ?1
                 ORDER BY m.timestamp DESC, m.id DESC
                 LIMIT ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![user_id, limit], authored_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Home feed: messages by `user_id` and by everyone they follow, newest first.
    pub fn timeline(&self, user_id: i64, limit: u32) -> Result<Vec<AuthoredMessage>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{AUTHORED_SELECT}
                 WHERE m.user_id = ?1
                    OR m.user_id IN (
                        SELECT user_being_followed_id FROM follows WHERE user_following_id = ?1
                    )
                 ORDER BY m.timestamp DESC, m.id DESC
                 LIMIT ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![user_id, limit], authored_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

pub(crate) fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    let raw: String = row.get(2)?;
    let timestamp = parse_timestamp(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            Type::Text,
            format!("bad timestamp '{raw}'").into(),
        )
    })?;

    Ok(MessageRow {
        id: row.get(0)?,
        text: row.get(1)?,
        timestamp,
        user_id: row.get(3)?,
    })
}

pub(crate) fn authored_from_row(row: &Row<'_>) -> rusqlite::Result<AuthoredMessage> {
    Ok(AuthoredMessage {
        message: message_from_row(row)?,
        username: row.get(4)?,
        image_url: row.get(5)?,
    })
}

fn query_message(conn: &Connection, id: i64) -> Result<Option<MessageRow>> {
    Ok(conn
        .query_row(
            "SELECT id, text, timestamp, user_id FROM messages WHERE id = ?1",
            [id],
            message_from_row,
        )
        .optional()?)
}
