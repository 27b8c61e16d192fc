use rusqlite::{Connection, OptionalExtension, Row};

use crate::models::{
    DEFAULT_HEADER_IMAGE_URL, DEFAULT_IMAGE_URL, NewUser, ProfileUpdate, UserRow, UserStats,
    non_blank,
};
use crate::{Database, Result};

pub(crate) const USER_COLUMNS: &str =
    "u.id, u.email, u.username, u.image_url, u.header_image_url, u.bio, u.location, u.password";

impl Database {
    /// Raw insert. The password column receives `new.password` untouched; use
    /// [`Database::signup`] to store a hashed credential.
    pub fn insert_user(&self, new: &NewUser<'_>) -> Result<UserRow> {
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO users (id, email, username, password, image_url)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    new.id,
                    new.email,
                    new.username,
                    new.password,
                    non_blank(new.image_url).unwrap_or(DEFAULT_IMAGE_URL),
                ],
            )?;
            let id = tx.last_insert_rowid();
            query_user_by_id(tx, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows.into())
        })
    }

    pub fn get_user(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.username = ?1");
            Ok(conn.query_row(&sql, [username], user_from_row).optional()?)
        })
    }

    /// All users ordered by id, optionally narrowed to usernames containing
    /// `search` (case-sensitive).
    pub fn list_users(&self, search: Option<&str>) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let rows = match search.filter(|s| !s.is_empty()) {
                Some(needle) => {
                    let sql = format!(
                        "SELECT {USER_COLUMNS} FROM users u
                         WHERE instr(u.username, ?1) > 0
                         ORDER BY u.id"
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    let rows = stmt
                        .query_map([needle], user_from_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?;
                    rows
                }
                None => {
                    let sql = format!("SELECT {USER_COLUMNS} FROM users u ORDER BY u.id");
                    let mut stmt = conn.prepare(&sql)?;
                    let rows = stmt
                        .query_map([], user_from_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?;
                    rows
                }
            };
            Ok(rows)
        })
    }

    /// Rewrites the editable profile columns. Returns the updated row, or
    /// `None` when no user has that id.
    pub fn update_profile(&self, id: i64, update: &ProfileUpdate<'_>) -> Result<Option<UserRow>> {
        self.with_tx(|tx| {
            let changed = tx.execute(
                "UPDATE users
                 SET username = ?2, email = ?3, image_url = ?4, header_image_url = ?5,
                     bio = ?6, location = ?7
                 WHERE id = ?1",
                rusqlite::params![
                    id,
                    update.username,
                    update.email,
                    non_blank(update.image_url).unwrap_or(DEFAULT_IMAGE_URL),
                    non_blank(update.header_image_url).unwrap_or(DEFAULT_HEADER_IMAGE_URL),
                    non_blank(update.bio),
                    non_blank(update.location),
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_user_by_id(tx, id)
        })
    }

    /// Deletes the user together with their messages, follows edges and likes.
    pub fn delete_user(&self, id: i64) -> Result<bool> {
        self.with_tx(|tx| Ok(tx.execute("DELETE FROM users WHERE id = ?1", [id])? > 0))
    }

    pub fn user_stats(&self, id: i64) -> Result<UserStats> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT
                    (SELECT COUNT(*) FROM messages WHERE user_id = ?1),
                    (SELECT COUNT(*) FROM follows WHERE user_following_id = ?1),
                    (SELECT COUNT(*) FROM follows WHERE user_being_followed_id = ?1),
                    (SELECT COUNT(*) FROM likes WHERE user_id = ?1)",
                [id],
                |row| {
                    Ok(UserStats {
                        messages: row.get(0)?,
                        following: row.get(1)?,
                        followers: row.get(2)?,
                        likes: row.get(3)?,
                    })
                },
            )?)
        })
    }
}

pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        image_url: row.get(3)?,
        header_image_url: row.get(4)?,
        bio: row.get(5)?,
        location: row.get(6)?,
        password: row.get(7)?,
    })
}

fn query_user_by_id(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?1");
    Ok(conn.query_row(&sql, [id], user_from_row).optional()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbError;
    use crate::models::NewMessage;

    fn user<'a>(username: &'a str, email: &'a str) -> NewUser<'a> {
        NewUser {
            username,
            email,
            password: "HASHED_PASSWORD",
            ..Default::default()
        }
    }

    #[test]
    fn new_user_has_no_messages_or_followers() {
        let db = Database::open_in_memory().unwrap();
        let u = db.insert_user(&user("testuser", "test@test.com")).unwrap();

        assert_eq!(u.image_url, DEFAULT_IMAGE_URL);
        assert_eq!(u.header_image_url, DEFAULT_HEADER_IMAGE_URL);
        assert_eq!(db.user_stats(u.id).unwrap(), UserStats::default());
        assert!(db.followers(u.id).unwrap().is_empty());
    }

    #[test]
    fn explicit_id_is_kept() {
        let db = Database::open_in_memory().unwrap();
        let u = db
            .insert_user(&NewUser {
                id: Some(5555),
                ..user("testuser", "test@test.com")
            })
            .unwrap();
        assert_eq!(u.id, 5555);
        assert_eq!(db.get_user(5555).unwrap().unwrap().username, "testuser");
    }

    #[test]
    fn duplicate_username_or_email_is_integrity_error() {
        let db = Database::open_in_memory().unwrap();
        db.insert_user(&user("testuser", "test@test.com")).unwrap();

        let err = db.insert_user(&user("testuser", "other@test.com")).unwrap_err();
        assert!(err.is_integrity(), "unexpected error: {err}");

        let err = db.insert_user(&user("other", "test@test.com")).unwrap_err();
        assert!(matches!(err, DbError::Integrity(_)));

        assert_eq!(db.list_users(None).unwrap().len(), 1);
    }

    #[test]
    fn search_filters_by_username_substring() {
        let db = Database::open_in_memory().unwrap();
        db.insert_user(&user("abc", "abc@test.com")).unwrap();
        db.insert_user(&user("abd", "abd@test.com")).unwrap();
        db.insert_user(&user("xyz", "xyz@test.com")).unwrap();

        let names = |q: Option<&str>| -> Vec<String> {
            db.list_users(q)
                .unwrap()
                .into_iter()
                .map(|u| u.username)
                .collect()
        };

        assert_eq!(names(Some("ab")), vec!["abc", "abd"]);
        assert_eq!(names(Some("y")), vec!["xyz"]);
        assert_eq!(names(Some("%")), Vec::<String>::new());
        assert_eq!(names(Some("")).len(), 3);
        assert_eq!(names(None).len(), 3);
    }

    #[test]
    fn update_profile_rewrites_columns() {
        let db = Database::open_in_memory().unwrap();
        let u = db.insert_user(&user("testuser", "test@test.com")).unwrap();

        let updated = db
            .update_profile(
                u.id,
                &ProfileUpdate {
                    username: "renamed",
                    email: "new@test.com",
                    image_url: Some(""),
                    header_image_url: Some("/h.jpg"),
                    bio: Some("hello"),
                    location: None,
                },
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.username, "renamed");
        assert_eq!(updated.image_url, DEFAULT_IMAGE_URL);
        assert_eq!(updated.header_image_url, "/h.jpg");
        assert_eq!(updated.bio.as_deref(), Some("hello"));
        assert_eq!(updated.location, None);
        assert_eq!(updated.password, u.password);

        assert!(db.update_profile(999, &ProfileUpdate::default()).unwrap().is_none());
    }

    #[test]
    fn delete_user_cascades() {
        let db = Database::open_in_memory().unwrap();
        let a = db.insert_user(&user("a", "a@test.com")).unwrap();
        let b = db.insert_user(&user("b", "b@test.com")).unwrap();
        let m = db
            .insert_message(&NewMessage {
                id: None,
                text: "hi",
                user_id: a.id,
            })
            .unwrap();
        db.follow(b.id, a.id).unwrap();
        db.toggle_like(b.id, m.id).unwrap();

        assert!(db.delete_user(a.id).unwrap());
        assert!(db.get_message(m.id).unwrap().is_none());
        assert_eq!(db.user_stats(b.id).unwrap(), UserStats::default());
        assert!(!db.delete_user(a.id).unwrap());
    }
}
