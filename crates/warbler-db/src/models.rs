//! Database row types. These map directly to SQLite rows and stay independent
//! of the HTTP layer's form types.

use chrono::{DateTime, NaiveDateTime, Utc};

pub const DEFAULT_IMAGE_URL: &str = "/static/images/default-pic.png";
pub const DEFAULT_HEADER_IMAGE_URL: &str = "/static/images/warbler-hero.png";

/// Longest message body the schema accepts.
pub const MAX_MESSAGE_LEN: usize = 140;

#[derive(Debug, Clone, PartialEq)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    /// Argon2 PHC string when the row was created through `signup`.
    pub password: String,
}

/// Insert payload for a user. `password` is stored exactly as given.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewUser<'a> {
    pub id: Option<i64>,
    pub email: &'a str,
    pub username: &'a str,
    pub password: &'a str,
    pub image_url: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileUpdate<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub image_url: Option<&'a str>,
    pub header_image_url: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub location: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageRow {
    pub id: i64,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct NewMessage<'a> {
    pub id: Option<i64>,
    pub text: &'a str,
    pub user_id: i64,
}

/// A message joined with the author columns needed to render it.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthoredMessage {
    pub message: MessageRow,
    pub username: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserStats {
    pub messages: i64,
    pub following: i64,
    pub followers: i64,
    pub likes: i64,
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>().ok().or_else(|| {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|ndt| ndt.and_utc())
    })
}

/// Treats a missing or blank optional column as "use the default".
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
