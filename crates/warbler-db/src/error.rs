use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

/// Errors surfaced by the storage layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// Input rejected before touching the database.
    #[error("invalid input: {0}")]
    Invalid(String),

    /// A unique, foreign key or check constraint rejected the write.
    #[error("integrity error: {0}")]
    Integrity(String),

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("sqlite error: {0}")]
    Sqlite(#[source] rusqlite::Error),

    #[error("database lock poisoned")]
    LockPoisoned,
}

impl DbError {
    pub fn is_integrity(&self) -> bool {
        matches!(self, DbError::Integrity(_))
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, msg)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                DbError::Integrity(msg.clone().unwrap_or_else(|| code.to_string()))
            }
            _ => DbError::Sqlite(err),
        }
    }
}
