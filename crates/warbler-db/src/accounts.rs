use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use rand_core::OsRng;
use tracing::info;

use crate::models::{NewUser, UserRow};
use crate::{Database, DbError, Result};

impl Database {
    /// Hashes `password` with Argon2id and stores a new user.
    ///
    /// Blank username, email or password is rejected with [`DbError::Invalid`]
    /// before the database is touched. A taken username or email comes back as
    /// [`DbError::Integrity`].
    pub fn signup(
        &self,
        username: &str,
        email: &str,
        password: &str,
        image_url: Option<&str>,
    ) -> Result<UserRow> {
        if username.trim().is_empty() {
            return Err(DbError::Invalid("username is required".into()));
        }
        if email.trim().is_empty() {
            return Err(DbError::Invalid("email is required".into()));
        }
        if password.is_empty() {
            return Err(DbError::Invalid("password is required".into()));
        }

        let password_hash = hash_password(password)?;
        let user = self.insert_user(&NewUser {
            id: None,
            email,
            username,
            password: &password_hash,
            image_url,
        })?;

        info!("User {} signed up (id {})", user.username, user.id);
        Ok(user)
    }

    /// Returns the user when `password` matches the stored hash, `None` for an
    /// unknown username or a wrong password.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Option<UserRow>> {
        let Some(user) = self.get_user_by_username(username)? else {
            return Ok(None);
        };

        if verify_password(&user.password, password) {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DbError::Hash(e.to_string()))
}

/// A stored value that is not a PHC hash string never verifies.
fn verify_password(stored: &str, password: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_stores_hashed_password() {
        let db = Database::open_in_memory().unwrap();
        let u = db
            .signup("testuser", "test@test.com", "HASHED_PASSWORD", Some(""))
            .unwrap();

        assert_ne!(u.password, "HASHED_PASSWORD");
        assert!(u.password.starts_with("$argon2"));

        let found = db.list_users(Some("testuser")).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn signup_salts_each_hash() {
        let db = Database::open_in_memory().unwrap();
        let a = db.signup("first", "first@test.com", "password1", None).unwrap();
        let b = db.signup("second", "second@test.com", "password1", None).unwrap();

        assert_ne!(a.password, b.password);
        assert!(db.authenticate("first", "password1").unwrap().is_some());
        assert!(db.authenticate("second", "password1").unwrap().is_some());
    }

    #[test]
    fn signup_rejects_empty_password() {
        let db = Database::open_in_memory().unwrap();
        let err = db
            .signup("testuser", "test@test.com", "", Some(""))
            .unwrap_err();

        assert!(matches!(err, DbError::Invalid(_)));
        assert!(db.get_user_by_username("testuser").unwrap().is_none());
    }

    #[test]
    fn signup_rejects_duplicate_username() {
        let db = Database::open_in_memory().unwrap();
        db.signup("testuser", "test@test.com", "secret", None).unwrap();

        let err = db
            .signup("testuser", "else@test.com", "secret", None)
            .unwrap_err();
        assert!(err.is_integrity());
    }

    #[test]
    fn authenticate_valid() {
        let db = Database::open_in_memory().unwrap();
        let created = db
            .signup("testuser", "test@test.com", "HASHED_PASSWORD", None)
            .unwrap();

        let user = db.authenticate("testuser", "HASHED_PASSWORD").unwrap();
        assert_eq!(user, Some(created));
    }

    #[test]
    fn authenticate_invalid_is_none_not_error() {
        let db = Database::open_in_memory().unwrap();
        db.signup("testuser", "test@test.com", "HASHED_PASSWORD", None)
            .unwrap();

        assert!(db.authenticate("test", "HASHED_PASSWORD").unwrap().is_none());
        assert!(db.authenticate("testuser", "password").unwrap().is_none());
    }

    #[test]
    fn authenticate_against_unhashed_row_is_none() {
        let db = Database::open_in_memory().unwrap();
        db.insert_user(&NewUser {
            username: "raw",
            email: "raw@test.com",
            password: "HASHED_PASSWORD",
            ..Default::default()
        })
        .unwrap();

        assert!(db.authenticate("raw", "HASHED_PASSWORD").unwrap().is_none());
    }
}
