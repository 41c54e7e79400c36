//! User accounts

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use super::database::{get_parsed, get_time, get_uuid, map_conflict, ts, Database, Result, StorageError};
use super::models::{NewUser, ProfileUpdate, User};
use crate::auth;

const USER_COLUMNS: &str = "id, username, full_name, role, grade_level, created_at";

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: get_uuid(row, 0)?,
        username: row.get(1)?,
        full_name: row.get(2)?,
        role: get_parsed(row, 3)?,
        grade_level: row.get(4)?,
        created_at: get_time(row, 5)?,
    })
}

impl Database {
    // ===== User Operations =====

    /// Register a new user. Usernames are unique.
    pub fn create_user(&self, new_user: NewUser) -> Result<User> {
        let password_hash = auth::hash_password(&new_user.password)?;
        self.insert_user(new_user, password_hash)
    }

    /// Register a new user whose password has already been hashed.
    /// `new_user.password` is ignored.
    pub fn insert_user(&self, new_user: NewUser, password_hash: String) -> Result<User> {
        let username = new_user.username.trim().to_string();
        if username.is_empty() {
            return Err(StorageError::InvalidInput("username must not be empty".to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            username,
            full_name: new_user.full_name,
            role: new_user.role,
            grade_level: new_user.grade_level,
            created_at: Utc::now(),
        };

        self.conn
            .execute(
                "INSERT INTO users (id, username, password_hash, full_name, role, grade_level, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    user.id.to_string(),
                    user.username,
                    password_hash,
                    user.full_name,
                    user.role.as_str(),
                    user.grade_level,
                    ts(&user.created_at),
                ],
            )
            .map_err(|e| map_conflict(e, format!("username '{}'", user.username)))?;

        log::info!("Created {} account {}", user.role, user.id);
        Ok(user)
    }

    /// Look up a user by username and check the password
    pub fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        match self.credentials(username)? {
            Some((user, hash)) if auth::verify_password(password, &hash) => Ok(user),
            _ => Err(StorageError::InvalidCredentials),
        }
    }

    /// The user and stored password hash for `username`, if registered
    pub fn credentials(&self, username: &str) -> Result<Option<(User, String)>> {
        let found = self
            .conn
            .query_row(
                &format!("SELECT {}, password_hash FROM users WHERE username = ?1", USER_COLUMNS),
                params![username.trim()],
                |row| Ok((user_from_row(row)?, row.get::<_, String>(6)?)),
            )
            .optional()?;
        Ok(found)
    }

    pub fn get_user(&self, id: Uuid) -> Result<User> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                params![id.to_string()],
                user_from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound(format!("User {}", id)))
    }

    /// Apply a partial profile update and return the updated user
    pub fn update_user_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<User> {
        let password_hash = update.password.as_deref().map(auth::hash_password).transpose()?;
        self.apply_profile_update(id, update, password_hash)
    }

    /// Apply a partial profile update with the new password already hashed.
    /// `update.password` is ignored.
    pub fn apply_profile_update(&self, id: Uuid, update: ProfileUpdate, password_hash: Option<String>) -> Result<User> {
        let mut user = self.get_user(id)?;

        if let Some(full_name) = update.full_name {
            user.full_name = full_name;
        }
        if let Some(grade_level) = update.grade_level {
            user.grade_level = grade_level;
        }

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE users SET full_name = ?1, grade_level = ?2 WHERE id = ?3",
            params![user.full_name, user.grade_level, id.to_string()],
        )?;
        if let Some(hash) = password_hash {
            tx.execute(
                "UPDATE users SET password_hash = ?1 WHERE id = ?2",
                params![hash, id.to_string()],
            )?;
        }
        tx.commit()?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Role;

    fn student(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password: "secret".to_string(),
            full_name: "Juan Dela Cruz".to_string(),
            role: Role::Student,
            grade_level: Some(7),
        }
    }

    #[test]
    fn test_create_and_authenticate() {
        let db = Database::open_in_memory().unwrap();
        let created = db.create_user(student("juan")).unwrap();

        let user = db.authenticate("juan", "secret").unwrap();
        assert_eq!(user.id, created.id);
        assert_eq!(user.role, Role::Student);
        assert_eq!(user.grade_level, Some(7));

        assert!(matches!(db.authenticate("juan", "wrong"), Err(StorageError::InvalidCredentials)));
        assert!(matches!(db.authenticate("nobody", "secret"), Err(StorageError::InvalidCredentials)));
    }

    #[test]
    fn test_password_not_stored_in_plaintext() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user(student("juan")).unwrap();
        let stored: String = db
            .conn
            .query_row(
                "SELECT password_hash FROM users WHERE id = ?1",
                params![user.id.to_string()],
                |row| row.get(0),
            )
            .unwrap();
        assert_ne!(stored, "secret");
    }

    #[test]
    fn test_duplicate_username_conflicts() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(student("juan")).unwrap();
        assert!(matches!(db.create_user(student("juan")), Err(StorageError::Conflict(_))));
    }

    #[test]
    fn test_update_profile() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user(student("maria")).unwrap();

        let updated = db
            .update_user_profile(
                user.id,
                ProfileUpdate {
                    full_name: Some("Maria Clara".to_string()),
                    grade_level: Some(None),
                    password: Some("new-secret".to_string()),
                },
            )
            .unwrap();
        assert_eq!(updated.full_name, "Maria Clara");
        assert_eq!(updated.grade_level, None);

        assert!(db.authenticate("maria", "new-secret").is_ok());
        assert!(db.authenticate("maria", "secret").is_err());
        assert_eq!(db.get_user(user.id).unwrap().full_name, "Maria Clara");
    }

    #[test]
    fn test_prehashed_password_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let hash = auth::hash_password("secret").unwrap();
        let created = db.insert_user(student("jose"), hash.clone()).unwrap();

        let (user, stored) = db.credentials(" jose ").unwrap().unwrap();
        assert_eq!(user.id, created.id);
        assert_eq!(stored, hash);
        assert!(db.credentials("nobody").unwrap().is_none());

        let new_hash = auth::hash_password("changed").unwrap();
        let update = ProfileUpdate {
            full_name: None,
            grade_level: None,
            password: Some("ignored".to_string()),
        };
        db.apply_profile_update(user.id, update, Some(new_hash)).unwrap();
        assert!(db.authenticate("jose", "changed").is_ok());
        assert!(db.authenticate("jose", "ignored").is_err());
    }

    #[test]
    fn test_get_missing_user() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(db.get_user(Uuid::new_v4()), Err(StorageError::NotFound(_))));
    }
}
