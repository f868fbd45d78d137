//! # User Repository
//!
//! Accounts. Password hashing happens in the API layer; this repository
//! only stores the PHC string.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};
use umkm_core::{new_id, Role, User};

#[derive(Debug, Clone)]
pub struct NewUser {
    /// Already normalised (trimmed, lowercased).
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// ## Errors
    /// `DbError::UniqueViolation { field: "email" }` when the email is taken.
    pub async fn create(&self, user: NewUser) -> DbResult<User> {
        let id = new_id();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, name, role, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.role)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        info!(user_id = %id, role = %user.role, "User registered");

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            name: "Owner".to_string(),
            role: Role::Owner,
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = Database::new(DbConfig::in_memory()).await.unwrap().users();

        let user = repo.create(new_user("owner@toko.id")).await.unwrap();
        assert_eq!(user.role, Role::Owner);
        assert_eq!(user.password_hash, "$argon2id$stub");

        let found = repo.find_by_email("owner@toko.id").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(repo.find_by_email("nobody@toko.id").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let repo = Database::new(DbConfig::in_memory()).await.unwrap().users();
        repo.create(new_user("a@toko.id")).await.unwrap();

        let err = repo.create(new_user("a@toko.id")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field } if field == "email"));
    }
}
