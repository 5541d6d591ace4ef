//! User repository for database operations

use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::credentials;
use crate::models::{NewUser, User};

const USER_COLUMNS: &str =
    "id, is_active, email, email_confirmed_at, password, first_name, last_name";

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user, hashing the supplied plaintext password
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        info!("Creating new user: {}", new_user.email);

        let password_hash = credentials::hash_password(&new_user.password)?;
        let confirmed_at = new_user.confirmed.then(Utc::now);

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, email_confirmed_at, password, first_name, last_name)
            VALUES (?, ?, ?, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.email)
        .bind(confirmed_at)
        .bind(&password_hash)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by email, ignoring case
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Enable or disable sign-in for a user
    pub async fn set_active(&self, id: i64, active: bool) -> Result<bool> {
        info!("Setting user {} active = {}", id, active);

        let result = sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
            .bind(active)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a user; memberships and sessions go with it
    pub async fn delete(&self, id: i64) -> Result<bool> {
        info!("Deleting user {}", id);

        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
