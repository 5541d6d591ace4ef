//! Role and membership repository
//!
//! Membership is always read through a parameterized join so that a change
//! is visible to the very next access check.

use common::error::DatabaseResult;
use sqlx::SqlitePool;
use std::collections::BTreeSet;
use tracing::info;

use crate::models::Role;

/// Role repository
#[derive(Clone)]
pub struct RoleRepository {
    pool: SqlitePool,
}

impl RoleRepository {
    /// Create a new role repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Fetch a role by name, creating it when missing
    pub async fn find_or_create(&self, name: &str) -> DatabaseResult<Role> {
        sqlx::query("INSERT INTO roles (name) VALUES (?) ON CONFLICT (name) DO NOTHING")
            .bind(name)
            .execute(&self.pool)
            .await?;

        let role = sqlx::query_as::<_, Role>("SELECT id, name FROM roles WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;

        Ok(role)
    }

    /// Add a user to a role
    pub async fn assign(&self, user_id: i64, role_name: &str) -> DatabaseResult<()> {
        info!("Assigning role {} to user {}", role_name, user_id);

        let role = self.find_or_create(role_name).await?;
        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id) VALUES (?, ?) \
             ON CONFLICT (user_id, role_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(role.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Remove a user from a role
    pub async fn unassign(&self, user_id: i64, role_name: &str) -> DatabaseResult<bool> {
        info!("Removing role {} from user {}", role_name, user_id);

        let result = sqlx::query(
            r#"
            DELETE FROM user_roles
            WHERE user_id = ?
              AND role_id IN (SELECT id FROM roles WHERE name = ?)
            "#,
        )
        .bind(user_id)
        .bind(role_name)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Names of every role the user is a member of
    pub async fn role_names_for_user(&self, user_id: i64) -> DatabaseResult<BTreeSet<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT roles.name
            FROM roles
            JOIN user_roles ON roles.id = user_roles.role_id
            WHERE user_roles.user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(names.into_iter().collect())
    }

    /// Delete a role; its memberships go with it
    pub async fn delete(&self, name: &str) -> DatabaseResult<bool> {
        info!("Deleting role {}", name);

        let result = sqlx::query("DELETE FROM roles WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
