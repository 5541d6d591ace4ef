//! Session repository for database operations

use chrono::{DateTime, Utc};
use common::error::DatabaseResult;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::{NewSession, Session};

/// Session repository
#[derive(Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    /// Create a new session repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a new session
    pub async fn create(&self, new_session: &NewSession) -> DatabaseResult<Session> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (id, user_id, issued_at, expires_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, user_id, issued_at, expires_at, revoked
            "#,
        )
        .bind(new_session.id)
        .bind(new_session.user_id)
        .bind(new_session.issued_at)
        .bind(new_session.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(session)
    }

    /// Find a session by ID
    pub async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT id, user_id, issued_at, expires_at, revoked FROM sessions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Mark a session as revoked
    pub async fn revoke(&self, id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query("UPDATE sessions SET revoked = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove sessions that can no longer authenticate: revoked, or expired
    /// as of `now`
    pub async fn delete_stale(&self, now: DateTime<Utc>) -> DatabaseResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE revoked = 1 OR expires_at < ?")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_user, provisioned_pool};
    use chrono::Duration;

    fn session_for(user_id: i64, expires_in: Duration) -> NewSession {
        let now = Utc::now();
        NewSession {
            id: Uuid::new_v4(),
            user_id,
            issued_at: now,
            expires_at: now + expires_in,
        }
    }

    #[tokio::test]
    async fn test_delete_stale_keeps_live_sessions() {
        let pool = provisioned_pool().await;
        let repo = SessionRepository::new(pool.clone());
        let user = create_user(&pool, "member@example.com", true).await;

        let live = repo
            .create(&session_for(user.id, Duration::hours(1)))
            .await
            .unwrap();
        let expired = repo
            .create(&session_for(user.id, Duration::hours(-1)))
            .await
            .unwrap();
        let revoked = repo
            .create(&session_for(user.id, Duration::hours(1)))
            .await
            .unwrap();
        assert!(repo.revoke(revoked.id).await.unwrap());

        assert_eq!(repo.delete_stale(Utc::now()).await.unwrap(), 2);
        assert!(repo.find_by_id(live.id).await.unwrap().is_some());
        assert!(repo.find_by_id(expired.id).await.unwrap().is_none());
        assert!(repo.find_by_id(revoked.id).await.unwrap().is_none());

        assert_eq!(repo.delete_stale(Utc::now()).await.unwrap(), 0);
    }
}
