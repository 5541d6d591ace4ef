//! Table definitions and provisioning
//!
//! Tables are created with `CREATE TABLE IF NOT EXISTS` at start-up. The
//! books table can be dropped at runtime and is re-created lazily by the
//! first write that needs it.

use common::error::{DatabaseError, DatabaseResult};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

pub const BOOKS_TABLE: &str = "books";

const CREATE_USERS: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        is_active BOOLEAN NOT NULL DEFAULT 1,
        email TEXT NOT NULL COLLATE NOCASE UNIQUE,
        email_confirmed_at TEXT,
        password TEXT NOT NULL DEFAULT '',
        first_name TEXT NOT NULL COLLATE NOCASE DEFAULT '',
        last_name TEXT NOT NULL COLLATE NOCASE DEFAULT ''
    )
"#;

const CREATE_ROLES: &str = r#"
    CREATE TABLE IF NOT EXISTS roles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    )
"#;

const CREATE_USER_ROLES: &str = r#"
    CREATE TABLE IF NOT EXISTS user_roles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        role_id INTEGER NOT NULL REFERENCES roles (id) ON DELETE CASCADE,
        UNIQUE (user_id, role_id)
    )
"#;

const CREATE_SESSIONS: &str = r#"
    CREATE TABLE IF NOT EXISTS sessions (
        id BLOB PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        issued_at TEXT NOT NULL,
        expires_at TEXT NOT NULL,
        revoked BOOLEAN NOT NULL DEFAULT 0
    )
"#;

// AUTOINCREMENT keeps ids of deleted books from being handed out again.
const CREATE_BOOKS: &str = r#"
    CREATE TABLE IF NOT EXISTS books (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        author TEXT NOT NULL DEFAULT '',
        title TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT ''
    )
"#;

/// Create every table the service uses
pub async fn create_all(pool: &SqlitePool) -> DatabaseResult<()> {
    info!("Provisioning database schema");

    let mut conn = pool.acquire().await.map_err(DatabaseError::Connection)?;
    for statement in [
        CREATE_USERS,
        CREATE_ROLES,
        CREATE_USER_ROLES,
        CREATE_SESSIONS,
        CREATE_BOOKS,
    ] {
        sqlx::query(statement)
            .execute(&mut *conn)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;
    }

    Ok(())
}

/// Create the books table if it has been dropped
pub async fn ensure_books_table(conn: &mut SqliteConnection) -> DatabaseResult<()> {
    sqlx::query(CREATE_BOOKS)
        .execute(&mut *conn)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?;
    Ok(())
}

/// Whether a table is currently provisioned
pub async fn table_exists(conn: &mut SqliteConnection, table: &str) -> DatabaseResult<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(table)
            .fetch_one(&mut *conn)
            .await?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::database::{DatabaseConfig, init_pool};

    #[tokio::test]
    async fn test_create_all_is_repeatable() {
        let pool = init_pool(&DatabaseConfig::in_memory()).await.unwrap();
        create_all(&pool).await.unwrap();
        create_all(&pool).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        for table in ["users", "roles", "user_roles", "sessions", BOOKS_TABLE] {
            assert!(table_exists(&mut conn, table).await.unwrap(), "{table}");
        }
    }

    #[tokio::test]
    async fn test_books_table_reprovisioned_after_drop() {
        let pool = init_pool(&DatabaseConfig::in_memory()).await.unwrap();
        create_all(&pool).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        sqlx::query("DROP TABLE books")
            .execute(&mut *conn)
            .await
            .unwrap();
        assert!(!table_exists(&mut conn, BOOKS_TABLE).await.unwrap());

        ensure_books_table(&mut conn).await.unwrap();
        assert!(table_exists(&mut conn, BOOKS_TABLE).await.unwrap());
    }
}
