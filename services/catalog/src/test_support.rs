//! Shared fixtures for unit tests

use common::database::{DatabaseConfig, init_pool};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::path::PathBuf;
use uuid::Uuid;

use crate::{
    bootstrap::{self, DEMO_PASSWORD},
    config::AppConfig,
    models::{NewUser, User},
    repositories::UserRepository,
    schema,
    state::AppState,
};

/// Fresh in-memory database with no tables
pub async fn memory_pool() -> SqlitePool {
    init_pool(&DatabaseConfig::in_memory())
        .await
        .expect("in-memory pool")
}

/// Fresh in-memory database with every table created
pub async fn provisioned_pool() -> SqlitePool {
    let pool = memory_pool().await;
    schema::create_all(&pool).await.expect("schema");
    pool
}

/// File-backed database in the temp directory, shared by several pooled
/// connections. The files are removed on drop.
pub struct TempDatabase {
    pub pool: SqlitePool,
    path: PathBuf,
}

impl TempDatabase {
    pub async fn new(max_connections: u32) -> Self {
        let path = std::env::temp_dir().join(format!("catalog-test-{}.sqlite", Uuid::new_v4()));
        let pool = init_pool(&DatabaseConfig {
            database_url: format!("sqlite://{}", path.display()),
            max_connections,
            min_connections: 0,
            connection_timeout: 10,
        })
        .await
        .expect("file pool");

        Self { pool, path }
    }
}

impl Drop for TempDatabase {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm", "-journal"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

/// Insert a user whose password is the demo password
pub async fn create_user(pool: &SqlitePool, email: &str, confirmed: bool) -> User {
    UserRepository::new(pool.clone())
        .create(&NewUser {
            email: email.to_string(),
            password: DEMO_PASSWORD.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            confirmed,
        })
        .await
        .expect("create user")
}

/// Configuration built from explicit `CATALOG_*` overrides only
pub fn test_config(vars: &[(&str, &str)]) -> AppConfig {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    AppConfig::from_vars(vars).expect("test config")
}

/// Application state over a provisioned database holding the demo accounts
pub async fn test_state(vars: &[(&str, &str)]) -> AppState {
    let state = AppState::new(provisioned_pool().await, test_config(vars));
    bootstrap::seed_default_users(&state.user_repository, &state.role_repository)
        .await
        .expect("demo users");
    state
}
