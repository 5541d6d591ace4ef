//! Application state shared across handlers

use sqlx::SqlitePool;

use crate::{
    config::AppConfig,
    gate::AccessGate,
    repositories::{BookRepository, RoleRepository, SessionRepository, UserRepository},
    session::SessionManager,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: AppConfig,
    pub user_repository: UserRepository,
    pub role_repository: RoleRepository,
    pub book_repository: BookRepository,
    pub sessions: SessionManager,
    pub gate: AccessGate,
}

impl AppState {
    /// Wire every repository to the shared pool
    pub fn new(pool: SqlitePool, config: AppConfig) -> Self {
        let user_repository = UserRepository::new(pool.clone());
        let role_repository = RoleRepository::new(pool.clone());
        let book_repository = BookRepository::new(pool.clone());
        let sessions = SessionManager::new(
            SessionRepository::new(pool.clone()),
            user_repository.clone(),
            &config.secret_key,
            config.session_ttl_seconds,
        );
        let gate = AccessGate::new(role_repository.clone());

        Self {
            db_pool: pool,
            config,
            user_repository,
            role_repository,
            book_repository,
            sessions,
            gate,
        }
    }
}
