use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod bootstrap;
mod config;
mod credentials;
mod error;
mod gate;
mod middleware;
mod models;
mod repositories;
mod routes;
mod schema;
mod session;
mod state;
mod validation;
mod views;

#[cfg(test)]
mod test_support;

use common::database::{self, DatabaseConfig};
use tokio::net::TcpListener;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting catalog service");

    let config = AppConfig::from_env()?;
    if config.uses_insecure_secret() {
        warn!("CATALOG_SECRET_KEY is not set; using the insecure development secret");
    }
    if config.open_maintenance_routes {
        warn!("/seedDB and /eraseDB are open to anonymous callers");
    }

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    schema::create_all(&pool).await?;

    let app_state = AppState::new(pool, config);

    if app_state.config.seed_users {
        bootstrap::seed_default_users(&app_state.user_repository, &app_state.role_repository)
            .await?;
    }

    let bind_address = app_state.config.bind_address.clone();
    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(&bind_address).await?;
    info!("Catalog service listening on {}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
