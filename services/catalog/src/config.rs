//! Service configuration
//!
//! Values come from `CATALOG_*` environment variables layered over built-in
//! defaults. Database settings are read separately by
//! [`common::database::DatabaseConfig`].

use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::collections::HashMap;

/// Secret used when `CATALOG_SECRET_KEY` is not set
pub const INSECURE_SECRET_KEY: &str =
    "This is an INSECURE secret!! DO NOT use this in production!!";

/// Catalog service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Application name shown in rendered views
    pub app_name: String,
    /// Address the HTTP listener binds to
    pub bind_address: String,
    /// Secret used to sign session tokens
    pub secret_key: String,
    /// Lifetime of a sign-in session in seconds
    pub session_ttl_seconds: i64,
    /// Create the demo member and admin accounts at start-up
    pub seed_users: bool,
    /// Serve `/seedDB` and `/eraseDB` without an Admin role check
    pub open_maintenance_routes: bool,
}

impl AppConfig {
    /// Load configuration from the process environment
    ///
    /// # Environment Variables
    /// - `CATALOG_APP_NAME` (default: "Book Catalog")
    /// - `CATALOG_BIND_ADDRESS` (default: "0.0.0.0:5000")
    /// - `CATALOG_SECRET_KEY` (default: an insecure development secret)
    /// - `CATALOG_SESSION_TTL_SECONDS` (default: 86400)
    /// - `CATALOG_SEED_USERS` (default: true)
    /// - `CATALOG_OPEN_MAINTENANCE_ROUTES` (default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load configuration from an explicit set of `CATALOG_*` variables
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::load(Some(vars))
    }

    fn load(vars: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        let environment = Environment::with_prefix("CATALOG")
            .try_parsing(true)
            .source(vars);

        Config::builder()
            .set_default("app_name", "Book Catalog")?
            .set_default("bind_address", "0.0.0.0:5000")?
            .set_default("secret_key", INSECURE_SECRET_KEY)?
            .set_default("session_ttl_seconds", 86_400_i64)?
            .set_default("seed_users", true)?
            .set_default("open_maintenance_routes", false)?
            .add_source(environment)
            .build()?
            .try_deserialize()
    }

    /// Whether the development secret is still in use
    pub fn uses_insecure_secret(&self) -> bool {
        self.secret_key == INSECURE_SECRET_KEY
    }
}
