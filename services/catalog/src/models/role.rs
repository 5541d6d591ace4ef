//! Role model and related functionality

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Name of the role guarding the admin page and maintenance routes
pub const ADMIN_ROLE: &str = "Admin";

/// Name of the secondary role granted to the demo administrator
pub const AGENT_ROLE: &str = "Agent";

/// Role entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: i64,
    pub name: String,
}
