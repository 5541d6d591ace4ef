//! Start-up seeding of the demo accounts

use anyhow::Result;
use tracing::info;

use crate::{
    models::{
        NewUser,
        role::{ADMIN_ROLE, AGENT_ROLE},
    },
    repositories::{RoleRepository, UserRepository},
};

pub const MEMBER_EMAIL: &str = "member@example.com";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const DEMO_PASSWORD: &str = "Password1";

/// Ensure the demo member (no roles) and admin (Admin and Agent) exist.
///
/// Accounts are looked up by email and only created when missing, so this
/// is safe to run on every start.
pub async fn seed_default_users(users: &UserRepository, roles: &RoleRepository) -> Result<()> {
    ensure_user(users, MEMBER_EMAIL).await?;

    let admin = ensure_user(users, ADMIN_EMAIL).await?;
    roles.assign(admin, ADMIN_ROLE).await?;
    roles.assign(admin, AGENT_ROLE).await?;

    Ok(())
}

async fn ensure_user(users: &UserRepository, email: &str) -> Result<i64> {
    if let Some(user) = users.find_by_email(email).await? {
        return Ok(user.id);
    }

    info!("Creating demo account {}", email);
    let user = users
        .create(&NewUser {
            email: email.to_string(),
            password: DEMO_PASSWORD.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            confirmed: true,
        })
        .await?;

    Ok(user.id)
}
