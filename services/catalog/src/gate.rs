//! Access-control gate
//!
//! Decides whether the current principal may proceed with a request. Role
//! membership is read from the store on every call; decisions are never
//! cached between requests.

use common::error::DatabaseResult;
use std::collections::BTreeSet;
use tracing::debug;
use uuid::Uuid;

use crate::models::role::ADMIN_ROLE;
use crate::repositories::RoleRepository;

/// Signed-in user attached to a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub session_id: Uuid,
}

/// The actor making a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Principal {
    #[default]
    Anonymous,
    User(AuthUser),
}

impl Principal {
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            Principal::User(user) => Some(user),
            Principal::Anonymous => None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Principal::Anonymous)
    }
}

/// What a route demands of the principal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// Any signed-in user
    Authenticated,
    /// Membership in at least one of the named roles
    AnyRole(BTreeSet<String>),
}

impl Requirement {
    pub fn any_role<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Requirement::AnyRole(names.into_iter().map(Into::into).collect())
    }

    pub fn admin() -> Self {
        Self::any_role([ADMIN_ROLE])
    }
}

/// Outcome of an access check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

/// Allow iff the principal holds at least one of the required roles
pub fn decide(held: &BTreeSet<String>, required: &BTreeSet<String>) -> Decision {
    if held.intersection(required).next().is_some() {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

/// Access-control gate backed by the role store
#[derive(Clone)]
pub struct AccessGate {
    roles: RoleRepository,
}

impl AccessGate {
    pub fn new(roles: RoleRepository) -> Self {
        Self { roles }
    }

    /// Check `principal` against `requirement`
    pub async fn authorize(
        &self,
        principal: &Principal,
        requirement: &Requirement,
    ) -> DatabaseResult<Decision> {
        let Some(user) = principal.user() else {
            return Ok(Decision::Deny);
        };

        let decision = match requirement {
            Requirement::Authenticated => Decision::Allow,
            Requirement::AnyRole(required) => {
                let held = self.roles.role_names_for_user(user.id).await?;
                decide(&held, required)
            }
        };

        debug!(
            "Access check for {} against {:?}: {:?}",
            user.email, requirement, decision
        );
        Ok(decision)
    }
}
