//! Sign-in session management
//!
//! A session is a row in the `sessions` table plus an HS256 token that
//! names it. The token carries only the user and session ids; everything
//! else, roles included, is looked up again on every request.

use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::gate::{AuthUser, Principal};
use crate::models::{NewSession, User};
use crate::repositories::{SessionRepository, UserRepository};

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "session";

/// Session token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: i64,
    /// Session ID
    pub sid: Uuid,
    /// Issued at time
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
}

/// Issues, resolves and revokes sign-in sessions
#[derive(Clone)]
pub struct SessionManager {
    sessions: SessionRepository,
    users: UserRepository,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(
        sessions: SessionRepository,
        users: UserRepository,
        secret: &str,
        ttl_seconds: i64,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        Self {
            sessions,
            users,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::seconds(ttl_seconds),
        }
    }

    /// Open a session for `user` and return its signed token
    pub async fn issue(&self, user: &User) -> Result<String> {
        info!("Creating session for user: {}", user.email);

        let now = Utc::now();
        let purged = self.sessions.delete_stale(now).await?;
        if purged > 0 {
            debug!("Purged {} stale sessions", purged);
        }

        let session = self
            .sessions
            .create(&NewSession {
                id: Uuid::new_v4(),
                user_id: user.id,
                issued_at: now,
                expires_at: now + self.ttl,
            })
            .await?;

        let claims = Claims {
            sub: user.id,
            sid: session.id,
            iat: session.issued_at.timestamp(),
            exp: session.expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to sign session token: {}", e))
    }

    /// Resolve a token to the principal it names.
    ///
    /// Anything short of a live session for an active user resolves to
    /// [`Principal::Anonymous`].
    pub async fn resolve(&self, token: &str) -> Principal {
        match self.authenticate(token).await {
            Ok(Some(user)) => Principal::User(user),
            Ok(None) => Principal::Anonymous,
            Err(e) => {
                warn!("Failed to resolve session: {}", e);
                Principal::Anonymous
            }
        }
    }

    async fn authenticate(&self, token: &str) -> Result<Option<AuthUser>> {
        let claims = match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => data.claims,
            Err(e) => {
                debug!("Rejected session token: {}", e);
                return Ok(None);
            }
        };

        let Some(session) = self.sessions.find_by_id(claims.sid).await? else {
            return Ok(None);
        };
        if session.user_id != claims.sub || !session.is_live(Utc::now()) {
            return Ok(None);
        }

        let Some(user) = self.users.find_by_id(claims.sub).await? else {
            return Ok(None);
        };
        if !user.is_active {
            return Ok(None);
        }

        Ok(Some(AuthUser {
            id: user.id,
            email: user.email,
            session_id: session.id,
        }))
    }

    /// End a session
    pub async fn revoke(&self, session_id: Uuid) -> Result<()> {
        info!("Revoking session: {}", session_id);
        self.sessions.revoke(session_id).await?;
        Ok(())
    }
}
