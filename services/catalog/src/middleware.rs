//! Principal resolution and route guards

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use crate::{
    error::ApiError,
    gate::{Principal, Requirement},
    session::SESSION_COOKIE,
    state::AppState,
};

/// Resolve the session token, if any, and attach the [`Principal`] to the
/// request extensions. Never rejects a request.
pub async fn resolve_principal(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = session_token(&req);
    let principal = match token {
        Some(token) => state.sessions.resolve(&token).await,
        None => Principal::Anonymous,
    };

    req.extensions_mut().insert(principal);
    next.run(req).await
}

/// Reject requests without a signed-in user
pub async fn require_login(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = current_principal(&req);
    let route = format!("{} {}", req.method(), req.uri().path());
    guard(&state, principal, &Requirement::Authenticated, &route).await?;
    Ok(next.run(req).await)
}

/// Reject requests from principals outside the Admin role
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = current_principal(&req);
    let route = format!("{} {}", req.method(), req.uri().path());
    guard(&state, principal, &Requirement::admin(), &route).await?;
    Ok(next.run(req).await)
}

/// The principal attached by [`resolve_principal`]
pub fn current_principal<B>(req: &axum::http::Request<B>) -> Principal {
    req.extensions()
        .get::<Principal>()
        .cloned()
        .unwrap_or_default()
}

async fn guard(
    state: &AppState,
    principal: Principal,
    requirement: &Requirement,
    route: &str,
) -> Result<(), ApiError> {
    let Some(user) = principal.user() else {
        return Err(ApiError::Unauthorized);
    };

    let decision = state.gate.authorize(&principal, requirement).await?;
    if !decision.is_allowed() {
        warn!("Denied {} to {}", route, user.email);
        return Err(ApiError::Forbidden);
    }

    Ok(())
}

/// Bearer token from the Authorization header, else the session cookie
fn session_token(req: &Request) -> Option<String> {
    let bearer = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::to_string);

    bearer.or_else(|| {
        CookieJar::from_headers(req.headers())
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty())
    })
}
