//! Auth Middleware
//!
//! Bearer authentication and role checks for protected routes.
//! [`require_bearer`] stores the verified [`AccessClaims`] in the request
//! extensions; [`require_role`] and [`CurrentUser`] read them back.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;

use crate::domain::token::AccessClaims;
use crate::domain::value_object::user_role::UserRole;
use crate::error::AuthError;
use crate::presentation::state::{AuthAppState, AuthBackend};

pub const ADMIN_ONLY: &[UserRole] = &[UserRole::Admin];

/// Middleware that requires `Authorization: Bearer <access token>`
pub async fn require_bearer<B: AuthBackend>(
    State(state): State<AuthAppState<B>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(req.headers()).ok_or(AuthError::Unauthorized)?;
    let claims = state.sessions.validate_access(token)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Middleware that admits only the given roles. Must run inside
/// [`require_bearer`].
pub async fn require_role(
    allowed: &'static [UserRole],
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let role = req
        .extensions()
        .get::<AccessClaims>()
        .map(|claims| claims.role)
        .ok_or(AuthError::Unauthorized)?;

    if !allowed.contains(&role) {
        tracing::warn!(%role, "Role not permitted");
        return Err(AuthError::Forbidden);
    }

    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
}

/// Claims of the authenticated caller
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AccessClaims);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AccessClaims>()
            .cloned()
            .map(CurrentUser)
            .ok_or(AuthError::Unauthorized)
    }
}
