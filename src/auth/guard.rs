//! Per-route access policy.
//!
//! Every route is tagged with an [`Access`] value. Non-public routes are wrapped
//! in [`enforce_access`], which verifies the bearer token, checks the policy and
//! hands the verified [`AuthUser`] to the handler through request extensions.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::warn;
use uuid::Uuid;

use super::{claims::Role, jwt::JwtKeys};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    RequiresRole(Role),
}

/// Identity asserted by a verified access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl Access {
    pub fn authorize(&self, user: Option<&AuthUser>) -> AppResult<()> {
        match (self, user) {
            (Access::Public, _) => Ok(()),
            (_, None) => Err(AppError::Unauthorized),
            (Access::Authenticated, Some(_)) => Ok(()),
            (Access::RequiresRole(required), Some(user)) if user.role == *required => Ok(()),
            (Access::RequiresRole(_), Some(_)) => Err(AppError::Forbidden),
        }
    }
}

/// Middleware state: the verification keys plus the policy of the wrapped route.
#[derive(Clone)]
pub struct RouteGuard {
    keys: JwtKeys,
    access: Access,
}

impl RouteGuard {
    pub fn new(state: &AppState, access: Access) -> Self {
        Self {
            keys: JwtKeys::from(&state.config.jwt),
            access,
        }
    }

    fn identify(&self, headers: &HeaderMap) -> AppResult<AuthUser> {
        let token = bearer_token(headers)?;
        let claims = self.keys.verify(token).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            AppError::from(e)
        })?;
        Ok(AuthUser {
            id: claims.sub,
            role: claims.role,
        })
    }
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> AppResult<&str> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthorized)
}

pub async fn enforce_access(
    State(guard): State<RouteGuard>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if guard.access != Access::Public {
        let user = guard.identify(request.headers())?;
        if let Err(e) = guard.access.authorize(Some(&user)) {
            warn!(user_id = %user.id, role = %user.role, access = ?guard.access, "access denied");
            return Err(e);
        }
        request.extensions_mut().insert(user);
    }
    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or(AppError::Unauthorized)
    }
}
