use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request};
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;
use uuid::Uuid;

use crate::shared::error::ApiError;
use crate::shared::state::AppState;

use super::jwt::extract_bearer_token;
use super::types::{AuthenticatedUser, Role};

/// Validates the bearer token and stores the caller in request extensions
/// for downstream handlers and role checks.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("missing authorization header".to_string()))?;

    let token = extract_bearer_token(header_value)
        .ok_or_else(|| ApiError::Unauthorized("malformed authorization header".to_string()))?;

    let claims = state
        .jwt
        .validate_access_token(token)
        .map_err(|_| ApiError::Unauthorized("invalid or expired token".to_string()))?;

    let user_id = claims
        .user_id()
        .map_err(|_| ApiError::Unauthorized("invalid token subject".to_string()))?;

    let user = AuthenticatedUser {
        id: user_id,
        email: claims.email,
        role: claims.role,
        provider_user_id: claims.provider_user_id,
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub async fn require_manager_middleware(
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let user = current_user(&request)?;
    if !user.is_at_least(Role::Manager) {
        return Err(ApiError::Forbidden("manager role required".to_string()));
    }
    Ok(next.run(request).await)
}

pub async fn require_admin_middleware(
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let user = current_user(&request)?;
    if !user.is_admin() {
        return Err(ApiError::Forbidden("admin role required".to_string()));
    }
    Ok(next.run(request).await)
}

/// Lets a user through for their own record; everyone else needs admin.
pub async fn owner_or_admin_middleware(
    Path(user_id): Path<Uuid>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let user = current_user(&request)?;
    if user.id != user_id && !user.is_admin() {
        return Err(ApiError::Forbidden(
            "you may only modify your own profile".to_string(),
        ));
    }
    Ok(next.run(request).await)
}

fn current_user(request: &Request<Body>) -> Result<AuthenticatedUser, ApiError> {
    request
        .extensions()
        .get::<AuthenticatedUser>()
        .cloned()
        .ok_or_else(|| ApiError::Unauthorized("authentication required".to_string()))
}
