pub mod jwt;
pub mod middleware;
mod provider;
mod service;
pub mod types;

pub use jwt::{Claims, JwtManager, TokenPair};
pub use provider::{IdentityProvider, ProviderIdentity};
pub use service::{AuthService, LoginResponse};
pub use types::{AuthenticatedUser, Role};

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::shared::error::ApiError;
use crate::shared::state::AppState;

use middleware::auth_middleware;

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshRequest {
    refresh_token: String,
}

pub fn auth_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let protected = Router::new()
        .route("/me", get(me_handler))
        .route_layer(axum::middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/login", get(login_handler))
        .route("/callback", get(callback_handler))
        .route("/refresh", post(refresh_handler))
        .route("/logout", post(logout_handler))
        .merge(protected)
}

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(
        Arc::new(state.conn.clone()),
        state.config.auth.clone(),
        state.jwt.clone(),
    )
}

async fn login_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let service = auth_service(&state);
    let csrf_state = Uuid::new_v4().to_string();
    let auth_url = service.authorization_url(&csrf_state);
    Ok(Json(serde_json::json!({
        "auth_url": auth_url,
        "state": csrf_state,
    })))
}

async fn callback_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<LoginResponse>, ApiError> {
    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::Validation("authorization code is required".to_string()))?;
    if query.state.as_deref().unwrap_or("").is_empty() {
        return Err(ApiError::Validation(
            "state parameter is required".to_string(),
        ));
    }

    let service = auth_service(&state);
    let response = service.login_with_code(&code).await?;
    Ok(Json(response))
}

async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let service = auth_service(&state);
    let tokens = service.refresh(&request.refresh_token).await?;
    Ok(Json(tokens))
}

// Tokens are stateless; logout exists so clients have a uniform endpoint to
// clear their session against.
async fn logout_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({"message": "logged out"}))
}

async fn me_handler(
    Extension(caller): Extension<AuthenticatedUser>,
) -> Result<Json<AuthenticatedUser>, ApiError> {
    Ok(Json(caller))
}
