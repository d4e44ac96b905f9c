use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::{Extension, Json, Router};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::middleware::{owner_or_admin_middleware, require_admin_middleware};
use crate::auth::types::AuthenticatedUser;
use crate::shared::error::ApiError;
use crate::shared::state::AppState;
use crate::shared::utils::Paginated;

use super::service::UserService;
use super::types::{
    CreateUserRequest, ListQuery, SearchQuery, UpdateUserRequest, UpdateUserRoleRequest, User,
};

pub fn user_routes() -> Router<Arc<AppState>> {
    let admin = Router::new()
        .route("/", post(create_user_handler))
        .route("/:id", delete(delete_user_handler))
        .route("/:id/role", put(update_user_role_handler))
        .route("/:id/activate", post(activate_user_handler))
        .route("/:id/deactivate", post(deactivate_user_handler))
        .route_layer(middleware::from_fn(require_admin_middleware));

    let owner = Router::new()
        .route("/:id", put(update_user_handler))
        .route_layer(middleware::from_fn(owner_or_admin_middleware));

    Router::new()
        .route("/", get(list_users_handler))
        .route("/active", get(list_active_users_handler))
        .route("/search", get(search_users_handler))
        .route("/:id", get(get_user_handler))
        .merge(admin)
        .merge(owner)
}

async fn create_user_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateUserRequest>,
) -> Result<Json<User>, ApiError> {
    let service = UserService::new(Arc::new(state.conn.clone()));
    let user = service.create_user(request).await?;
    Ok(Json(user))
}

async fn list_users_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<User>>, ApiError> {
    let service = UserService::new(Arc::new(state.conn.clone()));
    let (users, total) = service.get_users(query.page, query.limit).await?;
    Ok(Json(Paginated::new(users, query.page, query.limit, total)))
}

async fn list_active_users_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<User>>, ApiError> {
    let service = UserService::new(Arc::new(state.conn.clone()));
    let users = service.get_active_users().await?;
    Ok(Json(users))
}

async fn search_users_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Paginated<User>>, ApiError> {
    let service = UserService::new(Arc::new(state.conn.clone()));
    let (users, total) = service
        .search_users(&query.q, query.page, query.limit)
        .await?;
    Ok(Json(Paginated::new(users, query.page, query.limit, total)))
}

async fn get_user_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    let service = UserService::new(Arc::new(state.conn.clone()));
    let user = service.get_user(user_id).await?;
    Ok(Json(user))
}

async fn update_user_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    // Owners may edit their own profile, but role and reactivation stay
    // admin-only even on self-edits.
    if request.role.is_some() && !caller.is_admin() {
        return Err(ApiError::Forbidden(
            "only admins may change roles".to_string(),
        ));
    }
    if request.is_active == Some(true) && !caller.is_admin() {
        return Err(ApiError::Forbidden(
            "only admins may reactivate accounts".to_string(),
        ));
    }
    let service = UserService::new(Arc::new(state.conn.clone()));
    let user = service.update_user(user_id, request).await?;
    Ok(Json(user))
}

async fn delete_user_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let service = UserService::new(Arc::new(state.conn.clone()));
    service.delete_user(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_user_role_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<UpdateUserRoleRequest>,
) -> Result<Json<User>, ApiError> {
    let service = UserService::new(Arc::new(state.conn.clone()));
    let user = service.update_user_role(user_id, request.role).await?;
    Ok(Json(user))
}

async fn activate_user_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    let service = UserService::new(Arc::new(state.conn.clone()));
    let user = service.activate_user(user_id).await?;
    Ok(Json(user))
}

async fn deactivate_user_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    let service = UserService::new(Arc::new(state.conn.clone()));
    let user = service.deactivate_user(user_id).await?;
    Ok(Json(user))
}
