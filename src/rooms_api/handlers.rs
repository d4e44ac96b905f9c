use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::middleware::require_manager_middleware;
use crate::shared::error::ApiError;
use crate::shared::state::AppState;
use crate::shared::utils::Paginated;

use super::service::RoomService;
use super::types::{
    AvailabilityQuery, CreateFeatureRequest, CreateRoomRequest, ListQuery, Room, RoomFeature,
    SearchQuery, UpdateFeatureRequest, UpdateRoomRequest,
};

pub fn room_routes() -> Router<Arc<AppState>> {
    let manager = Router::new()
        .route("/", post(create_room_handler))
        .route("/:id", put(update_room_handler))
        .route("/:id", delete(delete_room_handler))
        .route("/features", post(create_feature_handler))
        .route("/features/:id", put(update_feature_handler))
        .route("/features/:id", delete(delete_feature_handler))
        .route_layer(middleware::from_fn(require_manager_middleware));

    Router::new()
        .route("/", get(list_rooms_handler))
        .route("/active", get(list_active_rooms_handler))
        .route("/search", get(search_rooms_handler))
        .route("/available", get(available_rooms_handler))
        .route("/features", get(list_features_handler))
        .route("/features/:id", get(get_feature_handler))
        .route("/:id", get(get_room_handler))
        .merge(manager)
}

async fn create_room_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<Json<Room>, ApiError> {
    let service = RoomService::new(Arc::new(state.conn.clone()));
    let room = service.create_room(request).await?;
    Ok(Json(room))
}

async fn list_rooms_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<Room>>, ApiError> {
    let service = RoomService::new(Arc::new(state.conn.clone()));
    let (rooms, total) = service.get_rooms(query.page, query.limit).await?;
    Ok(Json(Paginated::new(rooms, query.page, query.limit, total)))
}

async fn list_active_rooms_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Room>>, ApiError> {
    let service = RoomService::new(Arc::new(state.conn.clone()));
    let rooms = service.get_active_rooms().await?;
    Ok(Json(rooms))
}

async fn search_rooms_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Paginated<Room>>, ApiError> {
    let service = RoomService::new(Arc::new(state.conn.clone()));
    let (rooms, total) = service
        .search_rooms(&query.q, query.page, query.limit)
        .await?;
    Ok(Json(Paginated::new(rooms, query.page, query.limit, total)))
}

async fn available_rooms_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<Room>>, ApiError> {
    let service = RoomService::new(Arc::new(state.conn.clone()));
    let rooms = service
        .get_available_rooms(query.start, query.end, query.capacity)
        .await?;
    Ok(Json(rooms))
}

async fn get_room_handler(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<Uuid>,
) -> Result<Json<Room>, ApiError> {
    let service = RoomService::new(Arc::new(state.conn.clone()));
    let room = service.get_room(room_id).await?;
    Ok(Json(room))
}

async fn update_room_handler(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<Uuid>,
    Json(request): Json<UpdateRoomRequest>,
) -> Result<Json<Room>, ApiError> {
    let service = RoomService::new(Arc::new(state.conn.clone()));
    let room = service.update_room(room_id, request).await?;
    Ok(Json(room))
}

async fn delete_room_handler(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let service = RoomService::new(Arc::new(state.conn.clone()));
    service.delete_room(room_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_feature_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateFeatureRequest>,
) -> Result<Json<RoomFeature>, ApiError> {
    let service = RoomService::new(Arc::new(state.conn.clone()));
    let feature = service.create_feature(request).await?;
    Ok(Json(feature))
}

async fn list_features_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RoomFeature>>, ApiError> {
    let service = RoomService::new(Arc::new(state.conn.clone()));
    let features = service.get_features().await?;
    Ok(Json(features))
}

async fn get_feature_handler(
    State(state): State<Arc<AppState>>,
    Path(feature_id): Path<Uuid>,
) -> Result<Json<RoomFeature>, ApiError> {
    let service = RoomService::new(Arc::new(state.conn.clone()));
    let feature = service.get_feature(feature_id).await?;
    Ok(Json(feature))
}

async fn update_feature_handler(
    State(state): State<Arc<AppState>>,
    Path(feature_id): Path<Uuid>,
    Json(request): Json<UpdateFeatureRequest>,
) -> Result<Json<RoomFeature>, ApiError> {
    let service = RoomService::new(Arc::new(state.conn.clone()));
    let feature = service.update_feature(feature_id, request).await?;
    Ok(Json(feature))
}

async fn delete_feature_handler(
    State(state): State<Arc<AppState>>,
    Path(feature_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let service = RoomService::new(Arc::new(state.conn.clone()));
    service.delete_feature(feature_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
