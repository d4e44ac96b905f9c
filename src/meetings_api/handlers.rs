use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Extension, Json, Router};
use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::types::AuthenticatedUser;
use crate::shared::error::ApiError;
use crate::shared::state::AppState;
use crate::shared::utils::Paginated;
use crate::users_api::types::User;

use super::service::MeetingService;
use super::types::{
    CreateMeetingRequest, Meeting, MeetingFilter, MeetingListQuery, MeetingStatus, RangeQuery,
    UpcomingQuery, UpdateMeetingRequest,
};

pub fn meeting_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_meeting_handler))
        .route("/", get(list_meetings_handler))
        .route("/upcoming", get(upcoming_meetings_handler))
        .route("/range", get(meetings_by_range_handler))
        .route("/:id", get(get_meeting_handler))
        .route("/:id", put(update_meeting_handler))
        .route("/:id", delete(delete_meeting_handler))
        .route("/:id/start", post(start_meeting_handler))
        .route("/:id/complete", post(complete_meeting_handler))
        .route("/:id/cancel", post(cancel_meeting_handler))
        .route("/:id/attendees", get(list_attendees_handler))
        .route("/:id/attendees/:user_id", post(add_attendee_handler))
        .route("/:id/attendees/:user_id", delete(remove_attendee_handler))
}

async fn create_meeting_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(request): Json<CreateMeetingRequest>,
) -> Result<Json<Meeting>, ApiError> {
    let service = MeetingService::new(Arc::new(state.conn.clone()));
    let meeting = service.create_meeting(caller.id, request).await?;
    Ok(Json(meeting))
}

async fn list_meetings_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MeetingListQuery>,
) -> Result<Json<Paginated<Meeting>>, ApiError> {
    let filter = MeetingFilter {
        organizer_id: query.organizer_id,
        room_id: query.room_id,
        status: parse_status_filter(query.status.as_deref())?,
        start_date: query.start_date.map(day_start),
        end_date: query.end_date.map(day_start),
        user_id: query.user_id,
    };

    let service = MeetingService::new(Arc::new(state.conn.clone()));
    let (meetings, total) = service.get_meetings(filter, query.page, query.limit).await?;
    Ok(Json(Paginated::new(meetings, query.page, query.limit, total)))
}

async fn upcoming_meetings_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UpcomingQuery>,
) -> Result<Json<Vec<Meeting>>, ApiError> {
    let service = MeetingService::new(Arc::new(state.conn.clone()));
    let meetings = service
        .get_upcoming_meetings(query.user_id, query.limit)
        .await?;
    Ok(Json(meetings))
}

async fn meetings_by_range_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<Meeting>>, ApiError> {
    let service = MeetingService::new(Arc::new(state.conn.clone()));
    let meetings = service
        .get_meetings_by_range(day_start(query.start), day_start(query.end), query.user_id)
        .await?;
    Ok(Json(meetings))
}

async fn get_meeting_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Meeting>, ApiError> {
    let service = MeetingService::new(Arc::new(state.conn.clone()));
    let meeting = service.get_meeting(id).await?;
    Ok(Json(meeting))
}

async fn update_meeting_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateMeetingRequest>,
) -> Result<Json<Meeting>, ApiError> {
    let service = MeetingService::new(Arc::new(state.conn.clone()));
    let meeting = service.update_meeting(id, &caller, request).await?;
    Ok(Json(meeting))
}

async fn delete_meeting_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let service = MeetingService::new(Arc::new(state.conn.clone()));
    service.delete_meeting(id, &caller).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn start_meeting_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Meeting>, ApiError> {
    let service = MeetingService::new(Arc::new(state.conn.clone()));
    let meeting = service.start_meeting(id).await?;
    Ok(Json(meeting))
}

async fn complete_meeting_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Meeting>, ApiError> {
    let service = MeetingService::new(Arc::new(state.conn.clone()));
    let meeting = service.complete_meeting(id).await?;
    Ok(Json(meeting))
}

async fn cancel_meeting_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Meeting>, ApiError> {
    let service = MeetingService::new(Arc::new(state.conn.clone()));
    let meeting = service.cancel_meeting(id).await?;
    Ok(Json(meeting))
}

async fn list_attendees_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<User>>, ApiError> {
    let service = MeetingService::new(Arc::new(state.conn.clone()));
    let attendees = service.get_meeting_attendees(id).await?;
    Ok(Json(attendees))
}

async fn add_attendee_handler(
    State(state): State<Arc<AppState>>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let service = MeetingService::new(Arc::new(state.conn.clone()));
    service.add_attendee(id, user_id).await?;
    Ok(StatusCode::OK)
}

async fn remove_attendee_handler(
    State(state): State<Arc<AppState>>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let service = MeetingService::new(Arc::new(state.conn.clone()));
    service.remove_attendee(id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_status_filter(status: Option<&str>) -> Result<Option<MeetingStatus>, ApiError> {
    match status {
        None => Ok(None),
        Some(s) => MeetingStatus::parse(s)
            .map(Some)
            .ok_or_else(|| ApiError::Validation(format!("unknown status filter: {s}"))),
    }
}

fn day_start(date: NaiveDate) -> chrono::DateTime<chrono::Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}
