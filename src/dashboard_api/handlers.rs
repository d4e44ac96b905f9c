use axum::extract::{Query, State};
use axum::middleware;
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use std::sync::Arc;

use crate::auth::middleware::require_manager_middleware;
use crate::shared::error::ApiError;
use crate::shared::state::AppState;

use super::service::DashboardService;
use super::types::{
    DashboardFilter, DashboardQuery, DashboardStats, MeetingMonthlyCount, RoomUtilization,
};

pub fn dashboard_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stats", get(stats_handler))
        .route("/utilization", get(utilization_handler))
        .route("/meetings-by-month", get(meetings_by_month_handler))
        .route_layer(middleware::from_fn(require_manager_middleware))
}

async fn stats_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardStats>, ApiError> {
    let service = DashboardService::new(Arc::new(state.conn.clone()));
    let stats = service.get_dashboard_stats(to_filter(query)).await?;
    Ok(Json(stats))
}

async fn utilization_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Vec<RoomUtilization>>, ApiError> {
    let service = DashboardService::new(Arc::new(state.conn.clone()));
    let utilization = service.get_room_utilization(to_filter(query)).await?;
    Ok(Json(utilization))
}

async fn meetings_by_month_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Vec<MeetingMonthlyCount>>, ApiError> {
    let service = DashboardService::new(Arc::new(state.conn.clone()));
    let counts = service.get_meetings_by_month(to_filter(query)).await?;
    Ok(Json(counts))
}

fn to_filter(query: DashboardQuery) -> DashboardFilter {
    DashboardFilter {
        start_date: query.start_date.map(day_start),
        end_date: query.end_date.map(day_start),
        room_id: query.room_id,
        user_id: query.user_id,
    }
}

fn day_start(date: NaiveDate) -> chrono::DateTime<chrono::Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}
