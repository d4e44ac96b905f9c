use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Narrowing applied to every meeting-scoped aggregation. Absent fields mean
/// unconstrained.
#[derive(Debug, Clone, Copy, Default)]
pub struct DashboardFilter {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub room_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_users: i64,
    pub active_users: i64,
    pub total_rooms: i64,
    pub active_rooms: i64,
    pub total_meetings: i64,
    pub upcoming_meetings: i64,
    pub completed_meetings: i64,
    pub cancelled_meetings: i64,
    pub room_utilization: Vec<RoomUtilization>,
    pub meetings_by_status: Vec<MeetingStatusCount>,
    pub meetings_by_month: Vec<MeetingMonthlyCount>,
    pub top_active_users: Vec<UserActivity>,
    pub recent_meetings: Vec<MeetingSummary>,
    pub upcoming_meetings_7d: Vec<MeetingSummary>,
}

#[derive(Debug, Serialize)]
pub struct RoomUtilization {
    pub room_id: Uuid,
    pub room_name: String,
    pub total_bookings: i64,
    pub total_hours: f64,
    pub utilization_rate: f64,
}

#[derive(Debug, Serialize)]
pub struct MeetingStatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct MeetingMonthlyCount {
    pub month: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct UserActivity {
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub organized_meetings: i64,
    pub attended_meetings: i64,
    pub total_meetings: i64,
}

/// Flattened meeting row for dashboard listings. The full nested shape lives
/// on the meetings endpoints.
#[derive(Debug, Serialize)]
pub struct MeetingSummary {
    pub id: Uuid,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    pub organizer_name: String,
    pub room_name: String,
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub room_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}
