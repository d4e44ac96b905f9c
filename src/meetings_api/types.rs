use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rooms_api::types::Room;
use crate::shared::error::ApiError;
use crate::users_api::types::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl MeetingStatus {
    /// Terminal statuses reject further edits and transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MeetingStatus::Completed | MeetingStatus::Cancelled)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(MeetingStatus::Scheduled),
            "in_progress" => Some(MeetingStatus::InProgress),
            "completed" => Some(MeetingStatus::Completed),
            "cancelled" => Some(MeetingStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeetingStatus::Scheduled => write!(f, "scheduled"),
            MeetingStatus::InProgress => write!(f, "in_progress"),
            MeetingStatus::Completed => write!(f, "completed"),
            MeetingStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Status state machine: transitions out of a terminal status are invalid,
/// and a transition to the current status is reported as such rather than
/// silently rewritten.
pub fn guard_transition(current: MeetingStatus, next: MeetingStatus) -> Result<(), ApiError> {
    if current == next {
        return Err(ApiError::AlreadyInState(format!(
            "meeting is already {current}"
        )));
    }
    if current.is_terminal() {
        return Err(ApiError::InvalidState(format!(
            "meeting is {current} and cannot change status"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: MeetingStatus,
    pub is_recurring: bool,
    pub recurrence_pattern: String,
    pub organizer_id: Uuid,
    pub room_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub organizer: User,
    pub room: Room,
    pub attendees: Vec<User>,
}

impl Meeting {
    /// Half-open overlap: bookings that merely touch at a boundary do not
    /// conflict.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_time < end && self.end_time > start
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMeetingRequest {
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub room_id: Uuid,
    #[serde(default)]
    pub attendee_ids: Vec<Uuid>,
    #[serde(default)]
    pub is_recurring: bool,
    pub recurrence_pattern: Option<String>,
}

/// Sparse patch. `attendee_ids` is the one exception: when supplied (even
/// empty) it replaces the attendee set; when absent the set is untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMeetingRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub room_id: Option<Uuid>,
    pub attendee_ids: Option<Vec<Uuid>>,
    pub status: Option<MeetingStatus>,
    pub is_recurring: Option<bool>,
    pub recurrence_pattern: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MeetingFilter {
    pub organizer_id: Option<Uuid>,
    pub room_id: Option<Uuid>,
    pub status: Option<MeetingStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeetingListQuery {
    pub organizer_id: Option<Uuid>,
    pub room_id: Option<Uuid>,
    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub user_id: Option<Uuid>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpcomingQuery {
    pub limit: Option<i64>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RangeQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub user_id: Option<Uuid>,
}
