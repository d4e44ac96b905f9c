use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Bool, Nullable, Text, Timestamptz, Uuid as DieselUuid};
use log::{error, info};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::types::{AuthenticatedUser, Role};
use crate::rooms_api::RoomService;
use crate::shared::error::ApiError;
use crate::shared::utils::{normalize_pagination, page_offset, DbPool};
use crate::users_api::types::User;
use crate::users_api::UserService;

use super::types::{
    guard_transition, CreateMeetingRequest, Meeting, MeetingFilter, MeetingStatus,
    UpdateMeetingRequest,
};

#[derive(QueryableByName)]
struct MeetingRow {
    #[diesel(sql_type = DieselUuid)]
    id: Uuid,
    #[diesel(sql_type = Text)]
    title: String,
    #[diesel(sql_type = Text)]
    description: String,
    #[diesel(sql_type = Timestamptz)]
    start_time: DateTime<Utc>,
    #[diesel(sql_type = Timestamptz)]
    end_time: DateTime<Utc>,
    #[diesel(sql_type = Text)]
    status: String,
    #[diesel(sql_type = Bool)]
    is_recurring: bool,
    #[diesel(sql_type = Text)]
    recurrence_pattern: String,
    #[diesel(sql_type = DieselUuid)]
    organizer_id: Uuid,
    #[diesel(sql_type = DieselUuid)]
    room_id: Uuid,
    #[diesel(sql_type = Timestamptz)]
    created_at: DateTime<Utc>,
    #[diesel(sql_type = Timestamptz)]
    updated_at: DateTime<Utc>,
}

#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

#[derive(QueryableByName)]
struct RoomLockRow {
    #[diesel(sql_type = DieselUuid)]
    #[allow(dead_code)]
    id: Uuid,
    #[diesel(sql_type = Bool)]
    is_active: bool,
}

#[derive(QueryableByName)]
struct UserStateRow {
    #[diesel(sql_type = DieselUuid)]
    #[allow(dead_code)]
    id: Uuid,
    #[diesel(sql_type = Bool)]
    is_active: bool,
}

#[derive(QueryableByName)]
struct AttendeeIdRow {
    #[diesel(sql_type = DieselUuid)]
    user_id: Uuid,
}

#[derive(QueryableByName)]
struct AttendeeRow {
    #[diesel(sql_type = DieselUuid)]
    id: Uuid,
    #[diesel(sql_type = Text)]
    provider_user_id: String,
    #[diesel(sql_type = Text)]
    email: String,
    #[diesel(sql_type = Text)]
    first_name: String,
    #[diesel(sql_type = Text)]
    last_name: String,
    #[diesel(sql_type = Text)]
    display_name: String,
    #[diesel(sql_type = Nullable<Text>)]
    profile_picture: Option<String>,
    #[diesel(sql_type = Text)]
    role: String,
    #[diesel(sql_type = Bool)]
    is_active: bool,
    #[diesel(sql_type = Nullable<Timestamptz>)]
    last_login_at: Option<DateTime<Utc>>,
    #[diesel(sql_type = Timestamptz)]
    created_at: DateTime<Utc>,
    #[diesel(sql_type = Timestamptz)]
    updated_at: DateTime<Utc>,
}

const MEETING_COLUMNS: &str = "id, title, description, start_time, end_time, status, \
     is_recurring, recurrence_pattern, organizer_id, room_id, created_at, updated_at";

const MEETING_FILTER_WHERE: &str = "($1::uuid IS NULL OR organizer_id = $1) \
     AND ($2::uuid IS NULL OR room_id = $2) \
     AND ($3::text IS NULL OR status = $3) \
     AND ($4::timestamptz IS NULL OR start_time >= $4) \
     AND ($5::timestamptz IS NULL OR end_time <= $5) \
     AND ($6::uuid IS NULL OR organizer_id = $6 \
          OR id IN (SELECT meeting_id FROM meeting_attendees WHERE user_id = $6))";

pub struct MeetingService {
    pool: Arc<DbPool>,
    users: UserService,
    rooms: RoomService,
}

impl MeetingService {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self {
            users: UserService::new(pool.clone()),
            rooms: RoomService::new(pool.clone()),
            pool,
        }
    }

    /// Books a meeting. The room row is locked for the duration of the
    /// transaction so two overlapping bookings for the same room cannot both
    /// pass the availability check.
    pub async fn create_meeting(
        &self,
        organizer_id: Uuid,
        request: CreateMeetingRequest,
    ) -> Result<Meeting, ApiError> {
        validate_title(&request.title)?;
        validate_interval(request.start_time, request.end_time)?;
        validate_not_past(request.start_time)?;

        let id = Uuid::new_v4();
        {
            let mut conn = self.pool.get()?;
            conn.transaction::<_, ApiError, _>(|conn| {
                let room = lock_room(conn, request.room_id)?
                    .ok_or_else(|| ApiError::NotFound("room not found".to_string()))?;
                if !room.is_active {
                    return Err(ApiError::Validation("room is not active".to_string()));
                }

                let conflicts = conflicting_meetings_count(
                    conn,
                    request.room_id,
                    request.start_time,
                    request.end_time,
                    None,
                )?;
                if conflicts > 0 {
                    return Err(ApiError::SchedulingConflict(
                        "room is not available for the selected time".to_string(),
                    ));
                }

                let organizer = user_state(conn, organizer_id)?
                    .ok_or_else(|| ApiError::NotFound("organizer not found".to_string()))?;
                if !organizer.is_active {
                    return Err(ApiError::Validation("organizer is not active".to_string()));
                }

                diesel::sql_query(
                    r#"
                    INSERT INTO meetings (
                        id, title, description, start_time, end_time, status,
                        is_recurring, recurrence_pattern, organizer_id, room_id,
                        created_at, updated_at
                    ) VALUES ($1, $2, $3, $4, $5, 'scheduled', $6, $7, $8, $9, NOW(), NOW())
                    "#,
                )
                .bind::<DieselUuid, _>(id)
                .bind::<Text, _>(request.title.trim())
                .bind::<Text, _>(request.description.as_deref().unwrap_or(""))
                .bind::<Timestamptz, _>(request.start_time)
                .bind::<Timestamptz, _>(request.end_time)
                .bind::<Bool, _>(request.is_recurring)
                .bind::<Text, _>(request.recurrence_pattern.as_deref().unwrap_or(""))
                .bind::<DieselUuid, _>(organizer_id)
                .bind::<DieselUuid, _>(request.room_id)
                .execute(conn)?;

                // Bad attendee ids are skipped, never fatal.
                let mut seen = HashSet::new();
                for attendee_id in &request.attendee_ids {
                    if *attendee_id == organizer_id || !seen.insert(*attendee_id) {
                        continue;
                    }
                    match user_state(conn, *attendee_id)? {
                        Some(user) if user.is_active => {
                            insert_attendee(conn, id, *attendee_id)?;
                        }
                        _ => continue,
                    }
                }

                Ok(())
            })?;
        }

        info!("Created meeting {} in room {}", id, request.room_id);
        self.get_meeting(id).await
    }

    pub async fn get_meeting(&self, meeting_id: Uuid) -> Result<Meeting, ApiError> {
        let row = {
            let mut conn = self.pool.get()?;
            fetch_meeting_row(&mut conn, meeting_id)?
        };
        self.materialize(row).await
    }

    pub async fn get_meetings(
        &self,
        filter: MeetingFilter,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<(Vec<Meeting>, i64), ApiError> {
        let (page, limit) = normalize_pagination(page, limit);
        let status = filter.status.map(|s| s.to_string());

        let (rows, total) = {
            let mut conn = self.pool.get()?;

            let count_sql =
                format!("SELECT COUNT(*) AS count FROM meetings WHERE {MEETING_FILTER_WHERE}");
            let total: Vec<CountRow> = diesel::sql_query(count_sql)
                .bind::<Nullable<DieselUuid>, _>(filter.organizer_id)
                .bind::<Nullable<DieselUuid>, _>(filter.room_id)
                .bind::<Nullable<Text>, _>(status.as_deref())
                .bind::<Nullable<Timestamptz>, _>(filter.start_date)
                .bind::<Nullable<Timestamptz>, _>(filter.end_date)
                .bind::<Nullable<DieselUuid>, _>(filter.user_id)
                .load(&mut conn)?;
            let total = total.first().map(|r| r.count).unwrap_or(0);

            let page_sql = format!(
                "SELECT {MEETING_COLUMNS} FROM meetings WHERE {MEETING_FILTER_WHERE} \
                 ORDER BY start_time DESC LIMIT $7 OFFSET $8"
            );
            let rows: Vec<MeetingRow> = diesel::sql_query(page_sql)
                .bind::<Nullable<DieselUuid>, _>(filter.organizer_id)
                .bind::<Nullable<DieselUuid>, _>(filter.room_id)
                .bind::<Nullable<Text>, _>(status.as_deref())
                .bind::<Nullable<Timestamptz>, _>(filter.start_date)
                .bind::<Nullable<Timestamptz>, _>(filter.end_date)
                .bind::<Nullable<DieselUuid>, _>(filter.user_id)
                .bind::<BigInt, _>(limit)
                .bind::<BigInt, _>(page_offset(page, limit))
                .load(&mut conn)?;

            (rows, total)
        };

        let mut meetings = Vec::with_capacity(rows.len());
        for row in rows {
            meetings.push(self.materialize(row).await?);
        }
        Ok((meetings, total))
    }

    /// Scheduled meetings starting after now, soonest first. The limit is
    /// clamped to 50.
    pub async fn get_upcoming_meetings(
        &self,
        user_id: Option<Uuid>,
        limit: Option<i64>,
    ) -> Result<Vec<Meeting>, ApiError> {
        let limit = limit.filter(|l| *l > 0).unwrap_or(10).min(50);

        let rows: Vec<MeetingRow> = {
            let mut conn = self.pool.get()?;
            diesel::sql_query(format!(
                "SELECT {MEETING_COLUMNS} FROM meetings \
                 WHERE start_time > NOW() AND status = 'scheduled' \
                   AND ($1::uuid IS NULL OR organizer_id = $1 \
                        OR id IN (SELECT meeting_id FROM meeting_attendees WHERE user_id = $1)) \
                 ORDER BY start_time ASC LIMIT $2"
            ))
            .bind::<Nullable<DieselUuid>, _>(user_id)
            .bind::<BigInt, _>(limit)
            .load(&mut conn)?
        };

        let mut meetings = Vec::with_capacity(rows.len());
        for row in rows {
            meetings.push(self.materialize(row).await?);
        }
        Ok(meetings)
    }

    pub async fn get_meetings_by_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        user_id: Option<Uuid>,
    ) -> Result<Vec<Meeting>, ApiError> {
        if end < start {
            return Err(ApiError::Validation(
                "end date must be after start date".to_string(),
            ));
        }

        let rows: Vec<MeetingRow> = {
            let mut conn = self.pool.get()?;
            diesel::sql_query(format!(
                "SELECT {MEETING_COLUMNS} FROM meetings \
                 WHERE start_time >= $1 AND end_time <= $2 \
                   AND ($3::uuid IS NULL OR organizer_id = $3 \
                        OR id IN (SELECT meeting_id FROM meeting_attendees WHERE user_id = $3)) \
                 ORDER BY start_time ASC"
            ))
            .bind::<Timestamptz, _>(start)
            .bind::<Timestamptz, _>(end)
            .bind::<Nullable<DieselUuid>, _>(user_id)
            .load(&mut conn)?
        };

        let mut meetings = Vec::with_capacity(rows.len());
        for row in rows {
            meetings.push(self.materialize(row).await?);
        }
        Ok(meetings)
    }

    pub async fn update_meeting(
        &self,
        meeting_id: Uuid,
        caller: &AuthenticatedUser,
        request: UpdateMeetingRequest,
    ) -> Result<Meeting, ApiError> {
        if let Some(title) = &request.title {
            validate_title(title)?;
        }

        {
            let mut conn = self.pool.get()?;
            let current = fetch_meeting_row(&mut conn, meeting_id)?;

            if !caller.owns_or_is_at_least(current.organizer_id, Role::Manager) {
                return Err(ApiError::Forbidden(
                    "only the organizer or a manager can update a meeting".to_string(),
                ));
            }
            if parse_status(&current.status).is_terminal() {
                return Err(ApiError::InvalidState(
                    "cannot update a completed or cancelled meeting".to_string(),
                ));
            }
            let organizer_id = current.organizer_id;

            conn.transaction::<_, ApiError, _>(|conn| {
                // Re-read inside the transaction so the availability check and
                // the write see one snapshot.
                let row = fetch_meeting_row(conn, meeting_id)?;

                let start = request.start_time.unwrap_or(row.start_time);
                let end = request.end_time.unwrap_or(row.end_time);
                let room_id = request.room_id.unwrap_or(row.room_id);

                if let Some(new_start) = request.start_time {
                    validate_not_past(new_start)?;
                }
                if request.start_time.is_some() || request.end_time.is_some() {
                    validate_interval(start, end)?;
                }

                // A room move without a time change still needs the overlap
                // re-check, otherwise the moved meeting could land on top of
                // an existing booking.
                let placement_changed = request.start_time.is_some()
                    || request.end_time.is_some()
                    || request.room_id.is_some();
                if placement_changed {
                    let room = lock_room(conn, room_id)?
                        .ok_or_else(|| ApiError::NotFound("room not found".to_string()))?;
                    if request.room_id.is_some() && !room.is_active {
                        return Err(ApiError::Validation("room is not active".to_string()));
                    }
                    let conflicts =
                        conflicting_meetings_count(conn, room_id, start, end, Some(meeting_id))?;
                    if conflicts > 0 {
                        return Err(ApiError::SchedulingConflict(
                            "room is not available for the selected time".to_string(),
                        ));
                    }
                }

                let title = request
                    .title
                    .as_deref()
                    .map(|t| t.trim().to_string())
                    .unwrap_or(row.title);
                let description = request.description.clone().unwrap_or(row.description);
                let status = request
                    .status
                    .map(|s| s.to_string())
                    .unwrap_or(row.status);
                let is_recurring = request.is_recurring.unwrap_or(row.is_recurring);
                let recurrence_pattern = request
                    .recurrence_pattern
                    .clone()
                    .unwrap_or(row.recurrence_pattern);

                diesel::sql_query(
                    r#"
                    UPDATE meetings
                    SET title = $1, description = $2, start_time = $3, end_time = $4,
                        room_id = $5, status = $6, is_recurring = $7,
                        recurrence_pattern = $8, updated_at = NOW()
                    WHERE id = $9
                    "#,
                )
                .bind::<Text, _>(&title)
                .bind::<Text, _>(&description)
                .bind::<Timestamptz, _>(start)
                .bind::<Timestamptz, _>(end)
                .bind::<DieselUuid, _>(room_id)
                .bind::<Text, _>(&status)
                .bind::<Bool, _>(is_recurring)
                .bind::<Text, _>(&recurrence_pattern)
                .bind::<DieselUuid, _>(meeting_id)
                .execute(conn)?;

                Ok(())
            })?;

            if let Some(requested) = &request.attendee_ids {
                reconcile_attendees(&mut conn, meeting_id, organizer_id, requested)?;
            }
        }

        info!("Updated meeting {}", meeting_id);
        self.get_meeting(meeting_id).await
    }

    /// Soft delete: the row survives with status cancelled.
    pub async fn delete_meeting(
        &self,
        meeting_id: Uuid,
        caller: &AuthenticatedUser,
    ) -> Result<(), ApiError> {
        let mut conn = self.pool.get()?;
        let row = fetch_meeting_row(&mut conn, meeting_id)?;

        if !caller.owns_or_is_at_least(row.organizer_id, Role::Manager) {
            return Err(ApiError::Forbidden(
                "only the organizer or a manager can delete a meeting".to_string(),
            ));
        }

        match parse_status(&row.status) {
            MeetingStatus::Completed => {
                return Err(ApiError::InvalidState(
                    "cannot delete a completed meeting".to_string(),
                ))
            }
            MeetingStatus::Cancelled => {
                return Err(ApiError::AlreadyInState(
                    "meeting is already cancelled".to_string(),
                ))
            }
            _ => {}
        }

        set_status(&mut conn, meeting_id, MeetingStatus::Cancelled)?;
        info!("Cancelled meeting {} via delete", meeting_id);
        Ok(())
    }

    pub async fn start_meeting(&self, meeting_id: Uuid) -> Result<Meeting, ApiError> {
        self.transition(meeting_id, MeetingStatus::InProgress).await
    }

    pub async fn complete_meeting(&self, meeting_id: Uuid) -> Result<Meeting, ApiError> {
        self.transition(meeting_id, MeetingStatus::Completed).await
    }

    pub async fn cancel_meeting(&self, meeting_id: Uuid) -> Result<Meeting, ApiError> {
        self.transition(meeting_id, MeetingStatus::Cancelled).await
    }

    pub async fn add_attendee(&self, meeting_id: Uuid, user_id: Uuid) -> Result<(), ApiError> {
        let mut conn = self.pool.get()?;
        let row = fetch_meeting_row(&mut conn, meeting_id)?;
        if parse_status(&row.status).is_terminal() {
            return Err(ApiError::InvalidState(
                "cannot modify attendees of a completed or cancelled meeting".to_string(),
            ));
        }

        // The organizer is implicitly part of the meeting.
        if row.organizer_id == user_id {
            return Ok(());
        }

        let user = user_state(&mut conn, user_id)?
            .ok_or_else(|| ApiError::NotFound("user not found".to_string()))?;
        if !user.is_active {
            return Err(ApiError::Validation("user is not active".to_string()));
        }

        insert_attendee(&mut conn, meeting_id, user_id)?;
        info!("Added attendee {} to meeting {}", user_id, meeting_id);
        Ok(())
    }

    pub async fn remove_attendee(&self, meeting_id: Uuid, user_id: Uuid) -> Result<(), ApiError> {
        let mut conn = self.pool.get()?;
        let row = fetch_meeting_row(&mut conn, meeting_id)?;
        if parse_status(&row.status).is_terminal() {
            return Err(ApiError::InvalidState(
                "cannot modify attendees of a completed or cancelled meeting".to_string(),
            ));
        }

        remove_attendee_row(&mut conn, meeting_id, user_id)?;
        Ok(())
    }

    pub async fn get_meeting_attendees(&self, meeting_id: Uuid) -> Result<Vec<User>, ApiError> {
        let mut conn = self.pool.get()?;
        let _ = fetch_meeting_row(&mut conn, meeting_id)?;
        load_attendees(&mut conn, meeting_id)
    }

    async fn transition(
        &self,
        meeting_id: Uuid,
        next: MeetingStatus,
    ) -> Result<Meeting, ApiError> {
        {
            let mut conn = self.pool.get()?;
            let row = fetch_meeting_row(&mut conn, meeting_id)?;
            guard_transition(parse_status(&row.status), next)?;
            set_status(&mut conn, meeting_id, next)?;
        }
        info!("Meeting {} moved to {}", meeting_id, next);
        self.get_meeting(meeting_id).await
    }

    async fn materialize(&self, row: MeetingRow) -> Result<Meeting, ApiError> {
        let organizer = self.users.get_user(row.organizer_id).await?;
        let room = self.rooms.get_room(row.room_id).await?;
        let attendees = {
            let mut conn = self.pool.get()?;
            load_attendees(&mut conn, row.id)?
        };

        Ok(Meeting {
            id: row.id,
            title: row.title,
            description: row.description,
            start_time: row.start_time,
            end_time: row.end_time,
            status: parse_status(&row.status),
            is_recurring: row.is_recurring,
            recurrence_pattern: row.recurrence_pattern,
            organizer_id: row.organizer_id,
            room_id: row.room_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            organizer,
            room,
            attendees,
        })
    }
}

/// Symmetric difference between the current attendee set and the requested
/// one. The organizer and duplicate ids are dropped from the request before
/// diffing.
pub(crate) fn plan_attendee_changes(
    current: &[Uuid],
    requested: &[Uuid],
    organizer_id: Uuid,
) -> (Vec<Uuid>, Vec<Uuid>) {
    let mut seen = HashSet::new();
    let wanted: Vec<Uuid> = requested
        .iter()
        .copied()
        .filter(|id| *id != organizer_id && seen.insert(*id))
        .collect();

    let wanted_set: HashSet<Uuid> = wanted.iter().copied().collect();
    let current_set: HashSet<Uuid> = current.iter().copied().collect();

    let to_add = wanted
        .iter()
        .copied()
        .filter(|id| !current_set.contains(id))
        .collect();
    let to_remove = current
        .iter()
        .copied()
        .filter(|id| !wanted_set.contains(id))
        .collect();
    (to_add, to_remove)
}

fn reconcile_attendees(
    conn: &mut PgConnection,
    meeting_id: Uuid,
    organizer_id: Uuid,
    requested: &[Uuid],
) -> Result<(), ApiError> {
    let current = attendee_ids(conn, meeting_id)?;
    let (to_add, to_remove) = plan_attendee_changes(&current, requested, organizer_id);

    for user_id in to_remove {
        remove_attendee_row(conn, meeting_id, user_id)?;
    }
    for user_id in to_add {
        match user_state(conn, user_id)? {
            Some(user) if user.is_active => insert_attendee(conn, meeting_id, user_id)?,
            _ => continue,
        }
    }
    Ok(())
}

fn fetch_meeting_row(conn: &mut PgConnection, meeting_id: Uuid) -> Result<MeetingRow, ApiError> {
    let rows: Vec<MeetingRow> =
        diesel::sql_query(format!("SELECT {MEETING_COLUMNS} FROM meetings WHERE id = $1"))
            .bind::<DieselUuid, _>(meeting_id)
            .load(conn)?;
    rows.into_iter()
        .next()
        .ok_or_else(|| ApiError::NotFound("meeting not found".to_string()))
}

fn lock_room(conn: &mut PgConnection, room_id: Uuid) -> Result<Option<RoomLockRow>, ApiError> {
    let rows: Vec<RoomLockRow> =
        diesel::sql_query("SELECT id, is_active FROM rooms WHERE id = $1 FOR UPDATE")
            .bind::<DieselUuid, _>(room_id)
            .load(conn)?;
    Ok(rows.into_iter().next())
}

fn conflicting_meetings_count(
    conn: &mut PgConnection,
    room_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude_meeting: Option<Uuid>,
) -> Result<i64, ApiError> {
    let rows: Vec<CountRow> = diesel::sql_query(
        "SELECT COUNT(*) AS count FROM meetings \
         WHERE room_id = $1 AND start_time < $3 AND end_time > $2 \
           AND status IN ('scheduled', 'in_progress') \
           AND ($4::uuid IS NULL OR id != $4)",
    )
    .bind::<DieselUuid, _>(room_id)
    .bind::<Timestamptz, _>(start)
    .bind::<Timestamptz, _>(end)
    .bind::<Nullable<DieselUuid>, _>(exclude_meeting)
    .load(conn)?;
    Ok(rows.first().map(|r| r.count).unwrap_or(0))
}

fn user_state(conn: &mut PgConnection, user_id: Uuid) -> Result<Option<UserStateRow>, ApiError> {
    let rows: Vec<UserStateRow> =
        diesel::sql_query("SELECT id, is_active FROM users WHERE id = $1")
            .bind::<DieselUuid, _>(user_id)
            .load(conn)?;
    Ok(rows.into_iter().next())
}

fn attendee_ids(conn: &mut PgConnection, meeting_id: Uuid) -> Result<Vec<Uuid>, ApiError> {
    let rows: Vec<AttendeeIdRow> =
        diesel::sql_query("SELECT user_id FROM meeting_attendees WHERE meeting_id = $1")
            .bind::<DieselUuid, _>(meeting_id)
            .load(conn)?;
    Ok(rows.into_iter().map(|r| r.user_id).collect())
}

fn insert_attendee(conn: &mut PgConnection, meeting_id: Uuid, user_id: Uuid) -> Result<(), ApiError> {
    diesel::sql_query(
        "INSERT INTO meeting_attendees (meeting_id, user_id) VALUES ($1, $2) \
         ON CONFLICT DO NOTHING",
    )
    .bind::<DieselUuid, _>(meeting_id)
    .bind::<DieselUuid, _>(user_id)
    .execute(conn)?;
    Ok(())
}

fn remove_attendee_row(
    conn: &mut PgConnection,
    meeting_id: Uuid,
    user_id: Uuid,
) -> Result<(), ApiError> {
    diesel::sql_query("DELETE FROM meeting_attendees WHERE meeting_id = $1 AND user_id = $2")
        .bind::<DieselUuid, _>(meeting_id)
        .bind::<DieselUuid, _>(user_id)
        .execute(conn)?;
    Ok(())
}

fn set_status(
    conn: &mut PgConnection,
    meeting_id: Uuid,
    status: MeetingStatus,
) -> Result<(), ApiError> {
    diesel::sql_query("UPDATE meetings SET status = $1, updated_at = NOW() WHERE id = $2")
        .bind::<Text, _>(status.to_string())
        .bind::<DieselUuid, _>(meeting_id)
        .execute(conn)
        .map_err(|e| {
            error!("Failed to set status of meeting {meeting_id}: {e}");
            ApiError::from(e)
        })?;
    Ok(())
}

fn load_attendees(conn: &mut PgConnection, meeting_id: Uuid) -> Result<Vec<User>, ApiError> {
    let rows: Vec<AttendeeRow> = diesel::sql_query(
        r#"
        SELECT u.id, u.provider_user_id, u.email, u.first_name, u.last_name,
               u.display_name, u.profile_picture, u.role, u.is_active,
               u.last_login_at, u.created_at, u.updated_at
        FROM users u
        JOIN meeting_attendees ma ON ma.user_id = u.id
        WHERE ma.meeting_id = $1
        ORDER BY u.display_name ASC
        "#,
    )
    .bind::<DieselUuid, _>(meeting_id)
    .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|row| User {
            id: row.id,
            provider_user_id: row.provider_user_id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            display_name: row.display_name,
            profile_picture: row.profile_picture,
            role: Role::parse(&row.role),
            is_active: row.is_active,
            last_login_at: row.last_login_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
        .collect())
}

fn parse_status(s: &str) -> MeetingStatus {
    MeetingStatus::parse(s).unwrap_or(MeetingStatus::Scheduled)
}

fn validate_title(title: &str) -> Result<(), ApiError> {
    if title.trim().is_empty() {
        return Err(ApiError::Validation("title is required".to_string()));
    }
    Ok(())
}

fn validate_interval(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), ApiError> {
    if end <= start {
        return Err(ApiError::Validation(
            "end time must be after start time".to_string(),
        ));
    }
    Ok(())
}

fn validate_not_past(start: DateTime<Utc>) -> Result<(), ApiError> {
    if start < Utc::now() {
        return Err(ApiError::Validation(
            "meeting start time cannot be in the past".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_validate_interval_rejects_inverted_and_empty_windows() {
        let start = Utc::now() + Duration::hours(1);
        assert!(validate_interval(start, start + Duration::hours(1)).is_ok());
        assert!(validate_interval(start, start).is_err());
        assert!(validate_interval(start, start - Duration::minutes(30)).is_err());
    }

    #[test]
    fn test_validate_not_past() {
        assert!(validate_not_past(Utc::now() + Duration::minutes(5)).is_ok());
        assert!(matches!(
            validate_not_past(Utc::now() - Duration::minutes(5)),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_plan_attendee_changes_diffs_sets() {
        let organizer = Uuid::new_v4();
        let keep = Uuid::new_v4();
        let gone = Uuid::new_v4();
        let added = Uuid::new_v4();

        let current = vec![keep, gone];
        let requested = vec![keep, added, organizer];

        let (to_add, to_remove) = plan_attendee_changes(&current, &requested, organizer);
        assert_eq!(to_add, vec![added]);
        assert_eq!(to_remove, vec![gone]);
    }

    #[test]
    fn test_plan_attendee_changes_dedupes_and_drops_organizer() {
        let organizer = Uuid::new_v4();
        let attendee = Uuid::new_v4();

        let requested = vec![attendee, attendee, organizer, organizer];
        let (to_add, to_remove) = plan_attendee_changes(&[], &requested, organizer);
        assert_eq!(to_add, vec![attendee]);
        assert!(to_remove.is_empty());
    }

    #[test]
    fn test_plan_attendee_changes_is_idempotent() {
        let organizer = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let requested = vec![a, b];
        let (first_add, first_remove) = plan_attendee_changes(&[], &requested, organizer);
        assert_eq!(first_add.len(), 2);
        assert!(first_remove.is_empty());

        // Applying the same request against the resulting state changes
        // nothing.
        let (second_add, second_remove) = plan_attendee_changes(&first_add, &requested, organizer);
        assert!(second_add.is_empty());
        assert!(second_remove.is_empty());
    }

    #[test]
    fn test_plan_attendee_changes_empty_request_clears() {
        let organizer = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let (to_add, to_remove) = plan_attendee_changes(&[a, b], &[], organizer);
        assert!(to_add.is_empty());
        assert_eq!(to_remove, vec![a, b]);
    }
}
