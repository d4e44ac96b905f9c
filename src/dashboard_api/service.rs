use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Double, Nullable, Text, Timestamptz, Uuid as DieselUuid};
use std::sync::Arc;
use uuid::Uuid;

use crate::shared::error::ApiError;
use crate::shared::utils::DbPool;

use super::types::{
    DashboardFilter, DashboardStats, MeetingMonthlyCount, MeetingStatusCount, MeetingSummary,
    RoomUtilization, UserActivity,
};

/// Every scheduled or completed booked hour is measured against this fixed
/// window when computing a room's utilization rate.
const UTILIZATION_WINDOW_HOURS: f64 = 30.0 * 24.0;

const MEETING_FILTER: &str = "($1::timestamptz IS NULL OR start_time >= $1) \
     AND ($2::timestamptz IS NULL OR end_time <= $2) \
     AND ($3::uuid IS NULL OR room_id = $3) \
     AND ($4::uuid IS NULL OR organizer_id = $4 \
          OR id IN (SELECT meeting_id FROM meeting_attendees WHERE user_id = $4))";

#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

#[derive(QueryableByName)]
struct StatusCountRow {
    #[diesel(sql_type = Text)]
    status: String,
    #[diesel(sql_type = BigInt)]
    count: i64,
}

#[derive(QueryableByName)]
struct MonthCountRow {
    #[diesel(sql_type = Text)]
    month: String,
    #[diesel(sql_type = BigInt)]
    count: i64,
}

#[derive(QueryableByName)]
struct UtilizationRow {
    #[diesel(sql_type = DieselUuid)]
    room_id: Uuid,
    #[diesel(sql_type = Text)]
    room_name: String,
    #[diesel(sql_type = BigInt)]
    total_bookings: i64,
    #[diesel(sql_type = Double)]
    total_hours: f64,
}

#[derive(QueryableByName)]
struct ActivityRow {
    #[diesel(sql_type = DieselUuid)]
    user_id: Uuid,
    #[diesel(sql_type = Text)]
    user_name: String,
    #[diesel(sql_type = Text)]
    user_email: String,
    #[diesel(sql_type = BigInt)]
    organized_meetings: i64,
    #[diesel(sql_type = BigInt)]
    attended_meetings: i64,
    #[diesel(sql_type = BigInt)]
    total_meetings: i64,
}

#[derive(QueryableByName)]
struct SummaryRow {
    #[diesel(sql_type = DieselUuid)]
    id: Uuid,
    #[diesel(sql_type = Text)]
    title: String,
    #[diesel(sql_type = Timestamptz)]
    start_time: DateTime<Utc>,
    #[diesel(sql_type = Timestamptz)]
    end_time: DateTime<Utc>,
    #[diesel(sql_type = Text)]
    status: String,
    #[diesel(sql_type = Text)]
    organizer_name: String,
    #[diesel(sql_type = Text)]
    room_name: String,
}

pub struct DashboardService {
    pool: Arc<DbPool>,
}

impl DashboardService {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    /// One composite payload for the landing page. Sub-aggregations all apply
    /// the same meeting filter.
    pub async fn get_dashboard_stats(
        &self,
        filter: DashboardFilter,
    ) -> Result<DashboardStats, ApiError> {
        let mut conn = self.pool.get()?;

        let total_users = scalar_count(&mut conn, "SELECT COUNT(*) AS count FROM users")?;
        let active_users = scalar_count(
            &mut conn,
            "SELECT COUNT(*) AS count FROM users WHERE is_active = TRUE",
        )?;
        let total_rooms = scalar_count(&mut conn, "SELECT COUNT(*) AS count FROM rooms")?;
        let active_rooms = scalar_count(
            &mut conn,
            "SELECT COUNT(*) AS count FROM rooms WHERE is_active = TRUE",
        )?;

        let total_meetings = filtered_meeting_count(&mut conn, filter, None)?;
        let upcoming_meetings = filtered_meeting_count(&mut conn, filter, Some("scheduled"))?;
        let completed_meetings = filtered_meeting_count(&mut conn, filter, Some("completed"))?;
        let cancelled_meetings = filtered_meeting_count(&mut conn, filter, Some("cancelled"))?;

        let room_utilization = room_utilization(&mut conn, filter)?;
        let meetings_by_status = meetings_by_status(&mut conn, filter)?;
        let meetings_by_month = meetings_by_month(&mut conn, filter)?;
        let top_active_users = top_active_users(&mut conn, filter, 10)?;
        let recent_meetings = recent_meetings(&mut conn, 10)?;
        let upcoming_meetings_7d = upcoming_meetings_7d(&mut conn)?;

        Ok(DashboardStats {
            total_users,
            active_users,
            total_rooms,
            active_rooms,
            total_meetings,
            upcoming_meetings,
            completed_meetings,
            cancelled_meetings,
            room_utilization,
            meetings_by_status,
            meetings_by_month,
            top_active_users,
            recent_meetings,
            upcoming_meetings_7d,
        })
    }

    pub async fn get_room_utilization(
        &self,
        filter: DashboardFilter,
    ) -> Result<Vec<RoomUtilization>, ApiError> {
        let mut conn = self.pool.get()?;
        room_utilization(&mut conn, filter)
    }

    pub async fn get_meetings_by_month(
        &self,
        filter: DashboardFilter,
    ) -> Result<Vec<MeetingMonthlyCount>, ApiError> {
        let mut conn = self.pool.get()?;
        meetings_by_month(&mut conn, filter)
    }
}

/// Booked hours over a fixed 30 day window, as a percentage.
fn utilization_rate(total_hours: f64) -> f64 {
    total_hours / UTILIZATION_WINDOW_HOURS * 100.0
}

fn scalar_count(conn: &mut PgConnection, sql: &str) -> Result<i64, ApiError> {
    let rows: Vec<CountRow> = diesel::sql_query(sql).load(conn)?;
    Ok(rows.first().map(|r| r.count).unwrap_or(0))
}

fn filtered_meeting_count(
    conn: &mut PgConnection,
    filter: DashboardFilter,
    status: Option<&str>,
) -> Result<i64, ApiError> {
    let rows: Vec<CountRow> = diesel::sql_query(format!(
        "SELECT COUNT(*) AS count FROM meetings \
         WHERE {MEETING_FILTER} AND ($5::text IS NULL OR status = $5)"
    ))
    .bind::<Nullable<Timestamptz>, _>(filter.start_date)
    .bind::<Nullable<Timestamptz>, _>(filter.end_date)
    .bind::<Nullable<DieselUuid>, _>(filter.room_id)
    .bind::<Nullable<DieselUuid>, _>(filter.user_id)
    .bind::<Nullable<Text>, _>(status)
    .load(conn)?;
    Ok(rows.first().map(|r| r.count).unwrap_or(0))
}

/// Rooms with no bookings in the window still appear, with zero hours. Only
/// scheduled and completed meetings occupy a room.
fn room_utilization(
    conn: &mut PgConnection,
    filter: DashboardFilter,
) -> Result<Vec<RoomUtilization>, ApiError> {
    let rows: Vec<UtilizationRow> = diesel::sql_query(
        "SELECT r.id AS room_id, r.name AS room_name, \
                COUNT(m.id) AS total_bookings, \
                CAST(COALESCE(SUM(EXTRACT(EPOCH FROM (m.end_time - m.start_time))) / 3600.0, 0) \
                     AS DOUBLE PRECISION) AS total_hours \
         FROM rooms r \
         LEFT JOIN meetings m ON m.room_id = r.id \
              AND m.status IN ('scheduled', 'completed') \
              AND ($1::timestamptz IS NULL OR m.start_time >= $1) \
              AND ($2::timestamptz IS NULL OR m.end_time <= $2) \
         WHERE ($3::uuid IS NULL OR r.id = $3) \
         GROUP BY r.id, r.name \
         ORDER BY total_bookings DESC",
    )
    .bind::<Nullable<Timestamptz>, _>(filter.start_date)
    .bind::<Nullable<Timestamptz>, _>(filter.end_date)
    .bind::<Nullable<DieselUuid>, _>(filter.room_id)
    .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|row| RoomUtilization {
            room_id: row.room_id,
            room_name: row.room_name,
            total_bookings: row.total_bookings,
            total_hours: row.total_hours,
            utilization_rate: utilization_rate(row.total_hours),
        })
        .collect())
}

fn meetings_by_status(
    conn: &mut PgConnection,
    filter: DashboardFilter,
) -> Result<Vec<MeetingStatusCount>, ApiError> {
    let rows: Vec<StatusCountRow> = diesel::sql_query(format!(
        "SELECT status, COUNT(*) AS count FROM meetings \
         WHERE {MEETING_FILTER} GROUP BY status"
    ))
    .bind::<Nullable<Timestamptz>, _>(filter.start_date)
    .bind::<Nullable<Timestamptz>, _>(filter.end_date)
    .bind::<Nullable<DieselUuid>, _>(filter.room_id)
    .bind::<Nullable<DieselUuid>, _>(filter.user_id)
    .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|row| MeetingStatusCount {
            status: row.status,
            count: row.count,
        })
        .collect())
}

fn meetings_by_month(
    conn: &mut PgConnection,
    filter: DashboardFilter,
) -> Result<Vec<MeetingMonthlyCount>, ApiError> {
    let rows: Vec<MonthCountRow> = diesel::sql_query(format!(
        "SELECT TO_CHAR(start_time, 'YYYY-MM') AS month, COUNT(*) AS count \
         FROM meetings WHERE {MEETING_FILTER} \
         GROUP BY month ORDER BY month ASC"
    ))
    .bind::<Nullable<Timestamptz>, _>(filter.start_date)
    .bind::<Nullable<Timestamptz>, _>(filter.end_date)
    .bind::<Nullable<DieselUuid>, _>(filter.room_id)
    .bind::<Nullable<DieselUuid>, _>(filter.user_id)
    .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|row| MeetingMonthlyCount {
            month: row.month,
            count: row.count,
        })
        .collect())
}

/// Leaderboard of organizers and attendees. A user filter does not apply
/// here, the list always ranks across all users.
fn top_active_users(
    conn: &mut PgConnection,
    filter: DashboardFilter,
    limit: i64,
) -> Result<Vec<UserActivity>, ApiError> {
    let rows: Vec<ActivityRow> = diesel::sql_query(
        "SELECT u.id AS user_id, u.display_name AS user_name, u.email AS user_email, \
                COUNT(DISTINCT m1.id) AS organized_meetings, \
                COUNT(DISTINCT m2.id) AS attended_meetings, \
                COUNT(DISTINCT m1.id) + COUNT(DISTINCT m2.id) AS total_meetings \
         FROM users u \
         LEFT JOIN meetings m1 ON m1.organizer_id = u.id \
              AND ($1::timestamptz IS NULL OR m1.start_time >= $1) \
              AND ($2::timestamptz IS NULL OR m1.end_time <= $2) \
              AND ($3::uuid IS NULL OR m1.room_id = $3) \
         LEFT JOIN meeting_attendees ma ON ma.user_id = u.id \
         LEFT JOIN meetings m2 ON m2.id = ma.meeting_id \
              AND ($1::timestamptz IS NULL OR m2.start_time >= $1) \
              AND ($2::timestamptz IS NULL OR m2.end_time <= $2) \
              AND ($3::uuid IS NULL OR m2.room_id = $3) \
         GROUP BY u.id, u.display_name, u.email \
         ORDER BY total_meetings DESC \
         LIMIT $4",
    )
    .bind::<Nullable<Timestamptz>, _>(filter.start_date)
    .bind::<Nullable<Timestamptz>, _>(filter.end_date)
    .bind::<Nullable<DieselUuid>, _>(filter.room_id)
    .bind::<BigInt, _>(limit)
    .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|row| UserActivity {
            user_id: row.user_id,
            user_name: row.user_name,
            user_email: row.user_email,
            organized_meetings: row.organized_meetings,
            attended_meetings: row.attended_meetings,
            total_meetings: row.total_meetings,
        })
        .collect())
}

const SUMMARY_SELECT: &str = "SELECT m.id, m.title, m.start_time, m.end_time, m.status, \
            u.display_name AS organizer_name, r.name AS room_name \
     FROM meetings m \
     JOIN users u ON u.id = m.organizer_id \
     JOIN rooms r ON r.id = m.room_id";

fn recent_meetings(conn: &mut PgConnection, limit: i64) -> Result<Vec<MeetingSummary>, ApiError> {
    let rows: Vec<SummaryRow> =
        diesel::sql_query(format!("{SUMMARY_SELECT} ORDER BY m.created_at DESC LIMIT $1"))
            .bind::<BigInt, _>(limit)
            .load(conn)?;
    Ok(rows.into_iter().map(row_to_summary).collect())
}

fn upcoming_meetings_7d(conn: &mut PgConnection) -> Result<Vec<MeetingSummary>, ApiError> {
    let rows: Vec<SummaryRow> = diesel::sql_query(format!(
        "{SUMMARY_SELECT} \
         WHERE m.start_time >= NOW() AND m.start_time <= NOW() + INTERVAL '7 days' \
           AND m.status = 'scheduled' \
         ORDER BY m.start_time ASC"
    ))
    .load(conn)?;
    Ok(rows.into_iter().map(row_to_summary).collect())
}

fn row_to_summary(row: SummaryRow) -> MeetingSummary {
    MeetingSummary {
        id: row.id,
        title: row.title,
        start_time: row.start_time,
        end_time: row.end_time,
        status: row.status,
        organizer_name: row.organizer_name,
        room_name: row.room_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utilization_rate_is_share_of_30_day_window() {
        // 4 booked hours out of 720.
        let rate = utilization_rate(4.0);
        assert!((rate - 0.5555555).abs() < 1e-5);

        assert_eq!(utilization_rate(0.0), 0.0);
        assert_eq!(utilization_rate(720.0), 100.0);
    }
}
