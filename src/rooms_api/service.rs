use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{
    Array, BigInt, Bool, Integer, Nullable, Text, Timestamptz, Uuid as DieselUuid,
};
use log::{error, info};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::shared::error::ApiError;
use crate::shared::utils::{normalize_pagination, page_offset, DbPool};

use super::types::{
    CreateFeatureRequest, CreateRoomRequest, Room, RoomFeature, UpdateFeatureRequest,
    UpdateRoomRequest,
};

#[derive(QueryableByName)]
struct RoomRow {
    #[diesel(sql_type = DieselUuid)]
    id: Uuid,
    #[diesel(sql_type = Text)]
    name: String,
    #[diesel(sql_type = Text)]
    description: String,
    #[diesel(sql_type = Integer)]
    capacity: i32,
    #[diesel(sql_type = Text)]
    location: String,
    #[diesel(sql_type = Bool)]
    is_active: bool,
    #[diesel(sql_type = Timestamptz)]
    created_at: DateTime<Utc>,
    #[diesel(sql_type = Timestamptz)]
    updated_at: DateTime<Utc>,
}

#[derive(QueryableByName)]
struct FeatureRow {
    #[diesel(sql_type = DieselUuid)]
    id: Uuid,
    #[diesel(sql_type = Text)]
    name: String,
    #[diesel(sql_type = Text)]
    description: String,
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
struct IdRow {
    #[diesel(sql_type = DieselUuid)]
    id: Uuid,
}

pub struct RoomService {
    pool: Arc<DbPool>,
}

impl RoomService {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    pub async fn create_room(&self, request: CreateRoomRequest) -> Result<Room, ApiError> {
        validate_name(&request.name)?;
        validate_capacity(request.capacity)?;

        let id = Uuid::new_v4();
        let mut conn = self.pool.get()?;

        diesel::sql_query(
            r#"
            INSERT INTO rooms (id, name, description, capacity, location, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, TRUE, NOW(), NOW())
            "#,
        )
        .bind::<DieselUuid, _>(id)
        .bind::<Text, _>(request.name.trim())
        .bind::<Text, _>(request.description.as_deref().unwrap_or(""))
        .bind::<Integer, _>(request.capacity)
        .bind::<Text, _>(request.location.as_deref().unwrap_or(""))
        .execute(&mut conn)
        .map_err(|e| {
            error!("Failed to create room: {e}");
            ApiError::from(e)
        })?;

        if let Some(feature_ids) = &request.feature_ids {
            assign_features(&mut conn, id, feature_ids)?;
        }

        info!("Created room {} ({})", id, request.name.trim());
        self.get_room(id).await
    }

    pub async fn get_room(&self, room_id: Uuid) -> Result<Room, ApiError> {
        let mut conn = self.pool.get()?;
        let rows: Vec<RoomRow> = diesel::sql_query(
            "SELECT id, name, description, capacity, location, is_active, created_at, updated_at
             FROM rooms WHERE id = $1",
        )
        .bind::<DieselUuid, _>(room_id)
        .load(&mut conn)?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::NotFound("room not found".to_string()))?;
        let features = load_features(&mut conn, row.id)?;
        Ok(row_to_room(row, features))
    }

    pub async fn get_rooms(
        &self,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<(Vec<Room>, i64), ApiError> {
        let (page, limit) = normalize_pagination(page, limit);
        let mut conn = self.pool.get()?;

        let total: Vec<CountRow> =
            diesel::sql_query("SELECT COUNT(*) AS count FROM rooms").load(&mut conn)?;
        let total = total.first().map(|r| r.count).unwrap_or(0);

        let rows: Vec<RoomRow> = diesel::sql_query(
            "SELECT id, name, description, capacity, location, is_active, created_at, updated_at
             FROM rooms ORDER BY name ASC LIMIT $1 OFFSET $2",
        )
        .bind::<BigInt, _>(limit)
        .bind::<BigInt, _>(page_offset(page, limit))
        .load(&mut conn)?;

        let rooms = self.materialize(&mut conn, rows)?;
        Ok((rooms, total))
    }

    pub async fn get_active_rooms(&self) -> Result<Vec<Room>, ApiError> {
        let mut conn = self.pool.get()?;
        let rows: Vec<RoomRow> = diesel::sql_query(
            "SELECT id, name, description, capacity, location, is_active, created_at, updated_at
             FROM rooms WHERE is_active = TRUE ORDER BY name ASC",
        )
        .load(&mut conn)?;
        self.materialize(&mut conn, rows)
    }

    pub async fn search_rooms(
        &self,
        query: &str,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<(Vec<Room>, i64), ApiError> {
        let (page, limit) = normalize_pagination(page, limit);
        let pattern = format!("%{}%", query.trim());
        let mut conn = self.pool.get()?;

        let total: Vec<CountRow> = diesel::sql_query(
            "SELECT COUNT(*) AS count FROM rooms
             WHERE name ILIKE $1 OR description ILIKE $1 OR location ILIKE $1",
        )
        .bind::<Text, _>(&pattern)
        .load(&mut conn)?;
        let total = total.first().map(|r| r.count).unwrap_or(0);

        let rows: Vec<RoomRow> = diesel::sql_query(
            "SELECT id, name, description, capacity, location, is_active, created_at, updated_at
             FROM rooms
             WHERE name ILIKE $1 OR description ILIKE $1 OR location ILIKE $1
             ORDER BY name ASC LIMIT $2 OFFSET $3",
        )
        .bind::<Text, _>(&pattern)
        .bind::<BigInt, _>(limit)
        .bind::<BigInt, _>(page_offset(page, limit))
        .load(&mut conn)?;

        let rooms = self.materialize(&mut conn, rows)?;
        Ok((rooms, total))
    }

    /// Active rooms meeting the capacity floor with no scheduled or
    /// in-progress meeting overlapping [start, end).
    pub async fn get_available_rooms(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        capacity: Option<i32>,
    ) -> Result<Vec<Room>, ApiError> {
        validate_time_window(start, end)?;

        let mut conn = self.pool.get()?;
        let rows: Vec<RoomRow> = diesel::sql_query(
            r#"
            SELECT id, name, description, capacity, location, is_active, created_at, updated_at
            FROM rooms
            WHERE is_active = TRUE
              AND ($3::integer IS NULL OR capacity >= $3)
              AND id NOT IN (
                  SELECT room_id FROM meetings
                  WHERE start_time < $2 AND end_time > $1
                    AND status IN ('scheduled', 'in_progress')
              )
            ORDER BY name ASC
            "#,
        )
        .bind::<Timestamptz, _>(start)
        .bind::<Timestamptz, _>(end)
        .bind::<Nullable<Integer>, _>(capacity)
        .load(&mut conn)?;

        self.materialize(&mut conn, rows)
    }

    pub async fn update_room(
        &self,
        room_id: Uuid,
        request: UpdateRoomRequest,
    ) -> Result<Room, ApiError> {
        let current = self.get_room(room_id).await?;

        if let Some(name) = &request.name {
            validate_name(name)?;
        }
        if let Some(capacity) = request.capacity {
            validate_capacity(capacity)?;
        }

        let name = request.name.map(|n| n.trim().to_string()).unwrap_or(current.name);
        let description = request.description.unwrap_or(current.description);
        let capacity = request.capacity.unwrap_or(current.capacity);
        let location = request.location.unwrap_or(current.location);
        let is_active = request.is_active.unwrap_or(current.is_active);

        let mut conn = self.pool.get()?;
        diesel::sql_query(
            r#"
            UPDATE rooms
            SET name = $1, description = $2, capacity = $3, location = $4,
                is_active = $5, updated_at = NOW()
            WHERE id = $6
            "#,
        )
        .bind::<Text, _>(&name)
        .bind::<Text, _>(&description)
        .bind::<Integer, _>(capacity)
        .bind::<Text, _>(&location)
        .bind::<Bool, _>(is_active)
        .bind::<DieselUuid, _>(room_id)
        .execute(&mut conn)
        .map_err(|e| {
            error!("Failed to update room {room_id}: {e}");
            ApiError::from(e)
        })?;

        if let Some(feature_ids) = &request.feature_ids {
            replace_features(&mut conn, room_id, feature_ids)?;
        }

        info!("Updated room {}", room_id);
        self.get_room(room_id).await
    }

    /// Soft delete: bookings keep referencing the room, it just stops being
    /// offered.
    pub async fn delete_room(&self, room_id: Uuid) -> Result<(), ApiError> {
        let current = self.get_room(room_id).await?;
        if !current.is_active {
            return Err(ApiError::AlreadyInState(
                "room is already inactive".to_string(),
            ));
        }

        let mut conn = self.pool.get()?;
        diesel::sql_query(
            "UPDATE rooms SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind::<DieselUuid, _>(room_id)
        .execute(&mut conn)
        .map_err(|e| {
            error!("Failed to deactivate room {room_id}: {e}");
            ApiError::from(e)
        })?;

        info!("Deactivated room {}", room_id);
        Ok(())
    }

    pub async fn create_feature(&self, request: CreateFeatureRequest) -> Result<RoomFeature, ApiError> {
        validate_name(&request.name)?;

        let mut conn = self.pool.get()?;
        let taken: Vec<CountRow> =
            diesel::sql_query("SELECT COUNT(*) AS count FROM room_features WHERE name = $1")
                .bind::<Text, _>(request.name.trim())
                .load(&mut conn)?;
        if taken.first().map(|r| r.count > 0).unwrap_or(false) {
            return Err(ApiError::Conflict(
                "feature name already exists".to_string(),
            ));
        }

        let id = Uuid::new_v4();
        diesel::sql_query(
            "INSERT INTO room_features (id, name, description, created_at, updated_at)
             VALUES ($1, $2, $3, NOW(), NOW())",
        )
        .bind::<DieselUuid, _>(id)
        .bind::<Text, _>(request.name.trim())
        .bind::<Text, _>(request.description.as_deref().unwrap_or(""))
        .execute(&mut conn)
        .map_err(|e| {
            error!("Failed to create room feature: {e}");
            ApiError::from(e)
        })?;

        info!("Created room feature {} ({})", id, request.name.trim());
        self.get_feature(id).await
    }

    pub async fn get_feature(&self, feature_id: Uuid) -> Result<RoomFeature, ApiError> {
        let mut conn = self.pool.get()?;
        let rows: Vec<FeatureRow> = diesel::sql_query(
            "SELECT id, name, description, created_at, updated_at
             FROM room_features WHERE id = $1",
        )
        .bind::<DieselUuid, _>(feature_id)
        .load(&mut conn)?;

        rows.into_iter()
            .next()
            .map(row_to_feature)
            .ok_or_else(|| ApiError::NotFound("room feature not found".to_string()))
    }

    pub async fn get_features(&self) -> Result<Vec<RoomFeature>, ApiError> {
        let mut conn = self.pool.get()?;
        let rows: Vec<FeatureRow> = diesel::sql_query(
            "SELECT id, name, description, created_at, updated_at
             FROM room_features ORDER BY name ASC",
        )
        .load(&mut conn)?;
        Ok(rows.into_iter().map(row_to_feature).collect())
    }

    pub async fn update_feature(
        &self,
        feature_id: Uuid,
        request: UpdateFeatureRequest,
    ) -> Result<RoomFeature, ApiError> {
        let current = self.get_feature(feature_id).await?;
        let mut conn = self.pool.get()?;

        let name = match &request.name {
            Some(name) => {
                validate_name(name)?;
                let name = name.trim().to_string();
                if name != current.name {
                    let taken: Vec<CountRow> = diesel::sql_query(
                        "SELECT COUNT(*) AS count FROM room_features WHERE name = $1 AND id != $2",
                    )
                    .bind::<Text, _>(&name)
                    .bind::<DieselUuid, _>(feature_id)
                    .load(&mut conn)?;
                    if taken.first().map(|r| r.count > 0).unwrap_or(false) {
                        return Err(ApiError::Conflict(
                            "feature name already exists".to_string(),
                        ));
                    }
                }
                name
            }
            None => current.name,
        };
        let description = request.description.unwrap_or(current.description);

        diesel::sql_query(
            "UPDATE room_features SET name = $1, description = $2, updated_at = NOW() WHERE id = $3",
        )
        .bind::<Text, _>(&name)
        .bind::<Text, _>(&description)
        .bind::<DieselUuid, _>(feature_id)
        .execute(&mut conn)
        .map_err(|e| {
            error!("Failed to update room feature {feature_id}: {e}");
            ApiError::from(e)
        })?;

        self.get_feature(feature_id).await
    }

    /// Features are reference data with no history requirement, so this is a
    /// hard delete; assignment rows cascade.
    pub async fn delete_feature(&self, feature_id: Uuid) -> Result<(), ApiError> {
        let _ = self.get_feature(feature_id).await?;

        let mut conn = self.pool.get()?;
        diesel::sql_query("DELETE FROM room_features WHERE id = $1")
            .bind::<DieselUuid, _>(feature_id)
            .execute(&mut conn)
            .map_err(|e| {
                error!("Failed to delete room feature {feature_id}: {e}");
                ApiError::from(e)
            })?;

        info!("Deleted room feature {}", feature_id);
        Ok(())
    }

    fn materialize(
        &self,
        conn: &mut PgConnection,
        rows: Vec<RoomRow>,
    ) -> Result<Vec<Room>, ApiError> {
        let mut rooms = Vec::with_capacity(rows.len());
        for row in rows {
            let features = load_features(conn, row.id)?;
            rooms.push(row_to_room(row, features));
        }
        Ok(rooms)
    }
}

fn row_to_room(row: RoomRow, features: Vec<RoomFeature>) -> Room {
    Room {
        id: row.id,
        name: row.name,
        description: row.description,
        capacity: row.capacity,
        location: row.location,
        is_active: row.is_active,
        features,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn row_to_feature(row: FeatureRow) -> RoomFeature {
    RoomFeature {
        id: row.id,
        name: row.name,
        description: row.description,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn load_features(conn: &mut PgConnection, room_id: Uuid) -> Result<Vec<RoomFeature>, ApiError> {
    let rows: Vec<FeatureRow> = diesel::sql_query(
        r#"
        SELECT f.id, f.name, f.description, f.created_at, f.updated_at
        FROM room_features f
        JOIN room_feature_assignments a ON a.feature_id = f.id
        WHERE a.room_id = $1
        ORDER BY f.name ASC
        "#,
    )
    .bind::<DieselUuid, _>(room_id)
    .load(conn)?;
    Ok(rows.into_iter().map(row_to_feature).collect())
}

// Unresolvable ids are dropped silently rather than failing the request.
fn assign_features(
    conn: &mut PgConnection,
    room_id: Uuid,
    requested: &[Uuid],
) -> Result<(), ApiError> {
    if requested.is_empty() {
        return Ok(());
    }

    let resolved: Vec<IdRow> =
        diesel::sql_query("SELECT id FROM room_features WHERE id = ANY($1)")
            .bind::<Array<DieselUuid>, _>(requested)
            .load(conn)?;
    let resolved: HashSet<Uuid> = resolved.into_iter().map(|r| r.id).collect();

    let mut seen = HashSet::new();
    for feature_id in requested {
        if !resolved.contains(feature_id) || !seen.insert(*feature_id) {
            continue;
        }
        diesel::sql_query(
            "INSERT INTO room_feature_assignments (room_id, feature_id)
             VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind::<DieselUuid, _>(room_id)
        .bind::<DieselUuid, _>(*feature_id)
        .execute(conn)?;
    }
    Ok(())
}

// Full replacement: the supplied set becomes the room's feature set.
fn replace_features(
    conn: &mut PgConnection,
    room_id: Uuid,
    requested: &[Uuid],
) -> Result<(), ApiError> {
    diesel::sql_query("DELETE FROM room_feature_assignments WHERE room_id = $1")
        .bind::<DieselUuid, _>(room_id)
        .execute(conn)?;
    assign_features(conn, room_id, requested)
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::Validation("name is required".to_string()));
    }
    Ok(())
}

fn validate_capacity(capacity: i32) -> Result<(), ApiError> {
    if capacity < 1 {
        return Err(ApiError::Validation(
            "capacity must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn validate_time_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), ApiError> {
    if end <= start {
        return Err(ApiError::Validation(
            "end time must be after start time".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Boardroom").is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name("").is_err());
    }

    #[test]
    fn test_validate_capacity_floor() {
        assert!(validate_capacity(1).is_ok());
        assert!(validate_capacity(250).is_ok());
        assert!(matches!(
            validate_capacity(0),
            Err(ApiError::Validation(_))
        ));
        assert!(validate_capacity(-3).is_err());
    }

    #[test]
    fn test_validate_time_window() {
        let start = Utc::now();
        assert!(validate_time_window(start, start + Duration::hours(1)).is_ok());
        assert!(validate_time_window(start, start).is_err());
        assert!(validate_time_window(start, start - Duration::minutes(1)).is_err());
    }
}
