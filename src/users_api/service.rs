use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Bool, Nullable, Text, Timestamptz, Uuid as DieselUuid};
use log::{error, info};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::types::Role;
use crate::shared::error::ApiError;
use crate::shared::utils::{normalize_pagination, page_offset, DbPool};

use super::types::{CreateUserRequest, UpdateUserRequest, User};

#[derive(QueryableByName)]
struct UserRow {
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

#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

pub struct UserService {
    pool: Arc<DbPool>,
}

impl UserService {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    pub async fn create_user(&self, request: CreateUserRequest) -> Result<User, ApiError> {
        validate_create(&request)?;

        let mut conn = self.pool.get()?;

        let email_taken: Vec<CountRow> =
            diesel::sql_query("SELECT COUNT(*) AS count FROM users WHERE email = $1")
                .bind::<Text, _>(request.email.trim())
                .load(&mut conn)?;
        if email_taken.first().map(|r| r.count > 0).unwrap_or(false) {
            return Err(ApiError::Conflict("email is already in use".to_string()));
        }

        let provider_taken: Vec<CountRow> =
            diesel::sql_query("SELECT COUNT(*) AS count FROM users WHERE provider_user_id = $1")
                .bind::<Text, _>(request.provider_user_id.trim())
                .load(&mut conn)?;
        if provider_taken.first().map(|r| r.count > 0).unwrap_or(false) {
            return Err(ApiError::Conflict(
                "provider identity is already registered".to_string(),
            ));
        }

        let id = Uuid::new_v4();
        let display_name = request
            .display_name
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| format!("{} {}", request.first_name.trim(), request.last_name.trim()));
        let role = request.role.unwrap_or(Role::Employee);

        diesel::sql_query(
            r#"
            INSERT INTO users (
                id, provider_user_id, email, first_name, last_name, display_name,
                role, is_active, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, NOW(), NOW())
            "#,
        )
        .bind::<DieselUuid, _>(id)
        .bind::<Text, _>(request.provider_user_id.trim())
        .bind::<Text, _>(request.email.trim())
        .bind::<Text, _>(request.first_name.trim())
        .bind::<Text, _>(request.last_name.trim())
        .bind::<Text, _>(&display_name)
        .bind::<Text, _>(role.to_string())
        .execute(&mut conn)
        .map_err(|e| {
            error!("Failed to create user: {e}");
            ApiError::from(e)
        })?;

        info!("Created user {} ({})", id, request.email.trim());
        self.get_user(id).await
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<User, ApiError> {
        let mut conn = self.pool.get()?;
        let rows: Vec<UserRow> = diesel::sql_query(
            r#"
            SELECT id, provider_user_id, email, first_name, last_name, display_name,
                   profile_picture, role, is_active, last_login_at, created_at, updated_at
            FROM users WHERE id = $1
            "#,
        )
        .bind::<DieselUuid, _>(user_id)
        .load(&mut conn)?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::NotFound("user not found".to_string()))?;
        Ok(self.row_to_user(row))
    }

    pub async fn get_users(&self, page: Option<i64>, limit: Option<i64>) -> Result<(Vec<User>, i64), ApiError> {
        let (page, limit) = normalize_pagination(page, limit);
        let mut conn = self.pool.get()?;

        let total: Vec<CountRow> =
            diesel::sql_query("SELECT COUNT(*) AS count FROM users").load(&mut conn)?;
        let total = total.first().map(|r| r.count).unwrap_or(0);

        let rows: Vec<UserRow> = diesel::sql_query(
            r#"
            SELECT id, provider_user_id, email, first_name, last_name, display_name,
                   profile_picture, role, is_active, last_login_at, created_at, updated_at
            FROM users
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind::<BigInt, _>(limit)
        .bind::<BigInt, _>(page_offset(page, limit))
        .load(&mut conn)?;

        Ok((rows.into_iter().map(|r| self.row_to_user(r)).collect(), total))
    }

    pub async fn get_active_users(&self) -> Result<Vec<User>, ApiError> {
        let mut conn = self.pool.get()?;
        let rows: Vec<UserRow> = diesel::sql_query(
            r#"
            SELECT id, provider_user_id, email, first_name, last_name, display_name,
                   profile_picture, role, is_active, last_login_at, created_at, updated_at
            FROM users WHERE is_active = TRUE
            ORDER BY created_at DESC
            "#,
        )
        .load(&mut conn)?;
        Ok(rows.into_iter().map(|r| self.row_to_user(r)).collect())
    }

    pub async fn search_users(
        &self,
        query: &str,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<(Vec<User>, i64), ApiError> {
        let (page, limit) = normalize_pagination(page, limit);
        let pattern = format!("%{}%", query.trim());
        let mut conn = self.pool.get()?;

        let total: Vec<CountRow> = diesel::sql_query(
            r#"
            SELECT COUNT(*) AS count FROM users
            WHERE first_name ILIKE $1 OR last_name ILIKE $1
               OR display_name ILIKE $1 OR email ILIKE $1
            "#,
        )
        .bind::<Text, _>(&pattern)
        .load(&mut conn)?;
        let total = total.first().map(|r| r.count).unwrap_or(0);

        let rows: Vec<UserRow> = diesel::sql_query(
            r#"
            SELECT id, provider_user_id, email, first_name, last_name, display_name,
                   profile_picture, role, is_active, last_login_at, created_at, updated_at
            FROM users
            WHERE first_name ILIKE $1 OR last_name ILIKE $1
               OR display_name ILIKE $1 OR email ILIKE $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind::<Text, _>(&pattern)
        .bind::<BigInt, _>(limit)
        .bind::<BigInt, _>(page_offset(page, limit))
        .load(&mut conn)?;

        Ok((rows.into_iter().map(|r| self.row_to_user(r)).collect(), total))
    }

    pub async fn update_user(&self, user_id: Uuid, request: UpdateUserRequest) -> Result<User, ApiError> {
        let current = self.get_user(user_id).await?;
        let mut conn = self.pool.get()?;

        let email = match &request.email {
            Some(email) => {
                validate_email(email)?;
                let email = email.trim().to_string();
                if email != current.email {
                    let taken: Vec<CountRow> = diesel::sql_query(
                        "SELECT COUNT(*) AS count FROM users WHERE email = $1 AND id != $2",
                    )
                    .bind::<Text, _>(&email)
                    .bind::<DieselUuid, _>(user_id)
                    .load(&mut conn)?;
                    if taken.first().map(|r| r.count > 0).unwrap_or(false) {
                        return Err(ApiError::Conflict("email is already in use".to_string()));
                    }
                }
                email
            }
            None => current.email.clone(),
        };

        let first_name = request.first_name.unwrap_or(current.first_name);
        let last_name = request.last_name.unwrap_or(current.last_name);
        let display_name = request.display_name.unwrap_or(current.display_name);
        let profile_picture = request.profile_picture.or(current.profile_picture);
        let role = request.role.unwrap_or(current.role);
        let is_active = request.is_active.unwrap_or(current.is_active);

        diesel::sql_query(
            r#"
            UPDATE users
            SET email = $1, first_name = $2, last_name = $3, display_name = $4,
                profile_picture = $5, role = $6, is_active = $7, updated_at = NOW()
            WHERE id = $8
            "#,
        )
        .bind::<Text, _>(&email)
        .bind::<Text, _>(first_name.trim())
        .bind::<Text, _>(last_name.trim())
        .bind::<Text, _>(display_name.trim())
        .bind::<Nullable<Text>, _>(profile_picture.as_deref())
        .bind::<Text, _>(role.to_string())
        .bind::<Bool, _>(is_active)
        .bind::<DieselUuid, _>(user_id)
        .execute(&mut conn)
        .map_err(|e| {
            error!("Failed to update user {user_id}: {e}");
            ApiError::from(e)
        })?;

        info!("Updated user {}", user_id);
        self.get_user(user_id).await
    }

    /// Soft delete: the account is deactivated, never removed.
    pub async fn delete_user(&self, user_id: Uuid) -> Result<(), ApiError> {
        self.set_active(user_id, false).await?;
        info!("Deactivated user {} via delete", user_id);
        Ok(())
    }

    pub async fn activate_user(&self, user_id: Uuid) -> Result<User, ApiError> {
        self.set_active(user_id, true).await
    }

    pub async fn deactivate_user(&self, user_id: Uuid) -> Result<User, ApiError> {
        self.set_active(user_id, false).await
    }

    pub async fn update_user_role(&self, user_id: Uuid, role: Role) -> Result<User, ApiError> {
        let _ = self.get_user(user_id).await?;
        let mut conn = self.pool.get()?;

        diesel::sql_query("UPDATE users SET role = $1, updated_at = NOW() WHERE id = $2")
            .bind::<Text, _>(role.to_string())
            .bind::<DieselUuid, _>(user_id)
            .execute(&mut conn)
            .map_err(|e| {
                error!("Failed to update role for user {user_id}: {e}");
                ApiError::from(e)
            })?;

        info!("Set role of user {} to {}", user_id, role);
        self.get_user(user_id).await
    }

    pub async fn find_by_provider_id(&self, provider_user_id: &str) -> Result<Option<User>, ApiError> {
        let mut conn = self.pool.get()?;
        let rows: Vec<UserRow> = diesel::sql_query(
            r#"
            SELECT id, provider_user_id, email, first_name, last_name, display_name,
                   profile_picture, role, is_active, last_login_at, created_at, updated_at
            FROM users WHERE provider_user_id = $1
            "#,
        )
        .bind::<Text, _>(provider_user_id)
        .load(&mut conn)?;
        Ok(rows.into_iter().next().map(|r| self.row_to_user(r)))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let mut conn = self.pool.get()?;
        let rows: Vec<UserRow> = diesel::sql_query(
            r#"
            SELECT id, provider_user_id, email, first_name, last_name, display_name,
                   profile_picture, role, is_active, last_login_at, created_at, updated_at
            FROM users WHERE email = $1
            "#,
        )
        .bind::<Text, _>(email)
        .load(&mut conn)?;
        Ok(rows.into_iter().next().map(|r| self.row_to_user(r)))
    }

    /// Attaches a provider identity to an account that was matched by email.
    pub async fn link_provider_identity(
        &self,
        user_id: Uuid,
        provider_user_id: &str,
    ) -> Result<(), ApiError> {
        let mut conn = self.pool.get()?;
        diesel::sql_query(
            "UPDATE users SET provider_user_id = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind::<Text, _>(provider_user_id)
        .bind::<DieselUuid, _>(user_id)
        .execute(&mut conn)
        .map_err(|e| {
            error!("Failed to link provider identity for user {user_id}: {e}");
            ApiError::from(e)
        })?;
        Ok(())
    }

    pub async fn record_login(&self, user_id: Uuid) -> Result<(), ApiError> {
        let mut conn = self.pool.get()?;
        diesel::sql_query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind::<DieselUuid, _>(user_id)
            .execute(&mut conn)
            .map_err(|e| {
                error!("Failed to record login for user {user_id}: {e}");
                ApiError::from(e)
            })?;
        Ok(())
    }

    async fn set_active(&self, user_id: Uuid, active: bool) -> Result<User, ApiError> {
        let current = self.get_user(user_id).await?;
        if current.is_active == active {
            let state = if active { "active" } else { "inactive" };
            return Err(ApiError::AlreadyInState(format!("user is already {state}")));
        }

        let mut conn = self.pool.get()?;
        diesel::sql_query("UPDATE users SET is_active = $1, updated_at = NOW() WHERE id = $2")
            .bind::<Bool, _>(active)
            .bind::<DieselUuid, _>(user_id)
            .execute(&mut conn)
            .map_err(|e| {
                error!("Failed to change active flag for user {user_id}: {e}");
                ApiError::from(e)
            })?;

        info!(
            "{} user {}",
            if active { "Activated" } else { "Deactivated" },
            user_id
        );
        self.get_user(user_id).await
    }

    fn row_to_user(&self, row: UserRow) -> User {
        User {
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
        }
    }
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(ApiError::Validation("a valid email is required".to_string()));
    }
    Ok(())
}

fn validate_create(request: &CreateUserRequest) -> Result<(), ApiError> {
    if request.provider_user_id.trim().is_empty() {
        return Err(ApiError::Validation(
            "provider_user_id is required".to_string(),
        ));
    }
    validate_email(&request.email)?;
    if request.first_name.trim().is_empty() {
        return Err(ApiError::Validation("first_name is required".to_string()));
    }
    if request.last_name.trim().is_empty() {
        return Err(ApiError::Validation("last_name is required".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> CreateUserRequest {
        CreateUserRequest {
            provider_user_id: "prov-123".into(),
            email: "alice@example.com".into(),
            first_name: "Alice".into(),
            last_name: "Smith".into(),
            display_name: None,
            role: None,
        }
    }

    #[test]
    fn test_validate_create_accepts_valid_request() {
        assert!(validate_create(&valid_request()).is_ok());
    }

    #[test]
    fn test_validate_create_rejects_missing_fields() {
        let mut request = valid_request();
        request.provider_user_id = "  ".into();
        assert!(matches!(
            validate_create(&request),
            Err(ApiError::Validation(_))
        ));

        let mut request = valid_request();
        request.first_name = String::new();
        assert!(validate_create(&request).is_err());

        let mut request = valid_request();
        request.last_name = String::new();
        assert!(validate_create(&request).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@b.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@leading").is_err());
        assert!(validate_email("trailing@").is_err());
    }
}
