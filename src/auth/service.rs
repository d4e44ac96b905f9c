use diesel::prelude::*;
use diesel::sql_types::{Nullable, Text, Uuid as DieselUuid};
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::shared::error::ApiError;
use crate::shared::utils::DbPool;
use crate::users_api::types::User;
use crate::users_api::UserService;

use super::jwt::{JwtManager, TokenPair};
use super::provider::{IdentityProvider, ProviderIdentity};

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub tokens: TokenPair,
}

pub struct AuthService {
    pool: Arc<DbPool>,
    users: UserService,
    provider: IdentityProvider,
    jwt: JwtManager,
}

impl AuthService {
    pub fn new(pool: Arc<DbPool>, config: AuthConfig, jwt: JwtManager) -> Self {
        Self {
            users: UserService::new(pool.clone()),
            provider: IdentityProvider::new(config),
            pool,
            jwt,
        }
    }

    pub fn authorization_url(&self, state: &str) -> String {
        self.provider.authorization_url(state)
    }

    /// Full login flow: code exchange, identity fetch, local account
    /// resolution, token issue. Provider failures surface as Unauthorized.
    pub async fn login_with_code(&self, code: &str) -> Result<LoginResponse, ApiError> {
        if !self.provider.is_configured() {
            return Err(ApiError::Unauthorized(
                "identity provider is not configured".to_string(),
            ));
        }

        let provider_tokens = self.provider.exchange_code(code).await.map_err(|e| {
            warn!("Authorization code exchange failed: {e}");
            ApiError::Unauthorized("authorization code exchange failed".to_string())
        })?;

        let identity = self
            .provider
            .get_user_info(&provider_tokens.access_token)
            .await
            .map_err(|e| {
                warn!("Identity lookup failed: {e}");
                ApiError::Unauthorized("identity lookup failed".to_string())
            })?;

        let user = self.find_or_create_user(identity).await?;
        if !user.is_active {
            return Err(ApiError::Unauthorized("account is deactivated".to_string()));
        }

        self.users.record_login(user.id).await?;

        let tokens = self
            .jwt
            .generate_token_pair(user.id, &user.email, user.role, &user.provider_user_id)
            .map_err(|e| ApiError::Internal(format!("token generation failed: {e}")))?;

        info!("User {} logged in", user.id);
        Ok(LoginResponse { user, tokens })
    }

    /// Issues a fresh pair from a refresh token, re-reading the account so
    /// role changes and deactivations take effect at rotation.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        let claims = self
            .jwt
            .validate_refresh_token(refresh_token)
            .map_err(|_| ApiError::Unauthorized("invalid or expired refresh token".to_string()))?;
        let user_id = claims
            .user_id()
            .map_err(|_| ApiError::Unauthorized("invalid refresh token subject".to_string()))?;

        let user = self
            .users
            .get_user(user_id)
            .await
            .map_err(|_| ApiError::Unauthorized("account no longer exists".to_string()))?;
        if !user.is_active {
            return Err(ApiError::Unauthorized("account is deactivated".to_string()));
        }

        self.jwt
            .generate_token_pair(user.id, &user.email, user.role, &user.provider_user_id)
            .map_err(|e| ApiError::Internal(format!("token generation failed: {e}")))
    }

    /// Resolution order: provider id, then email (linking the provider id to
    /// the matched account), then a fresh employee account.
    async fn find_or_create_user(&self, identity: ProviderIdentity) -> Result<User, ApiError> {
        if let Some(user) = self.users.find_by_provider_id(&identity.sub).await? {
            return Ok(user);
        }

        if let Some(user) = self.users.find_by_email(&identity.email).await? {
            self.users
                .link_provider_identity(user.id, &identity.sub)
                .await?;
            return self.users.get_user(user.id).await;
        }

        self.create_from_identity(&identity).await
    }

    // Provider fields are trusted as-is here; the admin-create path is the
    // one that validates names.
    async fn create_from_identity(&self, identity: &ProviderIdentity) -> Result<User, ApiError> {
        let id = Uuid::new_v4();
        let first_name = identity.given_name.clone().unwrap_or_default();
        let last_name = identity.family_name.clone().unwrap_or_default();
        let display_name = identity
            .name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| format!("{first_name} {last_name}").trim().to_string());
        let display_name = if display_name.is_empty() {
            identity.email.clone()
        } else {
            display_name
        };

        let mut conn = self.pool.get()?;
        diesel::sql_query(
            r#"
            INSERT INTO users (
                id, provider_user_id, email, first_name, last_name, display_name,
                profile_picture, role, is_active, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, 'employee', TRUE, NOW(), NOW())
            "#,
        )
        .bind::<DieselUuid, _>(id)
        .bind::<Text, _>(&identity.sub)
        .bind::<Text, _>(&identity.email)
        .bind::<Text, _>(&first_name)
        .bind::<Text, _>(&last_name)
        .bind::<Text, _>(&display_name)
        .bind::<Nullable<Text>, _>(identity.picture.as_deref())
        .execute(&mut conn)?;

        info!("Registered user {} from provider identity", id);
        self.users.get_user(id).await
    }
}
