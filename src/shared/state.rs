use crate::auth::jwt::JwtManager;
use crate::config::AppConfig;
use crate::shared::utils::DbPool;

pub struct AppState {
    pub conn: DbPool,
    pub config: AppConfig,
    pub jwt: JwtManager,
}

impl AppState {
    pub fn new(conn: DbPool, config: AppConfig, jwt: JwtManager) -> Self {
        Self { conn, config, jwt }
    }
}
