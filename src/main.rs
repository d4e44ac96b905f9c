use axum::http::StatusCode;
use axum::routing::get;
use axum::{middleware, Json, Router};
use dotenvy::dotenv;
use log::info;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use roomserver::auth::auth_routes;
use roomserver::auth::jwt::JwtManager;
use roomserver::auth::middleware::auth_middleware;
use roomserver::config::AppConfig;
use roomserver::dashboard_api::dashboard_routes;
use roomserver::meetings_api::meeting_routes;
use roomserver::rooms_api::room_routes;
use roomserver::shared::state::AppState;
use roomserver::shared::utils::{create_conn, run_migrations};
use roomserver::users_api::user_routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env()?;

    let pool = create_conn(&config.database_url())?;
    run_migrations(&pool)?;

    let jwt = JwtManager::from_secret(
        &config.auth.jwt_secret,
        config.auth.access_token_minutes,
        config.auth.refresh_token_days,
    )?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(pool, config, jwt));

    let protected = Router::new()
        .nest("/users", user_routes())
        .nest("/rooms", room_routes())
        .nest("/meetings", meeting_routes())
        .nest("/dashboard", dashboard_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let app = Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes(state.clone()))
        .nest("/api", protected)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn health_check(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
) -> (StatusCode, Json<serde_json::Value>) {
    let db_ok = state.conn.get().is_ok();

    let status = if db_ok { "healthy" } else { "degraded" };
    let code = if db_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(serde_json::json!({
            "status": status,
            "service": "roomserver",
            "version": env!("CARGO_PKG_VERSION"),
            "database": db_ok
        })),
    )
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}
