pub mod auth;
pub mod config;
pub mod dashboard_api;
pub mod meetings_api;
pub mod rooms_api;
pub mod shared;
pub mod users_api;
