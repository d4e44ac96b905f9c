mod handlers;
mod service;
mod tests;
pub mod types;

pub use handlers::dashboard_routes;
pub use service::DashboardService;
pub use types::{DashboardFilter, DashboardStats, RoomUtilization};
