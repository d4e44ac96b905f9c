mod handlers;
pub mod migrations;
mod service;
mod tests;
pub mod types;

pub use handlers::user_routes;
pub use migrations::create_users_tables_migration;
pub use service::UserService;
pub use types::{CreateUserRequest, UpdateUserRequest, UpdateUserRoleRequest, User};
