mod handlers;
pub mod migrations;
mod service;
mod tests;
pub mod types;

pub use handlers::room_routes;
pub use migrations::create_rooms_tables_migration;
pub use service::RoomService;
pub use types::{
    CreateFeatureRequest, CreateRoomRequest, Room, RoomFeature, UpdateFeatureRequest,
    UpdateRoomRequest,
};
