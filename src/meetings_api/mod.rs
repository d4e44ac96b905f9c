mod handlers;
pub mod migrations;
mod service;
mod tests;
pub mod types;

pub use handlers::meeting_routes;
pub use migrations::create_meetings_tables_migration;
pub use service::MeetingService;
pub use types::{
    CreateMeetingRequest, Meeting, MeetingFilter, MeetingStatus, UpdateMeetingRequest,
};
