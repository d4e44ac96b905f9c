#[cfg(test)]
mod tests {
    use super::super::types::{
        guard_transition, CreateMeetingRequest, Meeting, MeetingStatus, UpdateMeetingRequest,
    };
    use crate::auth::types::Role;
    use crate::rooms_api::types::Room;
    use crate::shared::error::ApiError;
    use crate::users_api::types::User;
    use chrono::{DateTime, Duration, Utc};
    use uuid::Uuid;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            provider_user_id: "provider-1".to_string(),
            email: "ada@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            display_name: "Ada Lovelace".to_string(),
            profile_picture: None,
            role: Role::Employee,
            is_active: true,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample_room() -> Room {
        Room {
            id: Uuid::new_v4(),
            name: "Boardroom".to_string(),
            description: String::new(),
            capacity: 8,
            location: "Floor 2".to_string(),
            is_active: true,
            features: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample_meeting(start: DateTime<Utc>, end: DateTime<Utc>) -> Meeting {
        let organizer = sample_user();
        let room = sample_room();
        Meeting {
            id: Uuid::new_v4(),
            title: "Planning".to_string(),
            description: String::new(),
            start_time: start,
            end_time: end,
            status: MeetingStatus::Scheduled,
            is_recurring: false,
            recurrence_pattern: String::new(),
            organizer_id: organizer.id,
            room_id: room.id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            organizer,
            room,
            attendees: vec![],
        }
    }

    #[test]
    fn test_guard_transition_allows_forward_moves() {
        assert!(guard_transition(MeetingStatus::Scheduled, MeetingStatus::InProgress).is_ok());
        assert!(guard_transition(MeetingStatus::Scheduled, MeetingStatus::Cancelled).is_ok());
        assert!(guard_transition(MeetingStatus::InProgress, MeetingStatus::Completed).is_ok());
        assert!(guard_transition(MeetingStatus::InProgress, MeetingStatus::Cancelled).is_ok());
    }

    #[test]
    fn test_guard_transition_rejects_leaving_terminal_states() {
        assert!(matches!(
            guard_transition(MeetingStatus::Completed, MeetingStatus::Cancelled),
            Err(ApiError::InvalidState(_))
        ));
        assert!(matches!(
            guard_transition(MeetingStatus::Cancelled, MeetingStatus::InProgress),
            Err(ApiError::InvalidState(_))
        ));
    }

    #[test]
    fn test_guard_transition_reports_repeats_distinctly() {
        assert!(matches!(
            guard_transition(MeetingStatus::Scheduled, MeetingStatus::Scheduled),
            Err(ApiError::AlreadyInState(_))
        ));
        // Cancelling an already cancelled meeting is a repeat, not a bad
        // transition out of a terminal state.
        assert!(matches!(
            guard_transition(MeetingStatus::Cancelled, MeetingStatus::Cancelled),
            Err(ApiError::AlreadyInState(_))
        ));
    }

    #[test]
    fn test_overlap_is_half_open() {
        let base = Utc::now() + Duration::days(1);
        let meeting = sample_meeting(base, base + Duration::hours(1));

        // Back to back bookings share a boundary instant and do not conflict.
        assert!(!meeting.overlaps(base + Duration::hours(1), base + Duration::hours(2)));
        assert!(!meeting.overlaps(base - Duration::hours(1), base));

        assert!(meeting.overlaps(base + Duration::minutes(30), base + Duration::minutes(90)));
        assert!(meeting.overlaps(base - Duration::minutes(30), base + Duration::minutes(30)));
        assert!(meeting.overlaps(base - Duration::hours(1), base + Duration::hours(2)));
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(MeetingStatus::InProgress.to_string(), "in_progress");
        assert_eq!(MeetingStatus::parse("in_progress"), Some(MeetingStatus::InProgress));
        assert_eq!(MeetingStatus::parse("paused"), None);

        let json = serde_json::to_string(&MeetingStatus::Cancelled).unwrap();
        assert_eq!(json, r#""cancelled""#);
    }

    #[test]
    fn test_create_request_defaults_optional_collections() {
        let json = r#"{
            "title": "Standup",
            "start_time": "2030-01-01T09:00:00Z",
            "end_time": "2030-01-01T09:15:00Z",
            "room_id": "3fa85f64-5717-4562-b3fc-2c963f66afa6"
        }"#;
        let request: CreateMeetingRequest = serde_json::from_str(json).unwrap();
        assert!(request.attendee_ids.is_empty());
        assert!(!request.is_recurring);
        assert!(request.description.is_none());
    }

    #[test]
    fn test_update_request_distinguishes_absent_attendees_from_empty() {
        let request: UpdateMeetingRequest = serde_json::from_str("{}").unwrap();
        assert!(request.attendee_ids.is_none());

        let request: UpdateMeetingRequest =
            serde_json::from_str(r#"{"attendee_ids": []}"#).unwrap();
        assert_eq!(request.attendee_ids, Some(vec![]));
    }
}
