#[cfg(test)]
mod booking_rules_tests {
    use roomserver::meetings_api::types::guard_transition;
    use roomserver::meetings_api::MeetingStatus;
    use roomserver::shared::utils::normalize_pagination;
    use roomserver::shared::{ApiError, Paginated};

    #[test]
    fn test_meeting_lifecycle_happy_path() {
        assert!(guard_transition(MeetingStatus::Scheduled, MeetingStatus::InProgress).is_ok());
        assert!(guard_transition(MeetingStatus::InProgress, MeetingStatus::Completed).is_ok());
    }

    #[test]
    fn test_terminal_meetings_are_frozen() {
        for terminal in [MeetingStatus::Completed, MeetingStatus::Cancelled] {
            for next in [
                MeetingStatus::Scheduled,
                MeetingStatus::InProgress,
            ] {
                let result = guard_transition(terminal, next);
                assert!(
                    matches!(result, Err(ApiError::InvalidState(_))),
                    "{terminal} -> {next} should be invalid"
                );
            }
        }
    }

    #[test]
    fn test_repeated_transitions_are_reported_as_repeats() {
        for status in [
            MeetingStatus::Scheduled,
            MeetingStatus::InProgress,
            MeetingStatus::Completed,
            MeetingStatus::Cancelled,
        ] {
            let result = guard_transition(status, status);
            assert!(
                matches!(result, Err(ApiError::AlreadyInState(_))),
                "{status} -> {status} should report a repeat"
            );
        }
    }

    #[test]
    fn test_error_kinds_map_to_http_statuses() {
        let conflict = ApiError::SchedulingConflict("busy".to_string());
        assert_eq!(conflict.status_code().as_u16(), 409);
        assert_eq!(conflict.code(), "scheduling_conflict");

        let state = ApiError::InvalidState("done".to_string());
        assert_eq!(state.status_code().as_u16(), 422);

        let repeat = ApiError::AlreadyInState("cancelled".to_string());
        assert_eq!(repeat.status_code().as_u16(), 409);
    }

    #[test]
    fn test_pagination_surface_defaults_and_clamps() {
        assert_eq!(normalize_pagination(None, None), (1, 10));
        assert_eq!(normalize_pagination(Some(-1), Some(200)), (1, 10));
        assert_eq!(normalize_pagination(Some(4), Some(100)), (4, 100));

        let page: Paginated<u8> = Paginated::new(vec![], Some(2), Some(10), 35);
        assert_eq!(page.pagination.total_pages, 4);
        assert_eq!(page.pagination.total, 35);
    }
}
