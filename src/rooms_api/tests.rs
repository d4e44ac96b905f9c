#[cfg(test)]
mod tests {
    use super::super::types::{CreateRoomRequest, UpdateRoomRequest};

    #[test]
    fn test_update_request_feature_field_absent_vs_empty() {
        // Absent means "leave the associations alone"; an empty list means
        // "clear them".
        let request: UpdateRoomRequest = serde_json::from_str("{}").unwrap();
        assert!(request.feature_ids.is_none());

        let request: UpdateRoomRequest =
            serde_json::from_str(r#"{"feature_ids": []}"#).unwrap();
        assert_eq!(request.feature_ids, Some(vec![]));
    }

    #[test]
    fn test_create_request_optional_fields_default() {
        let request: CreateRoomRequest = serde_json::from_str(
            r#"{"name": "Boardroom", "capacity": 12}"#,
        )
        .unwrap();
        assert_eq!(request.name, "Boardroom");
        assert_eq!(request.capacity, 12);
        assert!(request.description.is_none());
        assert!(request.location.is_none());
        assert!(request.feature_ids.is_none());
    }
}
