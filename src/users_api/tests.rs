#[cfg(test)]
mod tests {
    use super::super::types::{CreateUserRequest, UpdateUserRequest};
    use crate::auth::types::Role;

    #[test]
    fn test_update_request_empty_body_changes_nothing() {
        let request: UpdateUserRequest = serde_json::from_str("{}").unwrap();
        assert!(request.email.is_none());
        assert!(request.first_name.is_none());
        assert!(request.last_name.is_none());
        assert!(request.display_name.is_none());
        assert!(request.profile_picture.is_none());
        assert!(request.role.is_none());
        assert!(request.is_active.is_none());
    }

    #[test]
    fn test_update_request_carries_only_supplied_fields() {
        let request: UpdateUserRequest =
            serde_json::from_str(r#"{"email": "new@example.com", "is_active": false}"#).unwrap();
        assert_eq!(request.email.as_deref(), Some("new@example.com"));
        assert_eq!(request.is_active, Some(false));
        assert!(request.role.is_none());
        assert!(request.first_name.is_none());
    }

    #[test]
    fn test_create_request_role_is_optional() {
        let request: CreateUserRequest = serde_json::from_str(
            r#"{
                "provider_user_id": "prov-1",
                "email": "new@example.com",
                "first_name": "New",
                "last_name": "Person"
            }"#,
        )
        .unwrap();
        assert!(request.role.is_none());
        assert!(request.display_name.is_none());

        let request: CreateUserRequest = serde_json::from_str(
            r#"{
                "provider_user_id": "prov-2",
                "email": "mgr@example.com",
                "first_name": "Mgr",
                "last_name": "Person",
                "role": "manager"
            }"#,
        )
        .unwrap();
        assert_eq!(request.role, Some(Role::Manager));
    }
}
