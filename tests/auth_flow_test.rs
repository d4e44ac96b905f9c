#[cfg(test)]
mod auth_flow_tests {
    use roomserver::auth::jwt::{extract_bearer_token, JwtManager};
    use roomserver::auth::types::{AuthenticatedUser, Role};
    use uuid::Uuid;

    const SECRET: &str = "an-integration-test-secret-with-length";

    fn manager() -> JwtManager {
        JwtManager::from_secret(SECRET, 60, 7).unwrap()
    }

    fn user(role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            id: Uuid::new_v4(),
            email: "grace@example.com".to_string(),
            role,
            provider_user_id: "provider-42".to_string(),
        }
    }

    #[test]
    fn test_short_secrets_are_rejected() {
        assert!(JwtManager::from_secret("too-short", 60, 7).is_err());
    }

    #[test]
    fn test_token_pair_round_trip() {
        let jwt = manager();
        let user_id = Uuid::new_v4();
        let pair = jwt
            .generate_token_pair(user_id, "grace@example.com", Role::Manager, "provider-42")
            .unwrap();

        let claims = jwt.validate_access_token(&pair.access_token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.email, "grace@example.com");
        assert_eq!(claims.role, Role::Manager);
        assert!(claims.is_access_token());

        let claims = jwt.validate_refresh_token(&pair.refresh_token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
        assert!(claims.is_refresh_token());
    }

    #[test]
    fn test_token_types_are_not_interchangeable() {
        let jwt = manager();
        let pair = jwt
            .generate_token_pair(Uuid::new_v4(), "grace@example.com", Role::Employee, "p-1")
            .unwrap();

        assert!(jwt.validate_access_token(&pair.refresh_token).is_err());
        assert!(jwt.validate_refresh_token(&pair.access_token).is_err());
    }

    #[test]
    fn test_tokens_from_another_secret_fail_validation() {
        let jwt = manager();
        let other =
            JwtManager::from_secret("a-different-secret-that-is-long-enough!!", 60, 7).unwrap();
        let pair = other
            .generate_token_pair(Uuid::new_v4(), "grace@example.com", Role::Employee, "p-1")
            .unwrap();

        assert!(jwt.validate_access_token(&pair.access_token).is_err());
    }

    #[test]
    fn test_bearer_extraction() {
        assert_eq!(extract_bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer_token("bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(extract_bearer_token(""), None);
    }

    #[test]
    fn test_role_floors_follow_the_hierarchy() {
        assert!(Role::Admin.is_at_least(&Role::Manager));
        assert!(Role::Manager.is_at_least(&Role::Employee));
        assert!(!Role::Employee.is_at_least(&Role::Manager));
        assert!(!Role::Manager.is_at_least(&Role::Admin));

        // Unknown role strings fall back to the least privileged role.
        assert_eq!(Role::parse("superuser"), Role::Employee);
    }

    #[test]
    fn test_ownership_gate() {
        let employee = user(Role::Employee);
        assert!(employee.owns_or_is_at_least(employee.id, Role::Manager));
        assert!(!employee.owns_or_is_at_least(Uuid::new_v4(), Role::Manager));

        let manager = user(Role::Manager);
        assert!(manager.owns_or_is_at_least(Uuid::new_v4(), Role::Manager));

        let admin = user(Role::Admin);
        assert!(admin.owns_or_is_at_least(Uuid::new_v4(), Role::Manager));
    }
}
