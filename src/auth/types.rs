use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Privilege order: admin > manager > employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employee,
    Manager,
    Admin,
}

impl Role {
    pub fn hierarchy_level(&self) -> u8 {
        match self {
            Role::Employee => 1,
            Role::Manager => 2,
            Role::Admin => 3,
        }
    }

    pub fn is_at_least(&self, other: &Role) -> bool {
        self.hierarchy_level() >= other.hierarchy_level()
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "admin" => Role::Admin,
            "manager" => Role::Manager,
            _ => Role::Employee,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Employee => write!(f, "employee"),
            Role::Manager => write!(f, "manager"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// Caller identity attached to the request by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub provider_user_id: String,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_at_least(&self, role: Role) -> bool {
        self.role.is_at_least(&role)
    }

    /// Ownership-or-rank gate: the caller either owns the resource or holds
    /// a role at or above the given floor.
    pub fn owns_or_is_at_least(&self, owner_id: Uuid, role: Role) -> bool {
        self.id == owner_id || self.role.is_at_least(&role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_role(role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            id: Uuid::new_v4(),
            email: "person@example.com".into(),
            role,
            provider_user_id: "prov-1".into(),
        }
    }

    #[test]
    fn test_role_order() {
        assert!(Role::Admin.is_at_least(&Role::Manager));
        assert!(Role::Admin.is_at_least(&Role::Employee));
        assert!(Role::Manager.is_at_least(&Role::Employee));
        assert!(!Role::Manager.is_at_least(&Role::Admin));
        assert!(!Role::Employee.is_at_least(&Role::Manager));
        assert!(Role::Employee.is_at_least(&Role::Employee));
    }

    #[test]
    fn test_role_display_parse() {
        assert_eq!(Role::Admin.to_string(), "admin");
        assert_eq!(Role::parse("manager"), Role::Manager);
        assert_eq!(Role::parse("unknown"), Role::Employee);
    }

    #[test]
    fn test_owner_or_role_gate() {
        let employee = user_with_role(Role::Employee);
        let manager = user_with_role(Role::Manager);
        let other = Uuid::new_v4();

        assert!(employee.owns_or_is_at_least(employee.id, Role::Manager));
        assert!(!employee.owns_or_is_at_least(other, Role::Manager));
        assert!(manager.owns_or_is_at_least(other, Role::Manager));
        assert!(user_with_role(Role::Admin).owns_or_is_at_least(other, Role::Manager));
    }
}
