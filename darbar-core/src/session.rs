use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// The authenticated caller of one request.
///
/// Built per request from the bearer token and handed to handlers; nothing
/// about the caller is kept in process-wide state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub role: Role,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Users may act on their own resources; admins on anyone's.
    pub fn can_access(&self, owner_id: &str) -> bool {
        self.is_admin() || self.user_id == owner_id
    }

    pub fn ensure_can_access(&self, owner_id: &str, resource: &str) -> CoreResult<()> {
        if self.can_access(owner_id) {
            Ok(())
        } else {
            // Hide existence of other users' resources.
            Err(CoreError::NotFound(resource.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(role: Role) -> Session {
        Session {
            user_id: "u1".to_string(),
            email: "u1@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_owner_access() {
        let user = session(Role::User);
        assert!(user.can_access("u1"));
        assert!(!user.can_access("u2"));
        assert!(matches!(user.ensure_can_access("u2", "Order"), Err(CoreError::NotFound(_))));
    }

    #[test]
    fn test_admin_access() {
        let admin = session(Role::Admin);
        assert!(admin.can_access("u2"));
    }

    #[test]
    fn test_role_wire_format() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        let role: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, Role::User);
    }
}
