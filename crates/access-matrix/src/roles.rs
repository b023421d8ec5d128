//! # Roles
//!
//! A role is selected one at a time as the active role. There is no
//! union of several roles: the compiled permission index always belongs
//! to exactly one role, or to none.

use serde::{Deserialize, Serialize};

/// Numeric role identifier.
pub type RoleId = i64;

/// A role that permission matrix rows are granted to.
///
/// # Example
///
/// ```
/// use access_matrix::roles::Role;
///
/// let roles = vec![Role::new(1, "Clerk"), Role::new(2, "Approver")];
/// assert_eq!(Role::find(&roles, 2).map(|r| r.name.as_str()), Some("Approver"));
/// assert!(Role::find(&roles, 3).is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    /// Role identifier.
    pub id: RoleId,
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Role {
    /// Create a role without a description.
    pub fn new(id: RoleId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
        }
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Find a role by id.
    pub fn find(roles: &[Role], id: RoleId) -> Option<&Role> {
        roles.iter().find(|role| role.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_deserialize_without_description() {
        let role: Role = serde_json::from_str(r#"{"id": 3, "name": "Auditor"}"#).unwrap();
        assert_eq!(role, Role::new(3, "Auditor"));
    }

    #[test]
    fn test_role_with_description_round_trip() {
        let role = Role::new(1, "Clerk").with_description("Enters orders");
        let json = serde_json::to_string(&role).unwrap();
        assert!(json.contains("\"description\":\"Enters orders\""));
    }
}
