//! Role model and related functionality

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role carried in a bearer token's `role` claim
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Department administrator, may open administrative screens
    Admin,
    /// Regular account created through signup
    Student,
    /// Any other role name the backend issues
    Other(String),
}

impl Role {
    /// Role name as it appears in the token claim
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Student => "student",
            Role::Other(name) => name,
        }
    }
}

impl From<&str> for Role {
    fn from(name: &str) -> Self {
        match name {
            "admin" => Role::Admin,
            "student" => Role::Student,
            other => Role::Other(other.to_string()),
        }
    }
}

impl From<String> for Role {
    fn from(name: String) -> Self {
        Role::from(name.as_str())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_names_round_trip() {
        for name in ["admin", "student", "faculty"] {
            assert_eq!(Role::from(name).as_str(), name);
        }
        assert_eq!(Role::from("admin"), Role::Admin);
        assert_eq!(Role::from("Admin"), Role::Other("Admin".to_string()));
    }

    #[test]
    fn test_serde_uses_plain_strings() {
        let json = serde_json::to_string(&Role::Admin).unwrap();
        assert_eq!(json, r#""admin""#);
        let role: Role = serde_json::from_str(r#""student""#).unwrap();
        assert_eq!(role, Role::Student);
    }
}
