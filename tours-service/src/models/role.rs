//! Role model - fixed admin roles.
//!
//! Roles are a closed set defined at compile time; users store the role code
//! as text. There is no runtime role editing.

use serde::{Deserialize, Serialize};

/// Admin role codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Editor,
    Viewer,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::SuperAdmin, Role::Admin, Role::Editor, Role::Viewer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Viewer => "viewer",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "Super Admin",
            Role::Admin => "Admin",
            Role::Editor => "Editor",
            Role::Viewer => "Viewer",
        }
    }

    /// Parse a stored role code. Unknown codes yield None so callers deny by
    /// default.
    pub fn parse(code: &str) -> Option<Role> {
        match code {
            "super_admin" => Some(Role::SuperAdmin),
            "admin" => Some(Role::Admin),
            "editor" => Some(Role::Editor),
            "viewer" => Some(Role::Viewer),
            _ => None,
        }
    }
}

/// Role description for the admin API.
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub code: &'static str,
    pub label: &'static str,
    pub capabilities: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_every_role() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }

    #[test]
    fn parse_rejects_unknown_codes() {
        assert_eq!(Role::parse("root"), None);
        assert_eq!(Role::parse(""), None);
        assert_eq!(Role::parse("Admin"), None);
    }
}
