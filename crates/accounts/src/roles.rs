use serde::{Deserialize, Serialize};

/// User role.
///
/// A closed set because the string values are part of the stored-document
/// compatibility surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    #[default]
    #[serde(rename = "client")]
    Client,
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "staff-member")]
    StaffMember,
    #[serde(rename = "super-admin")]
    SuperAdmin,
}

impl Role {
    /// Whether this role may manage other users (role changes, status
    /// toggles, soft delete).
    pub fn can_manage_users(self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }

    /// Whether this role may grant `target` to another user. Only a
    /// super-admin can mint another super-admin.
    pub fn can_grant(self, target: Role) -> bool {
        match target {
            Role::SuperAdmin => self == Role::SuperAdmin,
            _ => self.can_manage_users(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Admin => "admin",
            Role::StaffMember => "staff-member",
            Role::SuperAdmin => "super-admin",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
