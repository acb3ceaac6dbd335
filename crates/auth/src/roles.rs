use core::str::FromStr;

use serde::{Deserialize, Serialize};

use rolegate_core::DomainError;

/// Account role.
///
/// The ordering only exists for display and sorting. Authorization rules are
/// written per role in [`crate::policy`]; they never compare ranks.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    #[default]
    Regular,
    Moderator,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Regular, Role::Moderator, Role::Admin];

    pub const fn rank(self) -> u8 {
        match self {
            Role::Regular => 0,
            Role::Moderator => 1,
            Role::Admin => 2,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Regular => "Regular",
            Role::Moderator => "Moderator",
            Role::Admin => "Admin",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "regular" => Ok(Role::Regular),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            other => Err(DomainError::validation(format!(
                "unknown role '{other}': must be one of Regular, Moderator, Admin"
            ))),
        }
    }
}
