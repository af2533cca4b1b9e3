use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use snyk_sync_core::AppError;

/// Top-level tenant container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Upstream group identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Web URL of the group.
    pub url: String,
}

/// Organization membership reported on a group member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMemberOrg {
    /// Organization display name.
    pub name: String,
    /// Role slug held in that organization.
    pub role: String,
}

/// User attached directly to the group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    /// Upstream user identifier.
    pub id: String,
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Raw group role string, normally one of [`GroupRole`].
    pub group_role: String,
    /// Organizations the user belongs to.
    pub orgs: Vec<GroupMemberOrg>,
}

impl GroupMember {
    /// Returns the group role when it belongs to the closed role set.
    #[must_use]
    pub fn known_group_role(&self) -> Option<GroupRole> {
        GroupRole::from_str(self.group_role.as_str()).ok()
    }
}

/// Closed set of group-level roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupRole {
    /// Group administrator.
    Admin,
    /// Regular group member.
    Member,
    /// Read-only group member.
    Viewer,
}

impl GroupRole {
    /// Returns the upstream role slug.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
            Self::Viewer => "viewer",
        }
    }

    /// Returns all group roles.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[GroupRole] = &[GroupRole::Admin, GroupRole::Member, GroupRole::Viewer];

        ALL
    }
}

impl FromStr for GroupRole {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            "viewer" => Ok(Self::Viewer),
            _ => Err(AppError::Validation(format!(
                "unknown group role '{value}'"
            ))),
        }
    }
}

impl Display for GroupRole {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}
