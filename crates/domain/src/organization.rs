use serde::{Deserialize, Serialize};

use crate::Group;

/// Child container of a group with its own members and roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Upstream organization identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// URL slug.
    pub slug: String,
    /// Web URL of the organization.
    pub url: String,
    /// Owning group, when reported.
    pub group: Option<Group>,
}

/// User attached to an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgMember {
    /// Upstream user identifier.
    pub id: String,
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Role slug currently held, e.g. `admin` or `collaborator`.
    pub role: String,
}
