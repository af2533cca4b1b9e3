use serde::{Deserialize, Serialize};
use snyk_sync_core::{AppError, AppResult};

use crate::{ResourceId, ResourceType};

/// Slug of the singleton organization membership entitlement.
pub const ORG_MEMBERSHIP_SLUG: &str = "member";

/// Family an entitlement belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitlementKind {
    /// Membership in a container.
    Assignment,
    /// Permission level inside a container.
    Permission,
}

/// Grantable capability on one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlement {
    resource: ResourceId,
    slug: String,
    kind: EntitlementKind,
    display_name: String,
    description: String,
    grantable_to: Vec<ResourceType>,
}

impl Entitlement {
    /// Creates a membership entitlement grantable to users.
    #[must_use]
    pub fn assignment(
        resource: ResourceId,
        slug: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::build(
            resource,
            slug.into(),
            EntitlementKind::Assignment,
            display_name.into(),
            description.into(),
        )
    }

    /// Creates a permission entitlement grantable to users.
    #[must_use]
    pub fn permission(
        resource: ResourceId,
        slug: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::build(
            resource,
            slug.into(),
            EntitlementKind::Permission,
            display_name.into(),
            description.into(),
        )
    }

    fn build(
        resource: ResourceId,
        slug: String,
        kind: EntitlementKind,
        display_name: String,
        description: String,
    ) -> Self {
        Self {
            resource,
            slug,
            kind,
            display_name,
            description,
            grantable_to: vec![ResourceType::User],
        }
    }

    /// Returns the stable identifier `type:id:slug`.
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}:{}", self.resource, self.slug)
    }

    /// Returns the resource the entitlement belongs to.
    #[must_use]
    pub fn resource(&self) -> &ResourceId {
        &self.resource
    }

    /// Returns the entitlement slug.
    #[must_use]
    pub fn slug(&self) -> &str {
        self.slug.as_str()
    }

    /// Returns the entitlement family.
    #[must_use]
    pub fn kind(&self) -> EntitlementKind {
        self.kind
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Returns principal types that may hold the entitlement.
    #[must_use]
    pub fn grantable_to(&self) -> &[ResourceType] {
        self.grantable_to.as_slice()
    }
}

/// Edge recording that a principal holds an entitlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    entitlement: Entitlement,
    principal: ResourceId,
}

impl Grant {
    /// Creates a grant edge.
    #[must_use]
    pub fn new(entitlement: Entitlement, principal: ResourceId) -> Self {
        Self {
            entitlement,
            principal,
        }
    }

    /// Returns the stable identifier `entitlement_id:principal_type:principal_id`.
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}:{}", self.entitlement.id(), self.principal)
    }

    /// Returns the granted entitlement.
    #[must_use]
    pub fn entitlement(&self) -> &Entitlement {
        &self.entitlement
    }

    /// Returns the principal holding the entitlement.
    #[must_use]
    pub fn principal(&self) -> &ResourceId {
        &self.principal
    }
}

/// Organization entitlement resolved for provisioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrgEntitlement {
    /// Singleton membership entitlement.
    Membership,
    /// Role entitlement keyed by the upstream role public id.
    Permission {
        /// Upstream role public identifier.
        role_id: String,
    },
}

impl OrgEntitlement {
    /// Resolves an organization entitlement from its host representation.
    pub fn from_entitlement(entitlement: &Entitlement) -> AppResult<Self> {
        if entitlement.resource().resource_type() != ResourceType::Organization {
            return Err(AppError::Validation(format!(
                "entitlement '{}' does not belong to an organization",
                entitlement.id()
            )));
        }

        match entitlement.kind() {
            EntitlementKind::Assignment if entitlement.slug() == ORG_MEMBERSHIP_SLUG => {
                Ok(Self::Membership)
            }
            EntitlementKind::Assignment => Err(AppError::Validation(format!(
                "unknown organization assignment entitlement '{}'",
                entitlement.slug()
            ))),
            EntitlementKind::Permission if entitlement.slug().trim().is_empty() => {
                Err(AppError::Validation(
                    "organization permission entitlement has an empty role id".to_owned(),
                ))
            }
            EntitlementKind::Permission => Ok(Self::Permission {
                role_id: entitlement.slug().to_owned(),
            }),
        }
    }
}
