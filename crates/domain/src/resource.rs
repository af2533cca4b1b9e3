use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use snyk_sync_core::AppError;

/// Resource kinds exposed to the identity-governance host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// The configured top-level group.
    Group,
    /// Organization inside the group.
    #[serde(rename = "org")]
    Organization,
    /// User principal.
    User,
}

/// Shape a resource type takes in the host model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceTrait {
    /// Container with members.
    Group,
    /// Principal.
    User,
}

impl ResourceType {
    /// Returns the stable resource type identifier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Organization => "org",
            Self::User => "user",
        }
    }

    /// Returns the trait describing this resource type.
    #[must_use]
    pub fn resource_trait(&self) -> ResourceTrait {
        match self {
            Self::Group | Self::Organization => ResourceTrait::Group,
            Self::User => ResourceTrait::User,
        }
    }

    /// Returns whether entitlements and grants are never listed for this type.
    #[must_use]
    pub fn skips_entitlements_and_grants(&self) -> bool {
        matches!(self, Self::User)
    }
}

impl FromStr for ResourceType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "group" => Ok(Self::Group),
            "org" => Ok(Self::Organization),
            "user" => Ok(Self::User),
            _ => Err(AppError::Validation(format!(
                "unknown resource type '{value}'"
            ))),
        }
    }
}

impl Display for ResourceType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Typed reference to one resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId {
    resource_type: ResourceType,
    resource: String,
}

impl ResourceId {
    /// Creates a resource reference.
    #[must_use]
    pub fn new(resource_type: ResourceType, resource: impl Into<String>) -> Self {
        Self {
            resource_type,
            resource: resource.into(),
        }
    }

    /// Returns the resource type.
    #[must_use]
    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// Returns the upstream identifier.
    #[must_use]
    pub fn resource(&self) -> &str {
        self.resource.as_str()
    }
}

impl Display for ResourceId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}:{}", self.resource_type, self.resource)
    }
}

/// Resource object handed to the host on listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    id: ResourceId,
    resource_trait: ResourceTrait,
    display_name: String,
    parent_id: Option<ResourceId>,
    profile: Map<String, Value>,
    child_resource_types: Vec<ResourceType>,
}

impl Resource {
    /// Creates a resource with an empty profile and no parent.
    #[must_use]
    pub fn new(id: ResourceId, display_name: impl Into<String>) -> Self {
        Self {
            resource_trait: id.resource_type().resource_trait(),
            id,
            display_name: display_name.into(),
            parent_id: None,
            profile: Map::new(),
            child_resource_types: Vec::new(),
        }
    }

    /// Sets the parent resource.
    #[must_use]
    pub fn with_parent(mut self, parent_id: ResourceId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Adds one profile attribute.
    #[must_use]
    pub fn with_profile_value(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.profile.insert(key.to_owned(), value.into());
        self
    }

    /// Declares the resource types listed beneath this resource.
    #[must_use]
    pub fn with_child_resource_types(mut self, child_resource_types: Vec<ResourceType>) -> Self {
        self.child_resource_types = child_resource_types;
        self
    }

    /// Returns the resource reference.
    #[must_use]
    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    /// Returns the host trait derived from the resource type.
    #[must_use]
    pub fn resource_trait(&self) -> ResourceTrait {
        self.resource_trait
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the parent resource, if any.
    #[must_use]
    pub fn parent_id(&self) -> Option<&ResourceId> {
        self.parent_id.as_ref()
    }

    /// Returns profile attributes.
    #[must_use]
    pub fn profile(&self) -> &Map<String, Value> {
        &self.profile
    }

    /// Returns the child resource types.
    #[must_use]
    pub fn child_resource_types(&self) -> &[ResourceType] {
        self.child_resource_types.as_slice()
    }
}
