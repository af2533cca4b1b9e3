use std::sync::Arc;

use async_trait::async_trait;

use snyk_sync_core::AppResult;
use snyk_sync_domain::{
    Entitlement, Grant, Group, GroupRole, Resource, ResourceId, ResourceType,
};
use tracing::debug;

use crate::{ResourcePage, ResourceSyncer, SnykApi};

/// Syncs the configured group, its fixed role entitlements and member grants.
#[derive(Clone)]
pub struct GroupSyncer {
    api: Arc<dyn SnykApi>,
}

impl GroupSyncer {
    /// Creates a group syncer.
    #[must_use]
    pub fn new(api: Arc<dyn SnykApi>) -> Self {
        Self { api }
    }
}

fn group_resource(group: &Group) -> Resource {
    Resource::new(
        ResourceId::new(ResourceType::Group, group.id.as_str()),
        group.name.as_str(),
    )
    .with_profile_value("displayName", group.name.as_str())
    .with_profile_value("url", group.url.as_str())
    .with_child_resource_types(vec![ResourceType::Organization, ResourceType::User])
}

fn group_role_entitlement(resource: &Resource, role: GroupRole) -> Entitlement {
    Entitlement::permission(
        resource.id().clone(),
        role.as_str(),
        format!("{} {role}", resource.display_name()),
        format!("{role} role in the {} group", resource.display_name()),
    )
}

#[async_trait]
impl ResourceSyncer for GroupSyncer {
    fn resource_type(&self) -> ResourceType {
        ResourceType::Group
    }

    async fn list(
        &self,
        _parent: Option<&ResourceId>,
        _page_token: &str,
    ) -> AppResult<ResourcePage> {
        let group = self.api.group_details().await?;
        Ok(ResourcePage::last(vec![group_resource(&group)]))
    }

    async fn entitlements(&self, resource: &Resource) -> AppResult<Vec<Entitlement>> {
        Ok(GroupRole::all()
            .iter()
            .map(|role| group_role_entitlement(resource, *role))
            .collect())
    }

    async fn grants(&self, resource: &Resource) -> AppResult<Vec<Grant>> {
        let members = self.api.list_group_members().await?;

        Ok(members
            .into_iter()
            .filter_map(|member| {
                let Some(role) = member.known_group_role() else {
                    debug!(
                        user_id = %member.id,
                        group_role = %member.group_role,
                        "group member role has no entitlement"
                    );
                    return None;
                };

                Some(Grant::new(
                    group_role_entitlement(resource, role),
                    ResourceId::new(ResourceType::User, member.id),
                ))
            })
            .collect())
    }
}
