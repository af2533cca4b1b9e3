use std::sync::Arc;

use async_trait::async_trait;

use snyk_sync_core::AppResult;
use snyk_sync_domain::{Entitlement, Grant, GroupMember, Resource, ResourceId, ResourceType};

use crate::{ResourcePage, ResourceSyncer, SnykApi};

/// Syncs group members as user principals.
#[derive(Clone)]
pub struct UserSyncer {
    api: Arc<dyn SnykApi>,
}

impl UserSyncer {
    /// Creates a user syncer.
    #[must_use]
    pub fn new(api: Arc<dyn SnykApi>) -> Self {
        Self { api }
    }
}

fn user_resource(member: &GroupMember, parent_id: &ResourceId) -> Resource {
    let display_name = if member.name.trim().is_empty() {
        member.username.as_str()
    } else {
        member.name.as_str()
    };

    Resource::new(
        ResourceId::new(ResourceType::User, member.id.as_str()),
        display_name,
    )
    .with_parent(parent_id.clone())
    .with_profile_value("displayName", member.name.as_str())
    .with_profile_value("email", member.email.as_str())
    .with_profile_value("role", member.group_role.as_str())
}

#[async_trait]
impl ResourceSyncer for UserSyncer {
    fn resource_type(&self) -> ResourceType {
        ResourceType::User
    }

    async fn list(
        &self,
        parent: Option<&ResourceId>,
        _page_token: &str,
    ) -> AppResult<ResourcePage> {
        let Some(parent) = parent else {
            return Ok(ResourcePage::default());
        };

        let members = self.api.list_group_members().await?;
        Ok(ResourcePage::last(
            members
                .iter()
                .map(|member| user_resource(member, parent))
                .collect(),
        ))
    }

    // Users carry no entitlements of their own.
    async fn entitlements(&self, _resource: &Resource) -> AppResult<Vec<Entitlement>> {
        Ok(Vec::new())
    }

    async fn grants(&self, _resource: &Resource) -> AppResult<Vec<Grant>> {
        Ok(Vec::new())
    }
}
