//! Organization listing, entitlement reconciliation and provisioning.
//!
//! Every organization exposes one membership entitlement plus one permission
//! entitlement per org-scoped role, keyed by the role public id. A member
//! always holds exactly one role upstream, so revoking a permission lowers the
//! member to the minimal default role instead of removing them, unless the
//! minimal role itself is being revoked.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use snyk_sync_core::{AppError, AppResult};
use snyk_sync_domain::{
    Entitlement, Grant, MINIMAL_ROLE_SLUG, ORG_MEMBERSHIP_SLUG, OrgEntitlement, Organization,
    Resource, ResourceId, ResourceType, ScopedRole, parse_link_header, parse_page_token,
};
use tracing::{debug, info, warn};

use crate::resource_syncer::ensure_user_principal;
use crate::{
    PageRequest, RESOURCES_PAGE_SIZE, ResourcePage, ResourceProvisioner, ResourceSyncer, SnykApi,
    fetch_org_roles,
};

/// Upstream write chosen for a permission revoke.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RevokePlan {
    /// Revoking the minimal role ends the membership.
    RemoveMembership,
    /// Revoking a higher role falls back to the minimal role.
    Downgrade {
        /// Public id of the minimal default role.
        minimal_role_id: String,
    },
}

/// Syncs organizations of the group and provisions their memberships and roles.
#[derive(Clone)]
pub struct OrganizationSyncer {
    api: Arc<dyn SnykApi>,
    allowed_org_ids: HashSet<String>,
    page_size: u32,
}

impl OrganizationSyncer {
    /// Creates an organization syncer.
    ///
    /// When `allowed_org_ids` is non-empty only those organizations are listed.
    #[must_use]
    pub fn new(api: Arc<dyn SnykApi>, allowed_org_ids: impl IntoIterator<Item = String>) -> Self {
        Self {
            api,
            allowed_org_ids: allowed_org_ids.into_iter().collect(),
            page_size: RESOURCES_PAGE_SIZE,
        }
    }

    /// Overrides the page-size hint sent on organization listings.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn is_allowed(&self, org_id: &str) -> bool {
        self.allowed_org_ids.is_empty() || self.allowed_org_ids.contains(org_id)
    }

    async fn grant_permission(&self, org_id: &str, user_id: &str, role_id: &str) -> AppResult<()> {
        let roles = fetch_org_roles(self.api.as_ref()).await?;
        if !roles.iter().any(|role| role.public_id() == role_id) {
            return Err(AppError::NotFound(format!("role {role_id} not found")));
        }

        self.api
            .update_org_member_role(org_id, user_id, role_id)
            .await?;
        info!(org_id, user_id, role_id, "updated organization member role");
        Ok(())
    }

    async fn revoke_permission(&self, org_id: &str, user_id: &str, role_id: &str) -> AppResult<()> {
        let roles = fetch_org_roles(self.api.as_ref()).await?;

        match plan_revoke(&roles, role_id)? {
            RevokePlan::RemoveMembership => {
                self.api.remove_org_member(org_id, user_id).await?;
                info!(
                    org_id,
                    user_id, role_id, "revoked minimal role by removing organization member"
                );
            }
            RevokePlan::Downgrade { minimal_role_id } => {
                self.api
                    .update_org_member_role(org_id, user_id, minimal_role_id.as_str())
                    .await?;
                info!(
                    org_id,
                    user_id,
                    role_id,
                    minimal_role_id = %minimal_role_id,
                    "downgraded organization member to minimal role"
                );
            }
        }

        Ok(())
    }
}

/// Decides how revoking `role_id` is applied given the current role list.
fn plan_revoke(roles: &[ScopedRole], role_id: &str) -> AppResult<RevokePlan> {
    if !roles.iter().any(|role| role.public_id() == role_id) {
        return Err(AppError::NotFound(format!("role {role_id} not found")));
    }

    let minimal = roles.iter().find(|role| role.is_minimal()).ok_or_else(|| {
        AppError::NotFound(format!(
            "minimal default role {MINIMAL_ROLE_SLUG} not found"
        ))
    })?;

    if minimal.public_id() == role_id {
        return Ok(RevokePlan::RemoveMembership);
    }

    Ok(RevokePlan::Downgrade {
        minimal_role_id: minimal.public_id().to_owned(),
    })
}

fn org_resource(org: &Organization, parent_id: &ResourceId) -> Resource {
    Resource::new(
        ResourceId::new(ResourceType::Organization, org.id.as_str()),
        org.name.as_str(),
    )
    .with_parent(parent_id.clone())
    .with_profile_value("displayName", org.name.as_str())
    .with_profile_value("slug", org.slug.as_str())
    .with_profile_value("url", org.url.as_str())
}

fn membership_entitlement(resource: &Resource) -> Entitlement {
    Entitlement::assignment(
        resource.id().clone(),
        ORG_MEMBERSHIP_SLUG,
        format!("{} {ORG_MEMBERSHIP_SLUG}", resource.display_name()),
        format!("Member of the {} organization", resource.display_name()),
    )
}

fn role_entitlement(resource: &Resource, role: &ScopedRole) -> Entitlement {
    Entitlement::permission(
        resource.id().clone(),
        role.public_id(),
        role.name(),
        role.description(),
    )
}

#[async_trait]
impl ResourceSyncer for OrganizationSyncer {
    fn resource_type(&self) -> ResourceType {
        ResourceType::Organization
    }

    async fn list(
        &self,
        parent: Option<&ResourceId>,
        page_token: &str,
    ) -> AppResult<ResourcePage> {
        let Some(parent) = parent else {
            return Ok(ResourcePage::default());
        };

        let (mut bag, page) = parse_page_token(page_token, ResourceType::Organization, None)?;
        let request = PageRequest {
            page_url: (!page.is_empty()).then_some(page),
            per_page: self.page_size,
        };
        let response = self.api.list_organizations(&request).await?;

        let resources = response
            .organizations
            .iter()
            .filter(|org| self.is_allowed(org.id.as_str()))
            .map(|org| org_resource(org, parent))
            .collect();

        let next_page = parse_link_header(response.link_header.as_str());
        debug!(
            listed = response.organizations.len(),
            page_depth = bag.depth(),
            has_more = next_page.is_some(),
            "listed organization page"
        );
        let next_page_token = bag.next_token(next_page.as_deref())?;

        Ok(ResourcePage {
            resources,
            next_page_token,
        })
    }

    async fn entitlements(&self, resource: &Resource) -> AppResult<Vec<Entitlement>> {
        let roles = fetch_org_roles(self.api.as_ref()).await?;

        let mut entitlements = Vec::with_capacity(roles.len() + 1);
        entitlements.push(membership_entitlement(resource));
        entitlements.extend(roles.iter().map(|role| role_entitlement(resource, role)));

        Ok(entitlements)
    }

    async fn grants(&self, resource: &Resource) -> AppResult<Vec<Grant>> {
        let org_id = resource.id().resource();
        let members = self.api.list_org_members(org_id).await?;
        let roles = fetch_org_roles(self.api.as_ref()).await?;
        let membership = membership_entitlement(resource);

        let mut grants = Vec::with_capacity(members.len() * 2);
        for member in members {
            let principal = ResourceId::new(ResourceType::User, member.id.as_str());
            grants.push(Grant::new(membership.clone(), principal.clone()));

            match roles
                .iter()
                .find(|role| role.slug().eq_ignore_ascii_case(member.role.trim()))
            {
                Some(role) => grants.push(Grant::new(role_entitlement(resource, role), principal)),
                None => warn!(
                    org_id,
                    user_id = %member.id,
                    member_role = %member.role,
                    "organization member role matches no org-scoped role"
                ),
            }
        }

        Ok(grants)
    }
}

#[async_trait]
impl ResourceProvisioner for OrganizationSyncer {
    async fn grant(&self, principal: &ResourceId, entitlement: &Entitlement) -> AppResult<()> {
        ensure_user_principal(principal, "granted")?;
        let target = OrgEntitlement::from_entitlement(entitlement)?;
        let org_id = entitlement.resource().resource();
        let user_id = principal.resource();

        match target {
            OrgEntitlement::Membership => {
                self.api.add_org_member(org_id, user_id).await?;
                info!(org_id, user_id, "added organization member");
                Ok(())
            }
            OrgEntitlement::Permission { role_id } => {
                self.grant_permission(org_id, user_id, role_id.as_str())
                    .await
            }
        }
    }

    async fn revoke(&self, grant: &Grant) -> AppResult<()> {
        let principal = grant.principal();
        ensure_user_principal(principal, "revoked")?;
        let entitlement = grant.entitlement();
        let target = OrgEntitlement::from_entitlement(entitlement)?;
        let org_id = entitlement.resource().resource();
        let user_id = principal.resource();

        match target {
            OrgEntitlement::Membership => {
                self.api.remove_org_member(org_id, user_id).await?;
                info!(org_id, user_id, "removed organization member");
                Ok(())
            }
            OrgEntitlement::Permission { role_id } => {
                self.revoke_permission(org_id, user_id, role_id.as_str())
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests;
