use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use snyk_sync_core::{AppError, AppResult};
use snyk_sync_domain::{
    Group, GroupMember, MINIMAL_ROLE_SLUG, OrgMember, Organization, Role, RoleScope,
};

use crate::{OrganizationPage, PageRequest, SnykApi, filter_roles};

/// Upstream call recorded by [`FakeSnykApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    GroupDetails,
    ListGroupMembers,
    ListOrgMembers(String),
    ListRoles,
    ListOrganizations(PageRequest),
    AddOrgMember { org_id: String, user_id: String },
    RemoveOrgMember { org_id: String, user_id: String },
    UpdateOrgMemberRole {
        org_id: String,
        user_id: String,
        role_id: String,
    },
}

impl ApiCall {
    fn is_write(&self) -> bool {
        matches!(
            self,
            Self::AddOrgMember { .. } | Self::RemoveOrgMember { .. } | Self::UpdateOrgMemberRole { .. }
        )
    }
}

/// In-memory upstream that applies writes to its own membership state.
pub struct FakeSnykApi {
    group: Group,
    group_members: Vec<GroupMember>,
    roles: Vec<Role>,
    organization_pages: HashMap<Option<String>, OrganizationPage>,
    org_members: Mutex<HashMap<String, Vec<OrgMember>>>,
    calls: Mutex<Vec<ApiCall>>,
    reject_group_details: bool,
}

impl Default for FakeSnykApi {
    fn default() -> Self {
        Self {
            group: Group {
                id: "g1".to_owned(),
                name: "Acme Group".to_owned(),
                url: "https://app.example/group/g1".to_owned(),
            },
            group_members: Vec::new(),
            roles: Vec::new(),
            organization_pages: HashMap::new(),
            org_members: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            reject_group_details: false,
        }
    }
}

impl FakeSnykApi {
    pub fn with_group_members(mut self, members: Vec<GroupMember>) -> Self {
        self.group_members = members;
        self
    }

    pub fn with_roles(mut self, roles: Vec<Role>) -> Self {
        self.roles = roles;
        self
    }

    pub fn with_org_members(mut self, org_id: &str, members: Vec<OrgMember>) -> Self {
        self.org_members
            .get_mut()
            .insert(org_id.to_owned(), members);
        self
    }

    pub fn with_organization_page(
        mut self,
        page_url: Option<&str>,
        organizations: Vec<Organization>,
        link_header: &str,
    ) -> Self {
        self.organization_pages.insert(
            page_url.map(ToOwned::to_owned),
            OrganizationPage {
                organizations,
                link_header: link_header.to_owned(),
            },
        );
        self
    }

    pub fn rejecting_group_details(mut self) -> Self {
        self.reject_group_details = true;
        self
    }

    pub async fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().await.clone()
    }

    pub async fn writes(&self) -> Vec<ApiCall> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|call| call.is_write())
            .cloned()
            .collect()
    }

    pub async fn org_member_role(&self, org_id: &str, user_id: &str) -> Option<String> {
        self.org_members
            .lock()
            .await
            .get(org_id)
            .and_then(|members| members.iter().find(|member| member.id == user_id))
            .map(|member| member.role.clone())
    }

    async fn record(&self, call: ApiCall) {
        self.calls.lock().await.push(call);
    }
}

#[async_trait]
impl SnykApi for FakeSnykApi {
    async fn group_details(&self) -> AppResult<Group> {
        self.record(ApiCall::GroupDetails).await;
        if self.reject_group_details {
            return Err(AppError::Upstream {
                status: 401,
                message: Some("invalid token".to_owned()),
            });
        }

        Ok(self.group.clone())
    }

    async fn list_group_members(&self) -> AppResult<Vec<GroupMember>> {
        self.record(ApiCall::ListGroupMembers).await;
        Ok(self.group_members.clone())
    }

    async fn list_org_members(&self, org_id: &str) -> AppResult<Vec<OrgMember>> {
        self.record(ApiCall::ListOrgMembers(org_id.to_owned())).await;
        Ok(self
            .org_members
            .lock()
            .await
            .get(org_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.record(ApiCall::ListRoles).await;
        Ok(self.roles.clone())
    }

    async fn list_organizations(&self, request: &PageRequest) -> AppResult<OrganizationPage> {
        self.record(ApiCall::ListOrganizations(request.clone())).await;
        self.organization_pages
            .get(&request.page_url)
            .cloned()
            .ok_or_else(|| AppError::Upstream {
                status: 404,
                message: None,
            })
    }

    async fn add_org_member(&self, org_id: &str, user_id: &str) -> AppResult<()> {
        self.record(ApiCall::AddOrgMember {
            org_id: org_id.to_owned(),
            user_id: user_id.to_owned(),
        })
        .await;

        let mut org_members = self.org_members.lock().await;
        let members = org_members.entry(org_id.to_owned()).or_default();
        if !members.iter().any(|member| member.id == user_id) {
            members.push(org_member(user_id, MINIMAL_ROLE_SLUG));
        }
        Ok(())
    }

    async fn remove_org_member(&self, org_id: &str, user_id: &str) -> AppResult<()> {
        self.record(ApiCall::RemoveOrgMember {
            org_id: org_id.to_owned(),
            user_id: user_id.to_owned(),
        })
        .await;

        if let Some(members) = self.org_members.lock().await.get_mut(org_id) {
            members.retain(|member| member.id != user_id);
        }
        Ok(())
    }

    async fn update_org_member_role(
        &self,
        org_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> AppResult<()> {
        self.record(ApiCall::UpdateOrgMemberRole {
            org_id: org_id.to_owned(),
            user_id: user_id.to_owned(),
            role_id: role_id.to_owned(),
        })
        .await;

        let slug = filter_roles(&self.roles, RoleScope::Org)
            .into_iter()
            .find(|role| role.public_id() == role_id)
            .map(|role| role.slug().to_owned())
            .ok_or_else(|| AppError::Upstream {
                status: 400,
                message: Some(format!("unknown role {role_id}")),
            })?;

        let mut org_members = self.org_members.lock().await;
        let member = org_members
            .get_mut(org_id)
            .and_then(|members| members.iter_mut().find(|member| member.id == user_id))
            .ok_or_else(|| AppError::Upstream {
                status: 404,
                message: Some(format!("user {user_id} is not a member")),
            })?;
        member.role = slug;
        Ok(())
    }
}

pub fn role(public_id: &str, name: &str) -> Role {
    Role {
        public_id: public_id.to_owned(),
        name: name.to_owned(),
        description: format!("{name} role"),
        created: None,
        modified: None,
    }
}

pub fn org_member(id: &str, role: &str) -> OrgMember {
    OrgMember {
        id: id.to_owned(),
        username: format!("{id}-login"),
        email: format!("{id}@example.com"),
        name: format!("User {id}"),
        role: role.to_owned(),
    }
}

pub fn group_member(id: &str, group_role: &str) -> GroupMember {
    GroupMember {
        id: id.to_owned(),
        username: format!("{id}-login"),
        email: format!("{id}@example.com"),
        name: format!("User {id}"),
        group_role: group_role.to_owned(),
        orgs: Vec::new(),
    }
}

pub fn organization(id: &str, name: &str) -> Organization {
    Organization {
        id: id.to_owned(),
        name: name.to_owned(),
        slug: name.to_lowercase(),
        url: format!("https://app.example/org/{id}"),
        group: None,
    }
}
