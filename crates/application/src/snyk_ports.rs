use async_trait::async_trait;

use snyk_sync_core::AppResult;
use snyk_sync_domain::{Group, GroupMember, OrgMember, Organization, Role};

/// Default number of organizations requested per page.
pub const RESOURCES_PAGE_SIZE: u32 = 50;

/// Pagination parameters for paged upstream listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Next-page URL taken from a previous `Link` header; `None` starts over.
    pub page_url: Option<String>,
    /// Page-size hint sent as `perPage`.
    pub per_page: u32,
}

impl PageRequest {
    /// Creates a request for the first page.
    #[must_use]
    pub fn first(per_page: u32) -> Self {
        Self {
            page_url: None,
            per_page,
        }
    }
}

/// One page of organizations plus the raw continuation link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationPage {
    /// Organizations on this page.
    pub organizations: Vec<Organization>,
    /// Raw `Link` response header value, empty when absent.
    pub link_header: String,
}

/// Port for the upstream vulnerability-management API, scoped to one group.
#[async_trait]
pub trait SnykApi: Send + Sync {
    /// Fetches metadata of the configured group.
    async fn group_details(&self) -> AppResult<Group>;

    /// Lists users attached to the group.
    async fn list_group_members(&self) -> AppResult<Vec<GroupMember>>;

    /// Lists users of one organization, group admins included.
    async fn list_org_members(&self, org_id: &str) -> AppResult<Vec<OrgMember>>;

    /// Lists every role defined in the group, unclassified.
    async fn list_roles(&self) -> AppResult<Vec<Role>>;

    /// Lists one page of organizations in the group.
    async fn list_organizations(&self, request: &PageRequest) -> AppResult<OrganizationPage>;

    /// Adds a user to an organization with the minimal default role.
    async fn add_org_member(&self, org_id: &str, user_id: &str) -> AppResult<()>;

    /// Removes a user from an organization.
    async fn remove_org_member(&self, org_id: &str, user_id: &str) -> AppResult<()>;

    /// Replaces the role a user holds in an organization.
    async fn update_org_member_role(
        &self,
        org_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> AppResult<()>;
}
