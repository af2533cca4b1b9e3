use async_trait::async_trait;

use snyk_sync_core::{AppError, AppResult};
use snyk_sync_domain::{Entitlement, Grant, Resource, ResourceId, ResourceType};
use tracing::warn;

/// One page of resources and the token for the following page.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResourcePage {
    /// Resources on this page.
    pub resources: Vec<Resource>,
    /// Opaque token for the next call; empty when the listing is exhausted.
    pub next_page_token: String,
}

impl ResourcePage {
    /// Creates an exhausted page with the given resources.
    #[must_use]
    pub fn last(resources: Vec<Resource>) -> Self {
        Self {
            resources,
            next_page_token: String::new(),
        }
    }
}

/// Read side of the resource sync protocol for one resource type.
#[async_trait]
pub trait ResourceSyncer: Send + Sync {
    /// Returns the resource type handled by this syncer.
    fn resource_type(&self) -> ResourceType;

    /// Lists one page of resources under `parent`.
    async fn list(&self, parent: Option<&ResourceId>, page_token: &str)
    -> AppResult<ResourcePage>;

    /// Lists the entitlements offered by `resource`.
    async fn entitlements(&self, resource: &Resource) -> AppResult<Vec<Entitlement>>;

    /// Lists the grants currently held on `resource`.
    async fn grants(&self, resource: &Resource) -> AppResult<Vec<Grant>>;
}

/// Write side of the resource sync protocol.
#[async_trait]
pub trait ResourceProvisioner: Send + Sync {
    /// Gives `principal` the entitlement.
    async fn grant(&self, principal: &ResourceId, entitlement: &Entitlement) -> AppResult<()>;

    /// Takes the granted entitlement away from its principal.
    async fn revoke(&self, grant: &Grant) -> AppResult<()>;
}

/// Rejects principals other than users before any upstream call.
pub(crate) fn ensure_user_principal(principal: &ResourceId, operation: &str) -> AppResult<()> {
    if principal.resource_type() == ResourceType::User {
        return Ok(());
    }

    warn!(
        principal_id = %principal,
        principal_type = %principal.resource_type(),
        operation,
        "rejected non-user principal for organization entitlement"
    );

    Err(AppError::UnsupportedPrincipal(format!(
        "only users can be {operation} organization entitlements, got '{principal}'"
    )))
}
