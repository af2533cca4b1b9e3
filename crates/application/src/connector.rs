use std::sync::Arc;

use serde::Serialize;

use snyk_sync_core::{AppError, AppResult};
use tracing::{info, warn};

use crate::{
    GroupSyncer, OrganizationSyncer, ResourceProvisioner, ResourceSyncer, SnykApi, UserSyncer,
};

/// Static description of the connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectorMetadata {
    /// Human readable connector name.
    pub display_name: String,
    /// Short connector description.
    pub description: String,
}

/// Entry point wiring the Snyk syncers around one upstream client.
#[derive(Clone)]
pub struct SnykConnector {
    api: Arc<dyn SnykApi>,
    group_id: String,
    organizations: Arc<OrganizationSyncer>,
}

impl SnykConnector {
    /// Creates a connector for `group_id`, optionally restricted to `org_ids`.
    #[must_use]
    pub fn new(
        api: Arc<dyn SnykApi>,
        group_id: impl Into<String>,
        org_ids: impl IntoIterator<Item = String>,
        page_size: u32,
    ) -> Self {
        let organizations =
            Arc::new(OrganizationSyncer::new(api.clone(), org_ids).with_page_size(page_size));

        Self {
            api,
            group_id: group_id.into(),
            organizations,
        }
    }

    /// Returns connector metadata.
    #[must_use]
    pub fn metadata(&self) -> ConnectorMetadata {
        ConnectorMetadata {
            display_name: "Snyk".to_owned(),
            description: "Connector syncing Snyk parent group and its organizations and users"
                .to_owned(),
        }
    }

    /// Checks that the configured credentials can read the group.
    pub async fn validate(&self) -> AppResult<()> {
        match self.api.group_details().await {
            Ok(group) => {
                info!(group_id = %group.id, group_name = %group.name, "validated credentials");
                Ok(())
            }
            Err(error) => {
                warn!(group_id = %self.group_id, error = %error, "credential validation failed");
                Err(AppError::Unauthorized(format!(
                    "failed to validate credentials for group {}",
                    self.group_id
                )))
            }
        }
    }

    /// Returns one syncer per resource type, group first.
    #[must_use]
    pub fn resource_syncers(&self) -> Vec<Arc<dyn ResourceSyncer>> {
        vec![
            Arc::new(GroupSyncer::new(self.api.clone())),
            self.organizations.clone(),
            Arc::new(UserSyncer::new(self.api.clone())),
        ]
    }

    /// Returns the provisioner for organization entitlements.
    #[must_use]
    pub fn organizations(&self) -> Arc<dyn ResourceProvisioner> {
        self.organizations.clone()
    }
}
