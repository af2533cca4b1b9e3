use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use serde::Serialize;

use snyk_sync_core::{AppError, AppResult};
use snyk_sync_domain::{Entitlement, Grant, Resource, ResourceId, ResourceType};
use tracing::{debug, info};

use crate::ResourceSyncer;

/// Everything collected by one full sync pass.
#[derive(Debug, Default, Serialize)]
pub struct SyncSnapshot {
    /// Listed resources, parents before children.
    pub resources: Vec<Resource>,
    /// Entitlements of every listed resource.
    pub entitlements: Vec<Entitlement>,
    /// Grants of every listed resource.
    pub grants: Vec<Grant>,
}

/// Walks the resource hierarchy from the group down, following page tokens.
pub struct SyncRunner {
    syncers: HashMap<ResourceType, Arc<dyn ResourceSyncer>>,
}

impl SyncRunner {
    /// Creates a runner over one syncer per resource type.
    #[must_use]
    pub fn new(syncers: Vec<Arc<dyn ResourceSyncer>>) -> Self {
        Self {
            syncers: syncers
                .into_iter()
                .map(|syncer| (syncer.resource_type(), syncer))
                .collect(),
        }
    }

    /// Runs one full sync pass.
    pub async fn run(&self) -> AppResult<SyncSnapshot> {
        let mut snapshot = SyncSnapshot::default();
        let mut pending: VecDeque<Resource> =
            self.list_all(ResourceType::Group, None).await?.into();

        while let Some(resource) = pending.pop_front() {
            let resource_type = resource.id().resource_type();

            if !resource_type.skips_entitlements_and_grants() {
                let syncer = self.syncer(resource_type)?;
                snapshot
                    .entitlements
                    .extend(syncer.entitlements(&resource).await?);
                snapshot.grants.extend(syncer.grants(&resource).await?);
            }

            for child_type in resource.child_resource_types() {
                pending.extend(self.list_all(*child_type, Some(resource.id())).await?);
            }

            snapshot.resources.push(resource);
        }

        info!(
            resources = snapshot.resources.len(),
            entitlements = snapshot.entitlements.len(),
            grants = snapshot.grants.len(),
            "sync pass completed"
        );

        Ok(snapshot)
    }

    async fn list_all(
        &self,
        resource_type: ResourceType,
        parent: Option<&ResourceId>,
    ) -> AppResult<Vec<Resource>> {
        let syncer = self.syncer(resource_type)?;
        let mut resources = Vec::new();
        let mut seen_tokens = HashSet::new();
        let mut page_token = String::new();

        loop {
            let page = syncer.list(parent, page_token.as_str()).await?;
            debug!(
                resource_type = %resource_type,
                listed = page.resources.len(),
                has_more = !page.next_page_token.is_empty(),
                "listed resource page"
            );
            resources.extend(page.resources);

            if page.next_page_token.is_empty() {
                return Ok(resources);
            }
            if !seen_tokens.insert(page.next_page_token.clone()) {
                return Err(AppError::Internal(format!(
                    "pagination for resource type '{resource_type}' did not advance"
                )));
            }
            page_token = page.next_page_token;
        }
    }

    fn syncer(&self, resource_type: ResourceType) -> AppResult<&Arc<dyn ResourceSyncer>> {
        self.syncers.get(&resource_type).ok_or_else(|| {
            AppError::Internal(format!(
                "no syncer registered for resource type '{resource_type}'"
            ))
        })
    }
}
