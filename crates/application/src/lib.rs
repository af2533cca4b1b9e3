//! Application services and ports.

#![forbid(unsafe_code)]

mod connector;
mod group_syncer;
mod organization_syncer;
mod resource_syncer;
mod role_classifier;
mod snyk_ports;
mod sync_runner;
mod user_syncer;

#[cfg(test)]
mod test_support;

pub use connector::{ConnectorMetadata, SnykConnector};
pub use group_syncer::GroupSyncer;
pub use organization_syncer::OrganizationSyncer;
pub use resource_syncer::{ResourcePage, ResourceProvisioner, ResourceSyncer};
pub use role_classifier::{fetch_org_roles, filter_roles};
pub use snyk_ports::{OrganizationPage, PageRequest, RESOURCES_PAGE_SIZE, SnykApi};
pub use sync_runner::{SyncRunner, SyncSnapshot};
pub use user_syncer::UserSyncer;
