use snyk_sync_core::AppResult;
use snyk_sync_domain::{Role, RoleScope, ScopedRole};
use tracing::warn;

use crate::SnykApi;

/// Classifies `roles` and keeps the ones in `scope`.
///
/// Roles whose display name cannot be classified are logged and skipped so
/// one badly named role never hides the rest of the list.
#[must_use]
pub fn filter_roles(roles: &[Role], scope: RoleScope) -> Vec<ScopedRole> {
    roles
        .iter()
        .filter_map(|role| match role.classify() {
            Ok(scoped) => Some(scoped),
            Err(error) => {
                warn!(
                    role_id = %role.public_id,
                    role_name = %role.name,
                    error = %error,
                    "skipping role with unclassifiable name"
                );
                None
            }
        })
        .filter(|role| role.scope() == scope)
        .collect()
}

/// Fetches the current role list and returns the organization-scoped roles.
pub async fn fetch_org_roles(api: &dyn SnykApi) -> AppResult<Vec<ScopedRole>> {
    let roles = api.list_roles().await?;
    Ok(filter_roles(&roles, RoleScope::Org))
}
