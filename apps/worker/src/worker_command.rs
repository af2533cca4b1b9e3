use snyk_sync_core::{AppError, AppResult};
use snyk_sync_domain::{Entitlement, ORG_MEMBERSHIP_SLUG, ResourceId, ResourceType};

/// Operation requested on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerCommand {
    /// Full read-only sync pass.
    Sync,
    /// Grants an organization entitlement to a user.
    Grant(ProvisioningTarget),
    /// Revokes an organization entitlement from a user.
    Revoke(ProvisioningTarget),
}

/// Organization, user and entitlement slug addressed by a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningTarget {
    pub org_id: String,
    pub user_id: String,
    pub slug: String,
}

impl ProvisioningTarget {
    pub fn principal(&self) -> ResourceId {
        ResourceId::new(ResourceType::User, self.user_id.as_str())
    }

    /// `member` addresses the membership, any other slug a role public id.
    pub fn entitlement(&self) -> Entitlement {
        let resource = ResourceId::new(ResourceType::Organization, self.org_id.as_str());
        if self.slug == ORG_MEMBERSHIP_SLUG {
            Entitlement::assignment(resource, ORG_MEMBERSHIP_SLUG, ORG_MEMBERSHIP_SLUG, "")
        } else {
            Entitlement::permission(resource, self.slug.as_str(), self.slug.as_str(), "")
        }
    }
}

impl WorkerCommand {
    /// Parses arguments following the program name.
    pub fn parse<I>(args: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let args: Vec<String> = args.into_iter().collect();

        match args.first().map(String::as_str) {
            None | Some("sync") if args.len() <= 1 => Ok(Self::Sync),
            Some("grant") => Ok(Self::Grant(parse_target("grant", &args[1..])?)),
            Some("revoke") => Ok(Self::Revoke(parse_target("revoke", &args[1..])?)),
            _ => Err(AppError::Validation(format!(
                "unknown command '{}', expected one of: sync, grant <org-id> <user-id> <slug>, revoke <org-id> <user-id> <slug>",
                args.join(" ")
            ))),
        }
    }
}

fn parse_target(command: &str, args: &[String]) -> AppResult<ProvisioningTarget> {
    match args {
        [org_id, user_id, slug]
            if [org_id, user_id, slug]
                .iter()
                .all(|value| !value.trim().is_empty()) =>
        {
            Ok(ProvisioningTarget {
                org_id: org_id.trim().to_owned(),
                user_id: user_id.trim().to_owned(),
                slug: slug.trim().to_owned(),
            })
        }
        _ => Err(AppError::Validation(format!(
            "usage: {command} <org-id> <user-id> <slug>"
        ))),
    }
}
