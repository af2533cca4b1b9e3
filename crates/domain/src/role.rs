use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use snyk_sync_core::{AppError, AppResult};

/// Slug of the lowest-privilege organization role every member holds at minimum.
pub const MINIMAL_ROLE_SLUG: &str = "collaborator";

/// Scope encoded as the first token of a role display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleScope {
    /// Role assignable inside an organization.
    Org,
    /// Role assignable at the group level.
    Group,
}

impl RoleScope {
    /// Returns the lower-case token used in role display names.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Org => "org",
            Self::Group => "group",
        }
    }
}

impl FromStr for RoleScope {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "org" => Ok(Self::Org),
            "group" => Ok(Self::Group),
            _ => Err(AppError::Validation(format!("unknown role scope '{value}'"))),
        }
    }
}

impl Display for RoleScope {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Role definition as reported upstream, before classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Upstream public identifier, authoritative for uniqueness.
    pub public_id: String,
    /// Raw display name, conventionally `"<Scope> <Slug>"`.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Creation timestamp as reported upstream.
    pub created: Option<String>,
    /// Last modification timestamp as reported upstream.
    pub modified: Option<String>,
}

impl Role {
    /// Derives scope and slug from the display name.
    pub fn classify(&self) -> AppResult<ScopedRole> {
        let (scope, slug) = classify_role_name(self.name.as_str())?;

        Ok(ScopedRole {
            public_id: self.public_id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            scope,
            slug,
        })
    }
}

/// Role whose display name has been parsed into scope and slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopedRole {
    public_id: String,
    name: String,
    description: String,
    scope: RoleScope,
    slug: String,
}

impl ScopedRole {
    /// Returns the upstream public identifier.
    #[must_use]
    pub fn public_id(&self) -> &str {
        self.public_id.as_str()
    }

    /// Returns the raw display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the role description.
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Returns the parsed scope.
    #[must_use]
    pub fn scope(&self) -> RoleScope {
        self.scope
    }

    /// Returns the lower-cased slug.
    #[must_use]
    pub fn slug(&self) -> &str {
        self.slug.as_str()
    }

    /// Returns whether this is the minimal default organization role.
    #[must_use]
    pub fn is_minimal(&self) -> bool {
        self.scope == RoleScope::Org && self.slug == MINIMAL_ROLE_SLUG
    }
}

/// Parses a role display name into its scope and lower-cased slug.
///
/// The name must consist of exactly two whitespace-separated tokens, the
/// first of which is a known scope.
pub fn classify_role_name(name: &str) -> AppResult<(RoleScope, String)> {
    let lowered = name.to_lowercase();
    let mut tokens = lowered.split_whitespace();

    let (Some(scope), Some(slug), None) = (tokens.next(), tokens.next(), tokens.next()) else {
        return Err(AppError::Validation(format!(
            "role name '{name}' is not of the form '<scope> <slug>'"
        )));
    };

    Ok((RoleScope::from_str(scope)?, slug.to_owned()))
}
