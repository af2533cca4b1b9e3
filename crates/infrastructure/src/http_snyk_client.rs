use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, LINK};
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

use snyk_sync_application::{OrganizationPage, PageRequest, SnykApi};
use snyk_sync_core::{ApiToken, AppError, AppResult};
use snyk_sync_domain::{
    Group, GroupMember, GroupMemberOrg, MINIMAL_ROLE_SLUG, OrgMember, Organization, Role,
};
use tracing::debug;

/// Default Snyk v1 API base URL.
pub const DEFAULT_SNYK_API_BASE_URL: &str = "https://api.snyk.io/v1";

/// Snyk v1 REST client scoped to one group.
#[derive(Clone)]
pub struct HttpSnykClient {
    http_client: reqwest::Client,
    base_url: Url,
    token: ApiToken,
    group_id: String,
}

impl HttpSnykClient {
    /// Creates a client for `group_id` against `base_url`.
    pub fn new(
        http_client: reqwest::Client,
        base_url: Url,
        token: ApiToken,
        group_id: impl Into<String>,
    ) -> AppResult<Self> {
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(AppError::Validation(format!(
                "Snyk API base URL '{base_url}' must be an absolute http(s) URL"
            )));
        }

        let group_id = group_id.into();
        if group_id.trim().is_empty() {
            return Err(AppError::Validation(
                "Snyk group id must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            http_client,
            base_url,
            token,
            group_id,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                AppError::Validation(format!(
                    "Snyk API base URL '{}' cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn group_endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let mut path = vec!["group", self.group_id.as_str()];
        path.extend_from_slice(segments);
        self.endpoint(&path)
    }

    /// Parses a `Link` continuation URL, refusing hosts other than the API base.
    fn continuation_url(&self, page_url: &str) -> AppResult<Url> {
        let url = Url::parse(page_url).map_err(|error| {
            AppError::Validation(format!("invalid next page URL '{page_url}': {error}"))
        })?;

        if url.origin() != self.base_url.origin() {
            return Err(AppError::Validation(format!(
                "next page URL '{page_url}' does not belong to the configured Snyk API origin"
            )));
        }

        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> AppResult<Response> {
        debug!(method = %method, url = %url, "sending Snyk API request");

        let mut request: RequestBuilder = self
            .http_client
            .request(method.clone(), url.clone())
            .header(AUTHORIZATION, self.token.authorization_header())
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|error| {
            AppError::Transport(format!("Snyk API request {method} {url} failed: {error}"))
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        debug!(method = %method, url = %url, status = status.as_u16(), "Snyk API request rejected");
        Err(upstream_error(status.as_u16(), response.text().await))
    }

    async fn get_json<T>(&self, url: Url) -> AppResult<(T, String)>
    where
        T: DeserializeOwned,
    {
        let response = self.send(Method::GET, url, None).await?;
        let link_header = header_value(&response, LINK);
        let content_type = header_value(&response, CONTENT_TYPE);
        let body = response.text().await.map_err(|error| {
            AppError::Transport(format!("failed to read Snyk API response body: {error}"))
        })?;

        if !is_json_content_type(content_type.as_str()) {
            return Err(AppError::Transport(format!(
                "unexpected content type {content_type} - {body}"
            )));
        }

        let decoded = serde_json::from_str(body.as_str()).map_err(|error| {
            AppError::Decode(format!("failed to decode Snyk API response body: {error}"))
        })?;

        Ok((decoded, link_header))
    }
}

fn header_value(response: &Response, name: reqwest::header::HeaderName) -> String {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}

fn is_json_content_type(content_type: &str) -> bool {
    content_type.starts_with("application") && content_type.contains("json")
}

/// Builds the error for a rejected request from its possibly unreadable body.
fn upstream_error<E>(status: u16, body: Result<String, E>) -> AppError
where
    E: std::fmt::Display,
{
    let message = match body {
        Ok(body) => upstream_error_message(body.as_str()),
        Err(error) => {
            debug!(status, error = %error, "failed to read Snyk API error body");
            None
        }
    };

    AppError::Upstream { status, message }
}

/// Extracts `message` (or `error`) from a structured error body.
fn upstream_error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .message
        .filter(|message| !message.trim().is_empty())
        .or_else(|| parsed.error.filter(|error| !error.trim().is_empty()))
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroupBody {
    id: Option<String>,
    name: Option<String>,
    url: Option<String>,
}

impl GroupBody {
    fn into_group(self, fallback_id: &str) -> Group {
        Group {
            id: self.id.unwrap_or_else(|| fallback_id.to_owned()),
            name: self.name.unwrap_or_default(),
            url: self.url.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GroupMemberOrgBody {
    name: Option<String>,
    role: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupMemberBody {
    id: String,
    username: Option<String>,
    email: Option<String>,
    name: Option<String>,
    group_role: Option<String>,
    orgs: Option<Vec<GroupMemberOrgBody>>,
}

impl From<GroupMemberBody> for GroupMember {
    fn from(value: GroupMemberBody) -> Self {
        Self {
            id: value.id,
            username: value.username.unwrap_or_default(),
            email: value.email.unwrap_or_default(),
            name: value.name.unwrap_or_default(),
            group_role: value.group_role.unwrap_or_default(),
            orgs: value
                .orgs
                .unwrap_or_default()
                .into_iter()
                .map(|org| GroupMemberOrg {
                    name: org.name.unwrap_or_default(),
                    role: org.role.unwrap_or_default(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OrgMemberBody {
    id: String,
    username: Option<String>,
    email: Option<String>,
    name: Option<String>,
    role: Option<String>,
}

impl From<OrgMemberBody> for OrgMember {
    fn from(value: OrgMemberBody) -> Self {
        Self {
            id: value.id,
            username: value.username.unwrap_or_default(),
            email: value.email.unwrap_or_default(),
            name: value.name.unwrap_or_default(),
            role: value.role.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OrganizationBody {
    id: String,
    name: Option<String>,
    slug: Option<String>,
    url: Option<String>,
    group: Option<GroupBody>,
}

impl From<OrganizationBody> for Organization {
    fn from(value: OrganizationBody) -> Self {
        Self {
            id: value.id,
            name: value.name.unwrap_or_default(),
            slug: value.slug.unwrap_or_default(),
            url: value.url.unwrap_or_default(),
            group: value
                .group
                .filter(|group| group.id.is_some())
                .map(|group| group.into_group("")),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OrganizationListBody {
    #[serde(default)]
    orgs: Vec<OrganizationBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoleBody {
    public_id: String,
    name: Option<String>,
    description: Option<String>,
    created: Option<String>,
    modified: Option<String>,
}

impl From<RoleBody> for Role {
    fn from(value: RoleBody) -> Self {
        Self {
            public_id: value.public_id,
            name: value.name.unwrap_or_default(),
            description: value.description.unwrap_or_default(),
            created: value.created,
            modified: value.modified,
        }
    }
}

#[async_trait]
impl SnykApi for HttpSnykClient {
    async fn group_details(&self) -> AppResult<Group> {
        // The organization listing carries the group's own fields at the top level.
        let url = self.group_endpoint(&["orgs"])?;
        let (group, _): (GroupBody, String) = self.get_json(url).await?;
        Ok(group.into_group(self.group_id.as_str()))
    }

    async fn list_group_members(&self) -> AppResult<Vec<GroupMember>> {
        let url = self.group_endpoint(&["members"])?;
        let (members, _): (Vec<GroupMemberBody>, String) = self.get_json(url).await?;
        Ok(members.into_iter().map(GroupMember::from).collect())
    }

    async fn list_org_members(&self, org_id: &str) -> AppResult<Vec<OrgMember>> {
        let mut url = self.endpoint(&["org", org_id, "members"])?;
        url.query_pairs_mut()
            .append_pair("includeGroupAdmins", "true");
        let (members, _): (Vec<OrgMemberBody>, String) = self.get_json(url).await?;
        Ok(members.into_iter().map(OrgMember::from).collect())
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let url = self.group_endpoint(&["roles"])?;
        let (roles, _): (Vec<RoleBody>, String) = self.get_json(url).await?;
        Ok(roles.into_iter().map(Role::from).collect())
    }

    async fn list_organizations(&self, request: &PageRequest) -> AppResult<OrganizationPage> {
        let url = match request.page_url.as_deref() {
            Some(page_url) => self.continuation_url(page_url)?,
            None => {
                let mut url = self.group_endpoint(&["orgs"])?;
                url.query_pairs_mut()
                    .append_pair("perPage", request.per_page.to_string().as_str());
                url
            }
        };

        let (body, link_header): (OrganizationListBody, String) = self.get_json(url).await?;
        Ok(OrganizationPage {
            organizations: body.orgs.into_iter().map(Organization::from).collect(),
            link_header,
        })
    }

    async fn add_org_member(&self, org_id: &str, user_id: &str) -> AppResult<()> {
        let url = self.group_endpoint(&["org", org_id, "members"])?;
        self.send(
            Method::POST,
            url,
            Some(json!({ "userId": user_id, "role": MINIMAL_ROLE_SLUG })),
        )
        .await?;
        Ok(())
    }

    async fn remove_org_member(&self, org_id: &str, user_id: &str) -> AppResult<()> {
        let url = self.endpoint(&["org", org_id, "members", user_id])?;
        self.send(Method::DELETE, url, None).await?;
        Ok(())
    }

    async fn update_org_member_role(
        &self,
        org_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> AppResult<()> {
        let url = self.endpoint(&["org", org_id, "members", "update", user_id])?;
        self.send(Method::PUT, url, Some(json!({ "rolePublicId": role_id })))
            .await?;
        Ok(())
    }
}
