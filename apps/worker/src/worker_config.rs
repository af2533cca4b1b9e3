use std::time::Duration;

use snyk_sync_application::RESOURCES_PAGE_SIZE;
use snyk_sync_core::{ApiToken, AppError, AppResult};
use snyk_sync_infrastructure::DEFAULT_SNYK_API_BASE_URL;
use url::Url;

/// Runtime configuration read from `SNYK_*` environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub api_token: ApiToken,
    pub group_id: String,
    pub org_ids: Vec<String>,
    pub api_base_url: Url,
    pub page_size: u32,
    pub http_timeout: Duration,
}

impl WorkerConfig {
    pub fn load() -> AppResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_token = ApiToken::new(required_env(&lookup, "SNYK_API_TOKEN")?)
            .map_err(|_| AppError::Validation("SNYK_API_TOKEN must not be empty".to_owned()))?;
        let group_id = required_env(&lookup, "SNYK_GROUP_ID")?.trim().to_owned();
        if group_id.is_empty() {
            return Err(AppError::Validation(
                "SNYK_GROUP_ID must not be empty".to_owned(),
            ));
        }

        let org_ids = lookup("SNYK_ORG_IDS")
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|org_id| !org_id.is_empty())
                    .map(ToOwned::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        let raw_base_url = lookup("SNYK_API_BASE_URL")
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_SNYK_API_BASE_URL.to_owned());
        let api_base_url = Url::parse(raw_base_url.as_str()).map_err(|error| {
            AppError::Validation(format!(
                "invalid SNYK_API_BASE_URL value '{raw_base_url}': {error}"
            ))
        })?;

        let page_size = parse_env_u32(&lookup, "SNYK_PAGE_SIZE", RESOURCES_PAGE_SIZE)?;
        if page_size == 0 {
            return Err(AppError::Validation(
                "SNYK_PAGE_SIZE must be greater than zero".to_owned(),
            ));
        }

        let http_timeout_secs = parse_env_u64(&lookup, "SNYK_HTTP_TIMEOUT_SECS", 30)?;
        if http_timeout_secs == 0 {
            return Err(AppError::Validation(
                "SNYK_HTTP_TIMEOUT_SECS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            api_token,
            group_id,
            org_ids,
            api_base_url,
            page_size,
            http_timeout: Duration::from_secs(http_timeout_secs),
        })
    }
}

fn required_env<F>(lookup: &F, name: &str) -> AppResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).ok_or_else(|| AppError::Validation(format!("{name} is required")))
}

fn parse_env_u32<F>(lookup: &F, name: &str, default: u32) -> AppResult<u32>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => value.trim().parse::<u32>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}

fn parse_env_u64<F>(lookup: &F, name: &str, default: u64) -> AppResult<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => value.trim().parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}
