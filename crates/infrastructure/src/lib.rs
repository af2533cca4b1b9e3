//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod http_snyk_client;

pub use http_snyk_client::{DEFAULT_SNYK_API_BASE_URL, HttpSnykClient};
