//! Shared primitives for all Rust crates in snyk-sync.

#![forbid(unsafe_code)]

/// Credential primitives shared across services.
pub mod auth;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use auth::ApiToken;

/// Result type used across snyk-sync crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Principal type cannot hold the requested entitlement.
    #[error("unsupported principal: {0}")]
    UnsupportedPrincipal(String),

    /// Credentials were rejected or could not be validated.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Request never produced a usable HTTP exchange.
    #[error("transport error: {0}")]
    Transport(String),

    /// Upstream answered with a non-success status.
    #[error("{}", upstream_message(*status, message.as_deref()))]
    Upstream {
        /// HTTP status code returned upstream.
        status: u16,
        /// Message from a structured error body, if one was returned.
        message: Option<String>,
    },

    /// Response or token payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

fn upstream_message(status: u16, message: Option<&str>) -> String {
    match message {
        Some(message) => format!("unexpected status code {status}: {message}"),
        None => format!("unexpected status code {status}"),
    }
}
