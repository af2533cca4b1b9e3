use std::fmt::{Debug, Formatter};

use crate::{AppResult, NonEmptyString};

/// API token sent with every upstream request.
///
/// The value never appears in `Debug` output so configuration structs can be
/// logged freely.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(NonEmptyString);

impl ApiToken {
    /// Creates a token, rejecting empty or whitespace-only values.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        Ok(Self(NonEmptyString::new(value.into().trim().to_owned())?))
    }

    /// Returns the raw token value.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the `Authorization` header value for this token.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("token {}", self.expose())
    }
}

impl Debug for ApiToken {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("ApiToken(***)")
    }
}
