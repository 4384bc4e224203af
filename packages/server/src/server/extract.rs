//! Request extractors.

use std::convert::Infallible;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// Header carrying the node credential.
pub const API_TOKEN_HEADER: &str = "x-api-token";

/// The node credential from the `X-API-TOKEN` header, if present.
///
/// Extraction never rejects: handlers distinguish a missing credential
/// (401) from an unknown one (403) themselves.
#[derive(Debug, Clone)]
pub struct ApiToken(pub Option<String>);

impl ApiToken {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ApiToken {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(API_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        Ok(Self(token))
    }
}
