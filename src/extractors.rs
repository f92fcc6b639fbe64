//! Request extractors shared by the model handlers.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// Query parameter carrying the access token.
pub const ACCESS_TOKEN_PARAM: &str = "access_token";

/// The access-token credential of a request, if any. Checked in the query
/// string first, then the Authorization header (a Bearer prefix is allowed).
#[derive(Clone, Debug)]
pub struct TokenCredential(pub Option<String>);

impl TokenCredential {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for TokenCredential
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let from_query = parts.uri.query().and_then(token_from_query);
        let from_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(|raw| raw.strip_prefix("Bearer ").unwrap_or(raw).trim().to_string())
            .filter(|token| !token.is_empty());
        Ok(TokenCredential(from_query.or(from_header)))
    }
}

fn token_from_query(query: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == ACCESS_TOKEN_PARAM && !value.is_empty()).then(|| value.to_string())
    })
}
