//! API gateway: forward /api traffic into the session's backend router.

use crate::error::AppError;
use crate::state::HarnessState;
use axum::extract::{Request, State};
use axum::http::uri::{PathAndQuery, Uri};
use axum::response::Response;

/// Re-root `/api/...` to `/...` and hand the request to the current backend.
pub async fn gateway(
    State(state): State<HarnessState>,
    mut request: Request,
) -> Result<Response, AppError> {
    let session = state.session.require()?;
    *request.uri_mut() = strip_api_prefix(request.uri());
    // Routing to this handler left the wildcard capture in the request
    // extensions, and the backend router would append its own captures to
    // it. Clear them so the backend matches from a clean slate.
    request.extensions_mut().clear();
    Ok(session.backend.handle(request).await)
}

fn strip_api_prefix(uri: &Uri) -> Uri {
    let path_and_query = uri
        .path_and_query()
        .map(PathAndQuery::as_str)
        .unwrap_or("/");
    let rest = path_and_query.strip_prefix("/api").unwrap_or(path_and_query);
    let rewritten = if rest.is_empty() || rest.starts_with('?') {
        format!("/{}", rest)
    } else {
        rest.to_string()
    };
    match rewritten.parse() {
        Ok(uri) => uri,
        Err(_) => Uri::from_static("/"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stripped(input: &str) -> String {
        strip_api_prefix(&input.parse::<Uri>().unwrap()).to_string()
    }

    #[test]
    fn api_prefix_is_removed_and_the_query_kept() {
        assert_eq!(stripped("/api/Customer"), "/Customer");
        assert_eq!(stripped("/api/Customer/1?limit=2"), "/Customer/1?limit=2");
    }

    #[test]
    fn bare_api_maps_to_the_backend_root() {
        assert_eq!(stripped("/api"), "/");
        assert_eq!(stripped("/api/"), "/");
        assert_eq!(stripped("/api?x=1"), "/?x=1");
    }
}
