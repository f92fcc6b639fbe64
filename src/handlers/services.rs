//! Serve the current session's services script.

use crate::error::AppError;
use crate::state::HarnessState;
use axum::extract::{RawQuery, State};
use axum::http::header;
use axum::response::IntoResponse;

/// The query string names a module, but only one session exists, so the
/// configured script is served regardless. A mismatch is logged and ignored.
pub async fn services(
    State(state): State<HarnessState>,
    RawQuery(query): RawQuery,
) -> Result<impl IntoResponse, AppError> {
    let session = state.session.require()?;
    if let Some(requested) = query.as_deref() {
        if requested != session.name {
            tracing::debug!(requested, configured = %session.name, "services name mismatch ignored");
        }
    }
    Ok((
        [(header::CONTENT_TYPE, "application/javascript")],
        session.script.clone(),
    ))
}
