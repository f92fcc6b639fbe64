//! Setup handler: validate the request, build a fresh backend, generate the
//! services script, and swap the session in one step.

use crate::backend::{Backend, DataSourceConfig, DB_DATA_SOURCE, MAIL_DATA_SOURCE};
use crate::error::AppError;
use crate::generator;
use crate::schema::SetupRequest;
use crate::session::Session;
use crate::state::HarnessState;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupResponse {
    pub services_url: String,
}

pub async fn setup(
    State(state): State<HarnessState>,
    Json(body): Json<Value>,
) -> Result<Json<SetupResponse>, AppError> {
    let request = SetupRequest::parse(body)?;

    // One setup at a time; a failure below leaves the old session serving.
    let _guard = state.setup_lock.lock().await;

    let mut builder = Backend::builder()
        .attach_data_source(DB_DATA_SOURCE, DataSourceConfig::memory())
        .attach_data_source(MAIL_DATA_SOURCE, DataSourceConfig::mail());
    for (name, mut definition) in request.models {
        // Submitted models always live on the general-purpose store.
        definition.data_source = Some(DB_DATA_SOURCE.to_string());
        builder = builder.register_model(&name, definition);
    }
    if request.enable_auth {
        builder = builder.enable_auth();
    }
    let backend = builder.mount("/")?;

    let script = match generator::services_script(&backend, &request.name, state.api_url()) {
        Ok(script) => script,
        Err(err) => {
            tracing::error!(error = %err, "cannot generate services script");
            generator::ERROR_SCRIPT.to_string()
        }
    };

    let services_url = format!("{}services?{}", state.base_url(), request.name);
    let model_count = backend.registry().len();
    state.session.replace(Session { name: request.name, backend, script })?;
    tracing::info!(services_url = %services_url, models = model_count, "session configured");

    Ok(Json(SetupResponse { services_url }))
}
