//! Model CRUD handlers: list, create, read, update, delete, count, exists,
//! plus login and logout for user-based models.

use crate::auth::{self, Operation};
use crate::backend::BackendCore;
use crate::error::AppError;
use crate::extractors::{TokenCredential, ACCESS_TOKEN_PARAM};
use crate::schema::{PropertyType, RegisteredModel};
use crate::service::CrudService;
use crate::store::RecordId;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

pub async fn list(
    State(core): State<Arc<BackendCore>>,
    Path(model_path): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    token: TokenCredential,
) -> Result<Json<Value>, AppError> {
    let model = resolve_model(&core, &model_path)?;
    auth::authorize(&core, model, Operation::List, None, token.as_deref())?;
    let (filters, limit, offset) = parse_query(model, params);
    let rows = CrudService::list(&core, model, &filters, limit, offset)?;
    Ok(Json(Value::Array(rows)))
}

pub async fn create(
    State(core): State<Arc<BackendCore>>,
    Path(model_path): Path<String>,
    token: TokenCredential,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let model = resolve_model(&core, &model_path)?;
    auth::authorize(&core, model, Operation::Create, None, token.as_deref())?;
    let row = CrudService::create(&core, model, body_to_map(body)?)?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn find_by_id(
    State(core): State<Arc<BackendCore>>,
    Path((model_path, id)): Path<(String, String)>,
    token: TokenCredential,
) -> Result<Json<Value>, AppError> {
    let model = resolve_model(&core, &model_path)?;
    let id = parse_id(&id, model)?;
    auth::authorize(&core, model, Operation::Read, Some(&id), token.as_deref())?;
    let row = CrudService::read(&core, model, &id)?
        .ok_or_else(|| AppError::NotFound(format!("{}/{}", model.name, id)))?;
    Ok(Json(row))
}

pub async fn update(
    State(core): State<Arc<BackendCore>>,
    Path((model_path, id)): Path<(String, String)>,
    token: TokenCredential,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let model = resolve_model(&core, &model_path)?;
    let id = parse_id(&id, model)?;
    auth::authorize(&core, model, Operation::Update, Some(&id), token.as_deref())?;
    let row = CrudService::update(&core, model, &id, body_to_map(body)?)?
        .ok_or_else(|| AppError::NotFound(format!("{}/{}", model.name, id)))?;
    Ok(Json(row))
}

/// Idempotent: deleting an absent row is still a 204.
pub async fn delete_by_id(
    State(core): State<Arc<BackendCore>>,
    Path((model_path, id)): Path<(String, String)>,
    token: TokenCredential,
) -> Result<StatusCode, AppError> {
    let model = resolve_model(&core, &model_path)?;
    let id = parse_id(&id, model)?;
    auth::authorize(&core, model, Operation::Delete, Some(&id), token.as_deref())?;
    CrudService::delete(&core, model, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn count(
    State(core): State<Arc<BackendCore>>,
    Path(model_path): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    token: TokenCredential,
) -> Result<Json<Value>, AppError> {
    let model = resolve_model(&core, &model_path)?;
    auth::authorize(&core, model, Operation::Count, None, token.as_deref())?;
    let (filters, _, _) = parse_query(model, params);
    let count = CrudService::count(&core, model, &filters)?;
    Ok(Json(json!({ "count": count })))
}

pub async fn exists(
    State(core): State<Arc<BackendCore>>,
    Path((model_path, id)): Path<(String, String)>,
    token: TokenCredential,
) -> Result<Json<Value>, AppError> {
    let model = resolve_model(&core, &model_path)?;
    let id = parse_id(&id, model)?;
    auth::authorize(&core, model, Operation::Exists, Some(&id), token.as_deref())?;
    let exists = CrudService::exists(&core, model, &id)?;
    Ok(Json(json!({ "exists": exists })))
}

pub async fn login(
    State(core): State<Arc<BackendCore>>,
    Path(model_path): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let model = resolve_model(&core, &model_path)?;
    if !model.is_user_base() {
        return Err(AppError::NotFound(format!("{}/login", model_path)));
    }
    let token = auth::login(&core, model, body_to_map(body)?)?;
    Ok(Json(token))
}

pub async fn logout(
    State(core): State<Arc<BackendCore>>,
    Path(model_path): Path<String>,
    token: TokenCredential,
) -> Result<StatusCode, AppError> {
    let model = resolve_model(&core, &model_path)?;
    if !model.is_user_base() {
        return Err(AppError::NotFound(format!("{}/logout", model_path)));
    }
    auth::logout(&core, token.as_deref())?;
    Ok(StatusCode::NO_CONTENT)
}

fn resolve_model<'a>(core: &'a BackendCore, path: &str) -> Result<&'a Arc<RegisteredModel>, AppError> {
    core.registry
        .by_path(path)
        .ok_or_else(|| AppError::NotFound(path.to_string()))
}

fn parse_id(raw: &str, model: &RegisteredModel) -> Result<RecordId, AppError> {
    RecordId::parse(raw, model.id_kind)
        .ok_or_else(|| AppError::BadRequest(format!("invalid {} value", model.id_property)))
}

fn body_to_map(value: Value) -> Result<Map<String, Value>, AppError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(AppError::BadRequest("body must be a JSON object".to_string())),
    }
}

/// Split query params into paging controls and typed equality filters.
/// Unknown keys are ignored rather than rejected.
fn parse_query(
    model: &RegisteredModel,
    params: HashMap<String, String>,
) -> (Vec<(String, Value)>, Option<usize>, Option<usize>) {
    let mut filters = Vec::new();
    let mut limit = None;
    let mut offset = None;
    for (key, raw) in params {
        match key.as_str() {
            "limit" => limit = raw.parse().ok(),
            "offset" => offset = raw.parse().ok(),
            ACCESS_TOKEN_PARAM => {}
            _ => {
                if let Some(prop) = model.property(&key) {
                    let value = typed_query_value(prop.ty, &raw);
                    filters.push((key, value));
                }
            }
        }
    }
    (filters, limit, offset)
}

/// Coerce a query string to the property's type so filters compare typed.
fn typed_query_value(ty: PropertyType, raw: &str) -> Value {
    match ty {
        PropertyType::Number => {
            if let Ok(n) = raw.parse::<i64>() {
                return Value::Number(n.into());
            }
            if let Some(n) = raw.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
                return Value::Number(n);
            }
            Value::String(raw.to_string())
        }
        PropertyType::Boolean => match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(raw.to_string()),
        },
        _ => Value::String(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{resolve_model as resolve_definition, ModelDefinition};
    use crate::store::ConnectorKind;
    use serde_json::json;

    fn model() -> RegisteredModel {
        let definition: ModelDefinition = serde_json::from_value(json!({
            "properties": { "name": "string", "qty": "number", "done": "boolean" }
        }))
        .unwrap();
        resolve_definition("Item", &definition, "db", ConnectorKind::Memory).unwrap()
    }

    #[test]
    fn query_params_become_typed_filters() {
        let params = HashMap::from([
            ("name".to_string(), "Ada".to_string()),
            ("qty".to_string(), "3".to_string()),
            ("done".to_string(), "true".to_string()),
        ]);
        let (mut filters, _, _) = parse_query(&model(), params);
        filters.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            filters,
            vec![
                ("done".to_string(), json!(true)),
                ("name".to_string(), json!("Ada")),
                ("qty".to_string(), json!(3)),
            ]
        );
    }

    #[test]
    fn paging_and_token_params_are_not_filters() {
        let params = HashMap::from([
            ("limit".to_string(), "2".to_string()),
            ("offset".to_string(), "4".to_string()),
            ("access_token".to_string(), "tok".to_string()),
            ("unknown".to_string(), "x".to_string()),
        ]);
        let (filters, limit, offset) = parse_query(&model(), params);
        assert!(filters.is_empty());
        assert_eq!(limit, Some(2));
        assert_eq!(offset, Some(4));
    }

    #[test]
    fn id_segments_parse_by_kind() {
        let model = model();
        assert_eq!(parse_id("7", &model).unwrap(), RecordId::Number(7));
        assert!(parse_id("abc", &model).is_err());
    }
}
