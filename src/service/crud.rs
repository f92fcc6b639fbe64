//! Generic CRUD execution against a backend's data sources.

use crate::auth;
use crate::backend::BackendCore;
use crate::error::AppError;
use crate::schema::{BaseKind, DefaultFn, RegisteredModel};
use crate::store::{ConnectorKind, RecordId};
use serde_json::{Map, Value};

pub struct CrudService;

impl CrudService {
    /// List rows matching the equality filters, in id order, after paging.
    pub fn list(
        core: &BackendCore,
        model: &RegisteredModel,
        filters: &[(String, Value)],
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<Value>, AppError> {
        let rows = Self::rows(core, model)?;
        let matched = rows
            .into_iter()
            .filter(|row| matches_filters(row, filters))
            .skip(offset.unwrap_or(0));
        let rows: Vec<Value> = match limit {
            Some(limit) => matched.take(limit).collect(),
            None => matched.collect(),
        };
        Ok(rows.into_iter().map(|row| strip_sensitive(row, model)).collect())
    }

    pub fn create(
        core: &BackendCore,
        model: &RegisteredModel,
        body: Map<String, Value>,
    ) -> Result<Value, AppError> {
        crate::service::RequestValidator::validate(&body, model)?;
        let mut record = body;
        apply_defaults(&mut record, model);
        if model.base == BaseKind::User {
            auth::hash_password_field(&mut record);
        }
        match model.connector {
            ConnectorKind::Memory => {
                let explicit_id = match record.get(&model.id_property) {
                    Some(value) => {
                        let id = RecordId::from_value(value)
                            .filter(|id| id.matches_kind(model.id_kind))
                            .ok_or_else(|| {
                                AppError::BadRequest(format!("invalid {} value", model.id_property))
                            })?;
                        Some(id)
                    }
                    None => None,
                };
                let stored = core.store.create(
                    &model.name,
                    explicit_id,
                    record,
                    &model.id_property,
                    model.id_kind,
                )?;
                Ok(strip_sensitive(stored, model))
            }
            ConnectorKind::Mail => Ok(core.mail.send(record)?),
        }
    }

    pub fn read(
        core: &BackendCore,
        model: &RegisteredModel,
        id: &RecordId,
    ) -> Result<Option<Value>, AppError> {
        require_memory(model, "read")?;
        Ok(core
            .store
            .find(&model.name, id)?
            .map(|row| strip_sensitive(row, model)))
    }

    pub fn update(
        core: &BackendCore,
        model: &RegisteredModel,
        id: &RecordId,
        body: Map<String, Value>,
    ) -> Result<Option<Value>, AppError> {
        require_memory(model, "update")?;
        crate::service::RequestValidator::validate_partial(&body, model)?;
        let mut patch = body;
        if model.base == BaseKind::User && patch.contains_key("password") {
            auth::hash_password_field(&mut patch);
        }
        Ok(core
            .store
            .update(&model.name, id, patch, &model.id_property)?
            .map(|row| strip_sensitive(row, model)))
    }

    pub fn delete(
        core: &BackendCore,
        model: &RegisteredModel,
        id: &RecordId,
    ) -> Result<Option<Value>, AppError> {
        require_memory(model, "delete")?;
        Ok(core
            .store
            .remove(&model.name, id)?
            .map(|row| strip_sensitive(row, model)))
    }

    pub fn count(
        core: &BackendCore,
        model: &RegisteredModel,
        filters: &[(String, Value)],
    ) -> Result<u64, AppError> {
        let rows = Self::rows(core, model)?;
        Ok(rows.iter().filter(|row| matches_filters(row, filters)).count() as u64)
    }

    pub fn exists(
        core: &BackendCore,
        model: &RegisteredModel,
        id: &RecordId,
    ) -> Result<bool, AppError> {
        require_memory(model, "exists")?;
        Ok(core.store.exists(&model.name, id)?)
    }

    fn rows(core: &BackendCore, model: &RegisteredModel) -> Result<Vec<Value>, AppError> {
        let rows = match model.connector {
            ConnectorKind::Memory => core.store.all(&model.name)?,
            ConnectorKind::Mail => core.mail.outbox()?,
        };
        Ok(rows)
    }
}

fn require_memory(model: &RegisteredModel, operation: &str) -> Result<(), AppError> {
    if model.connector == ConnectorKind::Mail {
        return Err(AppError::BadRequest(format!(
            "{} is attached to the mail connector; {} is not supported",
            model.name, operation
        )));
    }
    Ok(())
}

fn apply_defaults(record: &mut Map<String, Value>, model: &RegisteredModel) {
    for prop in &model.properties {
        if prop.is_id || record.contains_key(&prop.name) {
            continue;
        }
        if let Some(value) = &prop.default {
            record.insert(prop.name.clone(), value.clone());
        } else if let Some(default_fn) = prop.default_fn {
            let value = match default_fn {
                DefaultFn::Now => Value::String(chrono::Utc::now().to_rfc3339()),
                DefaultFn::Guid => Value::String(uuid::Uuid::new_v4().to_string()),
            };
            record.insert(prop.name.clone(), value);
        }
    }
}

fn strip_sensitive(row: Value, model: &RegisteredModel) -> Value {
    if model.sensitive.is_empty() {
        return row;
    }
    match row {
        Value::Object(mut fields) => {
            fields.retain(|key, _| !model.sensitive.contains(key));
            Value::Object(fields)
        }
        other => other,
    }
}

fn matches_filters(row: &Value, filters: &[(String, Value)]) -> bool {
    filters.iter().all(|(key, expected)| {
        row.get(key)
            .map(|actual| values_match(actual, expected))
            .unwrap_or(false)
    })
}

/// Loose equality: numbers compare by value regardless of representation.
fn values_match(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}
